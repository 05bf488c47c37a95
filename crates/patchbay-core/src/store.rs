//! SQLite-backed record store.
//!
//! One shared cache file, generic CRUD driven by [`Record`] metadata.
//! Writes are upserts keyed by (name, scope) so one invocation never
//! produces duplicate rows; `AUTOINCREMENT` keeps surrogate ids stable
//! and never reused. Single-process, one-invocation-at-a-time usage is
//! assumed -- concurrent writers from separate processes are not
//! defended beyond SQLite's own file locking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::error::CoreError;
use crate::record::Record;

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS sites (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    provider TEXT NOT NULL,
    uuid TEXT,
    realm TEXT,
    title TEXT,
    unix_username TEXT,
    vcs_url TEXT,
    vcs_type TEXT,
    vcs_protocol TEXT,
    ssh_port TEXT,
    UNIQUE(name, provider)
);

CREATE TABLE IF NOT EXISTS environments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    site_id INTEGER NOT NULL,
    branch TEXT,
    host TEXT,
    unix_username TEXT,
    UNIQUE(name, site_id)
);
";

/// Local cache of site and environment records.
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (creating if needed) the cache at the given path.
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        Self::init(Connection::open(path)?)
    }

    /// Open a throwaway in-memory cache (tests, dry runs).
    pub fn open_in_memory() -> Result<Self, CoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, CoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Populate a record from its (name, scope) row.
    ///
    /// Returns `false` -- leaving the record untouched -- when no row
    /// exists yet.
    pub fn load<R: Record>(&self, record: &mut R) -> Result<bool, CoreError> {
        let conn = self.conn.lock().map_err(|_| CoreError::StorePoisoned)?;
        let columns = R::columns();
        let sql = format!(
            "SELECT id, {} FROM {} WHERE name = ?1 AND {} = ?2",
            columns.join(", "),
            R::TABLE,
            R::SCOPE_FIELD,
        );

        let row = conn
            .query_row(&sql, params![record.name(), record.scope()], |row| {
                let id: i64 = row.get(0)?;
                let mut values: Vec<Option<String>> = Vec::with_capacity(columns.len());
                for index in 0..columns.len() {
                    values.push(row.get(index + 1)?);
                }
                Ok((id, values))
            })
            .optional()?;

        match row {
            Some((id, values)) => {
                record.set_id(id);
                for (column, value) in columns.iter().zip(values) {
                    record.hydrate(column, value);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Upsert one record, then resolve and set its surrogate id.
    pub fn save<R: Record>(&self, record: &mut R) -> Result<i64, CoreError> {
        let conn = self.conn.lock().map_err(|_| CoreError::StorePoisoned)?;
        let columns = R::columns();

        let placeholders = (1..=columns.len() + 2)
            .map(|n| format!("?{n}"))
            .collect::<Vec<_>>()
            .join(", ");
        let assignments = columns
            .iter()
            .map(|c| format!("{c} = excluded.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} (name, {}, {}) VALUES ({}) \
             ON CONFLICT(name, {}) DO UPDATE SET {}",
            R::TABLE,
            R::SCOPE_FIELD,
            columns.join(", "),
            placeholders,
            R::SCOPE_FIELD,
            assignments,
        );

        let mut values: Vec<Option<String>> =
            vec![Some(record.name().to_owned()), Some(record.scope())];
        values.extend(record.values());
        conn.execute(&sql, params_from_iter(values))?;

        let id: i64 = conn.query_row(
            &format!(
                "SELECT id FROM {} WHERE name = ?1 AND {} = ?2",
                R::TABLE,
                R::SCOPE_FIELD,
            ),
            params![record.name(), record.scope()],
            |row| row.get(0),
        )?;
        record.set_id(id);
        Ok(id)
    }

    /// Names of all records of one kind within a scope, sorted.
    pub fn names_in_scope<R: Record>(&self, scope: &str) -> Result<Vec<String>, CoreError> {
        let conn = self.conn.lock().map_err(|_| CoreError::StorePoisoned)?;
        let sql = format!(
            "SELECT name FROM {} WHERE {} = ?1 ORDER BY name",
            R::TABLE,
            R::SCOPE_FIELD,
        );
        let mut stmt = conn.prepare(&sql)?;
        let names = stmt
            .query_map([scope], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{Environment, Site};

    #[test]
    fn save_then_load_round_trips_fields() {
        let store = Store::open_in_memory().unwrap();
        let mut site = Site::new("acquia", "mysite");
        site.set_field("title", Some("My Site".to_owned()));
        site.set_field("realm", Some("prod".to_owned()));
        store.save(&mut site).unwrap();

        let mut loaded = Site::new("acquia", "mysite");
        assert!(store.load(&mut loaded).unwrap());
        assert_eq!(loaded.peek("title"), Some("My Site"));
        assert_eq!(loaded.peek("realm"), Some("prod"));
        assert_eq!(loaded.peek("uuid"), None);
        assert_eq!(loaded.id(), site.id());
    }

    #[test]
    fn load_missing_row_returns_false() {
        let store = Store::open_in_memory().unwrap();
        let mut site = Site::new("acquia", "ghost");
        assert!(!store.load(&mut site).unwrap());
        assert_eq!(site.id(), None);
    }

    #[test]
    fn repeated_saves_keep_one_row_and_a_stable_id() {
        let store = Store::open_in_memory().unwrap();
        let mut site = Site::new("acquia", "mysite");
        let first = store.save(&mut site).unwrap();
        site.set_field("title", Some("Renamed".to_owned()));
        let second = store.save(&mut site).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            store.names_in_scope::<Site>("acquia").unwrap(),
            vec!["mysite"]
        );
    }

    #[test]
    fn same_name_under_different_providers_stays_distinct() {
        let store = Store::open_in_memory().unwrap();
        let mut a = Site::new("acquia", "shared");
        a.set_field("title", Some("On Acquia".to_owned()));
        store.save(&mut a).unwrap();
        let mut p = Site::new("pantheon", "shared");
        p.set_field("title", Some("On Pantheon".to_owned()));
        store.save(&mut p).unwrap();
        assert_ne!(a.id(), p.id());

        let mut loaded = Site::new("pantheon", "shared");
        store.load(&mut loaded).unwrap();
        assert_eq!(loaded.peek("title"), Some("On Pantheon"));
    }

    #[test]
    fn environments_are_scoped_by_owning_site() {
        let store = Store::open_in_memory().unwrap();
        let mut first = Site::new("acquia", "first");
        let first_id = store.save(&mut first).unwrap();
        let mut second = Site::new("acquia", "second");
        let second_id = store.save(&mut second).unwrap();

        let mut dev = Environment::new("dev", first_id);
        dev.set_field("branch", Some("develop".to_owned()));
        store.save(&mut dev).unwrap();
        let mut other_dev = Environment::new("dev", second_id);
        store.save(&mut other_dev).unwrap();

        assert_eq!(
            store
                .names_in_scope::<Environment>(&first_id.to_string())
                .unwrap(),
            vec!["dev"]
        );
        let mut loaded = Environment::new("dev", second_id);
        store.load(&mut loaded).unwrap();
        assert_eq!(loaded.peek("branch"), None);
    }

    #[test]
    fn rows_survive_reopening_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sqlite");
        {
            let store = Store::open(&path).unwrap();
            let mut site = Site::new("pantheon", "durable");
            site.set_field("uuid", Some("abc".to_owned()));
            store.save(&mut site).unwrap();
        }
        let store = Store::open(&path).unwrap();
        let mut site = Site::new("pantheon", "durable");
        assert!(store.load(&mut site).unwrap());
        assert_eq!(site.peek("uuid"), Some("abc"));
    }
}
