//! The persistence shape of a cache-backed entity.
//!
//! Site and Environment are dissimilar types that share generic
//! persistence; rather than a common base type, each implements this
//! small descriptor and the [`Store`](crate::store::Store) drives its
//! SQL from the metadata.

/// Describes how one entity kind maps onto its cache table.
///
/// Every record is keyed by `(name, scope)`: the natural name plus a
/// scoping value that disambiguates identical names across owners (the
/// provider name for sites, the owning site id for environments).
pub trait Record {
    /// Table backing this entity kind.
    const TABLE: &'static str;

    /// Column holding the scoping value.
    const SCOPE_FIELD: &'static str;

    /// Natural name of this record.
    fn name(&self) -> &str;

    /// Scoping value of this record.
    fn scope(&self) -> String;

    /// Surrogate id, once assigned by a successful save.
    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: i64);

    /// Declared scalar columns beyond name and scope, in table order.
    fn columns() -> &'static [&'static str];

    /// Current values of [`columns`](Self::columns), same order.
    fn values(&self) -> Vec<Option<String>>;

    /// Set one declared column from a stored value. Unknown columns are
    /// ignored.
    fn hydrate(&mut self, column: &str, value: Option<String>);
}
