//! Persistent entity layer and provider inventory for `patchbay`.
//!
//! - **[`Store`]** -- SQLite-backed record store. Generic over the
//!   [`Record`] trait, which describes each entity's table, scoping
//!   column, and declared scalar fields. Writes are upserts keyed by
//!   (name, scope); surrogate ids are assigned on first save and stable
//!   thereafter.
//!
//! - **Domain model** ([`model`]) -- [`Site`] and [`Environment`],
//!   local-cache-backed records whose unset fields are fetched lazily
//!   from the owning provider through an explicit [`Site::get`] accessor
//!   (at most one fetch attempt per field per process, unless a refresh
//!   is forced).
//!
//! - **[`Inventory`]** -- the per-invocation context owning the store,
//!   the registered providers, and their site maps. Constructed once and
//!   passed explicitly; there is no ambient registry.
//!
//! Persistence failures are caught and logged where they occur; the
//! in-memory entities stay valid and the process never crashes over a
//! diverged cache.

pub mod error;
pub mod inventory;
pub mod model;
pub mod record;
pub mod store;

pub use error::CoreError;
pub use inventory::Inventory;
pub use model::{Environment, FetchContext, Site, ENVIRONMENT_FIELDS, SITE_FIELDS};
pub use record::Record;
pub use store::Store;
