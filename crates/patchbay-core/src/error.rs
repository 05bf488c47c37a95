use thiserror::Error;

/// Error type for the persistence and inventory layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// SQLite operation failed.
    #[error("cache store error: {0}")]
    Persistence(#[from] rusqlite::Error),

    /// The store's connection mutex was poisoned by a panicking thread.
    #[error("cache store lock poisoned")]
    StorePoisoned,

    /// A provider API call failed.
    #[error(transparent)]
    Api(#[from] patchbay_api::Error),

    /// No provider registered under this name.
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),
}
