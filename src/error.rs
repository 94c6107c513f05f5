use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BfsError>;

/// Errors raised while configuring or running a traversal.
#[derive(Debug, Error)]
pub enum BfsError {
    /// A `CREATE VIRTUAL TABLE` argument did not match any known key.
    #[error("unrecognized argument: [{0}]")]
    UnrecognizedArgument(String),
    /// A recognized key was given a value that dequotes to nothing.
    #[error("empty value for argument: [{0}]")]
    EmptyArgument(String),
    /// An edge-table binding was neither declared nor overridden.
    #[error("{0} not configured")]
    MissingBinding(&'static str),
    /// The host handed back a plan descriptor that does not match its arguments.
    #[error("invalid plan: {0}")]
    InvalidPlan(String),
    /// Error reported by SQLite while preparing or stepping a statement.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl From<BfsError> for rusqlite::Error {
    fn from(err: BfsError) -> Self {
        match err {
            BfsError::Sqlite(inner) => inner,
            other => rusqlite::Error::ModuleError(other.to_string()),
        }
    }
}
