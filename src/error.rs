use thiserror::Error;

/// Every way a load can fail, classified by pipeline stage
///
/// All variants are reported to the caller the same way (status 500 with the
/// error text as the body); the classification exists for logging.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("malformed trigger event: {0}")]
    Event(String),

    #[error("failed to fetch s3://{bucket}/{key}: {cause:#}")]
    Fetch {
        bucket: String,
        key: String,
        cause: anyhow::Error,
    },

    #[error("object is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("object has no header row")]
    MissingHeader,

    #[error("failed to parse CSV record: {0}")]
    Parse(#[from] csv::Error),

    /// Raw driver text, so the response body matches what the database said
    #[error(transparent)]
    Connect(sqlx::Error),

    #[error("timed out waiting for lock on table `{table}`")]
    LockTimeout { table: String },

    #[error(transparent)]
    Execute(sqlx::Error),
}

impl LoadError {
    /// Short name of the failing stage, used as a log field
    pub fn stage(&self) -> &'static str {
        match self {
            LoadError::Event(_) => "decode",
            LoadError::Fetch { .. } => "fetch",
            LoadError::Encoding(_) | LoadError::MissingHeader | LoadError::Parse(_) => "parse",
            LoadError::Connect(_) => "connect",
            LoadError::LockTimeout { .. } => "lock",
            LoadError::Execute(_) => "execute",
        }
    }
}
