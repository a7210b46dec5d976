use thiserror::Error;

pub type Result<T> = std::result::Result<T, DutyError>;

/// Failure kinds for the stamp and payment registries.
///
/// Every operation in the core is all-or-nothing: any of these means the
/// enclosing call left no partial state behind. Retrying is a caller
/// decision.
#[derive(Error, Debug)]
pub enum DutyError {
    #[error("key already registered: {0}")]
    DuplicateKey(String),
    #[error("unknown key: {0}")]
    NotFound(String),
    #[error("stamp {0} is inactive")]
    InactiveReference(String),
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
    #[error("insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: u64, available: u64 },
    #[error("caller {0} is not authorized")]
    Unauthorized(String),
    #[error("transfers are suspended")]
    Paused,
    #[error("{0}")]
    InvalidState(String),
    #[error("malformed key: {0}")]
    MalformedKey(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("storage error: {0}")]
    Storage(#[from] rocksdb::Error),
}
