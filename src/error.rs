//! Crate-wide error taxonomy.
//!
//! Every fallible operation in this crate returns [`Result<T>`], whose error
//! type wraps exactly one [`StorageErrorKind`]. Callers that need to branch on
//! failure mode should match on `err.kind()` rather than the `Display` text.

use thiserror::Error;

/// First-class discriminant for [`StorageError`]. Kept separate from the
/// error type itself so callers can match on it without owning/cloning the
/// wrapped cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    NotFound,
    Closed,
    ReadOnly,
    InvalidReceipt,
    InvalidArgument,
    Codec,
    BackendUnsupported,
    BackendDuplicate,
    Cancelled,
    Internal,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("key not found")]
    NotFound,

    #[error("storage handle is closed")]
    Closed,

    #[error("mutation attempted on a read-only handle")]
    ReadOnly,

    #[error("invalid receipt: {0}")]
    InvalidReceipt(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("codec failure decoding/encoding {record_type}: {source}")]
    Codec {
        record_type: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("unsupported backend type: {0}")]
    BackendUnsupported(String),

    #[error("backend type already registered: {0}")]
    BackendDuplicate(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("internal storage error: {0}")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StorageError {
    pub fn kind(&self) -> StorageErrorKind {
        match self {
            StorageError::NotFound => StorageErrorKind::NotFound,
            StorageError::Closed => StorageErrorKind::Closed,
            StorageError::ReadOnly => StorageErrorKind::ReadOnly,
            StorageError::InvalidReceipt(_) => StorageErrorKind::InvalidReceipt,
            StorageError::InvalidArgument(_) => StorageErrorKind::InvalidArgument,
            StorageError::Codec { .. } => StorageErrorKind::Codec,
            StorageError::BackendUnsupported(_) => StorageErrorKind::BackendUnsupported,
            StorageError::BackendDuplicate(_) => StorageErrorKind::BackendDuplicate,
            StorageError::Cancelled => StorageErrorKind::Cancelled,
            StorageError::Internal(_) => StorageErrorKind::Internal,
        }
    }

    pub fn codec(record_type: &'static str, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        StorageError::Codec { record_type, source: Box::new(source) }
    }

    pub fn internal(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        StorageError::Internal(Box::new(source))
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        StorageError::InvalidArgument(msg.into())
    }
}

impl From<rocksdb::Error> for StorageError {
    fn from(e: rocksdb::Error) -> Self {
        StorageError::internal(e)
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(StorageError::NotFound.kind(), StorageErrorKind::NotFound);
        assert_eq!(StorageError::ReadOnly.kind(), StorageErrorKind::ReadOnly);
        assert_eq!(
            StorageError::invalid_argument("fromBlock > toBlock").kind(),
            StorageErrorKind::InvalidArgument
        );
    }

    #[test]
    fn display_carries_message() {
        let err = StorageError::invalid_argument("fromBlock > toBlock");
        assert_eq!(err.to_string(), "invalid argument: fromBlock > toBlock");
    }
}
