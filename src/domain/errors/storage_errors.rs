use crate::domain::value_objects::ObjectKey;

/// Object operations that can fail with a transfer error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOperation {
    Put,
    Get,
    Delete,
}

impl std::fmt::Display for TransferOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferOperation::Put => write!(f, "put"),
            TransferOperation::Get => write!(f, "get"),
            TransferOperation::Delete => write!(f, "delete"),
        }
    }
}

/// Errors that can occur during storage operations
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// The store rejected a bucket-level request (create, list)
    Bucket { bucket: String, message: String },

    /// Network or protocol failure while moving object data
    Transfer {
        operation: TransferOperation,
        key: ObjectKey,
        message: String,
    },

    /// Object absent on read
    NotFound { bucket: String, key: ObjectKey },
}

impl StorageError {
    pub fn bucket(bucket: impl Into<String>, message: impl Into<String>) -> Self {
        StorageError::Bucket {
            bucket: bucket.into(),
            message: message.into(),
        }
    }

    pub fn transfer(
        operation: TransferOperation,
        key: &ObjectKey,
        message: impl Into<String>,
    ) -> Self {
        StorageError::Transfer {
            operation,
            key: key.clone(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Bucket { bucket, message } => {
                write!(f, "Bucket '{}' error: {}", bucket, message)
            }
            StorageError::Transfer {
                operation,
                key,
                message,
            } => {
                write!(f, "Transfer error during {} of '{}': {}", operation, key, message)
            }
            StorageError::NotFound { bucket, key } => {
                write!(f, "Object not found: {}/{}", bucket, key)
            }
        }
    }
}

impl std::error::Error for StorageError {}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
