use crate::domain::{
    errors::{StorageError, TransferOperation},
    value_objects::{BucketName, ObjectKey},
};
use thiserror::Error as ThisError;

/// Infrastructure errors raised below the domain boundary
#[derive(ThisError, Debug)]
pub enum StoreError {
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("Request signing error: {0}")]
    Signing(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Service error: {status_code} {code} - {message}")]
    Service {
        status_code: u16,
        code: String,
        message: String,
    },
}

impl StoreError {
    /// Attach the bucket name and convert into the domain taxonomy
    pub fn into_bucket_error(self, bucket: &BucketName) -> StorageError {
        StorageError::bucket(bucket.as_str(), self.to_string())
    }
}

/// Map an object_store failure on an object operation to the domain taxonomy.
///
/// Only reads surface `NotFound`; a missing object on put or delete is a
/// transfer failure (or, for delete, handled by the caller as success).
pub(crate) fn transfer_error(
    operation: TransferOperation,
    bucket: &BucketName,
    key: &ObjectKey,
    err: object_store::Error,
) -> StorageError {
    match err {
        object_store::Error::NotFound { .. } if operation == TransferOperation::Get => {
            StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.clone(),
            }
        }
        other => StorageError::transfer(operation, key, other.to_string()),
    }
}

/// Map an object_store failure on a bucket-level operation
pub(crate) fn bucket_error(bucket: &BucketName, err: object_store::Error) -> StorageError {
    StorageError::bucket(bucket.as_str(), err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found() -> object_store::Error {
        object_store::Error::NotFound {
            path: "test/key.txt".to_string(),
            source: "missing".into(),
        }
    }

    #[test]
    fn test_not_found_only_on_get() {
        let bucket = BucketName::new("email-attachments").unwrap();
        let key = ObjectKey::from("test/key.txt");

        let err = transfer_error(TransferOperation::Get, &bucket, &key, not_found());
        assert_eq!(
            err,
            StorageError::NotFound {
                bucket: "email-attachments".to_string(),
                key: key.clone(),
            }
        );

        let err = transfer_error(TransferOperation::Put, &bucket, &key, not_found());
        assert!(matches!(
            err,
            StorageError::Transfer {
                operation: TransferOperation::Put,
                ..
            }
        ));
    }

    #[test]
    fn test_service_error_keeps_bucket_name() {
        let bucket = BucketName::new("email-attachments").unwrap();
        let err = StoreError::Service {
            status_code: 403,
            code: "AccessDenied".to_string(),
            message: "Access Denied".to_string(),
        }
        .into_bucket_error(&bucket);

        match err {
            StorageError::Bucket { bucket, message } => {
                assert_eq!(bucket, "email-attachments");
                assert!(message.contains("AccessDenied"));
            }
            other => panic!("Expected bucket error, got {:?}", other),
        }
    }
}
