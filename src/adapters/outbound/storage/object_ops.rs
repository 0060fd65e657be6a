//! Object operations shared by every adapter built on the `object_store` crate.

use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use object_store::{
    path::Path as ObjectPath, Attribute, Attributes, ObjectMeta, ObjectStore as ObjectStoreBackend,
    PutOptions, PutPayload,
};
use tracing::debug;

use super::error::{bucket_error, transfer_error};
use crate::domain::{
    errors::{StorageError, StorageResult, TransferOperation},
    models::{ObjectListItem, ObjectPayload, PutReceipt},
    value_objects::{BucketName, ObjectKey},
};

/// Largest number of keys a single S3 listing page returns
pub const DEFAULT_MAX_KEYS: usize = 1000;

/// Keys reach the store verbatim. One the path model cannot hold (empty,
/// leading or trailing `/`, empty or `.`/`..` segments) is refused, never rewritten.
fn to_object_path(operation: TransferOperation, key: &ObjectKey) -> StorageResult<ObjectPath> {
    if key.as_str().is_empty() {
        return Err(StorageError::transfer(operation, key, "unsupported key: empty"));
    }

    let path = ObjectPath::parse(key.as_str())
        .map_err(|e| StorageError::transfer(operation, key, format!("unsupported key: {}", e)))?;

    let stored: &str = path.as_ref();
    if stored != key.as_str() {
        return Err(StorageError::transfer(
            operation,
            key,
            format!("unsupported key: would be stored as '{}'", stored),
        ));
    }
    Ok(path)
}

fn to_object_list_item(meta: ObjectMeta) -> ObjectListItem {
    let location: &str = meta.location.as_ref();
    ObjectListItem {
        key: ObjectKey::new(location),
        size: meta.size,
        etag: meta.e_tag,
        last_modified: Some(meta.last_modified),
    }
}

pub(crate) async fn put(
    store: &dyn ObjectStoreBackend,
    bucket: &BucketName,
    key: &ObjectKey,
    payload: ObjectPayload,
) -> StorageResult<PutReceipt> {
    let path = to_object_path(TransferOperation::Put, key)?;
    let size = payload.data.len() as u64;

    let mut attributes = Attributes::new();
    attributes.insert(Attribute::ContentType, payload.content_type.into());
    let options = PutOptions {
        attributes,
        ..Default::default()
    };

    let result = store
        .put_opts(&path, PutPayload::from(payload.data), options)
        .await
        .map_err(|e| transfer_error(TransferOperation::Put, bucket, key, e))?;

    debug!(bucket = %bucket, key = %key, size, "object stored");

    Ok(PutReceipt {
        key: key.clone(),
        size,
        etag: result.e_tag,
    })
}

pub(crate) async fn get(
    store: &dyn ObjectStoreBackend,
    bucket: &BucketName,
    key: &ObjectKey,
) -> StorageResult<Bytes> {
    let path = to_object_path(TransferOperation::Get, key)?;

    let result = store
        .get(&path)
        .await
        .map_err(|e| transfer_error(TransferOperation::Get, bucket, key, e))?;

    result
        .bytes()
        .await
        .map_err(|e| transfer_error(TransferOperation::Get, bucket, key, e))
}

/// Consume at most `max_keys` entries, which keeps the request to one page
pub(crate) async fn list(
    store: &dyn ObjectStoreBackend,
    bucket: &BucketName,
    max_keys: usize,
) -> StorageResult<Vec<ObjectListItem>> {
    let mut stream = store.list(None).take(max_keys);
    let mut objects = Vec::new();

    while let Some(meta) = stream
        .try_next()
        .await
        .map_err(|e| bucket_error(bucket, e))?
    {
        objects.push(to_object_list_item(meta));
    }

    debug!(bucket = %bucket, count = objects.len(), "bucket listed");
    Ok(objects)
}

pub(crate) async fn delete(
    store: &dyn ObjectStoreBackend,
    bucket: &BucketName,
    key: &ObjectKey,
) -> StorageResult<()> {
    let path = to_object_path(TransferOperation::Delete, key)?;

    match store.delete(&path).await {
        Ok(()) => Ok(()),
        Err(object_store::Error::NotFound { .. }) => Ok(()),
        Err(e) => Err(transfer_error(TransferOperation::Delete, bucket, key, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_special_characters_are_kept() {
        for key in ["reports/#1.txt", "50%off.txt", ".config/a b.txt", "x/.y/..z"] {
            let path = to_object_path(TransferOperation::Put, &ObjectKey::from(key)).unwrap();
            let stored: &str = path.as_ref();
            assert_eq!(stored, key);
        }
    }

    #[test]
    fn test_unrepresentable_keys_are_refused() {
        for key in ["", "a//b.txt", "dir/", "/leading", "x/./y", "x/../y"] {
            let err = to_object_path(TransferOperation::Delete, &ObjectKey::from(key))
                .unwrap_err();
            assert!(
                matches!(
                    err,
                    StorageError::Transfer {
                        operation: TransferOperation::Delete,
                        ..
                    }
                ),
                "{:?} for {:?}",
                err,
                key
            );
        }
    }
}
