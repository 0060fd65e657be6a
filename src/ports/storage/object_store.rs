use crate::domain::{
    errors::StorageResult,
    models::{BucketCreation, ObjectListItem, ObjectPayload, PutReceipt},
    value_objects::{BucketName, ObjectKey},
};
use async_trait::async_trait;
use bytes::Bytes;

/// Port for object storage operations
/// This abstracts the actual storage backend (S3-compatible server, in-memory, ...)
///
/// Implementations are direct adapters: they never retry and never paper
/// over eventual consistency of the underlying store.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Create a bucket. A bucket that already exists is not an error.
    async fn create_bucket(&self, bucket: &BucketName) -> StorageResult<BucketCreation>;

    /// Store object data
    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        payload: ObjectPayload,
    ) -> StorageResult<PutReceipt>;

    /// Retrieve object data
    async fn get_object(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<Bytes>;

    /// List a single page of the bucket, in store order
    async fn list_objects(&self, bucket: &BucketName) -> StorageResult<Vec<ObjectListItem>>;

    /// Delete object data. Deleting an absent key succeeds.
    async fn delete_object(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<()>;
}
