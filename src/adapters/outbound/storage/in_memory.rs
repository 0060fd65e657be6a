use async_trait::async_trait;
use bytes::Bytes;
use object_store::memory::InMemory;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

use super::object_ops::{self, DEFAULT_MAX_KEYS};
use crate::{
    domain::{
        errors::{StorageError, StorageResult, TransferOperation},
        models::{BucketCreation, ObjectListItem, ObjectPayload, PutReceipt},
        value_objects::{BucketName, ObjectKey},
    },
    ports::storage::ObjectStore,
};

const NO_SUCH_BUCKET: &str = "NoSuchBucket: the specified bucket does not exist";

/// In-memory implementation of ObjectStore for testing and dry runs.
///
/// Buckets must be created before use, mirroring an S3 server.
#[derive(Clone)]
pub struct InMemoryObjectStore {
    buckets: Arc<RwLock<HashMap<BucketName, Arc<InMemory>>>>,
    max_keys: usize,
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self {
            buckets: Arc::new(RwLock::new(HashMap::new())),
            max_keys: DEFAULT_MAX_KEYS,
        }
    }

    /// Cap the number of entries a listing returns
    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = max_keys;
        self
    }

    async fn bucket(&self, bucket: &BucketName) -> Option<Arc<InMemory>> {
        self.buckets.read().await.get(bucket).cloned()
    }

    async fn bucket_for_transfer(
        &self,
        operation: TransferOperation,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> StorageResult<Arc<InMemory>> {
        self.bucket(bucket)
            .await
            .ok_or_else(|| StorageError::transfer(operation, key, NO_SUCH_BUCKET))
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn create_bucket(&self, bucket: &BucketName) -> StorageResult<BucketCreation> {
        let mut buckets = self.buckets.write().await;
        if buckets.contains_key(bucket) {
            return Ok(BucketCreation::AlreadyExists);
        }
        buckets.insert(bucket.clone(), Arc::new(InMemory::new()));
        Ok(BucketCreation::Created)
    }

    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        payload: ObjectPayload,
    ) -> StorageResult<PutReceipt> {
        let store = self
            .bucket_for_transfer(TransferOperation::Put, bucket, key)
            .await?;
        object_ops::put(store.as_ref(), bucket, key, payload).await
    }

    async fn get_object(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<Bytes> {
        let store = self
            .bucket_for_transfer(TransferOperation::Get, bucket, key)
            .await?;
        object_ops::get(store.as_ref(), bucket, key).await
    }

    async fn list_objects(&self, bucket: &BucketName) -> StorageResult<Vec<ObjectListItem>> {
        let store = self
            .bucket(bucket)
            .await
            .ok_or_else(|| StorageError::bucket(bucket.as_str(), NO_SUCH_BUCKET))?;
        object_ops::list(store.as_ref(), bucket, self.max_keys).await
    }

    async fn delete_object(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<()> {
        let store = self
            .bucket_for_transfer(TransferOperation::Delete, bucket, key)
            .await?;
        object_ops::delete(store.as_ref(), bucket, key).await
    }
}
