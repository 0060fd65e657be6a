use async_trait::async_trait;
use bytes::Bytes;
use object_store::ObjectStore as ObjectStoreBackend;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

use super::{create_s3_store, S3BucketClient};
use crate::{
    adapters::outbound::storage::{
        error::StoreError,
        object_ops::{self, DEFAULT_MAX_KEYS},
    },
    config::ConnectionConfig,
    domain::{
        errors::StorageResult,
        models::{BucketCreation, ObjectListItem, ObjectPayload, PutReceipt},
        value_objects::{BucketName, ObjectKey},
    },
    ports::storage::ObjectStore,
};

/// S3 storage adapter that implements the ObjectStore trait
pub struct S3ObjectStoreAdapter {
    config: ConnectionConfig,
    bucket_client: S3BucketClient,
    stores: RwLock<HashMap<BucketName, Arc<dyn ObjectStoreBackend>>>,
    max_keys: usize,
}

impl S3ObjectStoreAdapter {
    /// Create a new S3 adapter
    pub fn new(config: ConnectionConfig) -> Result<Self, StoreError> {
        let bucket_client = S3BucketClient::new(&config)?;
        Ok(Self {
            config,
            bucket_client,
            stores: RwLock::new(HashMap::new()),
            max_keys: DEFAULT_MAX_KEYS,
        })
    }

    /// Cap the number of entries a listing returns
    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = max_keys;
        self
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// `object_store` clients are bound to a single bucket; build them lazily
    async fn store_for(&self, bucket: &BucketName) -> StorageResult<Arc<dyn ObjectStoreBackend>> {
        if let Some(store) = self.stores.read().await.get(bucket) {
            return Ok(store.clone());
        }

        let mut stores = self.stores.write().await;
        if let Some(store) = stores.get(bucket) {
            return Ok(store.clone());
        }

        let store =
            create_s3_store(&self.config, bucket).map_err(|e| e.into_bucket_error(bucket))?;
        stores.insert(bucket.clone(), store.clone());
        Ok(store)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStoreAdapter {
    async fn create_bucket(&self, bucket: &BucketName) -> StorageResult<BucketCreation> {
        self.bucket_client
            .create_bucket(bucket)
            .await
            .map_err(|e| e.into_bucket_error(bucket))
    }

    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        payload: ObjectPayload,
    ) -> StorageResult<PutReceipt> {
        let store = self.store_for(bucket).await?;
        object_ops::put(store.as_ref(), bucket, key, payload).await
    }

    async fn get_object(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<Bytes> {
        let store = self.store_for(bucket).await?;
        object_ops::get(store.as_ref(), bucket, key).await
    }

    async fn list_objects(&self, bucket: &BucketName) -> StorageResult<Vec<ObjectListItem>> {
        let store = self.store_for(bucket).await?;
        object_ops::list(store.as_ref(), bucket, self.max_keys).await
    }

    async fn delete_object(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<()> {
        let store = self.store_for(bucket).await?;
        object_ops::delete(store.as_ref(), bucket, key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigOverrides, ConfigResolver, ConnectionDefaults};

    fn config() -> ConnectionConfig {
        let overrides = ConfigOverrides {
            access_key: Some("test".to_string()),
            secret_key: Some("test".to_string()),
            ..Default::default()
        };
        ConfigResolver::new(ConnectionDefaults::default(), overrides, |_: &str| None)
            .resolve()
            .unwrap()
    }

    #[tokio::test]
    async fn test_store_is_built_once_per_bucket() {
        let adapter = S3ObjectStoreAdapter::new(config()).unwrap();
        let bucket = BucketName::new("email-attachments").unwrap();

        let first = adapter.store_for(&bucket).await.unwrap();
        let second = adapter.store_for(&bucket).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let other = BucketName::new("other-bucket").unwrap();
        adapter.store_for(&other).await.unwrap();
        assert_eq!(adapter.stores.read().await.len(), 2);
    }
}
