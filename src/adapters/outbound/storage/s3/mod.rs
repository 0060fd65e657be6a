//! S3 storage adapter implementation using the object_store crate
//!
//! Object operations go through `object_store`'s `AmazonS3`; bucket creation,
//! which that crate does not offer, is a signed request issued by
//! [`S3BucketClient`].

pub mod bucket;
pub mod s3_adapter;
pub mod sigv4;

pub use bucket::S3BucketClient;
pub use s3_adapter::S3ObjectStoreAdapter;

use object_store::{
    aws::AmazonS3Builder, ClientOptions, ObjectStore as ObjectStoreBackend, RetryConfig,
};
use std::sync::Arc;
use url::Url;

use crate::{
    adapters::outbound::storage::error::StoreError, config::ConnectionConfig,
    domain::value_objects::BucketName,
};

/// Virtual-hosted requests go to the endpoint verbatim, so the bucket has to be in its host
fn store_endpoint(config: &ConnectionConfig, bucket: &BucketName) -> Result<String, StoreError> {
    if config.path_style() {
        return Ok(config.endpoint().to_string());
    }

    let mut url = Url::parse(config.endpoint())?;
    let host = url
        .host_str()
        .map(|host| format!("{}.{}", bucket, host))
        .ok_or_else(|| StoreError::Signing("endpoint has no host".to_string()))?;
    url.set_host(Some(&host))?;

    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Create an S3 store for one bucket from configuration.
///
/// Retries are disabled: every failure reaches the caller as-is.
pub fn create_s3_store(
    config: &ConnectionConfig,
    bucket: &BucketName,
) -> Result<Arc<dyn ObjectStoreBackend>, StoreError> {
    let mut client_options = ClientOptions::new();
    if let Some(timeout) = config.timeout() {
        client_options = client_options.with_timeout(timeout);
    }

    let retry = RetryConfig {
        max_retries: 0,
        ..Default::default()
    };

    let store = AmazonS3Builder::new()
        .with_bucket_name(bucket.as_str())
        .with_region(config.region())
        .with_endpoint(store_endpoint(config, bucket)?)
        .with_access_key_id(config.access_key())
        .with_secret_access_key(config.secret_key())
        .with_virtual_hosted_style_request(!config.path_style())
        .with_client_options(client_options)
        .with_allow_http(config.allow_http())
        .with_retry(retry)
        .build()?;

    Ok(Arc::new(store))
}
