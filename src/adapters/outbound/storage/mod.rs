// Infrastructure error types
pub mod error;

// Storage implementations
pub mod in_memory;
mod object_ops;

// Provider-specific implementations
pub mod s3;

// Re-export key types
pub use error::StoreError;
pub use in_memory::InMemoryObjectStore;
pub use object_ops::DEFAULT_MAX_KEYS;
pub use s3::{create_s3_store, S3BucketClient, S3ObjectStoreAdapter};
