use std::{sync::Arc, time::Duration};

use crate::{
    adapters::outbound::{
        keys::TimestampKeyGenerator,
        storage::{InMemoryObjectStore, S3ObjectStoreAdapter, StoreError},
    },
    config::{ConfigError, ConfigOverrides, ConfigResolver, ConnectionConfig},
    domain::value_objects::BucketName,
    ports::{keys::KeyGenerator, storage::ObjectStore},
    services::{VerificationPlan, VerificationRunner},
};

/// Storage backend configuration
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    S3(ConnectionConfig),
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage_backend: StorageBackend,
    pub bucket: BucketName,
    pub settle_delay: Duration,
    pub key_prefix: String,
}

impl AppConfig {
    /// Verify the S3-compatible server described by `connection`
    pub fn s3(connection: ConnectionConfig) -> Self {
        Self {
            bucket: connection.bucket().clone(),
            storage_backend: StorageBackend::S3(connection),
            settle_delay: Duration::from_secs(1),
            key_prefix: "test".to_string(),
        }
    }

    /// Verify a process-local store; nothing leaves the process
    pub fn in_memory(bucket: BucketName) -> Self {
        Self {
            bucket,
            storage_backend: StorageBackend::InMemory,
            settle_delay: Duration::ZERO,
            key_prefix: "test".to_string(),
        }
    }
}

/// Application services container
pub struct AppServices {
    pub store: Arc<dyn ObjectStore>,
    pub runner: VerificationRunner,
}

/// Application builder for dependency injection
pub struct AppBuilder {
    config: AppConfig,
    key_generator: Option<Arc<dyn KeyGenerator>>,
}

impl AppBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            key_generator: None,
        }
    }

    /// Resolve the connection first; nothing is constructed if that fails
    pub fn from_resolver<L>(resolver: &ConfigResolver<L>) -> Result<Self, AppError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let connection = resolver.resolve()?;
        Ok(Self::new(AppConfig::s3(connection)))
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.config.settle_delay = settle_delay;
        self
    }

    pub fn with_key_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.config.key_prefix = key_prefix.into();
        self
    }

    /// Replace the timestamp-derived key source
    pub fn with_key_generator(mut self, key_generator: Arc<dyn KeyGenerator>) -> Self {
        self.key_generator = Some(key_generator);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Build the store adapter
    pub fn build_store(&self) -> Result<Arc<dyn ObjectStore>, AppError> {
        match &self.config.storage_backend {
            StorageBackend::InMemory => {
                Ok(Arc::new(InMemoryObjectStore::new()) as Arc<dyn ObjectStore>)
            }
            StorageBackend::S3(connection) => {
                let adapter = S3ObjectStoreAdapter::new(connection.clone())?;
                Ok(Arc::new(adapter) as Arc<dyn ObjectStore>)
            }
        }
    }

    /// Build the complete application with services
    pub fn build(self) -> Result<AppServices, AppError> {
        let store = self.build_store()?;

        let key_generator = self.key_generator.unwrap_or_else(|| {
            Arc::new(TimestampKeyGenerator::system(self.config.key_prefix.clone()))
                as Arc<dyn KeyGenerator>
        });

        let plan = VerificationPlan::builder()
            .bucket(self.config.bucket)
            .settle_delay(self.config.settle_delay)
            .build();

        let runner = VerificationRunner::new(store.clone(), key_generator, plan);

        Ok(AppServices { store, runner })
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Storage initialization error: {0}")]
    StorageInit(#[from] StoreError),
}

/// Create an S3-backed application from the process environment
pub fn create_app_from_env(overrides: ConfigOverrides) -> Result<AppServices, AppError> {
    AppBuilder::from_resolver(&ConfigResolver::from_env(overrides))?.build()
}

/// Create an in-memory application for testing and development
pub fn create_in_memory_app(bucket: BucketName) -> Result<AppServices, AppError> {
    AppBuilder::new(AppConfig::in_memory(bucket)).build()
}
