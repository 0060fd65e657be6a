pub mod adapters;
pub mod app;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export key types for convenience

// Domain types - value objects, models and errors
pub use domain::{
    BucketCreation, BucketName, ObjectKey, ObjectListItem, ObjectPayload, PutReceipt,
    StorageError, StorageResult, TransferOperation, ValidationError,
};

// Port types - interfaces for external systems
pub use ports::{Clock, KeyGenerator, ObjectStore};

// Connection configuration
pub use config::{
    ConfigError, ConfigOverrides, ConfigResolver, ConnectionConfig, ConnectionDefaults,
};

// Verification service
pub use services::{
    RunError, RunState, Step, StepOutcome, StepReport, VerificationError, VerificationPlan,
    VerificationReport, VerificationRunner, TEST_PAYLOAD,
};

// Application factory and configuration
pub use app::{
    create_app_from_env, create_in_memory_app, AppBuilder, AppConfig, AppError, AppServices,
    StorageBackend,
};

// Adapter types - infrastructure implementations
pub use adapters::outbound::{
    keys::{FixedClock, FixedKeyGenerator, SystemClock, TimestampKeyGenerator},
    storage::{InMemoryObjectStore, S3ObjectStoreAdapter, StoreError},
};

// Public facade for easy construction
pub mod prelude {
    pub use crate::{
        create_in_memory_app, AppBuilder, AppConfig, BucketName, ConfigResolver,
        FixedKeyGenerator, InMemoryObjectStore, ObjectKey, ObjectPayload, ObjectStore,
        S3ObjectStoreAdapter, VerificationPlan, VerificationRunner,
    };
}
