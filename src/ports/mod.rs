pub mod keys;
pub mod storage;

// Re-export all port traits for convenience
pub use keys::{Clock, KeyGenerator};
pub use storage::ObjectStore;
