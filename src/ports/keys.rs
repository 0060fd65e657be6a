use chrono::{DateTime, Utc};

use crate::domain::value_objects::ObjectKey;

/// Source of the current time
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Source of object keys for test uploads
pub trait KeyGenerator: Send + Sync + 'static {
    fn next_key(&self) -> ObjectKey;
}
