use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::domain::value_objects::ObjectKey;

/// Bytes handed to the store together with their content type
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPayload {
    pub data: Bytes,
    pub content_type: String,
}

impl ObjectPayload {
    pub fn new(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    pub fn text(data: impl Into<Bytes>) -> Self {
        Self::new(data, "text/plain")
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Acknowledgement returned by a successful upload
#[derive(Debug, Clone, PartialEq)]
pub struct PutReceipt {
    pub key: ObjectKey,
    pub size: u64,
    pub etag: Option<String>,
}

/// One entry of a bucket listing
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectListItem {
    pub key: ObjectKey,
    pub size: u64,
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Result of a bucket creation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketCreation {
    Created,
    AlreadyExists,
}

impl std::fmt::Display for BucketCreation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BucketCreation::Created => write!(f, "created"),
            BucketCreation::AlreadyExists => write!(f, "already exists"),
        }
    }
}
