//! End-to-end verification of an object store.
//!
//! The run is a fixed sequence: create bucket, settle, upload, download and
//! compare, list, delete. Bucket creation failures only warn; every later
//! failure aborts the run and is recorded in the [`VerificationReport`].

use bon::Builder;
use bytes::Bytes;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    domain::{
        errors::StorageError,
        models::{ObjectListItem, ObjectPayload},
        value_objects::{BucketName, ObjectKey},
    },
    ports::{keys::KeyGenerator, storage::ObjectStore},
};

pub const TEST_PAYLOAD: &[u8] = b"Hello from SeaweedFS! This is a test attachment.";

/// A step of the verification sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CreateBucket,
    Settle,
    Upload,
    Download,
    List,
    Delete,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::CreateBucket => write!(f, "create-bucket"),
            Step::Settle => write!(f, "settle"),
            Step::Upload => write!(f, "upload"),
            Step::Download => write!(f, "download"),
            Step::List => write!(f, "list"),
            Step::Delete => write!(f, "delete"),
        }
    }
}

/// Where a run currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Start,
    BucketReady,
    Uploaded,
    Verified,
    Listed,
    Deleted,
    Done,
    Aborted { step: Step },
}

/// Downloaded content differs from what was uploaded
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VerificationError {
    #[error(
        "Content mismatch for '{key}': uploaded {expected_len} bytes, downloaded {actual_len} bytes{}",
        describe_difference(.first_difference)
    )]
    ContentMismatch {
        key: ObjectKey,
        expected_len: usize,
        actual_len: usize,
        first_difference: Option<usize>,
    },
}

fn describe_difference(first_difference: &Option<usize>) -> String {
    match first_difference {
        Some(offset) => format!(", first difference at byte {}", offset),
        None => String::new(),
    }
}

/// Fatal failure that ended a run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunError {
    #[error("{step} failed: {source}")]
    Step {
        step: Step,
        #[source]
        source: StorageError,
    },

    #[error(transparent)]
    Verification(#[from] VerificationError),
}

impl RunError {
    pub fn step(&self) -> Step {
        match self {
            RunError::Step { step, .. } => *step,
            RunError::Verification(_) => Step::Download,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Passed { detail: String },
    Warned { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub step: Step,
    pub outcome: StepOutcome,
}

impl std::fmt::Display for StepReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.outcome {
            StepOutcome::Passed { detail } => write!(f, "[PASS] {}: {}", self.step, detail),
            StepOutcome::Warned { reason } => write!(f, "[WARN] {}: {}", self.step, reason),
            StepOutcome::Failed { error } => write!(f, "[FAIL] {}: {}", self.step, error),
        }
    }
}

/// Everything a run observed
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationReport {
    pub bucket: BucketName,
    pub key: Option<ObjectKey>,
    pub steps: Vec<StepReport>,
    pub listing: Vec<ObjectListItem>,
    pub state: RunState,
    pub error: Option<RunError>,
}

impl VerificationReport {
    fn new(bucket: BucketName) -> Self {
        Self {
            bucket,
            key: None,
            steps: Vec::new(),
            listing: Vec::new(),
            state: RunState::Start,
            error: None,
        }
    }

    fn pass(&mut self, step: Step, detail: impl Into<String>) {
        self.steps.push(StepReport {
            step,
            outcome: StepOutcome::Passed {
                detail: detail.into(),
            },
        });
    }

    fn warn(&mut self, step: Step, reason: impl Into<String>) {
        self.steps.push(StepReport {
            step,
            outcome: StepOutcome::Warned {
                reason: reason.into(),
            },
        });
    }

    pub fn is_success(&self) -> bool {
        self.state == RunState::Done
    }

    pub fn warnings(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Warned { .. }))
    }

    pub fn into_result(self) -> Result<(), RunError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Parameters of a verification run
#[derive(Debug, Clone, Builder)]
pub struct VerificationPlan {
    bucket: BucketName,

    /// Pause between bucket creation and the first write
    #[builder(default = Duration::from_secs(1))]
    settle_delay: Duration,

    #[builder(default = ObjectPayload::text(Bytes::from_static(TEST_PAYLOAD)))]
    payload: ObjectPayload,
}

impl VerificationPlan {
    pub fn bucket(&self) -> &BucketName {
        &self.bucket
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    pub fn payload(&self) -> &ObjectPayload {
        &self.payload
    }
}

/// Drives one verification run against an [`ObjectStore`]
pub struct VerificationRunner {
    store: Arc<dyn ObjectStore>,
    keys: Arc<dyn KeyGenerator>,
    plan: VerificationPlan,
}

impl VerificationRunner {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        keys: Arc<dyn KeyGenerator>,
        plan: VerificationPlan,
    ) -> Self {
        Self { store, keys, plan }
    }

    pub fn plan(&self) -> &VerificationPlan {
        &self.plan
    }

    /// Run every step; the report is returned whether or not the run aborted
    pub async fn run(&self) -> VerificationReport {
        let mut report = VerificationReport::new(self.plan.bucket.clone());

        match self.execute(&mut report).await {
            Ok(()) => {
                report.state = RunState::Done;
                info!(bucket = %self.plan.bucket, "all verification steps passed");
            }
            Err(err) => {
                let step = err.step();
                error!(step = %step, error = %err, "verification aborted");
                report.steps.push(StepReport {
                    step,
                    outcome: StepOutcome::Failed {
                        error: err.to_string(),
                    },
                });
                report.state = RunState::Aborted { step };
                report.error = Some(err);
            }
        }

        report
    }

    async fn execute(&self, report: &mut VerificationReport) -> Result<(), RunError> {
        let bucket = &self.plan.bucket;

        info!(bucket = %bucket, "creating bucket");
        match self.store.create_bucket(bucket).await {
            Ok(creation) => {
                info!(bucket = %bucket, "bucket {}", creation);
                report.pass(Step::CreateBucket, format!("bucket {}", creation));
            }
            Err(err) => {
                warn!(bucket = %bucket, error = %err, "bucket creation failed (might already exist)");
                report.warn(Step::CreateBucket, err.to_string());
            }
        }
        report.state = RunState::BucketReady;

        let delay = self.plan.settle_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        report.pass(Step::Settle, format!("waited {:?}", delay));

        let key = self.keys.next_key();
        report.key = Some(key.clone());
        let payload = &self.plan.payload;

        info!(key = %key, size = payload.len(), "uploading test object");
        let receipt = self
            .store
            .put_object(bucket, &key, payload.clone())
            .await
            .map_err(|source| RunError::Step {
                step: Step::Upload,
                source,
            })?;
        report.pass(
            Step::Upload,
            format!("stored {} ({} bytes)", receipt.key, receipt.size),
        );
        report.state = RunState::Uploaded;

        info!(key = %key, "downloading test object");
        let downloaded = self
            .store
            .get_object(bucket, &key)
            .await
            .map_err(|source| RunError::Step {
                step: Step::Download,
                source,
            })?;
        verify_content(&key, &payload.data, &downloaded)?;
        report.pass(
            Step::Download,
            format!(
                "downloaded {} bytes: {}",
                downloaded.len(),
                String::from_utf8_lossy(&downloaded)
            ),
        );
        report.state = RunState::Verified;

        info!(bucket = %bucket, "listing objects");
        let listing = self
            .store
            .list_objects(bucket)
            .await
            .map_err(|source| RunError::Step {
                step: Step::List,
                source,
            })?;
        info!(count = listing.len(), "found {} objects", listing.len());
        for item in &listing {
            info!(key = %item.key, size = item.size, "listed object");
        }
        match listing.iter().find(|item| item.key == key) {
            Some(item) if item.size == payload.len() as u64 => {
                report.pass(Step::List, format!("{} objects", listing.len()));
            }
            Some(item) => {
                let reason = format!(
                    "'{}' listed with {} bytes, expected {}",
                    key,
                    item.size,
                    payload.len()
                );
                warn!("{}", reason);
                report.warn(Step::List, reason);
            }
            None => {
                let reason = format!("'{}' not present in the first listing page", key);
                warn!("{}", reason);
                report.warn(Step::List, reason);
            }
        }
        report.listing = listing;
        report.state = RunState::Listed;

        info!(key = %key, "deleting test object");
        self.store
            .delete_object(bucket, &key)
            .await
            .map_err(|source| RunError::Step {
                step: Step::Delete,
                source,
            })?;
        report.pass(Step::Delete, format!("deleted {}", key));
        report.state = RunState::Deleted;

        Ok(())
    }
}

fn verify_content(key: &ObjectKey, expected: &[u8], actual: &[u8]) -> Result<(), VerificationError> {
    if expected == actual {
        return Ok(());
    }

    let first_difference = expected
        .iter()
        .zip(actual.iter())
        .position(|(a, b)| a != b)
        .or_else(|| Some(expected.len().min(actual.len())));

    Err(VerificationError::ContentMismatch {
        key: key.clone(),
        expected_len: expected.len(),
        actual_len: actual.len(),
        first_difference,
    })
}
