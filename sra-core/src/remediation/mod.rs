// sra-core/src/remediation/mod.rs
//! The contract every remediation action obeys.
//!
//! An action describes *what* to look at and *how* to correct it; the generic
//! [`executor::execute`] drives it through validate, fetch, diff, conditional
//! apply and annotate. Actions only touch backends through the
//! [`Services`] bundle they are handed.

use async_trait::async_trait;
use serde::Serialize;

use crate::errors::{RemediationError, ServiceError};
use crate::services::{SecurityMarks, Services};

pub mod actions;
pub mod executor;
pub mod fingerprint;

pub use executor::execute;
pub use fingerprint::remediation_fingerprint;

#[async_trait]
pub trait RemediationAction: Send + Sync {
    /// Immutable per-invocation parameters.
    type Values: Send + Sync;
    /// Snapshot of the live resource.
    type State: Send + Sync;
    /// The fields the action cares about, projected out of a snapshot.
    /// Compared for equality to decide whether anything needs doing.
    type Target: PartialEq + Send + Sync;
    /// Request body for the update call.
    type Patch: Serialize + Send + Sync;

    /// Stable identifier used in logs, errors and marks.
    fn name(&self) -> &'static str;

    /// Rejects malformed values with a human-readable reason.
    fn validate(&self, values: &Self::Values) -> Result<(), String>;

    /// Identifier of the resource the values point at.
    fn resource_id(&self, values: &Self::Values) -> String;

    /// Finding or asset to annotate after a successful apply.
    fn annotation_target<'a>(&self, _values: &'a Self::Values) -> Option<&'a str> {
        None
    }

    async fn fetch(&self, values: &Self::Values, services: &Services) -> Result<Self::State, ServiceError>;

    /// Relevant fields as they currently are.
    fn observed(&self, current: &Self::State) -> Self::Target;

    /// Relevant fields as they should be.
    fn target(&self, current: &Self::State) -> Self::Target;

    /// Builds the minimal update moving `current` to `target`.
    fn patch(&self, values: &Self::Values, current: &Self::State, target: Self::Target) -> Self::Patch;

    async fn apply(&self, values: &Self::Values, patch: &Self::Patch, services: &Services) -> Result<(), ServiceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationStatus {
    /// Resource already satisfied the action's predicate; nothing was sent.
    AlreadyCompliant,
    /// Dry run: a change was computed but not applied.
    WouldRemediate,
    /// The update call succeeded.
    Remediated,
}

/// What happened to the optional annotation step.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationStatus {
    NotRequested,
    Annotated(SecurityMarks),
    /// Best-effort step failed; the remediation itself still succeeded.
    Failed(RemediationError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemediationOutcome {
    pub action: &'static str,
    pub resource: String,
    pub status: RemediationStatus,
    /// Set whenever a change was computed.
    pub fingerprint: Option<String>,
    /// The update body, for dry runs and reporting.
    pub patch: Option<serde_json::Value>,
    pub annotation: AnnotationStatus,
}

impl RemediationOutcome {
    pub fn changed(&self) -> bool {
        self.status == RemediationStatus::Remediated
    }

    pub fn annotation_error(&self) -> Option<&RemediationError> {
        match &self.annotation {
            AnnotationStatus::Failed(err) => Some(err),
            _ => None,
        }
    }
}
