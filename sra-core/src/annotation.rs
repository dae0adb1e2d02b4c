// sra-core/src/annotation.rs
//! Records remediation results as security marks on the originating finding.
//!
//! Writes go through [`SecurityMarksApi`] with a field mask naming only the
//! keys being set, so marks written by other tools stay in place. Two
//! invocations annotating the same finding at once race on the server; for a
//! given key the last write to land wins and no ordering between independent
//! invocations is assumed.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::context::ExecutionContext;
use crate::errors::ServiceError;
use crate::services::{SecurityMarks, SecurityMarksApi, UpdateSecurityMarksRequest};

pub const DEFAULT_MARK_PREFIX: &str = "sra";

/// Value of the status mark once a resource has been corrected.
pub const STATUS_REMEDIATED: &str = "remediated";

const MARKS_SUFFIX: &str = "/securityMarks";

/// Key of the status mark under `prefix`.
pub fn status_mark_key(prefix: &str) -> String {
    format!("{prefix}-remediation-status")
}

#[derive(Clone)]
pub struct Annotator {
    api: Arc<dyn SecurityMarksApi>,
    prefix: String,
}

impl fmt::Debug for Annotator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Annotator").field("prefix", &self.prefix).finish_non_exhaustive()
    }
}

impl Annotator {
    pub fn new(api: Arc<dyn SecurityMarksApi>) -> Self {
        Self { api, prefix: DEFAULT_MARK_PREFIX.to_string() }
    }

    /// Namespaces every mark key written by this annotator.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Sends one update under the context deadline.
    pub async fn update_security_marks(
        &self,
        ctx: &ExecutionContext,
        request: &UpdateSecurityMarksRequest,
    ) -> Result<SecurityMarks, ServiceError> {
        debug!(
            "[{}] Updating security marks on {} (mask: {})",
            ctx.invocation_id(),
            request.security_marks.name,
            request.update_mask.join(",")
        );
        ctx.call(self.api.update_security_marks(request)).await
    }

    /// The marks written after `action` corrected a resource.
    pub fn remediation_marks(&self, action: &str, fingerprint: &str) -> BTreeMap<String, String> {
        BTreeMap::from([
            (format!("{}-remediated-by", self.prefix), action.to_string()),
            (status_mark_key(&self.prefix), STATUS_REMEDIATED.to_string()),
            (format!("{}-fingerprint", self.prefix), fingerprint.to_string()),
        ])
    }

    /// Merges the remediation marks onto `target` (a finding or asset name).
    pub async fn mark_remediated(
        &self,
        ctx: &ExecutionContext,
        target: &str,
        action: &str,
        fingerprint: &str,
    ) -> Result<SecurityMarks, ServiceError> {
        let request = UpdateSecurityMarksRequest::merge(
            marks_name(target),
            self.remediation_marks(action, fingerprint),
        );
        self.update_security_marks(ctx, &request).await
    }
}

/// Resolves a finding or asset name to the name of its marks resource.
pub fn marks_name(target: &str) -> String {
    if target.ends_with(MARKS_SUFFIX) {
        target.to_string()
    } else {
        format!("{target}{MARKS_SUFFIX}")
    }
}
