// sra-core/src/services/security_center.rs
//! Security-mark annotation capability of the finding tracker.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// Merge key/value marks onto a finding or asset.
#[async_trait]
pub trait SecurityMarksApi: Send + Sync {
    async fn update_security_marks(
        &self,
        request: &UpdateSecurityMarksRequest,
    ) -> Result<SecurityMarks, ServiceError>;
}

/// Marks attached to one finding or asset.
///
/// `name` is the marks resource itself, e.g.
/// `organizations/1/sources/2/findings/3/securityMarks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityMarks {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub marks: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_name: Option<String>,
}

/// One update call. The server only touches the keys listed in `update_mask`,
/// which gives merge semantics: every other existing mark is preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSecurityMarksRequest {
    pub security_marks: SecurityMarks,
    pub update_mask: Vec<String>,
}

impl UpdateSecurityMarksRequest {
    /// Builds a request whose mask covers exactly the supplied keys.
    pub fn merge(name: impl Into<String>, marks: BTreeMap<String, String>) -> Self {
        let update_mask = marks.keys().map(|k| format!("marks.{k}")).collect();
        Self {
            security_marks: SecurityMarks { name: name.into(), marks, canonical_name: None },
            update_mask,
        }
    }
}
