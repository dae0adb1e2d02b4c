// sra-core/src/finding.rs
//! Security findings as delivered by the posture backend.
//!
//! Findings arrive either bare or wrapped in a notification envelope
//! (`{"notificationConfigName": ..., "finding": {...}}`). Only the fields
//! needed to route and parameterize an action are modelled; the record
//! itself is owned by the backend and never written back except through
//! security marks.

use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::annotation::{status_mark_key, STATUS_REMEDIATED};
use crate::services::SecurityMarks;

static SQL_INSTANCE_RESOURCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^//cloudsql\.googleapis\.com/projects/([^/]+)/instances/([^/]+)$")
        .expect("resource pattern is valid")
});

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Finding {
    /// e.g. `organizations/1/sources/2/findings/3`
    pub name: String,
    pub parent: String,
    /// Full resource name of the affected resource.
    pub resource_name: String,
    pub category: String,
    pub state: Option<String>,
    pub event_time: Option<String>,
    pub security_marks: Option<SecurityMarks>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Notification {
    finding: Finding,
}

impl Finding {
    /// Parses a finding from JSON, accepting a notification envelope or a bare finding.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text).context("Finding is not valid JSON")?;
        let finding = if value.get("finding").is_some() {
            serde_json::from_value::<Notification>(value)
                .context("Failed to parse finding notification")?
                .finding
        } else {
            serde_json::from_value::<Finding>(value).context("Failed to parse finding")?
        };

        if finding.category.is_empty() {
            anyhow::bail!("Finding '{}' has no category", finding.name);
        }
        Ok(finding)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read finding file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid finding in {}", path.display()))
    }

    /// `(project, instance)` when the finding points at a Cloud SQL instance.
    pub fn sql_instance(&self) -> Option<(String, String)> {
        let caps = SQL_INSTANCE_RESOURCE.captures(&self.resource_name)?;
        Some((caps[1].to_string(), caps[2].to_string()))
    }

    /// True when the finding already carries `key` set to `value`.
    pub fn has_mark(&self, key: &str, value: &str) -> bool {
        self.security_marks
            .as_ref()
            .and_then(|m| m.marks.get(key))
            .is_some_and(|v| v == value)
    }

    /// True when a previous run already recorded a remediation under `prefix`.
    pub fn is_marked_remediated(&self, prefix: &str) -> bool {
        self.has_mark(&status_mark_key(prefix), STATUS_REMEDIATED)
    }

    pub fn is_active(&self) -> bool {
        self.state.as_deref().map_or(true, |s| s.eq_ignore_ascii_case("ACTIVE"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTIFICATION: &str = r#"{
        "notificationConfigName": "organizations/1055058813388/notificationConfigs/sra",
        "finding": {
            "name": "organizations/1055058813388/sources/1986930501971458034/findings/f-1",
            "parent": "organizations/1055058813388/sources/1986930501971458034",
            "resourceName": "//cloudsql.googleapis.com/projects/sha-resources-20191002/instances/public-sql-instance",
            "state": "ACTIVE",
            "category": "PUBLIC_SQL_INSTANCE",
            "securityMarks": {
                "name": "organizations/1055058813388/sources/1986930501971458034/findings/f-1/securityMarks",
                "marks": { "sra-remediation-status": "remediated" }
            },
            "eventTime": "2019-10-03T18:00:00.000Z",
            "sourceProperties": { "ReactivationCount": 0 }
        }
    }"#;

    #[test]
    fn parses_notification_envelope() {
        let finding = Finding::from_json(NOTIFICATION).unwrap();
        assert_eq!(finding.category, "PUBLIC_SQL_INSTANCE");
        assert!(finding.is_active());
        assert_eq!(
            finding.sql_instance(),
            Some(("sha-resources-20191002".to_string(), "public-sql-instance".to_string()))
        );
        assert!(finding.has_mark("sra-remediation-status", "remediated"));
        assert!(!finding.has_mark("sra-remediation-status", "pending"));
        assert!(finding.is_marked_remediated("sra"));
        assert!(!finding.is_marked_remediated("secops"));
    }

    #[test]
    fn parses_bare_finding() {
        let finding = Finding::from_json(
            r#"{"name": "organizations/1/sources/2/findings/3", "category": "SQL_PUBLIC_IP",
                "resourceName": "//compute.googleapis.com/projects/p/zones/z/instances/vm"}"#,
        )
        .unwrap();
        assert_eq!(finding.sql_instance(), None);
    }

    #[test]
    fn rejects_finding_without_category() {
        assert!(Finding::from_json(r#"{"name": "organizations/1/sources/2/findings/3"}"#).is_err());
        assert!(Finding::from_json("not json").is_err());
    }
}
