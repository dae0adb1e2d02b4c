// sra-core/src/remediation/actions/remove_public_ip.rs
//! Removes internet-wide entries from a Cloud SQL instance's authorized networks.
//!
//! An entry is fully open when its range covers every address, that is when
//! its prefix length is zero (`0.0.0.0/0`, `::/0`, or any `a.b.c.d/0`). Restricted entries are kept in their original order. If nothing is
//! open the action is a no-op; if everything was open the patch clears the
//! list. The patch carries only the instance identity and the filtered list,
//! so every other setting on the instance is left as it is.

use async_trait::async_trait;

use crate::errors::{RemediationError, ServiceError};
use crate::finding::Finding;
use crate::remediation::RemediationAction;
use crate::services::{AclEntry, DatabaseInstance, IpConfiguration, Services, Settings};
use crate::validators::{validate_marks_target, validate_project_id, validate_sql_instance_name};

pub const ACTION_NAME: &str = "remove_public_ip";

pub const CATEGORIES: &[&str] = &["PUBLIC_SQL_INSTANCE", "SQL_PUBLIC_IP"];

/// True for a CIDR range with a zero-length prefix. Bare addresses are single hosts.
pub fn is_fully_open(entry: &AclEntry) -> bool {
    entry
        .value
        .trim()
        .split_once('/')
        .and_then(|(_, prefix)| prefix.trim().parse::<u8>().ok())
        .is_some_and(|len| len == 0)
}

/// Parameters for one run. Fields are fixed once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovePublicIpValues {
    project_id: String,
    instance_name: String,
    finding: Option<String>,
}

impl RemovePublicIpValues {
    pub fn new(project_id: impl Into<String>, instance_name: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            instance_name: instance_name.into(),
            finding: None,
        }
    }

    /// Names the finding to annotate once the instance is corrected.
    pub fn with_finding(mut self, finding: impl Into<String>) -> Self {
        self.finding = Some(finding.into());
        self
    }

    /// Builds values from a Cloud SQL finding, annotating that same finding.
    pub fn from_finding(finding: &Finding) -> Result<Self, RemediationError> {
        let invalid = |reason: String| RemediationError::InvalidInput { action: ACTION_NAME, reason };

        if !CATEGORIES.iter().any(|c| c.eq_ignore_ascii_case(&finding.category)) {
            return Err(invalid(format!(
                "finding category '{}' is not handled by {ACTION_NAME}",
                finding.category
            )));
        }
        let (project, instance) = finding.sql_instance().ok_or_else(|| {
            invalid(format!("'{}' is not a Cloud SQL instance resource", finding.resource_name))
        })?;

        let values = Self::new(project, instance);
        Ok(if finding.name.is_empty() { values } else { values.with_finding(finding.name.clone()) })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    pub fn finding(&self) -> Option<&str> {
        self.finding.as_deref()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RemovePublicIp;

#[async_trait]
impl RemediationAction for RemovePublicIp {
    type Values = RemovePublicIpValues;
    type State = DatabaseInstance;
    type Target = Vec<AclEntry>;
    type Patch = DatabaseInstance;

    fn name(&self) -> &'static str {
        ACTION_NAME
    }

    fn validate(&self, values: &Self::Values) -> Result<(), String> {
        validate_project_id(&values.project_id)?;
        validate_sql_instance_name(&values.instance_name)?;
        if let Some(finding) = &values.finding {
            validate_marks_target(finding)?;
        }
        Ok(())
    }

    fn resource_id(&self, values: &Self::Values) -> String {
        format!("projects/{}/instances/{}", values.project_id, values.instance_name)
    }

    fn annotation_target<'a>(&self, values: &'a Self::Values) -> Option<&'a str> {
        values.finding()
    }

    async fn fetch(&self, values: &Self::Values, services: &Services) -> Result<DatabaseInstance, ServiceError> {
        services.cloud_sql.instance(&values.project_id, &values.instance_name).await
    }

    fn observed(&self, current: &DatabaseInstance) -> Vec<AclEntry> {
        current.authorized_networks().to_vec()
    }

    fn target(&self, current: &DatabaseInstance) -> Vec<AclEntry> {
        current
            .authorized_networks()
            .iter()
            .filter(|entry| !is_fully_open(entry))
            .cloned()
            .collect()
    }

    fn patch(&self, values: &Self::Values, current: &DatabaseInstance, target: Vec<AclEntry>) -> DatabaseInstance {
        DatabaseInstance {
            name: Some(current.name.clone().unwrap_or_else(|| values.instance_name.clone())),
            project: Some(current.project.clone().unwrap_or_else(|| values.project_id.clone())),
            settings: Some(Settings {
                ip_configuration: Some(IpConfiguration {
                    authorized_networks: Some(target),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    async fn apply(&self, values: &Self::Values, patch: &DatabaseInstance, services: &Services) -> Result<(), ServiceError> {
        services
            .cloud_sql
            .patch_instance(&values.project_id, &values.instance_name, patch)
            .await?
            .into_result()
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use crate::context::ExecutionContext;
    use crate::errors::ErrorKind;
    use crate::remediation::{execute, AnnotationStatus, RemediationStatus};
    use crate::stubs::{CloudSqlStub, SecurityMarksStub};

    const PROJECT: &str = "sha-resources-20191002";
    const INSTANCE: &str = "public-sql-instance";
    const FINDING: &str = "organizations/1055058813388/sources/1986930501971458034/findings/public-sql";

    fn instance(networks: &[&str]) -> DatabaseInstance {
        DatabaseInstance {
            name: Some(INSTANCE.into()),
            project: Some(PROJECT.into()),
            settings: Some(Settings {
                ip_configuration: Some(IpConfiguration {
                    authorized_networks: Some(networks.iter().map(|v| AclEntry::new(*v)).collect()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn values() -> RemovePublicIpValues {
        RemovePublicIpValues::new(PROJECT, INSTANCE)
    }

    fn setup(state: DatabaseInstance) -> (Services, Arc<CloudSqlStub>) {
        let sql = Arc::new(CloudSqlStub::with_instance(state));
        (Services::new(sql.clone()), sql)
    }

    #[tokio::test]
    async fn close_public_ip_on_sql_instance() {
        let (services, sql) = setup(instance(&["0.0.0.0/0", "199.27.199.0/24"]));

        let outcome = execute(&ExecutionContext::new(), &RemovePublicIp, &values(), &services)
            .await
            .unwrap();

        assert_eq!(outcome.status, RemediationStatus::Remediated);
        assert_eq!(sql.patch_calls(), 1);
        assert_eq!(sql.saved_instance_updated(), Some(instance(&["199.27.199.0/24"])));
        assert_eq!(sql.last_get(), Some((PROJECT.to_string(), INSTANCE.to_string())));
    }

    #[tokio::test]
    async fn tries_to_close_instance_already_closed() {
        let (services, sql) = setup(instance(&["199.27.199.0/24"]));

        let outcome = execute(&ExecutionContext::new(), &RemovePublicIp, &values(), &services)
            .await
            .unwrap();

        assert_eq!(outcome.status, RemediationStatus::AlreadyCompliant);
        assert_eq!(outcome.fingerprint, None);
        assert_eq!(sql.patch_calls(), 0);
        assert_eq!(sql.saved_instance_updated(), None);
    }

    #[tokio::test]
    async fn compliant_lists_never_trigger_an_update() {
        let cases: &[&[&str]] = &[&[], &["10.0.0.0/8"], &["10.0.0.0/8", "192.168.1.0/24", "2001:db8::/32"]];
        for networks in cases {
            let (services, sql) = setup(instance(networks));
            let outcome = execute(&ExecutionContext::new(), &RemovePublicIp, &values(), &services)
                .await
                .unwrap();
            assert_eq!(outcome.status, RemediationStatus::AlreadyCompliant, "{networks:?}");
            assert_eq!(sql.patch_calls(), 0, "{networks:?}");
        }
    }

    #[tokio::test]
    async fn any_zero_length_prefix_counts_as_open() {
        let (services, sql) = setup(instance(&["1.2.3.4/0", "10.0.0.0/8", "2001:db8::/0", "203.0.113.7"]));

        let outcome = execute(&ExecutionContext::new(), &RemovePublicIp, &values(), &services)
            .await
            .unwrap();

        assert_eq!(outcome.status, RemediationStatus::Remediated);
        assert_eq!(sql.saved_instance_updated(), Some(instance(&["10.0.0.0/8", "203.0.113.7"])));
    }

    #[test]
    fn open_range_detection() {
        for open in ["0.0.0.0/0", "::/0", " 0.0.0.0/0 ", "1.2.3.4/0"] {
            assert!(is_fully_open(&AclEntry::new(open)), "{open}");
        }
        for closed in ["10.0.0.0/8", "0.0.0.0/1", "203.0.113.7", "0.0.0.0", "bogus/x"] {
            assert!(!is_fully_open(&AclEntry::new(closed)), "{closed}");
        }
    }

    #[tokio::test]
    async fn second_run_observes_corrected_state_and_does_nothing() {
        let (services, sql) = setup(instance(&["0.0.0.0/0", "199.27.199.0/24"]));
        let ctx = ExecutionContext::new();

        execute(&ctx, &RemovePublicIp, &values(), &services).await.unwrap();
        // The provider now reports the patched list.
        sql.set_instance_response(instance(&["199.27.199.0/24"]));
        let second = execute(&ctx, &RemovePublicIp, &values(), &services).await.unwrap();

        assert_eq!(second.status, RemediationStatus::AlreadyCompliant);
        assert_eq!(sql.patch_calls(), 1);
        assert_eq!(sql.get_calls(), 2);
    }

    #[tokio::test]
    async fn removing_every_entry_sends_an_empty_list() {
        let (services, sql) = setup(instance(&["0.0.0.0/0", "::/0"]));

        execute(&ExecutionContext::new(), &RemovePublicIp, &values(), &services).await.unwrap();

        let sent = serde_json::to_value(sql.saved_instance_updated().unwrap()).unwrap();
        assert_eq!(
            sent,
            json!({
                "name": INSTANCE,
                "project": PROJECT,
                "settings": { "ipConfiguration": { "authorizedNetworks": [] } }
            })
        );
    }

    #[tokio::test]
    async fn patch_leaves_unrelated_fields_out_and_keeps_order() {
        let mut state: DatabaseInstance = serde_json::from_value(json!({
            "name": INSTANCE,
            "project": PROJECT,
            "databaseVersion": "MYSQL_8_0",
            "region": "us-central1",
            "settings": {
                "tier": "db-n1-standard-1",
                "ipConfiguration": {
                    "ipv4Enabled": true,
                    "requireSsl": true,
                    "authorizedNetworks": [
                        { "value": "203.0.113.0/24", "name": "office" },
                        { "value": "0.0.0.0/0", "name": "anyone" },
                        { "value": "198.51.100.7/32", "name": "vpn" }
                    ]
                }
            }
        }))
        .unwrap();
        state.extra.insert("state".into(), json!("RUNNABLE"));
        let (services, sql) = setup(state);

        execute(&ExecutionContext::new(), &RemovePublicIp, &values(), &services).await.unwrap();

        let sent = serde_json::to_value(sql.saved_instance_updated().unwrap()).unwrap();
        assert_eq!(
            sent,
            json!({
                "name": INSTANCE,
                "project": PROJECT,
                "settings": { "ipConfiguration": { "authorizedNetworks": [
                    { "value": "203.0.113.0/24", "name": "office" },
                    { "value": "198.51.100.7/32", "name": "vpn" }
                ] } }
            })
        );
    }

    #[tokio::test]
    async fn fetch_error_propagates_with_its_class_and_no_update() {
        let (services, sql) = setup(instance(&["0.0.0.0/0"]));
        sql.fail_instance(ServiceError::PermissionDenied("cloudsql.instances.get".into()));

        let err = execute(&ExecutionContext::new(), &RemovePublicIp, &values(), &services)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Fetch);
        assert_eq!(
            err.service_error(),
            Some(&ServiceError::PermissionDenied("cloudsql.instances.get".into()))
        );
        assert!(err.to_string().contains(&format!("projects/{PROJECT}/instances/{INSTANCE}")));
        assert_eq!(sql.patch_calls(), 0);
    }

    #[tokio::test]
    async fn missing_instance_is_a_fetch_error() {
        let sql = Arc::new(CloudSqlStub::new());
        let services = Services::new(sql.clone());

        let err = execute(&ExecutionContext::new(), &RemovePublicIp, &values(), &services)
            .await
            .unwrap_err();
        assert!(matches!(err.service_error(), Some(ServiceError::NotFound(_))));
        assert_eq!(sql.patch_calls(), 0);
    }

    #[tokio::test]
    async fn apply_error_is_reported_and_retryable_when_transient() {
        let (services, sql) = setup(instance(&["0.0.0.0/0"]));
        let marks = Arc::new(SecurityMarksStub::new());
        let services = services.with_security_marks(marks.clone());
        sql.fail_patch(ServiceError::Unavailable("try later".into()));

        let err = execute(&ExecutionContext::new(), &RemovePublicIp, &values().with_finding(FINDING), &services)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Apply);
        assert!(err.is_retryable());
        assert_eq!(sql.patch_calls(), 1);
        assert_eq!(marks.calls(), 0);
    }

    #[tokio::test]
    async fn failed_operation_is_an_apply_error() {
        let (services, sql) = setup(instance(&["0.0.0.0/0"]));
        sql.set_patch_response(serde_json::from_value(json!({
            "name": "op-1",
            "status": "DONE",
            "error": { "errors": [{ "code": "INVALID_ARGUMENT", "message": "bad acl" }] }
        })).unwrap());

        let err = execute(&ExecutionContext::new(), &RemovePublicIp, &values(), &services)
            .await
            .unwrap_err();
        assert_eq!(
            err.service_error(),
            Some(&ServiceError::OperationFailed("INVALID_ARGUMENT: bad acl".into()))
        );
    }

    #[tokio::test]
    async fn invalid_values_fail_before_any_call() {
        let (services, sql) = setup(instance(&["0.0.0.0/0"]));
        let bad = [
            RemovePublicIpValues::new("", INSTANCE),
            RemovePublicIpValues::new(PROJECT, ""),
            RemovePublicIpValues::new(PROJECT, "Not_Valid"),
            values().with_finding("not-a-finding"),
        ];
        for v in &bad {
            let err = execute(&ExecutionContext::new(), &RemovePublicIp, v, &services).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "{v:?}");
        }
        assert_eq!(sql.get_calls(), 0);
        assert_eq!(sql.patch_calls(), 0);
    }

    #[tokio::test]
    async fn identical_runs_produce_identical_requests_and_results() {
        let mut runs = Vec::new();
        for _ in 0..2 {
            let (services, sql) = setup(instance(&["0.0.0.0/0", "199.27.199.0/24"]));
            let marks = Arc::new(SecurityMarksStub::new());
            let services = services.with_security_marks(marks.clone());
            let outcome = execute(&ExecutionContext::new(), &RemovePublicIp, &values().with_finding(FINDING), &services)
                .await
                .unwrap();
            runs.push((outcome, sql.saved_instance_updated(), marks.last_request()));
        }
        assert_eq!(runs[0], runs[1]);
    }

    #[tokio::test]
    async fn annotates_the_finding_after_a_successful_apply() {
        let (services, _sql) = setup(instance(&["0.0.0.0/0"]));
        let marks = Arc::new(SecurityMarksStub::new());
        let services = services.with_security_marks(marks.clone());

        let outcome = execute(&ExecutionContext::new(), &RemovePublicIp, &values().with_finding(FINDING), &services)
            .await
            .unwrap();

        let req = marks.last_request().expect("annotation sent");
        assert_eq!(req.security_marks.name, format!("{FINDING}/securityMarks"));
        assert_eq!(
            req.security_marks.marks.get("sra-fingerprint"),
            outcome.fingerprint.as_ref()
        );
        assert!(matches!(outcome.annotation, AnnotationStatus::Annotated(_)));
    }

    #[tokio::test]
    async fn annotates_an_asset_target() {
        let (services, _sql) = setup(instance(&["0.0.0.0/0"]));
        let marks = Arc::new(SecurityMarksStub::new());
        let services = services.with_security_marks(marks.clone());
        let asset = "organizations/1055058813388/assets/4711";

        let outcome = execute(&ExecutionContext::new(), &RemovePublicIp, &values().with_finding(asset), &services)
            .await
            .unwrap();

        assert!(matches!(outcome.annotation, AnnotationStatus::Annotated(_)));
        assert_eq!(marks.last_request().map(|r| r.security_marks.name), Some(format!("{asset}/securityMarks")));
    }

    #[tokio::test]
    async fn noop_runs_do_not_annotate() {
        let (services, _sql) = setup(instance(&["199.27.199.0/24"]));
        let marks = Arc::new(SecurityMarksStub::new());
        let services = services.with_security_marks(marks.clone());

        let outcome = execute(&ExecutionContext::new(), &RemovePublicIp, &values().with_finding(FINDING), &services)
            .await
            .unwrap();

        assert_eq!(outcome.annotation, AnnotationStatus::NotRequested);
        assert_eq!(marks.calls(), 0);
    }

    #[tokio::test]
    async fn annotation_failure_does_not_mask_the_remediation() {
        let (services, sql) = setup(instance(&["0.0.0.0/0"]));
        let marks = Arc::new(SecurityMarksStub::new());
        marks.fail_with(ServiceError::PermissionDenied("securitycenter.findings.update".into()));
        let services = services.with_security_marks(marks.clone());

        let outcome = execute(&ExecutionContext::new(), &RemovePublicIp, &values().with_finding(FINDING), &services)
            .await
            .unwrap();

        assert_eq!(outcome.status, RemediationStatus::Remediated);
        assert_eq!(sql.patch_calls(), 1);
        let err = outcome.annotation_error().expect("annotation failure reported");
        assert_eq!(err.kind(), ErrorKind::Annotation);
    }

    #[tokio::test]
    async fn dry_run_computes_the_patch_without_sending_it() {
        let (services, sql) = setup(instance(&["0.0.0.0/0", "199.27.199.0/24"]));
        let ctx = ExecutionContext::new().with_dry_run(true);

        let outcome = execute(&ctx, &RemovePublicIp, &values(), &services).await.unwrap();

        assert_eq!(outcome.status, RemediationStatus::WouldRemediate);
        assert_eq!(
            outcome.patch.as_ref().and_then(|p| p.pointer("/settings/ipConfiguration/authorizedNetworks")),
            Some(&json!([{ "value": "199.27.199.0/24" }]))
        );
        assert_eq!(sql.patch_calls(), 0);
    }

    #[tokio::test]
    async fn slow_fetch_hits_the_context_deadline() {
        let (services, sql) = setup(instance(&["0.0.0.0/0"]));
        sql.set_delay(Duration::from_millis(500));
        let ctx = ExecutionContext::new().with_timeout(Duration::from_millis(20));

        let err = execute(&ctx, &RemovePublicIp, &values(), &services).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Fetch);
        assert_eq!(err.service_error(), Some(&ServiceError::DeadlineExceeded));
        assert_eq!(sql.patch_calls(), 0);
    }

    #[test]
    fn values_from_a_public_sql_finding() {
        let finding = Finding {
            name: FINDING.into(),
            category: "PUBLIC_SQL_INSTANCE".into(),
            resource_name: format!("//cloudsql.googleapis.com/projects/{PROJECT}/instances/{INSTANCE}"),
            ..Default::default()
        };
        let v = RemovePublicIpValues::from_finding(&finding).unwrap();
        assert_eq!(v, values().with_finding(FINDING));

        let wrong = Finding { category: "OPEN_FIREWALL".into(), ..finding };
        assert!(RemovePublicIpValues::from_finding(&wrong).is_err());
    }
}
