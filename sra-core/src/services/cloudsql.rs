// sra-core/src/services/cloudsql.rs
//! Cloud SQL Admin capability and the slice of its resource model actions use.
//!
//! Field names follow the v1beta4 REST representation. Optional fields are
//! skipped when `None`, which is what keeps a patch built from these types
//! minimal: anything left unset is absent from the request body and therefore
//! untouched by the server. Unknown fields of a fetched instance are kept in
//! `extra` so a snapshot round-trips without loss.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ServiceError;

/// Get and patch a Cloud SQL instance.
#[async_trait]
pub trait CloudSqlAdmin: Send + Sync {
    /// Fetches the current state of `instance` in `project`.
    async fn instance(&self, project: &str, instance: &str) -> Result<DatabaseInstance, ServiceError>;

    /// Submits a partial update. Only fields present in `patch` are changed.
    async fn patch_instance(
        &self,
        project: &str,
        instance: &str,
        patch: &DatabaseInstance,
    ) -> Result<Operation, ServiceError>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseInstance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DatabaseInstance {
    /// The authorized network list, or an empty slice when the instance has none.
    pub fn authorized_networks(&self) -> &[AclEntry] {
        self.settings
            .as_ref()
            .and_then(|s| s.ip_configuration.as_ref())
            .and_then(|ip| ip.authorized_networks.as_deref())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_configuration: Option<IpConfiguration>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpConfiguration {
    /// `Some(vec![])` serializes as `[]` and clears the list; `None` leaves it alone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorized_networks: Option<Vec<AclEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4_enabled: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AclEntry {
    /// CIDR notation range, e.g. `199.27.199.0/24`.
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<String>,
}

impl AclEntry {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into(), ..Default::default() }
    }
}

/// Long-running operation handle returned by a patch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationErrors>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationErrors {
    #[serde(default)]
    pub errors: Vec<OperationError>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl Operation {
    /// Converts an operation that already carries errors into a `ServiceError`.
    pub fn into_result(self) -> Result<Operation, ServiceError> {
        match &self.error {
            Some(errs) if !errs.errors.is_empty() => {
                let detail = errs
                    .errors
                    .iter()
                    .map(|e| format!("{}: {}", e.code, e.message))
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(ServiceError::OperationFailed(detail))
            }
            _ => Ok(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let raw = json!({
            "name": "db-1",
            "project": "proj-123456",
            "databaseVersion": "POSTGRES_15",
            "settings": {
                "tier": "db-custom-1-3840",
                "ipConfiguration": {
                    "ipv4Enabled": true,
                    "requireSsl": false,
                    "authorizedNetworks": [{ "value": "0.0.0.0/0", "kind": "sql#aclEntry" }]
                }
            }
        });
        let instance: DatabaseInstance = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(instance.authorized_networks().len(), 1);
        assert_eq!(instance.extra.get("databaseVersion"), Some(&json!("POSTGRES_15")));
        assert_eq!(serde_json::to_value(&instance).unwrap(), raw);
    }

    #[test]
    fn empty_network_list_is_serialized_not_omitted() {
        let patch = DatabaseInstance {
            name: Some("db-1".into()),
            settings: Some(Settings {
                ip_configuration: Some(IpConfiguration {
                    authorized_networks: Some(Vec::new()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({ "name": "db-1", "settings": { "ipConfiguration": { "authorizedNetworks": [] } } })
        );
    }

    #[test]
    fn operation_errors_become_service_errors() {
        let op = Operation {
            name: "op-1".into(),
            error: Some(OperationErrors {
                errors: vec![OperationError { code: "INTERNAL".into(), message: "boom".into() }],
            }),
            ..Default::default()
        };
        assert_eq!(op.into_result(), Err(ServiceError::OperationFailed("INTERNAL: boom".into())));
    }
}
