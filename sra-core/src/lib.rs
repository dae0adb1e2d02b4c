// sra-core/src/lib.rs
//! # SRA Core Library
//!
//! `sra-core` provides the remediation action execution model for security
//! response automation: given a finding about a misconfigured cloud resource,
//! an action fetches the resource's live state, computes the minimal
//! corrective change, applies it through the provider API only when the
//! resource is actually out of compliance, and optionally records the result
//! as security marks on the finding.
//!
//! Actions are safe under at-least-once delivery. State is fetched fresh on
//! every run, so a duplicate or retried invocation sees the corrected
//! resource and sends nothing.
//!
//! ## Modules
//!
//! * `remediation`: the `RemediationAction` contract, the generic `execute` driver and concrete actions.
//! * `services`: narrow capability traits per backend, plus the `Services` bundle.
//! * `clients`: live adapters over the provider REST APIs and OAuth2 token handling.
//! * `stubs`: in-memory fakes of every service trait for deterministic tests.
//! * `annotation`: merges remediation marks onto findings.
//! * `finding`: parsing of finding notifications.
//! * `context`: per-invocation deadline and dry-run settings.
//! * `config`: YAML configuration with environment overrides.
//! * `validators`: identifier syntax checks.
//! * `errors`: `ServiceError`, `RemediationError` and `ConfigError`.
//!
//! ## Usage Example
//!
//! ```rust
//! use std::sync::Arc;
//! use sra_core::{execute, ExecutionContext, RemediationStatus, RemovePublicIp, RemovePublicIpValues, Services};
//! use sra_core::services::{AclEntry, DatabaseInstance, IpConfiguration, Settings};
//! use sra_core::stubs::CloudSqlStub;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let sql = Arc::new(CloudSqlStub::with_instance(DatabaseInstance {
//!     name: Some("public-sql-instance".into()),
//!     project: Some("sha-resources-20191002".into()),
//!     settings: Some(Settings {
//!         ip_configuration: Some(IpConfiguration {
//!             authorized_networks: Some(vec![AclEntry::new("0.0.0.0/0"), AclEntry::new("199.27.199.0/24")]),
//!             ..Default::default()
//!         }),
//!         ..Default::default()
//!     }),
//!     ..Default::default()
//! }));
//! let services = Services::new(sql.clone());
//! let values = RemovePublicIpValues::new("sha-resources-20191002", "public-sql-instance");
//!
//! let outcome = execute(&ExecutionContext::new(), &RemovePublicIp, &values, &services).await.unwrap();
//! assert_eq!(outcome.status, RemediationStatus::Remediated);
//! assert_eq!(sql.patch_calls(), 1);
//! # });
//! ```
//!
//! ---
//! License: MIT OR Apache-2.0

pub mod annotation;
pub mod clients;
pub mod config;
pub mod context;
pub mod errors;
pub mod finding;
pub mod remediation;
pub mod services;
pub mod stubs;
pub mod validators;

/// Re-exports the error taxonomy.
pub use errors::{ConfigError, ErrorKind, RemediationError, ServiceError};

/// Re-exports the execution model.
pub use context::ExecutionContext;
pub use remediation::{
    execute, AnnotationStatus, RemediationAction, RemediationOutcome, RemediationStatus,
};
pub use remediation::actions::{ActionKind, RemovePublicIp, RemovePublicIpValues};

/// Re-exports the service bundle and annotation client.
pub use annotation::Annotator;
pub use services::Services;

pub use config::SraConfig;
pub use finding::Finding;
