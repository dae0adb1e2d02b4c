// sra-core/src/services/mod.rs
//! Narrow capability traits for every backend an action talks to, and the
//! bundle that carries them into an invocation.
//!
//! Actions never see a concrete client. A live adapter from
//! [`crate::clients`] and a fake from [`crate::stubs`] are interchangeable
//! behind these traits.

use std::sync::Arc;

use crate::annotation::Annotator;

pub mod cloudsql;
pub mod security_center;

pub use cloudsql::{AclEntry, CloudSqlAdmin, DatabaseInstance, IpConfiguration, Operation, Settings};
pub use security_center::{SecurityMarks, SecurityMarksApi, UpdateSecurityMarksRequest};

/// The services one invocation may use. Built by the caller and passed in
/// explicitly; the executor never constructs or caches clients.
#[derive(Clone)]
pub struct Services {
    pub cloud_sql: Arc<dyn CloudSqlAdmin>,
    pub annotator: Option<Annotator>,
}

impl Services {
    pub fn new(cloud_sql: Arc<dyn CloudSqlAdmin>) -> Self {
        Self { cloud_sql, annotator: None }
    }

    /// Enables annotation through `api` with the default mark prefix.
    pub fn with_security_marks(self, api: Arc<dyn SecurityMarksApi>) -> Self {
        self.with_annotator(Annotator::new(api))
    }

    pub fn with_annotator(mut self, annotator: Annotator) -> Self {
        self.annotator = Some(annotator);
        self
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("annotator", &self.annotator.as_ref().map(Annotator::prefix))
            .finish_non_exhaustive()
    }
}
