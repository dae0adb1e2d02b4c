// sra-core/src/stubs.rs
//! In-memory fakes for every service trait.
//!
//! Each stub holds a scripted response (or error) and captures the last
//! request it saw plus a call count, so tests can assert on exactly what an
//! action sent. They are meant for one sequential caller per test.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::ServiceError;
use crate::services::{
    CloudSqlAdmin, DatabaseInstance, Operation, SecurityMarks, SecurityMarksApi,
    UpdateSecurityMarksRequest,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct CloudSqlState {
    instance_response: Option<DatabaseInstance>,
    instance_error: Option<ServiceError>,
    patch_response: Operation,
    patch_error: Option<ServiceError>,
    delay: Option<Duration>,
    last_get: Option<(String, String)>,
    saved_instance_updated: Option<DatabaseInstance>,
    get_calls: usize,
    patch_calls: usize,
}

/// Fake [`CloudSqlAdmin`]. With no scripted instance, `instance` reports `NotFound`.
#[derive(Debug, Default)]
pub struct CloudSqlStub {
    state: Mutex<CloudSqlState>,
}

impl CloudSqlStub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instance(instance: DatabaseInstance) -> Self {
        let stub = Self::new();
        stub.set_instance_response(instance);
        stub
    }

    pub fn set_instance_response(&self, instance: DatabaseInstance) {
        lock(&self.state).instance_response = Some(instance);
    }

    pub fn fail_instance(&self, err: ServiceError) {
        lock(&self.state).instance_error = Some(err);
    }

    pub fn set_patch_response(&self, op: Operation) {
        lock(&self.state).patch_response = op;
    }

    pub fn fail_patch(&self, err: ServiceError) {
        lock(&self.state).patch_error = Some(err);
    }

    /// Makes every call sleep first, for deadline tests.
    pub fn set_delay(&self, delay: Duration) {
        lock(&self.state).delay = Some(delay);
    }

    /// The last patch body received, if any.
    pub fn saved_instance_updated(&self) -> Option<DatabaseInstance> {
        lock(&self.state).saved_instance_updated.clone()
    }

    /// `(project, instance)` of the last get.
    pub fn last_get(&self) -> Option<(String, String)> {
        lock(&self.state).last_get.clone()
    }

    pub fn get_calls(&self) -> usize {
        lock(&self.state).get_calls
    }

    pub fn patch_calls(&self) -> usize {
        lock(&self.state).patch_calls
    }

    fn delay(&self) -> Option<Duration> {
        lock(&self.state).delay
    }
}

#[async_trait]
impl CloudSqlAdmin for CloudSqlStub {
    async fn instance(&self, project: &str, instance: &str) -> Result<DatabaseInstance, ServiceError> {
        if let Some(delay) = self.delay() {
            tokio::time::sleep(delay).await;
        }
        let mut state = lock(&self.state);
        state.get_calls += 1;
        state.last_get = Some((project.to_string(), instance.to_string()));
        if let Some(err) = &state.instance_error {
            return Err(err.clone());
        }
        state
            .instance_response
            .clone()
            .ok_or_else(|| ServiceError::NotFound(format!("projects/{project}/instances/{instance}")))
    }

    async fn patch_instance(
        &self,
        _project: &str,
        _instance: &str,
        patch: &DatabaseInstance,
    ) -> Result<Operation, ServiceError> {
        if let Some(delay) = self.delay() {
            tokio::time::sleep(delay).await;
        }
        let mut state = lock(&self.state);
        state.patch_calls += 1;
        state.saved_instance_updated = Some(patch.clone());
        match &state.patch_error {
            Some(err) => Err(err.clone()),
            None => Ok(state.patch_response.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct SecurityMarksState {
    response: Option<SecurityMarks>,
    error: Option<ServiceError>,
    last_request: Option<UpdateSecurityMarksRequest>,
    calls: usize,
}

/// Fake [`SecurityMarksApi`]. Without a scripted response it echoes the
/// submitted marks back.
#[derive(Debug, Default)]
pub struct SecurityMarksStub {
    state: Mutex<SecurityMarksState>,
}

impl SecurityMarksStub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_response(&self, marks: SecurityMarks) {
        lock(&self.state).response = Some(marks);
    }

    pub fn fail_with(&self, err: ServiceError) {
        lock(&self.state).error = Some(err);
    }

    pub fn last_request(&self) -> Option<UpdateSecurityMarksRequest> {
        lock(&self.state).last_request.clone()
    }

    pub fn calls(&self) -> usize {
        lock(&self.state).calls
    }
}

#[async_trait]
impl SecurityMarksApi for SecurityMarksStub {
    async fn update_security_marks(
        &self,
        request: &UpdateSecurityMarksRequest,
    ) -> Result<SecurityMarks, ServiceError> {
        let mut state = lock(&self.state);
        state.calls += 1;
        state.last_request = Some(request.clone());
        if let Some(err) = &state.error {
            return Err(err.clone());
        }
        Ok(state.response.clone().unwrap_or_else(|| request.security_marks.clone()))
    }
}
