// sra-core/src/context.rs
//! Per-invocation execution context.
//!
//! The context is supplied by the caller and governs outbound calls only: an
//! optional deadline bounds every service call made on its behalf, and the
//! dry-run flag stops the executor before anything is written. Cancellation is
//! the usual async one: drop the future.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

use crate::errors::ServiceError;

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    invocation_id: Uuid,
    deadline: Option<Instant>,
    dry_run: bool,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self { invocation_id: Uuid::new_v4(), deadline: None, dry_run: false }
    }

    /// Sets the deadline to `timeout` from now. A timeout too large to
    /// represent as an instant leaves the context without a deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Correlation id for log lines of this invocation.
    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Runs one outbound call under the context deadline.
    pub async fn call<T, F>(&self, call: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, call)
                .await
                .map_err(|_| ServiceError::DeadlineExceeded)?,
            None => call.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn call_without_deadline_passes_result_through() {
        let ctx = ExecutionContext::new();
        let out = ctx.call(async { Ok::<_, ServiceError>(7) }).await;
        assert_eq!(out, Ok(7));
    }

    #[tokio::test]
    async fn call_past_deadline_is_deadline_exceeded() {
        let ctx = ExecutionContext::new().with_timeout(Duration::from_millis(10));
        let out = ctx
            .call(async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok::<_, ServiceError>(())
            })
            .await;
        assert_eq!(out, Err(ServiceError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn unrepresentable_timeout_means_no_deadline() {
        let ctx = ExecutionContext::new().with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(ctx.deadline(), None);
        let out = ctx.call(async { Ok::<_, ServiceError>("done") }).await;
        assert_eq!(out, Ok("done"));
    }

    #[test]
    fn each_context_gets_its_own_invocation_id() {
        assert_ne!(ExecutionContext::new().invocation_id(), ExecutionContext::new().invocation_id());
    }
}
