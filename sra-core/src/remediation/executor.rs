// sra-core/src/remediation/executor.rs
//! Drives a [`RemediationAction`] through one invocation.
//!
//! The sequence is fetch, diff, conditionally apply, then annotate. State is
//! fetched fresh every time and nothing is kept between invocations, so a
//! redelivered or retried trigger observes the corrected resource and sends
//! no second update. There is no retry loop and no rollback: the update is a
//! single provider call, and if it fails the resource is simply still in its
//! original, retryable state.

use log::{debug, info, warn};

use crate::context::ExecutionContext;
use crate::errors::{RemediationError, ServiceError};
use crate::remediation::fingerprint::remediation_fingerprint;
use crate::remediation::{AnnotationStatus, RemediationAction, RemediationOutcome, RemediationStatus};
use crate::services::Services;

/// Runs `action` once against the resource named by `values`.
///
/// Returns the first hard error encountered. An annotation failure is not a
/// hard error: it is logged and reported in the outcome.
pub async fn execute<A: RemediationAction>(
    ctx: &ExecutionContext,
    action: &A,
    values: &A::Values,
    services: &Services,
) -> Result<RemediationOutcome, RemediationError> {
    let name = action.name();
    let id = ctx.invocation_id();

    action
        .validate(values)
        .map_err(|reason| RemediationError::InvalidInput { action: name, reason })?;
    let resource = action.resource_id(values);
    debug!("[{id}] {name}: fetching {resource}");

    let current = ctx
        .call(action.fetch(values, services))
        .await
        .map_err(|source| RemediationError::Fetch { action: name, resource: resource.clone(), source })?;

    let target = action.target(&current);
    if action.observed(&current) == target {
        info!("[{id}] {name}: {resource} is already compliant, nothing to do");
        return Ok(RemediationOutcome {
            action: name,
            resource,
            status: RemediationStatus::AlreadyCompliant,
            fingerprint: None,
            patch: None,
            annotation: AnnotationStatus::NotRequested,
        });
    }

    let patch = action.patch(values, &current, target);
    let patch_json = serde_json::to_value(&patch).map_err(|e| RemediationError::Apply {
        action: name,
        resource: resource.clone(),
        source: ServiceError::Encode(e.to_string()),
    })?;
    let fingerprint = remediation_fingerprint(name, &resource, &patch_json);

    if ctx.dry_run() {
        info!("[{id}] {name}: dry run, would patch {resource} with {patch_json}");
        return Ok(RemediationOutcome {
            action: name,
            resource,
            status: RemediationStatus::WouldRemediate,
            fingerprint: Some(fingerprint),
            patch: Some(patch_json),
            annotation: AnnotationStatus::NotRequested,
        });
    }

    debug!("[{id}] {name}: patching {resource} with {patch_json}");
    ctx.call(action.apply(values, &patch, services))
        .await
        .map_err(|source| RemediationError::Apply { action: name, resource: resource.clone(), source })?;
    info!("[{id}] {name}: remediated {resource} (fingerprint {fingerprint})");

    let annotation = annotate(ctx, action, values, services, &fingerprint).await;

    Ok(RemediationOutcome {
        action: name,
        resource,
        status: RemediationStatus::Remediated,
        fingerprint: Some(fingerprint),
        patch: Some(patch_json),
        annotation,
    })
}

async fn annotate<A: RemediationAction>(
    ctx: &ExecutionContext,
    action: &A,
    values: &A::Values,
    services: &Services,
    fingerprint: &str,
) -> AnnotationStatus {
    let (Some(target), Some(annotator)) = (action.annotation_target(values), services.annotator.as_ref()) else {
        return AnnotationStatus::NotRequested;
    };

    match annotator.mark_remediated(ctx, target, action.name(), fingerprint).await {
        Ok(marks) => {
            debug!("[{}] {}: annotated {target}", ctx.invocation_id(), action.name());
            AnnotationStatus::Annotated(marks)
        }
        Err(source) => {
            let err = RemediationError::Annotation {
                action: action.name(),
                target: target.to_string(),
                source,
            };
            warn!("[{}] remediation succeeded but annotation failed: {err}", ctx.invocation_id());
            AnnotationStatus::Failed(err)
        }
    }
}
