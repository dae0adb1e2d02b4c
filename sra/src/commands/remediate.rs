//! `sra remove-public-ip`: runs the action against one named instance.

use std::io;

use is_terminal::IsTerminal;

use anyhow::Result;
use log::info;

use sra_core::{execute, RemediationOutcome, RemovePublicIp, RemovePublicIpValues};

use crate::cli::RemovePublicIpCommand;
use crate::commands::RunSettings;
use crate::ui::output;

pub async fn run_remove_public_ip(settings: &RunSettings, cmd: &RemovePublicIpCommand) -> Result<()> {
    let mut values = RemovePublicIpValues::new(cmd.project.trim(), cmd.instance.trim());
    if let Some(finding) = cmd.finding.as_deref().filter(|f| !f.trim().is_empty()) {
        values = values.with_finding(finding.trim());
    }
    let outcome = run_action(settings, &values).await?;
    report(settings, &outcome)
}

/// Executes `RemovePublicIp` for `values` with live services.
pub(crate) async fn run_action(settings: &RunSettings, values: &RemovePublicIpValues) -> Result<RemediationOutcome> {
    let ctx = settings.context();
    info!(
        "Checking authorized networks of {}/{} (invocation {})",
        values.project_id(),
        values.instance_name(),
        ctx.invocation_id()
    );
    let services = settings.services()?;
    Ok(execute(&ctx, &RemovePublicIp, values, &services).await?)
}

pub(crate) fn report(settings: &RunSettings, outcome: &RemediationOutcome) -> Result<()> {
    if let Some(err) = outcome.annotation_error() {
        output::warn_msg(format!("Remediation succeeded but the finding was not annotated: {err}"));
    }
    let stdout = io::stdout();
    let colored = stdout.is_terminal();
    output::print_outcome(&mut stdout.lock(), outcome, settings.json, colored)
}
