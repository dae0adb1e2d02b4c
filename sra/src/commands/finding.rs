//! `sra finding`: routes a finding to the action registered for its category.

use std::io::Read;

use anyhow::{Context, Result};
use log::{debug, info};

use sra_core::{ActionKind, Finding, RemovePublicIpValues};

use crate::cli::FindingCommand;
use crate::commands::{remediate, RunSettings, UsageError};
use crate::ui::output;

/// Reads the finding from a file, or from stdin when the path is `-`.
pub fn read_finding(cmd: &FindingCommand) -> Result<Finding> {
    if cmd.path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read finding from stdin")?;
        Finding::from_json(&text).context("Invalid finding on stdin")
    } else {
        Finding::from_file(&cmd.path)
    }
}

pub async fn run_finding(settings: &RunSettings, cmd: &FindingCommand) -> Result<()> {
    let finding = read_finding(cmd).map_err(|e| UsageError(format!("{e:#}")))?;
    debug!("Finding {} has category {}", finding.name, finding.category);

    if !finding.is_active() && !cmd.force {
        output::info_msg(format!(
            "Finding '{}' is {}; skipping (use --force to run anyway).",
            finding.name,
            finding.state.as_deref().unwrap_or("inactive")
        ));
        return Ok(());
    }

    if finding.is_marked_remediated(&settings.config.mark_prefix) {
        output::info_msg(format!(
            "Finding '{}' is already marked remediated; re-checking the live resource.",
            finding.name
        ));
    }

    let kind = ActionKind::for_category(&finding.category).ok_or_else(|| {
        UsageError(format!("No action handles finding category '{}'", finding.category))
    })?;
    info!("Routing finding {} to {}", finding.name, kind.name());

    match kind {
        ActionKind::RemovePublicIp => {
            let values = RemovePublicIpValues::from_finding(&finding)?;
            let outcome = remediate::run_action(settings, &values).await?;
            remediate::report(settings, &outcome)
        }
    }
}
