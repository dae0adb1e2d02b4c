//! Rendering of outcomes and status messages.
//!
//! Outcomes go to stdout, either as human-readable lines or as a single JSON
//! document. Status messages go to stderr.

use std::io::{self, Write};

use anyhow::Result;
use is_terminal::IsTerminal;
use serde_json::{json, Value};

use sra_core::{ActionKind, AnnotationStatus, RemediationOutcome, RemediationStatus};

use crate::ui::theme::{paint, ThemeEntry};

/// JSON form of an outcome.
pub fn outcome_json(outcome: &RemediationOutcome) -> Value {
    let annotation = match &outcome.annotation {
        AnnotationStatus::NotRequested => json!({ "status": "not_requested" }),
        AnnotationStatus::Annotated(marks) => json!({ "status": "annotated", "securityMarks": marks }),
        AnnotationStatus::Failed(err) => json!({ "status": "failed", "error": err.to_string() }),
    };
    json!({
        "action": outcome.action,
        "resource": outcome.resource,
        "status": outcome.status,
        "changed": outcome.changed(),
        "fingerprint": outcome.fingerprint,
        "patch": outcome.patch,
        "annotation": annotation,
    })
}

/// Writes an outcome in the requested format.
pub fn print_outcome<W: Write>(
    out: &mut W,
    outcome: &RemediationOutcome,
    as_json: bool,
    colored: bool,
) -> Result<()> {
    if as_json {
        writeln!(out, "{}", serde_json::to_string_pretty(&outcome_json(outcome))?)?;
        return Ok(());
    }

    let (label, entry) = match outcome.status {
        RemediationStatus::AlreadyCompliant => ("already compliant", ThemeEntry::Muted),
        RemediationStatus::WouldRemediate => ("would remediate (dry run)", ThemeEntry::Warn),
        RemediationStatus::Remediated => ("remediated", ThemeEntry::Success),
    };
    writeln!(
        out,
        "{} {}: {}",
        paint(outcome.action, ThemeEntry::Header, colored),
        outcome.resource,
        paint(label, entry, colored)
    )?;

    if let Some(fingerprint) = &outcome.fingerprint {
        writeln!(out, "  fingerprint: {fingerprint}")?;
    }
    if outcome.status == RemediationStatus::WouldRemediate {
        if let Some(patch) = &outcome.patch {
            writeln!(out, "  patch: {}", serde_json::to_string(patch)?)?;
        }
    }
    match &outcome.annotation {
        AnnotationStatus::NotRequested => {}
        AnnotationStatus::Annotated(marks) => {
            writeln!(out, "  annotated: {}", paint(&marks.name, ThemeEntry::Info, colored))?;
        }
        AnnotationStatus::Failed(err) => {
            writeln!(out, "  {}", paint(&format!("annotation failed: {err}"), ThemeEntry::Warn, colored))?;
        }
    }
    Ok(())
}

/// Lists the available actions and the categories routed to them.
pub fn print_actions<W: Write>(out: &mut W) -> io::Result<()> {
    for kind in ActionKind::ALL {
        writeln!(out, "{}\t{}", kind.name(), kind.categories().join(", "))?;
    }
    Ok(())
}

/// Helper for printing info messages to stderr.
pub fn info_msg(msg: impl AsRef<str>) {
    let colored = io::stderr().is_terminal();
    let _ = writeln!(io::stderr(), "{}", paint(msg.as_ref(), ThemeEntry::Info, colored));
}

/// Helper for printing warning messages to stderr.
pub fn warn_msg(msg: impl AsRef<str>) {
    let colored = io::stderr().is_terminal();
    let _ = writeln!(io::stderr(), "{}", paint(&format!("Warning: {}", msg.as_ref()), ThemeEntry::Warn, colored));
}

/// Helper for printing error messages to stderr.
pub fn error_msg(msg: impl AsRef<str>) {
    let colored = io::stderr().is_terminal();
    let _ = writeln!(io::stderr(), "{}", paint(&format!("Error: {}", msg.as_ref()), ThemeEntry::Error, colored));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: RemediationStatus) -> RemediationOutcome {
        RemediationOutcome {
            action: "remove_public_ip",
            resource: "projects/p/instances/i".to_string(),
            status,
            fingerprint: Some("ab12".to_string()),
            patch: Some(json!({ "name": "i" })),
            annotation: AnnotationStatus::NotRequested,
        }
    }

    #[test]
    fn human_output_names_resource_and_status() {
        let mut buf = Vec::new();
        print_outcome(&mut buf, &outcome(RemediationStatus::Remediated), false, false).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("remove_public_ip projects/p/instances/i: remediated"));
        assert!(text.contains("fingerprint: ab12"));
        assert!(!text.contains("patch:"));
    }

    #[test]
    fn dry_run_output_shows_patch() {
        let mut buf = Vec::new();
        print_outcome(&mut buf, &outcome(RemediationStatus::WouldRemediate), false, false).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains(r#"patch: {"name":"i"}"#));
    }

    #[test]
    fn json_output_is_one_document() {
        let mut buf = Vec::new();
        print_outcome(&mut buf, &outcome(RemediationStatus::AlreadyCompliant), true, false).unwrap();
        let value: Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["status"], "already_compliant");
        assert_eq!(value["changed"], false);
        assert_eq!(value["annotation"]["status"], "not_requested");
    }

    #[test]
    fn actions_listing_includes_categories() {
        let mut buf = Vec::new();
        print_actions(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("remove_public_ip\tPUBLIC_SQL_INSTANCE, SQL_PUBLIC_IP"));
    }
}
