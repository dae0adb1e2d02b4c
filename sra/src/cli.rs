// sra/src/cli.rs
//! Command-line interface definition for the `sra` binary.
//! License: MIT OR Apache-2.0

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "sra",
    version = env!("CARGO_PKG_VERSION"),
    about = "Remediate misconfigured cloud resources",
    long_about = "sra runs idempotent remediation actions against cloud resources named by a security finding. Each run fetches the resource's live state, computes the minimal corrective change, applies it only if the resource is out of compliance, and records the result as security marks on the finding.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Suppress all log output.
    #[arg(long, short = 'q', global = true, help = "Suppress all informational and debug messages.")]
    pub quiet: bool,

    /// Enable debug logging (overrides RUST_LOG).
    #[arg(long, short = 'd', global = true, conflicts_with = "quiet", help = "Enable debug logging.")]
    pub debug: bool,

    /// Path to a YAML configuration file.
    #[arg(long = "config", value_name = "FILE", global = true, help = "Path to a YAML configuration file.")]
    pub config: Option<PathBuf>,

    /// Path to a service-account or authorized-user JSON key file.
    #[arg(long = "credentials", value_name = "FILE", env = "SRA_CREDENTIALS", global = true, help = "Path to a JSON credentials file.")]
    pub credentials: Option<PathBuf>,

    /// Pre-minted OAuth2 access token, used instead of a credentials file.
    #[arg(long = "access-token", value_name = "TOKEN", env = "SRA_ACCESS_TOKEN", hide_env_values = true, global = true, hide = true)]
    pub access_token: Option<String>,

    /// Compute the change without applying it.
    #[arg(long = "dry-run", global = true, help = "Compute the corrective change without applying it.")]
    pub dry_run: bool,

    /// Deadline for the outbound calls of one run.
    #[arg(long = "timeout", value_name = "SECS", global = true, help = "Deadline in seconds for the outbound calls of one run.")]
    pub timeout: Option<u64>,

    /// Do not write security marks on the finding.
    #[arg(long = "no-annotate", global = true, help = "Do not write security marks on the finding.")]
    pub no_annotate: bool,

    /// Print the outcome as JSON on stdout.
    #[arg(long = "json", global = true, help = "Print the outcome as JSON on stdout.")]
    pub json: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Removes internet-wide entries from a Cloud SQL instance's authorized networks.
    #[command(about = "Remove 0.0.0.0/0 and ::/0 from a Cloud SQL instance's authorized networks.")]
    RemovePublicIp(RemovePublicIpCommand),

    /// Reads a finding and runs the action mapped to its category.
    #[command(about = "Read a finding (JSON) and run the action mapped to its category.")]
    Finding(FindingCommand),

    /// Lists the available actions and the finding categories they handle.
    #[command(about = "List available actions and the finding categories they handle.")]
    Actions,
}

#[derive(Parser, Debug)]
pub struct RemovePublicIpCommand {
    #[arg(long = "project", value_name = "PROJECT_ID", help = "Project that owns the instance.")]
    pub project: String,

    #[arg(long = "instance", value_name = "NAME", help = "Cloud SQL instance name.")]
    pub instance: String,

    #[arg(long = "finding", value_name = "NAME", help = "Finding to annotate after remediation.")]
    pub finding: Option<String>,
}

#[derive(Parser, Debug)]
pub struct FindingCommand {
    /// Finding JSON file, or `-` for stdin.
    #[arg(value_name = "FILE", help = "Finding or notification JSON file ('-' reads stdin).")]
    pub path: PathBuf,

    /// Run even if the finding is no longer active.
    #[arg(long = "force", help = "Run even if the finding is no longer active.")]
    pub force: bool,
}
