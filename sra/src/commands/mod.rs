// sra/src/commands/mod.rs
//! Command dispatch and the wiring of live services from configuration.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::debug;

use sra_core::clients::{build_http_client, CloudSqlClient, Credentials, SecurityCenterClient, TokenSource};
use sra_core::{Annotator, ErrorKind, ExecutionContext, RemediationError, Services, SraConfig};

use crate::cli::{Cli, Commands};

pub mod finding;
pub mod remediate;

/// Exit codes reported by the binary.
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_INVALID_INPUT: u8 = 2;
pub const EXIT_FETCH_ERROR: u8 = 3;
pub const EXIT_APPLY_ERROR: u8 = 4;

/// Input the binary rejects before any action runs, such as a finding whose
/// category no action handles.
#[derive(Debug)]
pub struct UsageError(pub String);

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for UsageError {}

/// Settings resolved from config file, environment and flags.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub config: SraConfig,
    pub access_token: Option<String>,
    pub dry_run: bool,
    pub json: bool,
}

impl RunSettings {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = SraConfig::load(cli.config.as_deref())?;
        config.apply_env_overrides()?;

        if let Some(path) = &cli.credentials {
            config.credentials_file = Some(path.clone());
        }
        if let Some(secs) = cli.timeout {
            config.timeout_secs = secs;
        }
        if cli.no_annotate {
            config.annotate = false;
        }
        config.validate()?;
        debug!("Effective configuration: {config:?}");

        Ok(Self {
            config,
            access_token: cli.access_token.clone(),
            dry_run: cli.dry_run,
            json: cli.json,
        })
    }

    pub fn context(&self) -> ExecutionContext {
        ExecutionContext::new()
            .with_timeout(self.config.timeout())
            .with_dry_run(self.dry_run)
    }

    /// Builds the live service bundle. Credentials are read here and nowhere else.
    pub fn services(&self) -> Result<Services> {
        let http = build_http_client()?;
        let tokens = match (&self.access_token, &self.config.credentials_file) {
            (Some(token), _) => TokenSource::fixed(http.clone(), token.clone()),
            (None, Some(path)) => {
                let mut credentials = Credentials::from_file(path)?;
                if let Some(uri) = &self.config.endpoints.token {
                    credentials = credentials.with_token_uri(uri.clone());
                }
                TokenSource::new(http.clone(), credentials)
            }
            (None, None) => {
                return Err(UsageError(
                    "No credentials: pass --credentials, set SRA_CREDENTIALS, or set credentials_file in the config."
                        .to_string(),
                )
                .into())
            }
        };
        let tokens = Arc::new(tokens);

        let cloud_sql = CloudSqlClient::new(http.clone(), tokens.clone())
            .with_endpoint(self.config.endpoints.sql_admin.clone());
        let services = Services::new(Arc::new(cloud_sql));

        if !self.config.annotate {
            return Ok(services);
        }
        let scc = SecurityCenterClient::new(http, tokens)
            .with_endpoint(self.config.endpoints.security_center.clone());
        Ok(services.with_annotator(Annotator::new(Arc::new(scc)).with_prefix(self.config.mark_prefix.clone())))
    }
}

/// Runs the parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    if let Commands::Actions = cli.command {
        crate::ui::output::print_actions(&mut std::io::stdout()).context("Failed to write action list")?;
        return Ok(());
    }

    let settings = RunSettings::from_cli(&cli)?;
    match &cli.command {
        Commands::RemovePublicIp(cmd) => remediate::run_remove_public_ip(&settings, cmd).await,
        Commands::Finding(cmd) => finding::run_finding(&settings, cmd).await,
        Commands::Actions => Ok(()),
    }
}

/// Maps an error chain to the binary's exit code.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<UsageError>().is_some() {
        return EXIT_INVALID_INPUT;
    }
    match err.downcast_ref::<RemediationError>().map(RemediationError::kind) {
        Some(ErrorKind::InvalidInput) => EXIT_INVALID_INPUT,
        Some(ErrorKind::Fetch) => EXIT_FETCH_ERROR,
        Some(ErrorKind::Apply) => EXIT_APPLY_ERROR,
        _ => EXIT_FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sra_core::ServiceError;

    #[test]
    fn exit_codes_follow_error_kind() {
        let fetch: anyhow::Error = RemediationError::Fetch {
            action: "remove_public_ip",
            resource: "projects/p/instances/i".into(),
            source: ServiceError::NotFound("i".into()),
        }
        .into();
        assert_eq!(exit_code(&fetch), EXIT_FETCH_ERROR);

        let invalid: anyhow::Error = RemediationError::InvalidInput {
            action: "remove_public_ip",
            reason: "project id is empty".into(),
        }
        .into();
        assert_eq!(exit_code(&invalid.context("while running")), EXIT_INVALID_INPUT);

        assert_eq!(exit_code(&UsageError("nope".into()).into()), EXIT_INVALID_INPUT);
        assert_eq!(exit_code(&anyhow::anyhow!("disk full")), EXIT_FAILURE);
    }
}
