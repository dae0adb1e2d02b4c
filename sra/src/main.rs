// sra/src/main.rs
//! Entry point for the `sra` binary.

use std::process::ExitCode;

use clap::Parser;
use log::debug;

use sra::cli::Cli;
use sra::commands;
use sra::logger;
use sra::ui::output;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    logger::init_logger(logger::level_from_flags(cli.quiet, cli.debug));
    if let Ok(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error_msg(format!("{err:#}"));
            ExitCode::from(commands::exit_code(&err))
        }
    }
}
