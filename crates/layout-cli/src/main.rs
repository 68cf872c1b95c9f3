//! Layout CLI - machine construct history from the command line
//!
//! Records construct changes and moves their history between devices with
//! export files or the remote backend.

mod cli;
mod commands;
mod error;


use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::auth_cmd::run_auth;
use crate::commands::block::run_block;
use crate::commands::common::RuntimeContext;
use crate::commands::completions::run_completions;
use crate::commands::construction::run_construction;
use crate::commands::device::run_device;
use crate::commands::export::run_export;
use crate::commands::history::run_history;
use crate::commands::import::{run_import, run_merge, run_reconcile};
use crate::commands::record::run_record;
use crate::commands::remote::run_remote;
use crate::commands::status::run_status;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let directive = "layout=info"
        .parse()
        .map_err(|error| CliError::Config(format!("invalid log directive: {error}")))?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Commands that need no session
    match &cli.command {
        Commands::Block { machine } => {
            run_block(*machine);
            return Ok(());
        }
        Commands::Completions { shell, output } => {
            return run_completions(*shell, output.as_deref());
        }
        _ => {}
    }

    let context = RuntimeContext::resolve(cli.db_path, cli.config, cli.preferences)?;
    let mut session = context.open_session().await?;

    match cli.command {
        Commands::Export { output_dir } => run_export(&session, output_dir.as_deref()).await?,
        Commands::Import { file, merge } => run_import(&session, &file, merge).await?,
        Commands::Merge { file } => run_merge(&session, &file).await?,
        Commands::Reconcile => run_reconcile(&session).await?,
        Commands::History { limit, json, store } => {
            run_history(&session, limit, json, store).await?;
        }
        Commands::Record { machine, from, to } => run_record(&session, machine, from, to).await?,
        Commands::Status { json } => run_status(&session, json).await?,
        Commands::Device { command } => run_device(&mut session, command)?,
        Commands::Auth { command } => run_auth(&mut session, &context.config, command)?,
        Commands::Construction { command } => run_construction(&session, command).await?,
        Commands::Remote { command } => {
            run_remote(&session, command, context.config.watch_interval()).await?;
        }
        Commands::Block { .. } | Commands::Completions { .. } => {}
    }

    Ok(())
}
