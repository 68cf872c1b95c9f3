use std::time::Duration;

use layout_core::remote::RemoteChange;
use layout_core::Session;

use crate::cli::RemoteCommands;
use crate::commands::common::format_history_lines;
use crate::error::CliError;

pub async fn run_remote(
    session: &Session,
    command: RemoteCommands,
    interval: Duration,
) -> Result<(), CliError> {
    if !session.cloud_available() {
        return Err(CliError::RemoteNotConfigured);
    }

    match command {
        RemoteCommands::Pull { limit } => {
            let added = session.pull_remote_history(limit).await?;
            println!("Merged {added} remote entries into history");
        }
        RemoteCommands::Watch => watch(session, interval).await?,
    }
    Ok(())
}

async fn watch(session: &Session, interval: Duration) -> Result<(), CliError> {
    let (mut watcher, mut changes) = session.watch_remote(interval)?;
    watcher.subscribe_all().await;
    println!("Watching remote changes every {}s (Ctrl-C to stop)", interval.as_secs());

    loop {
        tokio::select! {
            change = changes.recv() => {
                let Some(change) = change else { break };
                for line in describe_change(&change) {
                    println!("{line}");
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    watcher.cleanup();
    Ok(())
}

pub fn describe_change(change: &RemoteChange) -> Vec<String> {
    match change {
        RemoteChange::Machines(machines) => {
            vec![format!("machines changed: {} rows", machines.len())]
        }
        RemoteChange::Constructions(constructions) => {
            vec![format!("constructions changed: {} rows", constructions.len())]
        }
        RemoteChange::History(entries) => {
            let mut lines = vec![format!("history changed: {} rows", entries.len())];
            lines.extend(
                format_history_lines(entries.get(..1).unwrap_or_default())
                    .into_iter()
                    .map(|line| format!("  latest {line}")),
            );
            lines
        }
    }
}
