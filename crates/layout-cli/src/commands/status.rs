use layout_core::Session;

use crate::commands::common::format_status_lines;
use crate::error::CliError;

pub async fn run_status(session: &Session, as_json: bool) -> Result<(), CliError> {
    let status = session.status().await?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        for line in format_status_lines(&status) {
            println!("{line}");
        }
    }
    Ok(())
}
