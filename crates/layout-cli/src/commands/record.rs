use layout_core::util::normalize_text_option;
use layout_core::Session;

use crate::commands::common::format_history_lines;
use crate::error::CliError;

pub async fn run_record(
    session: &Session,
    machine: i64,
    from: Option<String>,
    to: Option<String>,
) -> Result<(), CliError> {
    let entry = session
        .record_change(machine, normalize_text_option(from), normalize_text_option(to))
        .await?;

    for line in format_history_lines(std::slice::from_ref(&entry)) {
        println!("{line}");
    }
    Ok(())
}
