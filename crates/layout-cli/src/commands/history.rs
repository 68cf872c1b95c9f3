use layout_core::history::HistoryLog;
use layout_core::Session;

use crate::commands::common::{format_history_lines, format_record_lines, recent_entries};
use crate::error::CliError;

pub async fn run_history(
    session: &Session,
    limit: usize,
    as_json: bool,
    from_store: bool,
) -> Result<(), CliError> {
    if from_store {
        let mut records = session.store().load_all().await;
        records.truncate(limit);
        if as_json {
            println!("{}", serde_json::to_string_pretty(&records)?);
        } else {
            for line in format_record_lines(&records) {
                println!("{line}");
            }
        }
        return Ok(());
    }

    let entries = recent_entries(session.log().entries().await?, limit);
    if as_json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for line in format_history_lines(&entries) {
            println!("{line}");
        }
    }
    Ok(())
}
