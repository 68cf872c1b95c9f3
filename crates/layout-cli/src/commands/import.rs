use std::path::Path;

use layout_core::Session;

use crate::error::CliError;

pub async fn run_import(session: &Session, file: &Path, merge: bool) -> Result<(), CliError> {
    let processed = session.import_from_path(file).await?;
    println!("Imported {processed} entries into the local store");

    if merge {
        let added = session.merge_file(file).await?;
        println!("Merged {added} new entries into history");
    }
    Ok(())
}

pub async fn run_merge(session: &Session, file: &Path) -> Result<(), CliError> {
    let added = session.merge_file(file).await?;
    println!("Merged {added} new entries into history");
    Ok(())
}

pub async fn run_reconcile(session: &Session) -> Result<(), CliError> {
    let added = session.merge_store_into_log().await?;
    println!("Merged {added} store records into history");
    Ok(())
}
