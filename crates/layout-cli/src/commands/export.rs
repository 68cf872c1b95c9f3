use std::path::Path;

use layout_core::Session;

use crate::error::CliError;

pub async fn run_export(session: &Session, output_dir: Option<&Path>) -> Result<(), CliError> {
    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()?,
    };

    let path = session.export_to_dir(&dir).await?;
    println!("{}", path.display());
    Ok(())
}
