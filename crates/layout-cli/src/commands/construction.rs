use layout_core::models::Construction;
use layout_core::Session;

use crate::cli::ConstructionCommands;
use crate::error::CliError;

pub async fn run_construction(
    session: &Session,
    command: ConstructionCommands,
) -> Result<(), CliError> {
    if !session.cloud_available() {
        return Err(CliError::RemoteNotConfigured);
    }

    match command {
        ConstructionCommands::List => {
            let mut constructions = session.constructions().await?;
            constructions.sort_by(|left, right| left.id.cmp(&right.id));
            if constructions.is_empty() {
                println!("No constructs");
            }
            for line in format_construction_lines(&constructions) {
                println!("{line}");
            }
        }
        ConstructionCommands::Save {
            id,
            name,
            color,
            new,
        } => {
            let construction = Construction {
                id,
                name,
                color,
                created_by: None,
                created_at: None,
            };
            session.save_construction(&construction, new).await?;
            println!("Saved construct {}", construction.id);
        }
        ConstructionCommands::Delete { id } => {
            session.delete_construction(&id).await?;
            println!("Deleted construct {id}");
        }
    }
    Ok(())
}

pub fn format_construction_lines(constructions: &[Construction]) -> Vec<String> {
    constructions
        .iter()
        .map(|construction| {
            format!(
                "{}  {}  {}  by {}",
                construction.id,
                construction.name,
                construction.color,
                construction.created_by.as_deref().unwrap_or("-")
            )
        })
        .collect()
}
