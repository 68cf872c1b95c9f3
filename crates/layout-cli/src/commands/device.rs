use layout_core::Session;

use crate::cli::DeviceCommands;
use crate::error::CliError;

pub fn run_device(session: &mut Session, command: DeviceCommands) -> Result<(), CliError> {
    match command {
        DeviceCommands::Show => {
            let identity = session.identity();
            println!("{}", identity.name);
            println!("{}", identity.id);
        }
        DeviceCommands::Rename { name } => {
            if name.trim().is_empty() {
                return Err(CliError::EmptyDeviceName);
            }
            session.rename_device(&name);
            println!("Device renamed to '{}'", session.identity().name);
        }
    }
    Ok(())
}
