use layout_core::config::AppConfig;
use layout_core::Session;

use crate::cli::AuthCommands;
use crate::error::CliError;

pub fn run_auth(
    session: &mut Session,
    config: &AppConfig,
    command: AuthCommands,
) -> Result<(), CliError> {
    match command {
        AuthCommands::Login { email, password } => {
            if config.credentials.is_empty() {
                return Err(CliError::NoCredentials);
            }
            let user = session.sign_in(&config.credentials, &email, &password)?;
            println!("Signed in as {} ({})", user.name, user.email);
        }
        AuthCommands::Status => match session.signed_in_email() {
            Some(email) => println!(
                "Signed in as {email} (editor id {})",
                session.current_user().unwrap_or("-")
            ),
            None => println!("Not signed in; changes are recorded as 'unknown'"),
        },
        AuthCommands::Logout => {
            session.sign_out()?;
            println!("Signed out");
        }
    }
    Ok(())
}
