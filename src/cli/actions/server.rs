use crate::cli::{actions::Action, globals::GlobalArgs};
use crate::turnstile::new;
use anyhow::Result;
use secrecy::SecretString;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            auth_url,
            signing_key,
        } => {
            let globals = GlobalArgs::new(auth_url, SecretString::from(signing_key));

            new(port, dsn, &globals).await?;
        }
    }

    Ok(())
}
