use crate::args::LoginArgs;
use crate::commands::Out;
use crate::session::{self, Session};
use crate::{Config, Result};

/// Starts a session for the configured user.
///
/// # Errors
/// - Returns an `Auth` error if the username or password does not match the configuration.
pub async fn login(config: &Config, args: &LoginArgs) -> Result<Out<Session>> {
    let session = session::login(config, args.username(), args.password()).await?;
    Ok(Out::new(
        format!("Logged in as {}", session.username()),
        session,
    ))
}

/// Ends the current session, if any.
pub async fn logout(config: &Config) -> Result<Out<()>> {
    if session::logout(config).await? {
        Ok("Logged out".into())
    } else {
        Ok("There was no session to end".into())
    }
}
