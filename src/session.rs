//! The login session of the single configured user.
//!
//! A session is a file in the secrets directory. Every command that touches payment data checks
//! that it exists and belongs to the configured user.

use crate::error::IntoResult;
use crate::{utils, Config, Error, ErrorType, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Session {
    token: String,
    username: String,
    login_time: DateTime<Utc>,
}

impl Session {
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn login_time(&self) -> DateTime<Utc> {
        self.login_time
    }
}

/// Checks the credentials against the configuration and starts a new session.
///
/// # Errors
/// Returns an `ErrorType::Auth` error if the username or password is wrong.
pub async fn login(config: &Config, username: &str, password: &str) -> Result<Session> {
    if username != config.username() || password != config.password() {
        return Err(Error::msg(
            ErrorType::Auth,
            "The username or password is incorrect",
        ));
    }
    let session = Session {
        token: Uuid::new_v4().simple().to_string(),
        username: username.to_string(),
        login_time: Utc::now(),
    };
    utils::serialize_secret(&config.session_path(), &session)
        .await
        .pub_result(ErrorType::Internal)?;
    debug!("Started a session for {username}");
    Ok(session)
}

/// Returns the current session.
///
/// # Errors
/// Returns an `ErrorType::Auth` error if nobody is logged in, or the session belongs to a user
/// other than the configured one.
pub async fn current(config: &Config) -> Result<Session> {
    let path = config.session_path();
    if !path.is_file() {
        return Err(Error::msg(
            ErrorType::Auth,
            "You are not logged in, run `paytrack login` first",
        ));
    }
    let session: Session = utils::deserialize(&path)
        .await
        .pub_result(ErrorType::Auth)?;
    if session.username != config.username() {
        return Err(Error::msg(
            ErrorType::Auth,
            "The session belongs to another user, run `paytrack login` again",
        ));
    }
    Ok(session)
}

/// Ends the current session. Returns `false` if there was none.
pub async fn logout(config: &Config) -> Result<bool> {
    let path = config.session_path();
    if !path.is_file() {
        return Ok(false);
    }
    utils::remove(&path).await.pub_result(ErrorType::Internal)?;
    Ok(true)
}
