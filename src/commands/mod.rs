//! Command handlers for the paytrack CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod auth;
mod export;
mod init;
mod payments;
mod rates;
mod summary;

use crate::backup::LOADED;
use crate::rates::RateProvider;
use crate::store::RecordStore;
use crate::{session, Config, Mode, Result};
use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info, warn};

pub use auth::{login, logout};
pub use export::{export, ExportReport};
pub use init::init;
pub use payments::{add, delete, list, update};
pub use rates::{rates, RatesReport};
pub use summary::summary;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Checks the session, then loads the payments and keeps a backup of what was loaded.
async fn open_store(config: &Config, mode: Mode) -> Result<RecordStore> {
    let session = session::current(config).await?;
    debug!("Session of {} from {}", session.username(), session.login_time());

    let mut store = RecordStore::from_config(config, mode).await?;
    store.load().await?;
    match config.backup().save_json(LOADED, store.document()).await {
        Ok(path) => debug!("Saved a backup of the loaded payments to {}", path.display()),
        Err(e) => warn!("Unable to back up the loaded payments: {e:#}"),
    }
    Ok(store)
}

/// Same as `open_store`, but also hands the current rates to the store so that they are used for
/// the summary that is saved with the next change.
async fn open_store_with_rates(config: &Config, mode: Mode) -> Result<RecordStore> {
    let mut store = open_store(config, mode).await?;
    let rates = RateProvider::from_config(config, mode)?.get_rates().await;
    store.set_rates(rates);
    Ok(store)
}

/// Returns "s" unless `count` is one.
fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
