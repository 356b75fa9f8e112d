//! Access to the remote JSON document and its local fallback copy.
//!
//! The [`RemoteStore`] trait is the seam between the record store and wherever the document
//! lives. In `Mode::Remote` it is a file in a GitHub repository; in `Mode::Test` it is an
//! in-memory document shared by everything in the process.

mod github;
mod local;
mod test_store;

use crate::{Config, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};

pub(crate) use github::GitHubStore;
pub(crate) use local::read_local;
pub(crate) use test_store::TestStore;
#[cfg(test)]
pub(crate) use test_store::TestStoreState;

/// When this environment variable is set and non-empty, the program runs without network access.
pub const TEST_MODE_ENV: &str = "PAYTRACK_IN_TEST_MODE";

/// The token written in place of a real one when the document was loaded from the local fallback.
const LOCAL_FALLBACK_TOKEN: &str = "local-sha-placeholder";

/// Selects the implementations of the remote collaborators.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    /// GitHub and the configured exchange rate API.
    #[default]
    Remote,
    /// In-memory document and fixed exchange rates.
    Test,
}

impl Mode {
    /// Returns `Mode::Test` when `PAYTRACK_IN_TEST_MODE` is set and non-empty.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Remote,
        }
    }
}

/// An opaque value identifying the remote state that a write is based on.
#[derive(Debug, Default, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The sentinel used after a local fallback load. The remote store will reject writes that
    /// carry it.
    pub fn local_fallback() -> Self {
        Self::new(LOCAL_FALLBACK_TOKEN)
    }

    pub fn is_local_fallback(&self) -> bool {
        self.0 == LOCAL_FALLBACK_TOKEN
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for VersionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document together with the version token that must accompany the next write.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Fetched {
    pub(crate) content: Value,
    pub(crate) version_token: VersionToken,
}

/// A store that holds whole JSON documents by path and guards writes with a version token.
#[async_trait::async_trait]
pub(crate) trait RemoteStore {
    /// Fails with `ErrorType::Auth` when the credential is missing or rejected, or with
    /// `ErrorType::Request` when the path does not exist or the transport fails.
    async fn fetch(&mut self, path: &str) -> Result<Fetched>;

    /// Replaces the document at `path` if `expected` is still its current version and returns the
    /// new version. Fails with `ErrorType::Conflict` when `expected` is stale.
    async fn write(
        &mut self,
        path: &str,
        content: &Value,
        expected: &VersionToken,
    ) -> Result<VersionToken>;
}

/// Creates the `RemoteStore` for `mode`.
pub(crate) async fn remote_store(
    config: &Config,
    mode: Mode,
) -> Result<Box<dyn RemoteStore + Send>> {
    match mode {
        Mode::Remote => {
            let token = config.github_token().await?;
            Ok(Box::new(GitHubStore::new(config.repository(), token)?))
        }
        Mode::Test => Ok(Box::new(TestStore::new())),
    }
}
