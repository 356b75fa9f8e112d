//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::api::{TestStore, TestStoreState};
use crate::config::{NewConfig, Repository};
use crate::model::Currency;
use crate::{session, Config};
use tempfile::TempDir;
use uuid::Uuid;

pub(crate) const USERNAME: &str = "admin";
pub(crate) const PASSWORD: &str = "test-password";

/// Test environment that sets up a paytrack home directory with a Config.
/// Holds TempDir to keep the directory alive for the duration of the test.
///
/// Each environment points at its own document path, so tests that share the in-memory remote
/// store do not see each other's documents.
pub struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a test environment with a logged-in session.
    pub async fn new() -> Self {
        let env = Self::new_logged_out().await;
        session::login(&env.config, USERNAME, PASSWORD).await.unwrap();
        env
    }

    /// Creates a test environment without a session.
    pub async fn new_logged_out() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("paytrack");

        let mut repository = Repository::new("acme", "payments-data");
        repository.file_path = format!("test/{}.json", Uuid::new_v4().simple());
        let config = Config::create(
            &root,
            NewConfig {
                repository,
                username: USERNAME.to_string(),
                password: PASSWORD.to_string(),
                reporting_currency: Currency::Eur,
                local_fallback_path: None,
            },
        )
        .await
        .unwrap();

        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Returns a clone of the Config.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    /// Gets the current state of the in-memory document associated with this environment.
    pub fn get_state(&self) -> TestStoreState {
        TestStore::get_state(self.config.file_path())
    }

    /// Sets the state of the in-memory document associated with this environment.
    pub fn set_state(&self, state: TestStoreState) {
        TestStore::set_state(self.config.file_path(), state)
    }
}
