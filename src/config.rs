//! Configuration file handling for paytrack.
//!
//! The configuration file is stored at `$PAYTRACK_HOME/config.json` and contains the location of
//! the payments document, the exchange rate settings, backup settings and the login of the single
//! user.

use crate::backup::Backup;
use crate::error::{IntoResult, Res};
use crate::model::Currency;
use crate::{utils, Error, ErrorType, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const APP_NAME: &str = "paytrack";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const RATE_API_URL: &str = "https://api.frankfurter.dev/v1";
const RATE_CACHE_HOURS: u32 = 24;
const DEFAULT_BRANCH: &str = "main";
const DEFAULT_FILE_PATH: &str = "payments.json";
const SECRETS: &str = ".secrets";
const BACKUPS: &str = ".backups";
const CACHE: &str = ".cache";
const CONFIG_JSON: &str = "config.json";
const TOKEN_FILE: &str = "github_token";
const SESSION_JSON: &str = "session.json";
const RATES_JSON: &str = "rates.json";

/// Read when there is no token file.
pub const GITHUB_TOKEN_ENV: &str = "PAYTRACK_GITHUB_TOKEN";

/// Where the payments document lives.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_file_path")]
    pub file_path: String,
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_file_path() -> String {
    DEFAULT_FILE_PATH.to_string()
}

impl Repository {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: default_branch(),
            file_path: default_file_path(),
        }
    }
}

impl FromStr for Repository {
    type Err = String;

    /// Parses `owner/repo`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(Self::new(owner, repo))
            }
            _ => Err(format!("Expected a repository in the form owner/repo, got '{s}'")),
        }
    }
}

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$PAYTRACK_HOME` and from there it loads `$PAYTRACK_HOME/config.json`. It provides
/// paths to other items that are expected in a certain location within the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    secrets: PathBuf,
    cache: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

/// What `Config::create` needs to know that has no sensible default.
#[derive(Debug, Clone)]
pub struct NewConfig {
    pub repository: Repository,
    pub username: String,
    pub password: String,
    pub reporting_currency: Currency,
    pub local_fallback_path: Option<PathBuf>,
}

impl Config {
    /// Creates the data directory, its subdirectories and an initial `config.json`.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>, new: NewConfig) -> Result<Self> {
        Self::create_inner(dir.into(), new)
            .await
            .pub_result(ErrorType::Config)
    }

    async fn create_inner(maybe_relative: PathBuf, new: NewConfig) -> Res<Self> {
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the paytrack home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        for dir in [BACKUPS, SECRETS, CACHE] {
            utils::make_dir(&root.join(dir)).await?;
        }

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            repository: new.repository,
            username: new.username,
            password: new.password,
            reporting_currency: new.reporting_currency,
            local_fallback_path: new.local_fallback_path,
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Ok(Self::from_parts(root, config_path, config_file))
    }

    /// This will
    /// - validate that the home directory exists and that the config file exists
    /// - load the config file
    /// - validate that the backups, secrets and cache directories exist
    /// - return the loaded configuration object
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        Self::load_inner(home.into())
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_inner(maybe_relative: PathBuf) -> Res<Self> {
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The paytrack home directory is missing, run `paytrack init` first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let config = Self::from_parts(root, config_path, config_file);

        for dir in [&config.backups, &config.secrets, &config.cache] {
            if !dir.is_dir() {
                bail!("The directory '{}' is missing", dir.display())
            }
        }
        Ok(config)
    }

    fn from_parts(root: PathBuf, config_path: PathBuf, config_file: ConfigFile) -> Self {
        Self {
            backups: root.join(BACKUPS),
            secrets: root.join(SECRETS),
            cache: root.join(CACHE),
            root,
            config_path,
            config_file,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub fn cache(&self) -> &Path {
        &self.cache
    }

    pub fn repository(&self) -> &Repository {
        &self.config_file.repository
    }

    /// The path of the payments document within the repository.
    pub fn file_path(&self) -> &str {
        &self.config_file.repository.file_path
    }

    pub fn rate_api_url(&self) -> &str {
        &self.config_file.rate_api_url
    }

    pub fn rate_cache_duration(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.config_file.rate_cache_hours))
    }

    pub fn rates_cache_path(&self) -> PathBuf {
        self.cache.join(RATES_JSON)
    }

    pub fn session_path(&self) -> PathBuf {
        self.secrets.join(SESSION_JSON)
    }

    pub fn reporting_currency(&self) -> Currency {
        self.config_file.reporting_currency
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    pub fn username(&self) -> &str {
        &self.config_file.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.config_file.password
    }

    /// Creates a new `Backup` instance for managing backup files.
    pub(crate) fn backup(&self) -> Backup {
        Backup::new(self)
    }

    /// Returns the stored `token_path` if it is absolute, otherwise resolves the relative path.
    pub fn token_path(&self) -> PathBuf {
        self.resolve(self.config_file.token_path())
    }

    /// The read-only copy of the document used when GitHub cannot be reached, if configured.
    pub fn local_fallback_path(&self) -> Option<PathBuf> {
        self.config_file
            .local_fallback_path
            .clone()
            .map(|p| self.resolve(p))
    }

    /// Reads the GitHub token from the token file, or else from `PAYTRACK_GITHUB_TOKEN`. Returns
    /// `None` when neither is present.
    pub async fn github_token(&self) -> Result<Option<String>> {
        let path = self.token_path();
        if path.is_file() {
            let token = utils::read(&path).await.pub_result(ErrorType::Auth)?;
            let token = token.trim();
            if token.is_empty() {
                return Err(Error::msg(
                    ErrorType::Auth,
                    format!("The token file {} is empty", path.display()),
                ));
            }
            return Ok(Some(token.to_string()));
        }
        Ok(std::env::var(GITHUB_TOKEN_ENV)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()))
    }

    /// Checks if `p` is relative, and if so, resolves it. Returns it unchanged if it is absolute.
    fn resolve(&self, p: PathBuf) -> PathBuf {
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "paytrack",
///   "config_version": 1,
///   "owner": "acme",
///   "repo": "payments-data",
///   "branch": "main",
///   "file_path": "payments.json",
///   "rate_api_url": "https://api.frankfurter.dev/v1",
///   "rate_cache_hours": 24,
///   "reporting_currency": "EUR",
///   "backup_copies": 5,
///   "username": "admin",
///   "password": "secret",
///   "token_path": ".secrets/github_token",
///   "local_fallback_path": "data/payments.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "paytrack"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    #[serde(flatten)]
    repository: Repository,

    #[serde(default = "default_rate_api_url")]
    rate_api_url: String,

    #[serde(default = "default_rate_cache_hours")]
    rate_cache_hours: u32,

    #[serde(default = "default_reporting_currency")]
    reporting_currency: Currency,

    /// Number of backup copies to keep
    #[serde(default = "default_backup_copies")]
    backup_copies: u32,

    username: String,

    password: String,

    /// Path to the GitHub token file (optional, relative to the home directory or absolute).
    /// Defaults to $PAYTRACK_HOME/.secrets/github_token if not specified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    local_fallback_path: Option<PathBuf>,
}

fn default_rate_api_url() -> String {
    RATE_API_URL.to_string()
}

fn default_rate_cache_hours() -> u32 {
    RATE_CACHE_HOURS
}

fn default_reporting_currency() -> Currency {
    Currency::Eur
}

fn default_backup_copies() -> u32 {
    BACKUP_COPIES
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            repository: Repository::new("", ""),
            rate_api_url: default_rate_api_url(),
            rate_cache_hours: RATE_CACHE_HOURS,
            reporting_currency: default_reporting_currency(),
            backup_copies: BACKUP_COPIES,
            username: String::new(),
            password: String::new(),
            token_path: None,
            local_fallback_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or the app_name is wrong.
    async fn load(path: &Path) -> Res<Self> {
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path. It holds the password, so it is owner-only.
    async fn save(&self, path: &Path) -> Res<()> {
        utils::serialize_secret(path, self)
            .await
            .context("Unable to write config file")
    }

    /// Gets the token path. If None, defaults to $PAYTRACK_HOME/.secrets/github_token
    fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(TOKEN_FILE))
    }
}
