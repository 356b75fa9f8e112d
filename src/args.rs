//! These structs provide the CLI interface for the paytrack CLI.

use crate::config::Repository;
use crate::filter::FilterCriteria;
use crate::model::{Currency, InvoiceStatus, NewPayment, PaymentUpdates};
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// paytrack: A command-line tool for tracking business payments.
///
/// Payments are kept in a JSON document in a GitHub repository. Each payment has a currency, and
/// paytrack converts between currencies with daily exchange rates so that it can show what is owed
/// in a single reporting currency.
///
/// If GitHub cannot be reached, paytrack can show a local read-only copy of the document.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration files.
    ///
    /// This is the first command you should run. You need a GitHub repository that holds (or will
    /// hold) the payments document and a token that can read and write its contents. Pass the
    /// token in a file with --token-file, or set PAYTRACK_GITHUB_TOKEN.
    Init(InitArgs),
    /// Start a session. Commands that read or change payments require one.
    Login(LoginArgs),
    /// End the current session.
    Logout,
    /// Show the exchange rates in use and where they came from.
    Rates,
    /// List payments, optionally filtered.
    List(FilterArgs),
    /// Add a payment. The total debt and remaining amount are computed from the amounts.
    Add(AddArgs),
    /// Change some fields of a payment.
    Update(UpdateArgs),
    /// Delete a payment.
    Delete(DeleteArgs),
    /// Show totals per currency and in the reporting currency.
    Summary,
    /// Export payments, optionally filtered, to a CSV file.
    Export(ExportArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where paytrack configuration and caches are held. Defaults to ~/paytrack
    #[arg(long, env = "PAYTRACK_HOME", default_value_t = default_paytrack_home())]
    paytrack_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, paytrack_home: PathBuf) -> Self {
        Self {
            log_level,
            paytrack_home: paytrack_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn paytrack_home(&self) -> &DisplayPath {
        &self.paytrack_home
    }
}

/// (Not shown): Args for the `paytrack init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The GitHub repository that holds the payments document, as owner/repo.
    #[arg(long)]
    repository: Repository,

    /// The branch to read and write.
    #[arg(long, default_value = "main")]
    branch: String,

    /// The path of the payments document within the repository.
    #[arg(long, default_value = "payments.json")]
    file_path: String,

    /// The name of the single user.
    #[arg(long)]
    username: String,

    /// The password of the single user.
    #[arg(long, env = "PAYTRACK_PASSWORD", hide_env_values = true)]
    password: String,

    /// The currency that grand totals are reported in.
    #[arg(long, default_value_t = Currency::Eur)]
    reporting_currency: Currency,

    /// A read-only copy of the payments document to show when GitHub cannot be reached.
    #[arg(long)]
    local_fallback: Option<PathBuf>,

    /// A file holding the GitHub token. It will be copied into the secrets directory.
    #[arg(long)]
    token_file: Option<PathBuf>,
}

impl InitArgs {
    pub fn new(repository: Repository, username: &str, password: &str) -> Self {
        Self {
            branch: repository.branch.clone(),
            file_path: repository.file_path.clone(),
            repository,
            username: username.to_string(),
            password: password.to_string(),
            reporting_currency: Currency::Eur,
            local_fallback: None,
            token_file: None,
        }
    }

    /// The repository, with the branch and file path applied.
    pub fn repository(&self) -> Repository {
        Repository {
            branch: self.branch.clone(),
            file_path: self.file_path.clone(),
            ..self.repository.clone()
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn reporting_currency(&self) -> Currency {
        self.reporting_currency
    }

    pub fn local_fallback(&self) -> Option<&Path> {
        self.local_fallback.as_deref()
    }

    pub fn token_file(&self) -> Option<&Path> {
        self.token_file.as_deref()
    }

    pub fn with_reporting_currency(mut self, currency: Currency) -> Self {
        self.reporting_currency = currency;
        self
    }

    pub fn with_local_fallback(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_fallback = Some(path.into());
        self
    }

    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }
}

/// (Not shown): Args for the `paytrack login` command.
#[derive(Debug, Parser, Clone)]
pub struct LoginArgs {
    #[arg(long)]
    username: String,

    #[arg(long, env = "PAYTRACK_PASSWORD", hide_env_values = true)]
    password: String,
}

impl LoginArgs {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

/// Filters shared by `list` and `export`. Omitted filters match everything.
#[derive(Debug, Default, Parser, Clone)]
pub struct FilterArgs {
    /// Only payments of this project (exact match).
    #[arg(long)]
    project: Option<String>,

    /// Only payments in this currency. TL is accepted for TRY.
    #[arg(long)]
    currency: Option<Currency>,

    /// Only payments with this invoice status: invoiced or not-invoiced.
    #[arg(long)]
    status: Option<InvoiceStatus>,

    /// Only payments whose item or company name contains this text, ignoring case.
    #[arg(long)]
    search: Option<String>,
}

impl FilterArgs {
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            project: self.project.clone(),
            currency: self.currency,
            invoice_status: self.status,
            search: self.search.clone(),
        }
    }
}

impl From<FilterCriteria> for FilterArgs {
    fn from(c: FilterCriteria) -> Self {
        Self {
            project: c.project,
            currency: c.currency,
            status: c.invoice_status,
            search: c.search,
        }
    }
}

/// (Not shown): Args for the `paytrack add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// What the payment is for.
    #[arg(long)]
    item: String,

    #[arg(long, default_value = "")]
    company: String,

    #[arg(long, default_value = "")]
    service: String,

    #[arg(long, default_value = "")]
    project: String,

    /// TRY (or TL), USD, EUR or GBP.
    #[arg(long)]
    currency: Currency,

    #[arg(long, default_value_t = 0.0)]
    previous_debt: f64,

    #[arg(long, default_value_t = 0.0)]
    current_debt: f64,

    #[arg(long, default_value_t = 0.0)]
    paid: f64,

    /// invoiced or not-invoiced.
    #[arg(long, default_value_t = InvoiceStatus::NotInvoiced)]
    status: InvoiceStatus,
}

impl AddArgs {
    pub fn new_payment(&self) -> NewPayment {
        NewPayment {
            item_name: self.item.clone(),
            company_name: self.company.clone(),
            service_type: self.service.clone(),
            project_name: self.project.clone(),
            currency: self.currency,
            previous_debt: self.previous_debt,
            current_debt: self.current_debt,
            paid: self.paid,
            invoice_status: self.status,
        }
    }
}

impl From<NewPayment> for AddArgs {
    fn from(p: NewPayment) -> Self {
        Self {
            item: p.item_name,
            company: p.company_name,
            service: p.service_type,
            project: p.project_name,
            currency: p.currency,
            previous_debt: p.previous_debt,
            current_debt: p.current_debt,
            paid: p.paid,
            status: p.invoice_status,
        }
    }
}

/// (Not shown): Args for the `paytrack update` command.
#[derive(Debug, Parser, Clone)]
pub struct UpdateArgs {
    /// The id of the payment to change.
    id: u64,

    #[arg(long)]
    item: Option<String>,

    #[arg(long)]
    company: Option<String>,

    #[arg(long)]
    service: Option<String>,

    #[arg(long)]
    project: Option<String>,

    #[arg(long)]
    currency: Option<Currency>,

    #[arg(long)]
    previous_debt: Option<f64>,

    #[arg(long)]
    current_debt: Option<f64>,

    #[arg(long)]
    paid: Option<f64>,

    #[arg(long)]
    status: Option<InvoiceStatus>,

    #[arg(long)]
    document_uploaded: Option<bool>,

    #[arg(long)]
    document_url: Option<String>,
}

impl UpdateArgs {
    pub fn new(id: u64, updates: PaymentUpdates) -> Self {
        Self {
            id,
            item: updates.item_name,
            company: updates.company_name,
            service: updates.service_type,
            project: updates.project_name,
            currency: updates.currency,
            previous_debt: updates.previous_debt,
            current_debt: updates.current_debt,
            paid: updates.paid,
            status: updates.invoice_status,
            document_uploaded: updates.document_uploaded,
            document_url: updates.document_url,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// The requested changes. Derived totals are left to the caller.
    pub fn updates(&self) -> PaymentUpdates {
        PaymentUpdates {
            item_name: self.item.clone(),
            company_name: self.company.clone(),
            service_type: self.service.clone(),
            project_name: self.project.clone(),
            currency: self.currency,
            previous_debt: self.previous_debt,
            current_debt: self.current_debt,
            total_debt: None,
            paid: self.paid,
            remaining: None,
            invoice_status: self.status,
            document_uploaded: self.document_uploaded,
            document_url: self.document_url.clone(),
        }
    }
}

/// (Not shown): Args for the `paytrack delete` command.
#[derive(Debug, Parser, Clone)]
pub struct DeleteArgs {
    /// The id of the payment to delete.
    id: u64,
}

impl DeleteArgs {
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// (Not shown): Args for the `paytrack export` command.
#[derive(Debug, Parser, Clone)]
pub struct ExportArgs {
    #[clap(flatten)]
    filter: FilterArgs,

    /// Where to write the CSV file.
    #[arg(long, short)]
    output: PathBuf,
}

impl ExportArgs {
    pub fn new(filter: FilterArgs, output: impl Into<PathBuf>) -> Self {
        Self {
            filter,
            output: output.into(),
        }
    }

    pub fn filter(&self) -> &FilterArgs {
        &self.filter
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

fn default_paytrack_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("paytrack"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --paytrack-home or PAYTRACK_HOME instead of relying on the \
                default paytrack home directory. If you continue using the program right now, you \
                may have problems!",
            );
            PathBuf::from("paytrack")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
