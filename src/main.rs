use clap::Parser;
use paytrack::args::{Args, Command};
use paytrack::{commands, Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().paytrack_home().path();

    // When PAYTRACK_IN_TEST_MODE is set and non-empty, the GitHub and exchange rate APIs are
    // replaced by in-memory stand-ins.
    let mode = Mode::from_env();

    if let Command::Init(init_args) = args.command() {
        commands::init(home, init_args).await?.print();
        return Ok(());
    }

    let config = Config::load(home).await?;
    let _: () = match args.command() {
        Command::Init(_) => {}
        Command::Login(login_args) => commands::login(&config, login_args).await?.print(),
        Command::Logout => commands::logout(&config).await?.print(),
        Command::Rates => commands::rates(&config, mode).await?.print(),
        Command::List(filter_args) => commands::list(&config, mode, filter_args).await?.print(),
        Command::Add(add_args) => commands::add(&config, mode, add_args).await?.print(),
        Command::Update(update_args) => {
            commands::update(&config, mode, update_args).await?.print()
        }
        Command::Delete(delete_args) => {
            commands::delete(&config, mode, delete_args).await?.print()
        }
        Command::Summary => commands::summary(&config, mode).await?.print(),
        Command::Export(export_args) => {
            commands::export(&config, mode, export_args).await?.print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
