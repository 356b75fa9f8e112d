use crate::args::InitArgs;
use crate::commands::Out;
use crate::config::NewConfig;
use crate::error::{ErrorType, IntoResult};
use crate::{utils, Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the data directory, its subdirectories and an initial `config.json` file, and copies
/// the GitHub token file, if one was given, into the secrets directory.
///
/// # Arguments
/// - `paytrack_home` - The directory that will be the root of data directory, e.g.
///   `$HOME/paytrack`
/// - `args` - The repository, the login of the single user and the optional settings.
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(paytrack_home: &Path, args: &InitArgs) -> Result<Out<()>> {
    let config = Config::create(
        paytrack_home,
        NewConfig {
            repository: args.repository(),
            username: args.username().to_string(),
            password: args.password().to_string(),
            reporting_currency: args.reporting_currency(),
            local_fallback_path: args.local_fallback().map(Path::to_path_buf),
        },
    )
    .await?;

    if let Some(token_file) = args.token_file() {
        let token = utils::read(token_file)
            .await
            .context("Unable to read the GitHub token file")
            .pub_result(ErrorType::Config)?;
        utils::write_secret(&config.token_path(), token.trim())
            .await
            .pub_result(ErrorType::Config)?;
    }

    Ok(format!(
        "Successfully created the paytrack directory and config at {}",
        config.root().display()
    )
    .into())
}
