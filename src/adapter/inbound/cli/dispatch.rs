//! Global flag handling and command dispatch.

use std::path::Path;

use super::command::{Cli, Commands, ConfigCommand, MetricsCommand};
use super::output::{self, OutputConfig};
use super::{config, create, markets, metrics, resolve, run};
use crate::error::Result;
use crate::infrastructure::config::Config;

/// Load the configuration at `path`, falling back to defaults plus
/// environment when the file does not exist.
///
/// # Errors
/// Returns an error if an existing file is unreadable or invalid.
#[allow(clippy::result_large_err)]
pub fn load_config(path: &Path) -> Result<Config> {
    Config::load_or_default(path)
}

/// Apply global flags, initialize logging and run the selected command.
///
/// # Errors
/// Returns the first error any handler reports.
pub async fn execute(cli: Cli) -> Result<()> {
    output::configure(OutputConfig::new(cli.json, cli.quiet));

    // `config validate` reports its own load errors.
    if let Commands::Config(ConfigCommand::Validate) = cli.command {
        return config::execute_validate(&cli.config);
    }

    let mut config = load_config(&cli.config)?;
    match cli.verbose {
        0 if cli.quiet => config.logging.level = "warn".to_string(),
        0 => {}
        1 => config.logging.level = "debug".to_string(),
        _ => config.logging.level = "trace".to_string(),
    }
    if cli.json {
        config.logging.format = "json".to_string();
    }
    if let Err(e) = config.init_logging() {
        tracing::debug!(error = %e, "Keeping the installed tracing subscriber");
    }

    match cli.command {
        Commands::Resolve(args) => resolve::execute(&config, &args).await,
        Commands::CreateMarket(args) => create::execute(&config, &args).await,
        Commands::Run => run::execute(&config).await,
        Commands::Markets(args) => markets::execute(&config, &args).await,
        Commands::Metrics(MetricsCommand::List) => metrics::execute_list(&config).await,
        Commands::Metrics(MetricsCommand::Fetch { name }) => {
            metrics::execute_fetch(&config, &name).await
        }
        Commands::Config(ConfigCommand::Show) => config::execute_show(&cli.config, &config),
        Commands::Config(ConfigCommand::Validate) => config::execute_validate(&cli.config),
    }
}
