//! Handler for the `run` command.

use tokio::signal;
use tracing::info;

use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::Config;

/// Run the poll loop until Ctrl-C or a storage failure.
pub async fn execute(config: &Config) -> Result<()> {
    let scheduler = bootstrap::build_scheduler(config).await?;

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Program", &config.ledger.program_id);
    output::field("Network", &config.ledger.network);
    output::field("Database", &config.database);
    output::field(
        "Interval",
        format!("{}s", config.worker.poll_interval_secs),
    );
    if config.ledger.credential.is_none() {
        output::warning("ORACLE_PRIVATE_KEY not set; due markets will not be submitted");
    }

    tokio::select! {
        result = scheduler.run() => result,
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
            Ok(())
        }
    }
}
