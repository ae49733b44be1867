//! Handlers for the `config` command group.

use std::path::Path;

use serde_json::json;

use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::config::Config;

fn loaded(flag: bool) -> &'static str {
    if flag {
        "loaded"
    } else {
        "not set"
    }
}

/// Execute `config show`.
pub fn execute_show(path: &Path, config: &Config) -> Result<()> {
    if output::is_json() {
        output::json_output(json!({
            "command": "config.show",
            "path": path.display().to_string(),
            "config": serde_json::to_value(config)?,
            "credential_loaded": config.ledger.credential.is_some(),
            "etherscan_key_loaded": config.metrics.etherscan_api_key.is_some(),
        }));
        return Ok(());
    }

    output::section("Effective Configuration");
    output::field(
        "File",
        if path.exists() {
            path.display().to_string()
        } else {
            format!("{} (missing, defaults)", path.display())
        },
    );
    output::field("Database", &config.database);
    output::field("Log level", &config.logging.level);

    output::section("Ledger");
    output::field("Program", &config.ledger.program_id);
    output::field("Network", &config.ledger.network);
    output::field(
        "Broadcast",
        config
            .ledger
            .broadcast_url()
            .unwrap_or_else(|| "(node URL not set)".to_string()),
    );
    output::field("Prover", &config.ledger.prover_url);
    output::field("Resolve fee", config.ledger.resolve_fee);
    output::field("Create fee", config.ledger.create_fee);
    output::field(
        "Timeout",
        format!("{}s", config.ledger.execution_timeout_secs),
    );

    output::section("Worker");
    output::field("Interval", format!("{}s", config.worker.poll_interval_secs));
    output::field("Alert after", config.worker.failure_alert_threshold);

    output::section("Secrets");
    output::field("Private key", loaded(config.ledger.credential.is_some()));
    output::field(
        "Etherscan key",
        loaded(config.metrics.etherscan_api_key.is_some()),
    );
    Ok(())
}

/// Execute `config validate`. The file must exist.
pub fn execute_validate(path: &Path) -> Result<()> {
    let config = Config::load(path)?;

    if output::is_json() {
        output::json_output(json!({
            "command": "config.validate",
            "path": path.display().to_string(),
            "valid": true,
        }));
        return Ok(());
    }

    output::success("Configuration is valid");
    output::field("Path", path.display());
    if config.ledger.credential.is_none() {
        output::warning("ORACLE_PRIVATE_KEY not set");
    }
    if config.ledger.node_url.is_none() {
        output::warning("ledger.node_url not set");
    }
    Ok(())
}
