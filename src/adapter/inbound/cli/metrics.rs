//! Handlers for the `metrics` command group.

use serde_json::json;

use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::Config;
use crate::port::inbound::operator::OracleOperator;

/// List registered metric types.
pub async fn execute_list(config: &Config) -> Result<()> {
    let operator = bootstrap::build_operator(config).await?;
    let names = operator.metric_names();

    if output::is_json() {
        output::json_output(json!({ "command": "metrics.list", "metrics": names }));
        return Ok(());
    }
    if output::is_quiet() {
        return Ok(());
    }

    output::section("Metric providers");
    for name in &names {
        output::note(&format!("- {name}"));
    }
    Ok(())
}

/// Take one observation from `name` and print it.
pub async fn execute_fetch(config: &Config, name: &str) -> Result<()> {
    let operator = bootstrap::build_operator(config).await?;

    let pb = output::spinner(&format!("Fetching {name}"));
    let observation = match operator.sample_metric(name).await {
        Ok(observation) => {
            output::spinner_success(&pb, "Fetched");
            observation
        }
        Err(e) => {
            output::spinner_fail(&pb, "Fetch failed");
            return Err(e);
        }
    };

    if output::is_json() {
        output::json_output(json!({
            "command": "metrics.fetch",
            "metric": observation.provider,
            "value": observation.value,
        }));
        return Ok(());
    }

    output::field("Metric", &observation.provider);
    output::field("Value", output::highlight(observation.value));
    Ok(())
}
