//! Handler for the `create-market` command.

use serde_json::json;

use crate::adapter::inbound::cli::command::CreateMarketArgs;
use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::Config;
use crate::port::inbound::operator::{CreateMarketRequest, OracleOperator};

/// Execute the create-market command.
pub async fn execute(config: &Config, args: &CreateMarketArgs) -> Result<()> {
    let operator = bootstrap::build_operator(config).await?;

    let request = CreateMarketRequest {
        title: args.title_field.clone(),
        threshold: args.threshold,
        snapshot_time: args.snapshot_time,
        metric: args.metric.clone(),
        description: args.description.clone(),
        option_a: args.option_a.clone(),
        option_b: args.option_b.clone(),
    };

    let pb = output::spinner(&format!("Creating pool {}", args.title_field));
    let created = match operator.create_market(&request).await {
        Ok(created) => {
            output::spinner_success(&pb, "Pool created");
            created
        }
        Err(e) => {
            output::spinner_fail(&pb, "Pool creation failed");
            return Err(e);
        }
    };

    let market = &created.market;
    if output::is_json() {
        output::json_output(json!({
            "command": "create-market",
            "market_id": market.id.as_str(),
            "deadline": market.deadline,
            "threshold": market.threshold,
            "metric_type": market.metric_type,
            "description": market.description,
            "option_a_label": market.option_a_label,
            "option_b_label": market.option_b_label,
            "transaction_id": created.transaction_id.as_str(),
        }));
        return Ok(());
    }

    output::field("Market", &market.id);
    output::field("Deadline", super::markets::format_deadline(market.deadline));
    output::field("Threshold", market.threshold);
    output::field("Metric", &market.metric_type);
    output::field(
        "Options",
        format!("1 = {}, 2 = {}", market.option_a_label, market.option_b_label),
    );
    if !market.description.is_empty() {
        output::field("Description", &market.description);
    }
    output::field("Transaction", output::highlight(&created.transaction_id));
    output::hint("the worker resolves it once the deadline passes");
    Ok(())
}
