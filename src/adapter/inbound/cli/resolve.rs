//! Handler for the `resolve` command.

use serde_json::json;

use crate::adapter::inbound::cli::command::ResolveArgs;
use crate::adapter::inbound::cli::output;
use crate::domain::{MarketId, WinningOption};
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::Config;
use crate::port::inbound::operator::OracleOperator;

/// Execute the resolve command.
pub async fn execute(config: &Config, args: &ResolveArgs) -> Result<()> {
    let option = WinningOption::try_from(args.winning_option)?;
    let id = MarketId::new(args.market_id.trim());
    let operator = bootstrap::build_operator(config).await?;

    let pb = output::spinner(&format!("Resolving {id} as {option}"));
    let transaction_id = match operator.resolve_market(&id, option).await {
        Ok(tx) => {
            output::spinner_success(&pb, "Resolution accepted");
            tx
        }
        Err(e) => {
            output::spinner_fail(&pb, "Resolution failed");
            return Err(e);
        }
    };

    if output::is_json() {
        output::json_output(json!({
            "command": "resolve",
            "market_id": id.as_str(),
            "winning_option": option.index(),
            "transaction_id": transaction_id.as_str(),
        }));
        return Ok(());
    }

    output::field("Market", &id);
    output::field("Option", format!("{} ({})", option.index(), option));
    output::field("Transaction", output::highlight(&transaction_id));
    Ok(())
}
