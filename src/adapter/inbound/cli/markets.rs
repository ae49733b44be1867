//! Handler for the `markets` command.

use chrono::{DateTime, Utc};
use serde_json::json;
use tabled::{Table, Tabled};

use crate::adapter::inbound::cli::command::MarketsArgs;
use crate::adapter::inbound::cli::output;
use crate::domain::Market;
use crate::error::Result;
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::Config;
use crate::port::inbound::operator::OracleOperator;

#[derive(Tabled)]
struct MarketRow {
    #[tabled(rename = "Market")]
    id: String,
    #[tabled(rename = "Deadline")]
    deadline: String,
    #[tabled(rename = "Threshold")]
    threshold: f64,
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Options")]
    options: String,
    #[tabled(rename = "Staked (A/B)")]
    staked: String,
    #[tabled(rename = "Status")]
    status: String,
}

impl From<&Market> for MarketRow {
    fn from(market: &Market) -> Self {
        Self {
            id: market.id.to_string(),
            deadline: format_deadline(market.deadline),
            threshold: market.threshold,
            metric: market.metric_type.clone(),
            options: format!("{} / {}", market.option_a_label, market.option_b_label),
            staked: format!(
                "{} ({}/{})",
                market.stats.total_staked, market.stats.option_a_stakes, market.stats.option_b_stakes
            ),
            status: market.status.to_string(),
        }
    }
}

/// Render unix seconds as UTC, falling back to the raw number.
pub(crate) fn format_deadline(deadline: i64) -> String {
    DateTime::<Utc>::from_timestamp(deadline, 0)
        .map_or_else(|| deadline.to_string(), |t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

/// List pending markets, or every market with `--all`.
pub async fn execute(config: &Config, args: &MarketsArgs) -> Result<()> {
    let operator = bootstrap::build_operator(config).await?;
    let markets = operator.list_markets(args.all).await?;

    if output::is_json() {
        let markets: Vec<_> = markets
            .iter()
            .map(|m| {
                json!({
                    "id": m.id.as_str(),
                    "deadline": m.deadline,
                    "threshold": m.threshold,
                    "metric_type": m.metric_type,
                    "status": m.status.as_str(),
                    "description": m.description,
                    "option_a_label": m.option_a_label,
                    "option_b_label": m.option_b_label,
                    "total_staked": m.stats.total_staked,
                    "option_a_stakes": m.stats.option_a_stakes,
                    "option_b_stakes": m.stats.option_b_stakes,
                })
            })
            .collect();
        output::json_output(json!({ "command": "markets", "markets": markets }));
        return Ok(());
    }
    if output::is_quiet() {
        return Ok(());
    }

    output::section(if args.all { "Markets" } else { "Pending markets" });
    if markets.is_empty() {
        output::note("(none)");
        return Ok(());
    }

    let rows: Vec<MarketRow> = markets.iter().map(MarketRow::from).collect();
    output::lines(&Table::new(rows).to_string());
    Ok(())
}
