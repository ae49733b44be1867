use clap::Parser;
use market_oracle::adapter::inbound::cli::{command::Cli, dispatch, output};
use tracing::error;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = dispatch::execute(cli).await {
        if e.is_fatal() {
            error!(error = %e, "Fatal error");
        }
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
