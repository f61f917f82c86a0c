use flowcast::data::BinanceClient;
use flowcast::runner::{Runner, RunnerConfig};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("flowcast=info".parse()?))
        .init();

    tracing::info!("Starting direction signal runner...");

    let client = BinanceClient::new();
    let runner = Runner::new(client, RunnerConfig::default());
    runner.run().await
}
