use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;

use cli::Cli;
use crate::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("salesdemo starting up");
    debug!("API base URL: {}", settings.api_base_url);

    let cli = Cli::parse();
    cli.run(settings).await?;

    Ok(())
}
