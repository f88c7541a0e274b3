mod bot;
mod config;
mod database;
mod error;
mod utils;

use anyhow::Result;
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "geo_asistencia=info,poise=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        database = %config.database_url,
        utc_offset = %config.utc_offset,
        admin_role = config.admin_role_id.is_some(),
        "Configuration loaded"
    );

    // Create and start the bot
    let mut client = bot::create_bot(config).await?;

    tracing::info!("Starting Discord bot...");

    if let Err(why) = client.start().await {
        tracing::error!("Client error: {:?}", why);
    }

    Ok(())
}
