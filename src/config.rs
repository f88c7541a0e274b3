use crate::utils::geolocation::DEFAULT_TIMEOUT;
use anyhow::Result;
use chrono::FixedOffset;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub database_url: String,
    pub admin_role_id: Option<String>,
    /// Offset used both for the daily partition key and for schedule wall-clock times.
    pub utc_offset: FixedOffset,
    pub geolocation_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let discord_token = env::var("DISCORD_TOKEN")
            .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN environment variable is required"))?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:asistencia.db".to_string());

        let admin_role_id = env::var("ADMIN_ROLE_ID").ok();

        let offset_hours: i32 = env::var("UTC_OFFSET_HOURS")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("UTC_OFFSET_HOURS must be an integer"))?;
        let utc_offset = parse_utc_offset(offset_hours)?;

        let timeout_secs: u64 = env::var("GEOLOCATION_TIMEOUT_SECS")
            .map(|v| v.parse())
            .unwrap_or(Ok(DEFAULT_TIMEOUT.as_secs()))
            .map_err(|_| anyhow::anyhow!("GEOLOCATION_TIMEOUT_SECS must be a positive integer"))?;

        Ok(Config {
            discord_token,
            database_url,
            admin_role_id,
            utc_offset,
            geolocation_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

pub fn parse_utc_offset(hours: i32) -> Result<FixedOffset> {
    hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| anyhow::anyhow!("UTC_OFFSET_HOURS out of range: {}", hours))
}
