use std::time::Duration;

use anyhow::Result;

use crate::db::DbConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub pass_interval: Duration,
    pub dev_mode: bool,
    pub database: DbConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let log_level = std::env::var("FLEET_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let pass_interval = match std::env::var("FLEET_PASS_INTERVAL_SECS") {
            Ok(secs) => Duration::from_secs(secs.parse()?),
            Err(_) => Duration::from_secs(5),
        };

        let dev_mode = std::env::var("FLEET_DEV")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        let database = DbConfig::from_env();

        Ok(Self {
            log_level,
            pass_interval,
            dev_mode,
            database,
        })
    }
}
