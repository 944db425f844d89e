use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Where the canvas snapshot is written and restored from
    pub snapshot_path: PathBuf,
    /// Time between two snapshots
    pub snapshot_interval: Duration,
    /// Minimum time between two placements by the same user
    pub place_cooldown: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()?;
        let snapshot_path = env::var("SNAPSHOT_PATH")
            .unwrap_or_else(|_| "placesh.chunks".to_string())
            .into();
        let snapshot_interval = env::var("SNAPSHOT_INTERVAL_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map(Duration::from_secs)?;
        let place_cooldown = env::var("PLACE_COOLDOWN_MS")
            .unwrap_or_else(|_| "1000".to_string())
            .parse()
            .map(Duration::from_millis)?;

        if snapshot_interval.is_zero() {
            anyhow::bail!("SNAPSHOT_INTERVAL_SECS must be at least 1");
        }

        Ok(Self {
            host,
            port,
            snapshot_path,
            snapshot_interval,
            place_cooldown,
        })
    }
}
