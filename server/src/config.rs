use shared::{DEFAULT_GRID_SIZE, DEFAULT_PORT, DEFAULT_VISION_RANGE};
use std::time::Duration;

/// Settings for one shard.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    /// Port 0 binds an ephemeral port
    pub port: u16,
    pub grid_size: usize,
    pub vision_range: usize,
    /// How long a round waits for silent sessions after the first action
    pub round_timeout: Duration,
    pub max_players: usize,
    /// Seed for spawn placement, random when unset
    pub seed: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            grid_size: DEFAULT_GRID_SIZE,
            vision_range: DEFAULT_VISION_RANGE,
            round_timeout: Duration::from_secs(1),
            max_players: 32,
            seed: None,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
