/// Settings for the public load balancer endpoint.
#[derive(Debug, Clone)]
pub struct BalancerConfig {
    pub host: String,
    pub port: u16,
    /// Connections per shard before a new shard is launched
    pub capacity: usize,
    /// Port of the first launched shard, later shards count upwards.
    /// 0 gives every shard an ephemeral port.
    pub first_shard_port: u16,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8765,
            capacity: 4,
            first_shard_port: 10_000,
        }
    }
}

impl BalancerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
