use thiserror::Error;

#[derive(Debug, Error)]
pub enum BalancerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("failed to launch shard: {0}")]
    ShardLaunch(String),
    #[error("port {0} is already in use")]
    PortInUse(u16),
    #[error("shard at {0} did not accept a connection")]
    ShardUnreachable(String),
}
