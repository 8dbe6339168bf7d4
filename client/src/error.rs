use shared::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("unexpected message: {0}")]
    UnexpectedMessage(String),
    #[error("disconnected by server: {0}")]
    Disconnected(String),
    #[error("connection closed")]
    ConnectionClosed,
}
