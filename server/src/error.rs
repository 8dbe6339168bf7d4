use crate::grid::PlayerId;
use crate::session::SessionId;
use shared::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("grid {width}x{height} is too small, both sides must be at least 3")]
    GridTooSmall { width: usize, height: usize },
    #[error("no free spawn cell found")]
    GridSaturated,
    #[error("player {0:?} is not in the game")]
    UnknownPlayer(PlayerId),
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("invalid action {0}, expected an index in 0..=3")]
    UnknownAction(u8),
    #[error(transparent)]
    Game(#[from] GameError),
    #[error("server full")]
    ServerFull,
    #[error("unknown session {0}")]
    UnknownSession(SessionId),
}
