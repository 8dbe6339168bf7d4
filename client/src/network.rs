use crate::error::ClientError;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info};
use shared::{decode, encode, Action, ClientMessage, Observation, ServerMessage, StepResult};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// Environment handle backed by a shard or load balancer connection.
///
/// The server spawns a player as soon as the connection is accepted, so
/// `step` may be called right away. After a terminated frame the player is
/// gone until `reset` is called.
pub struct RemoteEnv {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl RemoteEnv {
    /// Opens the WebSocket connection. The server places a player right away.
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (stream, _) = connect_async(url).await?;
        info!("Connected to {}", url);
        Ok(Self { stream })
    }

    /// Replaces the current player and returns its first observation.
    pub async fn reset(&mut self) -> Result<Observation, ClientError> {
        self.send(&ClientMessage::Reset).await?;

        loop {
            match self.receive().await? {
                ServerMessage::Reset(observation) => return Ok(observation),
                ServerMessage::Tick(_) => debug!("Dropping tick frame received before reset"),
                ServerMessage::Disconnected { reason } => {
                    return Err(ClientError::Disconnected(reason))
                }
            }
        }
    }

    /// Sends one action and waits for the tick it takes part in.
    pub async fn step(&mut self, action: Action) -> Result<StepResult, ClientError> {
        self.send(&ClientMessage::Move(action)).await?;

        match self.receive().await? {
            ServerMessage::Tick(step) => Ok(step),
            ServerMessage::Disconnected { reason } => Err(ClientError::Disconnected(reason)),
            other => Err(ClientError::UnexpectedMessage(format!("{:?}", other))),
        }
    }

    /// Tells the server the connection is alive without acting this round.
    pub async fn keep_alive(&mut self) -> Result<(), ClientError> {
        self.send(&ClientMessage::KeepAlive).await
    }

    /// Announces the departure and closes the WebSocket.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.send(&ClientMessage::Close).await?;
        self.stream.close(None).await?;
        Ok(())
    }

    async fn send(&mut self, message: &ClientMessage) -> Result<(), ClientError> {
        let bytes = encode(message)?;
        self.stream.send(Message::Binary(bytes)).await?;
        Ok(())
    }

    /// Next server frame. Observations with a broken shape are rejected.
    async fn receive(&mut self) -> Result<ServerMessage, ClientError> {
        while let Some(frame) = self.stream.next().await {
            match frame? {
                Message::Binary(bytes) => {
                    let message = decode::<ServerMessage>(&bytes)?;
                    match &message {
                        ServerMessage::Reset(observation) => observation.check_shape()?,
                        ServerMessage::Tick(step) => step.observation.check_shape()?,
                        ServerMessage::Disconnected { .. } => {}
                    }
                    return Ok(message);
                }
                Message::Close(_) => return Err(ClientError::ConnectionClosed),
                _ => continue,
            }
        }
        Err(ClientError::ConnectionClosed)
    }
}
