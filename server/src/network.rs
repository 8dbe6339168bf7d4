//! Shard network layer handling WebSocket connections and round dispatch

use crate::config::ServerConfig;
use crate::coordinator::{Outbox, TickCoordinator};
use crate::error::ServerError;
use crate::game::Game;
use crate::session::SessionId;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{decode, encode, ClientMessage, ServerMessage};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Events sent from connection tasks to the shard loop
#[derive(Debug)]
pub enum ConnectionEvent {
    Connected {
        session: SessionId,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<Message>,
    },
    Received {
        session: SessionId,
        message: ClientMessage,
    },
    Disconnected {
        session: SessionId,
    },
}

/// One shard: a listener plus the coordinator that owns its game
pub struct Server {
    listener: TcpListener,
    coordinator: TickCoordinator,
}

impl Server {
    /// Builds the game and binds the listener. Port 0 picks an ephemeral
    /// port, see `local_addr`.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let game = Game::with_seed(config.grid_size, config.grid_size, config.seed)?;
        let listener = TcpListener::bind(config.address()).await?;
        info!(
            "Shard listening on {} ({}x{} grid, vision range {})",
            listener.local_addr()?,
            config.grid_size,
            config.grid_size,
            config.vision_range
        );

        Ok(Server {
            listener,
            coordinator: TickCoordinator::new(
                game,
                config.vision_range,
                config.round_timeout,
                config.max_players,
            ),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections and drives rounds until the event channel closes.
    pub async fn run(self) -> Result<(), ServerError> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        tokio::spawn(accept_connections(self.listener, event_tx));

        let mut shard = Shard {
            coordinator: self.coordinator,
            connections: HashMap::new(),
        };
        shard.run(event_rx).await;
        Ok(())
    }
}

async fn accept_connections(listener: TcpListener, events: mpsc::UnboundedSender<ConnectionEvent>) {
    let mut next_session: SessionId = 1;

    loop {
        let accepted = tokio::select! {
            accepted = listener.accept() => accepted,
            // shard loop is gone
            _ = events.closed() => break,
        };

        match accepted {
            Ok((stream, addr)) => {
                let session = next_session;
                next_session = next_session.wrapping_add(1);
                debug!("Accepted {} as session {}", addr, session);
                tokio::spawn(handle_connection(stream, addr, session, events.clone()));
            }
            Err(e) => {
                error!("Error accepting connection: {}", e);
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    }
}

/// Runs the reader and writer halves of one connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    session: SessionId,
    events: mpsc::UnboundedSender<ConnectionEvent>,
) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws_stream) => ws_stream,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };
    let (mut write, mut read) = ws_stream.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    if events
        .send(ConnectionEvent::Connected {
            session,
            addr,
            sender: tx,
        })
        .is_err()
    {
        return;
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let closing = matches!(message, Message::Close(_));
            if write.send(message).await.is_err() || closing {
                break;
            }
        }
        let _ = write.close().await;
    });

    let reader_events = events.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = read.next().await {
            let data = match frame {
                Ok(Message::Binary(data)) => data,
                Ok(Message::Close(_)) => break,
                Ok(Message::Text(_)) => {
                    warn!("Dropping text frame from session {}", session);
                    continue;
                }
                Ok(_) => continue,
                Err(e) => {
                    debug!("Session {} connection lost: {}", session, e);
                    break;
                }
            };

            // a Close message is forwarded too; the close frame that follows ends the loop
            match decode::<ClientMessage>(&data) {
                Ok(message) => {
                    if reader_events
                        .send(ConnectionEvent::Received { session, message })
                        .is_err()
                    {
                        break;
                    }
                }
                Err(e) => warn!("Dropping frame from session {}: {}", session, e),
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => {}
    }

    // the writer finishes once the shard loop drops this session's sender
    let _ = events.send(ConnectionEvent::Disconnected { session });
}

/// Sleeps until the running round times out, or forever when no round runs.
async fn round_timer(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Main loop state; exclusively owns the game through the coordinator.
struct Shard {
    coordinator: TickCoordinator,
    connections: HashMap<SessionId, mpsc::UnboundedSender<Message>>,
}

impl Shard {
    async fn run(&mut self, mut events: mpsc::UnboundedReceiver<ConnectionEvent>) {
        info!("Shard started");

        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Some(event) => self.handle_event(event),
                        None => break,
                    }
                }
                _ = round_timer(self.coordinator.deadline()) => {
                    let outbox = self.coordinator.time_out(Instant::now());
                    self.dispatch(outbox);
                }
            }
        }

        info!("Shard stopped");
    }

    fn handle_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Connected {
                session,
                addr,
                sender,
            } => match self.coordinator.join(session) {
                Ok(()) => {
                    info!("Session {} connected from {}", session, addr);
                    self.connections.insert(session, sender);
                }
                Err(e) => {
                    warn!("Refusing {}: {}", addr, e);
                    let reason = ServerMessage::Disconnected {
                        reason: e.to_string(),
                    };
                    if let Ok(bytes) = encode(&reason) {
                        let _ = sender.send(Message::Binary(bytes));
                    }
                    let _ = sender.send(Message::Close(None));
                }
            },

            ConnectionEvent::Received { session, message } => {
                if !self.connections.contains_key(&session) {
                    return;
                }
                self.handle_message(session, message);
            }

            ConnectionEvent::Disconnected { session } => {
                if self.connections.remove(&session).is_some() {
                    info!("Session {} disconnected", session);
                    let outbox = self.coordinator.leave(session);
                    self.dispatch(outbox);
                }
            }
        }
    }

    fn handle_message(&mut self, session: SessionId, message: ClientMessage) {
        match message {
            ClientMessage::Move(action) => {
                let outbox = self.coordinator.submit(session, action, Instant::now());
                self.dispatch(outbox);
            }
            ClientMessage::Reset => match self.coordinator.reset(session) {
                Ok(observation) => self.send(session, &ServerMessage::Reset(observation)),
                Err(e) => {
                    warn!("Reset of session {} failed: {}", session, e);
                    self.send(
                        session,
                        &ServerMessage::Disconnected {
                            reason: e.to_string(),
                        },
                    );
                }
            },
            ClientMessage::KeepAlive => debug!("Keep-alive from session {}", session),
            ClientMessage::Close => {
                // dropping the sender lets the writer close the socket
                if self.connections.remove(&session).is_some() {
                    info!("Session {} closed", session);
                    let outbox = self.coordinator.leave(session);
                    self.dispatch(outbox);
                }
            }
        }
    }

    fn dispatch(&self, outbox: Outbox) {
        for (session, message) in outbox {
            self.send(session, &message);
        }
    }

    fn send(&self, session: SessionId, message: &ServerMessage) {
        let sender = match self.connections.get(&session) {
            Some(sender) => sender,
            None => return,
        };

        match encode(message) {
            Ok(bytes) => {
                if sender.send(Message::Binary(bytes)).is_err() {
                    debug!("Session {} writer already closed", session);
                }
            }
            Err(e) => error!("Failed to encode frame for session {}: {}", session, e),
        }
    }
}
