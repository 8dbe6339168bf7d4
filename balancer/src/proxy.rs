//! Frame relay between a client and its shard

use crate::error::BalancerError;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use log::{debug, warn};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

const CONNECT_ATTEMPTS: u32 = 50;
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(100);

pub type ShardStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects to a shard, retrying while a freshly launched one starts up.
pub async fn connect_shard(addr: &str) -> Result<ShardStream, BalancerError> {
    let url = format!("ws://{}", addr);

    for attempt in 1..=CONNECT_ATTEMPTS {
        match connect_async(url.as_str()).await {
            Ok((stream, _)) => return Ok(stream),
            Err(e) => {
                debug!("Shard {} not ready (attempt {}): {}", addr, attempt, e);
                tokio::time::sleep(CONNECT_RETRY_DELAY).await;
            }
        }
    }

    warn!("Giving up on shard {}", addr);
    Err(BalancerError::ShardUnreachable(addr.to_string()))
}

/// Relays data frames both ways until either side closes, then closes both.
pub async fn relay<C>(client: C, shard: ShardStream)
where
    C: Stream<Item = Result<Message, WsError>> + Sink<Message, Error = WsError> + Send + 'static,
{
    let (client_write, client_read) = client.split();
    let (shard_write, shard_read) = shard.split();

    let mut upstream = tokio::spawn(forward(client_read, shard_write));
    let mut downstream = tokio::spawn(forward(shard_read, client_write));

    tokio::select! {
        _ = (&mut upstream) => downstream.abort(),
        _ = (&mut downstream) => upstream.abort(),
    }
}

async fn forward<R, W>(mut read: R, mut write: W)
where
    R: Stream<Item = Result<Message, WsError>> + Unpin,
    W: Sink<Message, Error = WsError> + Unpin,
{
    while let Some(Ok(message)) = read.next().await {
        let closing = message.is_close();
        if !(message.is_binary() || message.is_text() || closing) {
            continue;
        }
        if write.send(message).await.is_err() || closing {
            break;
        }
    }
    let _ = write.close().await;
}
