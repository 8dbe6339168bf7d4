//! Public endpoint accepting clients and placing them on shards

use crate::config::BalancerConfig;
use crate::error::BalancerError;
use crate::launcher::ShardLauncher;
use crate::proxy::{connect_shard, relay};
use crate::registry::ShardRegistry;
use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::accept_async;

/// Public endpoint. Every accepted client is relayed to one shard for the
/// lifetime of its connection.
pub struct LoadBalancer {
    listener: TcpListener,
    registry: Arc<Mutex<ShardRegistry>>,
}

impl LoadBalancer {
    pub async fn bind(config: BalancerConfig, launcher: ShardLauncher) -> Result<Self, BalancerError> {
        let listener = TcpListener::bind(config.address()).await?;
        info!(
            "Load balancer listening on {} ({} connections per shard)",
            listener.local_addr()?,
            config.capacity
        );

        Ok(LoadBalancer {
            listener,
            registry: Arc::new(Mutex::new(ShardRegistry::new(
                launcher,
                config.capacity,
                config.first_shard_port,
            ))),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, BalancerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared handle on the shard registry, for inspection.
    pub fn registry(&self) -> Arc<Mutex<ShardRegistry>> {
        Arc::clone(&self.registry)
    }

    /// Accepts clients until the task is dropped. Each client is handled on
    /// its own task; failures are logged and end only that connection.
    pub async fn run(self) -> Result<(), BalancerError> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let registry = Arc::clone(&self.registry);
                    tokio::spawn(async move {
                        if let Err(e) = handle_client(stream, addr, registry).await {
                            warn!("Connection from {} ended: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}

/// Places one client on a shard and relays until either side closes.
///
/// A shard that cannot be reached is discarded from the registry so the
/// next client gets a fresh one.
async fn handle_client(
    stream: TcpStream,
    addr: SocketAddr,
    registry: Arc<Mutex<ShardRegistry>>,
) -> Result<(), BalancerError> {
    let client = accept_async(stream).await?;

    // attached under the lock so concurrent clients see the updated count
    let assignment = registry.lock().await.assign().await?;
    info!("Client {} assigned to shard {}", addr, assignment.shard);

    let shard = match connect_shard(&assignment.addr).await {
        Ok(shard) => shard,
        Err(e) => {
            registry.lock().await.discard(&assignment);
            return Err(e);
        }
    };
    relay(client, shard).await;

    registry.lock().await.detach(&assignment);
    info!("Client {} left shard {}", addr, assignment.shard);
    Ok(())
}
