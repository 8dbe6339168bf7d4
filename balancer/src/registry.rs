//! Bookkeeping of running shards and the connections proxied to them

use crate::error::BalancerError;
use crate::launcher::{ShardHandle, ShardLauncher};
use log::{debug, info, warn};

/// Identity of one proxied client connection.
pub type ConnectionId = u64;

/// Ports tried past a taken one before a launch gives up.
const MAX_PORT_SKIPS: u32 = 32;

struct ShardEntry {
    id: usize,
    addr: String,
    connections: Vec<ConnectionId>,
    handle: ShardHandle,
}

/// Where a connection was placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub connection: ConnectionId,
    pub shard: usize,
    pub addr: String,
}

/// Running shards and the connections placed on each, in launch order.
pub struct ShardRegistry {
    shards: Vec<ShardEntry>,
    capacity: usize,
    next_port: u16,
    next_shard: usize,
    next_connection: ConnectionId,
    launcher: ShardLauncher,
}

impl ShardRegistry {
    /// Shards are launched on consecutive ports starting at `first_port`,
    /// or on ephemeral ports when it is 0.
    pub fn new(launcher: ShardLauncher, capacity: usize, first_port: u16) -> Self {
        Self {
            shards: Vec::new(),
            capacity: capacity.max(1),
            next_port: first_port,
            next_shard: 0,
            next_connection: 1,
            launcher,
        }
    }

    /// Attaches a connection to the first live shard with room, launching a
    /// new shard when every running one is full.
    ///
    /// Shards whose process or task has stopped are dropped from the
    /// registry first, together with the connections still counted on them.
    pub async fn assign(&mut self) -> Result<Assignment, BalancerError> {
        self.prune_stopped();

        let index = match self
            .shards
            .iter()
            .position(|s| s.connections.len() < self.capacity)
        {
            Some(index) => index,
            None => self.launch().await?,
        };

        let connection = self.next_connection;
        self.next_connection += 1;

        let entry = &mut self.shards[index];
        entry.connections.push(connection);
        debug!(
            "Assigned connection {} to shard {} ({}/{})",
            connection,
            entry.id,
            entry.connections.len(),
            self.capacity
        );

        Ok(Assignment {
            connection,
            shard: entry.id,
            addr: entry.addr.clone(),
        })
    }

    fn prune_stopped(&mut self) {
        self.shards.retain_mut(|entry| {
            let running = entry.handle.is_running();
            if !running {
                warn!(
                    "Shard {} at {} stopped, dropping {} connections",
                    entry.id,
                    entry.addr,
                    entry.connections.len()
                );
            }
            running
        });
    }

    /// Launches a shard on the next free port and returns its index.
    async fn launch(&mut self) -> Result<usize, BalancerError> {
        let mut skipped = 0;
        let (addr, handle) = loop {
            let port = self.next_port;
            let launched = self.launcher.launch(port).await;
            if port != 0 {
                self.next_port = port.saturating_add(1);
            }

            match launched {
                Err(BalancerError::PortInUse(port)) if skipped < MAX_PORT_SKIPS => {
                    debug!("Port {} is taken, trying the next one", port);
                    skipped += 1;
                }
                other => break other?,
            }
        };

        let id = self.next_shard;
        self.next_shard += 1;
        self.shards.push(ShardEntry {
            id,
            addr,
            connections: Vec::new(),
            handle,
        });
        info!("Shard {} registered, {} running", id, self.shards.len());
        Ok(self.shards.len() - 1)
    }

    /// Removes a connection from its shard. Unknown connections and shards
    /// are ignored.
    pub fn detach(&mut self, assignment: &Assignment) {
        if let Some(entry) = self.shards.iter_mut().find(|s| s.id == assignment.shard) {
            entry.connections.retain(|&c| c != assignment.connection);
            debug!(
                "Connection {} left shard {} ({} remaining)",
                assignment.connection,
                assignment.shard,
                entry.connections.len()
            );
        }
    }

    /// Drops the shard of an assignment whose connection attempt failed, so
    /// the next assignment launches a replacement. The shard is stopped.
    pub fn discard(&mut self, assignment: &Assignment) {
        if let Some(index) = self.shards.iter().position(|s| s.id == assignment.shard) {
            let entry = self.shards.remove(index);
            warn!(
                "Discarding unreachable shard {} at {}",
                entry.id, entry.addr
            );
        }
    }

    /// Number of shards currently registered.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Connections proxied to `shard`, or `None` when it is not registered.
    pub fn connections(&self, shard: usize) -> Option<usize> {
        self.shards
            .iter()
            .find(|s| s.id == shard)
            .map(|s| s.connections.len())
    }

    pub fn total_connections(&self) -> usize {
        self.shards.iter().map(|s| s.connections.len()).sum()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
