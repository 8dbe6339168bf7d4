//! Starting new shards on demand

use crate::error::BalancerError;
use log::{error, info, warn};
use server::config::ServerConfig;
use server::network::Server;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::net::TcpListener;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// How the balancer brings up a shard.
#[derive(Debug, Clone)]
pub enum ShardLauncher {
    /// Spawns the `server` binary as a child process
    Process {
        server_bin: PathBuf,
        host: String,
        grid_size: usize,
        vision_range: usize,
    },
    /// Runs the shard on this runtime. Port 0 binds an ephemeral port.
    Embedded { config: ServerConfig },
}

/// Keeps a launched shard alive; dropping it stops the shard.
#[derive(Debug)]
pub enum ShardHandle {
    Process(Child),
    Embedded(JoinHandle<()>),
}

impl ShardHandle {
    /// Whether the shard process or task is still running.
    pub fn is_running(&mut self) -> bool {
        match self {
            ShardHandle::Process(child) => match child.try_wait() {
                Ok(None) => true,
                Ok(Some(status)) => {
                    warn!("Shard process {:?} exited with {}", child.id(), status);
                    false
                }
                Err(e) => {
                    warn!("Cannot poll shard process: {}", e);
                    false
                }
            },
            ShardHandle::Embedded(task) => !task.is_finished(),
        }
    }
}

impl Drop for ShardHandle {
    fn drop(&mut self) {
        // children are spawned with kill_on_drop
        if let ShardHandle::Embedded(task) = self {
            task.abort();
        }
    }
}

impl ShardLauncher {
    /// Starts a shard on `port` and returns the address clients connect to.
    ///
    /// Process shards fail with `PortInUse` when something already listens
    /// on the port, so the caller can move on to the next one.
    pub async fn launch(&self, port: u16) -> Result<(String, ShardHandle), BalancerError> {
        match self {
            ShardLauncher::Process {
                server_bin,
                host,
                grid_size,
                vision_range,
            } => {
                if port == 0 {
                    return Err(BalancerError::ShardLaunch(
                        "process shards need a fixed port".to_string(),
                    ));
                }
                if TcpListener::bind((host.as_str(), port)).await.is_err() {
                    return Err(BalancerError::PortInUse(port));
                }

                let child = Command::new(server_bin)
                    .arg("--grid-size")
                    .arg(grid_size.to_string())
                    .arg("--vision-range")
                    .arg(vision_range.to_string())
                    .arg("--host")
                    .arg(host)
                    .arg("--port")
                    .arg(port.to_string())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .kill_on_drop(true)
                    .spawn()
                    .map_err(|e| {
                        BalancerError::ShardLaunch(format!("{}: {}", server_bin.display(), e))
                    })?;

                info!(
                    "Started shard process {:?} on {}:{}",
                    child.id(),
                    host,
                    port
                );
                Ok((format!("{}:{}", host, port), ShardHandle::Process(child)))
            }

            ShardLauncher::Embedded { config } => {
                let config = ServerConfig {
                    port,
                    ..config.clone()
                };
                let server = Server::bind(config)
                    .await
                    .map_err(|e| BalancerError::ShardLaunch(e.to_string()))?;
                let addr = server
                    .local_addr()
                    .map_err(|e| BalancerError::ShardLaunch(e.to_string()))?;

                let task = tokio::spawn(async move {
                    if let Err(e) = server.run().await {
                        error!("Embedded shard stopped: {}", e);
                    }
                });

                info!("Started embedded shard on {}", addr);
                Ok((addr.to_string(), ShardHandle::Embedded(task)))
            }
        }
    }
}
