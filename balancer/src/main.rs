use balancer::config::BalancerConfig;
use balancer::launcher::ShardLauncher;
use balancer::network::LoadBalancer;
use clap::Parser;
use log::info;
use server::config::ServerConfig;
use shared::{DEFAULT_GRID_SIZE, DEFAULT_VISION_RANGE};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to accept clients on
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Port to accept clients on
    #[arg(short, long, default_value_t = 8765)]
    port: u16,
    /// Connections per shard
    #[arg(short, long, default_value_t = 4)]
    capacity: usize,
    /// Port of the first shard
    #[arg(long, default_value_t = 10_000)]
    first_shard_port: u16,
    /// Path of the shard server binary
    #[arg(long, default_value = "server")]
    server_bin: PathBuf,
    /// Run shards inside this process instead of spawning the server binary
    #[arg(long)]
    embedded: bool,
    /// Grid side length of every shard
    #[arg(long, default_value_t = DEFAULT_GRID_SIZE)]
    grid_size: usize,
    /// Vision range of every shard
    #[arg(long, default_value_t = DEFAULT_VISION_RANGE)]
    vision_range: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    let launcher = if args.embedded {
        ShardLauncher::Embedded {
            config: ServerConfig {
                host: args.host.clone(),
                grid_size: args.grid_size,
                vision_range: args.vision_range,
                ..ServerConfig::default()
            },
        }
    } else {
        ShardLauncher::Process {
            server_bin: args.server_bin,
            host: args.host.clone(),
            grid_size: args.grid_size,
            vision_range: args.vision_range,
        }
    };

    let config = BalancerConfig {
        host: args.host,
        port: args.port,
        capacity: args.capacity,
        first_shard_port: args.first_shard_port,
    };

    let balancer = LoadBalancer::bind(config, launcher).await?;

    tokio::select! {
        result = balancer.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, stopping shards");
        }
    }

    Ok(())
}
