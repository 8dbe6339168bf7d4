use clap::Parser;
use log::info;
use server::config::ServerConfig;
use server::network::Server;
use shared::{DEFAULT_GRID_SIZE, DEFAULT_PORT, DEFAULT_VISION_RANGE};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Side length of the square grid
    #[arg(long, default_value_t = DEFAULT_GRID_SIZE)]
    grid_size: usize,
    /// Radius of each player's observation window
    #[arg(long, default_value_t = DEFAULT_VISION_RANGE)]
    vision_range: usize,
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,
    /// Server port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Milliseconds a round waits for silent clients
    #[arg(long, default_value_t = 1000)]
    round_timeout_ms: u64,
    /// Maximum number of connected players
    #[arg(short, long, default_value_t = 32)]
    max_players: usize,
    /// Seed for spawn placement
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        grid_size: args.grid_size,
        vision_range: args.vision_range,
        round_timeout: Duration::from_millis(args.round_timeout_ms),
        max_players: args.max_players,
        seed: args.seed,
    };

    let server = Server::bind(config).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
