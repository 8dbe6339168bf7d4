use clap::Parser;
use client::network::RemoteEnv;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{Action, DEFAULT_PORT};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Shard or load balancer to connect to
    #[arg(short = 's', long, default_value_t = format!("ws://127.0.0.1:{}", DEFAULT_PORT))]
    server: String,

    /// Number of episodes to play
    #[arg(short = 'e', long, default_value_t = 5)]
    episodes: u32,

    /// Episode length cap on the client side
    #[arg(long, default_value_t = 300)]
    max_steps: u32,

    /// Seed for the random policy
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    info!("Connecting to: {}", args.server);
    let mut env = RemoteEnv::connect(&args.server).await?;

    for episode in 1..=args.episodes {
        env.reset().await?;

        let mut episode_return = 0.0;
        let mut steps = 0;
        loop {
            let action = Action::ALL[rng.gen_range(0..Action::ALL.len())];
            let step = env.step(action).await?;
            episode_return += step.reward;
            steps += 1;

            if step.terminated || step.truncated || steps >= args.max_steps {
                break;
            }
        }

        info!(
            "Episode {}: return {:.2} after {} steps",
            episode, episode_return, steps
        );
    }

    env.close().await?;
    Ok(())
}
