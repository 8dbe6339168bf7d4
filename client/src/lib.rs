//! # Tileman Client Library
//!
//! Remote environment interface for agents playing on a shard, either
//! directly or through the load balancer. The connection speaks the same
//! bincode-over-WebSocket protocol as the server and exposes it as an
//! environment: `reset` for a fresh player, `step` for one lockstep round.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::RemoteEnv;
//! use shared::Action;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut env = RemoteEnv::connect("ws://127.0.0.1:9909").await?;
//!     let _observation = env.reset().await?;
//!
//!     loop {
//!         let step = env.step(Action::Up).await?;
//!         if step.terminated || step.truncated {
//!             break;
//!         }
//!     }
//!
//!     env.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! Rounds only advance once every connected agent has acted or the server's
//! round timeout has passed, so a slow agent delays its peers by at most that
//! timeout.

pub mod error;
pub mod network;
