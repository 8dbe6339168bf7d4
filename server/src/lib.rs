//! # Tileman Shard Library
//!
//! This library provides one authoritative shard of the territory-claiming
//! grid game. A shard owns a single game, accepts WebSocket connections and
//! advances the game in lockstep rounds driven by the actions its clients send.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Every rule decision is made here. Players leave a trail while they walk
//! outside their own territory, close a loop to claim it and die when they
//! leave the grid, when somebody steps on their trail or when they lose a
//! same-cell collision.
//!
//! ### Lockstep Rounds
//! The first action received after a tick opens a round. The next tick fires
//! once every active session has acted, or when the round timeout skips the
//! silent ones. Each tick yields a personal frame per session containing its
//! observation window, reward and termination flag.
//!
//! ### Session Management
//! Handles the lifecycle of a connection:
//! - Joining and spawning a player on a free cell
//! - Resetting into a fresh player after elimination
//! - Disconnection and release of the player's territory
//! - Refusing connections once the shard is full
//!
//! ## Architecture Design
//!
//! ### Single Owner Event Loop
//! One loop exclusively owns the game and consumes events sent by the
//! connection tasks over an mpsc channel. The round timeout is a deadline
//! polled by the same `select!`, so ticks never overlap.
//!
//! ### WebSocket Transport
//! Each binary frame carries one bincode-encoded message from the `shared`
//! crate. Malformed frames are logged and dropped without closing the
//! connection.
//!
//! ## Module Organization
//!
//! ### Grid, Player and Game (`grid`, `player`, `game`)
//! Tile ownership, per-player statistics and vision, and the per-tick update.
//!
//! ### Sessions and Coordinator (`session`, `coordinator`)
//! Per-connection flags and the round barrier that decides when a tick fires.
//!
//! ### Network Module (`network`)
//! Listener, connection reader and writer tasks, and the shard loop.
//!
//! ### Solo Environment (`solo`)
//! Steps a private single-player game directly, without a socket.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig {
//!         grid_size: 20,
//!         vision_range: 3,
//!         ..ServerConfig::default()
//!     };
//!
//!     let server = Server::bind(config).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod game;
pub mod grid;
pub mod network;
pub mod player;
pub mod session;
pub mod solo;
