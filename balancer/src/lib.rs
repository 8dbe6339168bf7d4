//! # Tileman Load Balancer
//!
//! Public entry point spreading clients over shards. Each shard is an
//! independent game server. A new shard is launched once every running one
//! holds `capacity` connections.
//!
//! Every accepted client is attached to a shard under the registry lock and
//! then proxied frame by frame; the balancer never inspects game messages.
//! When either side closes, both connections are closed and the slot is
//! released.
//!
//! ## Modules
//! - `registry`: shard list and connection counts
//! - `launcher`: child-process or in-process shards
//! - `proxy`: shard connection with start-up retries and the two-way relay
//! - `network`: the listener tying the pieces together

pub mod config;
pub mod error;
pub mod launcher;
pub mod network;
pub mod proxy;
pub mod registry;
