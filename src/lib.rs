//! # Mudforge - a text-driven world simulation engine
//!
//! Mudforge runs small multiplayer interactive-fiction worlds: locations,
//! items and creatures in a containment graph, doors with credential locks,
//! wiretappable message fan-out, and a game clock that drives deferred
//! actions and creature heartbeats.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mudforge::config::Config;
//! use mudforge::engine::queue::ConnectionId;
//! use mudforge::engine::Engine;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let mut engine = Engine::new(config)?;
//!     let conn = ConnectionId::new();
//!     let player = engine.login(conn, "mia", false)?;
//!     engine.on_command(conn, "look")?;
//!     for line in engine.drain_output(player) {
//!         println!("{line}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`world`] - The entity graph: records, containment, passage, fan-out
//! - [`engine`] - Command dispatch, the player verbs, and the engine facade
//! - [`scheduler`] - Game clock, deferred actions, and heartbeat sweeps
//! - [`snapshot`] - Whole-world persistence
//! - [`config`] - Story and server configuration
//!
//! ## Architecture
//!
//! All mutation happens on a single task that owns the [`engine::Engine`];
//! transports feed it input lines and drain player outboxes. No world lock
//! exists anywhere because nothing ever contends for the world.

pub mod config;
pub mod engine;
pub mod logutil;
pub mod scheduler;
pub mod snapshot;
pub mod world;
