//! Airspace Simulator - concurrent agents, conflict monitor and radar
//!
//! This crate wires the `airspace_core` engine into a running simulation:
//! one motion task per aircraft and a conflict monitor share a single
//! [`AirspaceStore`](airspace_core::AirspaceStore), while collaborators
//! around it log history, print positions, accept operator commands and
//! publish the table for read-only radar processes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Supervisor                           │
//! │  ┌──────────┐ ┌──────────┐        ┌─────────┐ ┌───────────┐  │
//! │  │ Agent #1 │ │ Agent #2 │  ...   │ Monitor │ │ Operator  │  │
//! │  └────┬─────┘ └────┬─────┘        └────┬────┘ └─────┬─────┘  │
//! │       └────────────┴───────┬───────────┴────────────┘        │
//! │                   ┌────────▼────────┐                        │
//! │                   │  AirspaceStore  │──► History log         │
//! │                   └────────┬────────┘                        │
//! │                            │ publish (display tick)          │
//! └────────────────────────────┼─────────────────────────────────┘
//!                     ┌────────▼────────┐
//!                     │  Region image   │◄── `airspace-sim radar`
//!                     └─────────────────┘
//! ```
//!
//! Two drivers share the same agents and monitor:
//! - [`Supervisor`]: one tokio task per component, stopped by a
//!   cancellation token (the binary's `run` command)
//! - [`LockstepWorld`]: a virtual clock stepping every component in a
//!   fixed order, for reproducible scenarios (the `step` command)
//!
//! # Usage
//!
//! ```ignore
//! use airspace_sim::{bootstrap, LockstepWorld, TracingSink};
//! use airspace_core::{AirspaceStore, MonitorConfig};
//! use std::sync::Arc;
//!
//! let store = AirspaceStore::default();
//! bootstrap::load_file(&store, "aircraft_data.txt")?;
//!
//! let mut world = LockstepWorld::new(store, Arc::new(TracingSink), MonitorConfig::default());
//! let totals = world.run(60);
//! ```

pub mod bootstrap;
mod config;
mod context;
pub mod display;
mod error;
mod history;
pub mod operator;
mod region;
mod runtime;
mod summary;
mod telemetry;
pub mod traffic;
mod world;

pub use bootstrap::{BootstrapEntry, BootstrapReport};
pub use config::{secs_duration, SimConfig, DEFAULT_REGION_NAME};
pub use context::SimContext;
pub use error::SimError;
pub use history::HistoryLogger;
pub use operator::{CommandAudit, OperatorConsole};
pub use region::{RegionPublisher, RegionReader};
pub use runtime::{Supervisor, TaskExit};
pub use summary::RunSummary;
pub use telemetry::TracingSink;
pub use traffic::TrafficBounds;
pub use world::LockstepWorld;
