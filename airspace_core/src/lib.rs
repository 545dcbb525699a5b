//! Airspace Core - shared aircraft state, motion and conflict detection
//!
//! This library holds everything that touches the shared aircraft table:
//! 1. **Store**: a fixed-capacity arena of aircraft records behind one lock
//! 2. **Agents**: one motion task per aircraft, consuming staged commands
//! 3. **Monitor**: pairwise live/predicted separation and collision checks
//!
//! The table layout is pinned by a single versioned [`AirspaceSchema`] so
//! that every process reading a published region agrees on capacity and
//! record format.

pub mod aircraft;
pub mod agent;
pub mod error;
pub mod events;
pub mod geometry;
pub mod monitor;
pub mod schema;
pub mod store;

// Re-export key types for convenience
pub use aircraft::{AircraftId, AircraftRecord, SlotIndex};
pub use agent::{AgentExit, AircraftAgent, TickOutcome};
pub use error::{SchemaError, StoreError};
pub use events::{AirspaceEvent, EventSink, NullSink, RecordingSink};
pub use geometry::{CollisionEnvelope, Separation, SeparationMinima};
pub use monitor::{ConflictMonitor, MonitorConfig, MonitorTotals, PairAssessment, ScanReport};
pub use schema::{AirspaceSchema, DEFAULT_CAPACITY, SCHEMA_VERSION};
pub use store::{AirspaceStore, AirspaceTable};
