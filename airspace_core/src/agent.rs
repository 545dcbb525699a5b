//! Aircraft Agent - one motion task per aircraft.
//!
//! Each tick, while its aircraft is active, the agent:
//! 1. Consumes a staged velocity command, if any
//! 2. Integrates `position += velocity * dt`
//! 3. Emits a position update
//!
//! ```text
//!            tick (command applied)
//!           ┌──────────────┐
//!           ▼              │
//!   ──► [ Active ] ────────┘
//!           │ ▲  tick (steady motion)
//!           │ └──────┘
//!           │ deactivate_pair (by ConflictMonitor only)
//!           ▼
//!     [ Deactivated ]   terminal, task ends
//! ```

use airspace_env::AirspaceContext;
use nalgebra::Vector3;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aircraft::{AircraftId, SlotIndex};
use crate::error::StoreError;
use crate::events::{AirspaceEvent, EventSink};
use crate::store::AirspaceStore;

/// Result of a single agent tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// The aircraft moved; `command_applied` is set when a staged
    /// command was consumed this tick
    Moved {
        position: Vector3<f32>,
        velocity: Vector3<f32>,
        command_applied: bool,
    },

    /// The aircraft is retired; nothing was written
    Deactivated,
}

/// Why an agent task finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentExit {
    /// The shutdown token was cancelled
    Shutdown,

    /// The aircraft was retired by a collision
    Deactivated,

    /// The slot disappeared from the store
    Lost,
}

/// Drives one aircraft slot.
pub struct AircraftAgent {
    id: AircraftId,
    slot: SlotIndex,
    store: AirspaceStore,
    sink: Arc<dyn EventSink>,

    /// Integration step in seconds per tick
    time_step: f32,

    tick_count: u64,
}

impl AircraftAgent {
    /// Creates an agent for `slot` with a one-second integration step.
    pub fn new(
        id: AircraftId,
        slot: SlotIndex,
        store: AirspaceStore,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            id,
            slot,
            store,
            sink,
            time_step: 1.0,
            tick_count: 0,
        }
    }

    /// Sets the integration step `dt` in seconds.
    pub fn with_time_step(mut self, dt: f32) -> Self {
        self.time_step = dt;
        self
    }

    pub fn id(&self) -> AircraftId {
        self.id
    }

    pub fn slot(&self) -> SlotIndex {
        self.slot
    }

    /// Number of ticks in which the aircraft moved.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Advances the aircraft by one tick.
    pub fn tick(&mut self) -> Result<TickOutcome, StoreError> {
        let dt = self.time_step;

        let outcome = self.store.with_aircraft(self.slot, |record| {
            if !record.active {
                return TickOutcome::Deactivated;
            }

            let command_applied = record.pending_command;
            if command_applied {
                record.velocity = record.requested_velocity;
                record.pending_command = false;
            }

            record.position += record.velocity * dt;

            TickOutcome::Moved {
                position: record.position,
                velocity: record.velocity,
                command_applied,
            }
        })?;

        if let TickOutcome::Moved {
            position,
            velocity,
            command_applied,
        } = outcome
        {
            self.tick_count += 1;
            if command_applied {
                self.sink.emit(AirspaceEvent::CommandApplied { id: self.id, velocity });
            }
            self.sink.emit(AirspaceEvent::PositionUpdated { id: self.id, position });
        }

        Ok(outcome)
    }

    /// Ticks every `period` until shutdown or retirement.
    pub async fn run<Ctx: AirspaceContext>(
        mut self,
        ctx: Arc<Ctx>,
        period: Duration,
        shutdown: CancellationToken,
    ) -> AgentExit {
        info!(aircraft = %self.id, slot = %self.slot, "Aircraft agent started");

        let exit = loop {
            tokio::select! {
                _ = shutdown.cancelled() => break AgentExit::Shutdown,
                _ = ctx.sleep(period) => {}
            }

            match self.tick() {
                Ok(TickOutcome::Moved { .. }) => {}
                Ok(TickOutcome::Deactivated) => break AgentExit::Deactivated,
                Err(e) => {
                    warn!(aircraft = %self.id, "Aircraft agent lost its slot: {}", e);
                    break AgentExit::Lost;
                }
            }
        };

        debug!(aircraft = %self.id, ticks = self.tick_count, ?exit, "Aircraft agent stopped");
        exit
    }
}
