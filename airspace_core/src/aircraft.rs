//! Aircraft identity and the per-slot record.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry;

/// Caller-visible aircraft identifier.
///
/// Distinct from the slot an aircraft occupies: ids come from the
/// bootstrap input or the operator, slots come from the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AircraftId(pub i32);

impl From<i32> for AircraftId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl fmt::Display for AircraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable index of a slot in the airspace table.
///
/// Slots are never compacted or reused, so a handle stays valid for the
/// whole run even after its aircraft is retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotIndex(pub usize);

impl SlotIndex {
    /// Returns the raw table index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One aircraft slot.
///
/// `position`/`velocity` are advanced only by the slot's agent,
/// `pending_command`/`requested_velocity` form the command mailbox and
/// `active` is cleared only by the conflict monitor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AircraftRecord {
    /// Caller-supplied identifier
    pub id: AircraftId,

    /// Position [x, y, z]
    pub position: Vector3<f32>,

    /// Velocity [vx, vy, vz] in units per second
    pub velocity: Vector3<f32>,

    /// False once retired by a collision; never set back
    pub active: bool,

    /// A staged velocity command awaits the agent
    pub pending_command: bool,

    /// Staged velocity, meaningful while `pending_command` is set
    pub requested_velocity: Vector3<f32>,
}

impl AircraftRecord {
    /// Creates an active record with an empty mailbox.
    pub fn new(id: AircraftId, position: Vector3<f32>, velocity: Vector3<f32>) -> Self {
        Self {
            id,
            position,
            velocity,
            active: true,
            pending_command: false,
            requested_velocity: Vector3::zeros(),
        }
    }

    /// Position linearly extrapolated `lookahead` seconds ahead.
    pub fn predicted_position(&self, lookahead: f32) -> Vector3<f32> {
        geometry::predict(&self.position, &self.velocity, lookahead)
    }

    /// Copy of this record moved to its predicted position.
    pub fn predict(&self, lookahead: f32) -> Self {
        Self {
            position: self.predicted_position(lookahead),
            ..*self
        }
    }
}
