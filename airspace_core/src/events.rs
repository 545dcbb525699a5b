//! Observable events emitted by agents and the conflict monitor.

use nalgebra::Vector3;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};

use crate::aircraft::AircraftId;
use crate::geometry::Separation;

/// Something a telemetry or logging collaborator may want to see.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AirspaceEvent {
    /// An agent consumed a staged velocity command
    CommandApplied {
        id: AircraftId,
        velocity: Vector3<f32>,
    },

    /// An agent advanced its aircraft by one tick
    PositionUpdated {
        id: AircraftId,
        position: Vector3<f32>,
    },

    /// Live distance of an evaluated pair
    PairDistance {
        a: AircraftId,
        b: AircraftId,
        distance: f32,
    },

    /// Live loss of separation
    SeparationViolation {
        a: AircraftId,
        b: AircraftId,
        separation: Separation,
    },

    /// Loss of separation on extrapolated positions
    PredictedConflict {
        a: AircraftId,
        b: AircraftId,
        lookahead_secs: f32,
        separation: Separation,
    },

    /// Escalation of a predicted conflict inside the critical horizon
    CriticalAlert {
        a: AircraftId,
        b: AircraftId,
        lookahead_secs: f32,
    },

    /// Both aircraft were retired
    Collision {
        a: AircraftId,
        b: AircraftId,
        separation: Separation,
    },
}

impl AirspaceEvent {
    /// Short machine-readable name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CommandApplied { .. } => "command_applied",
            Self::PositionUpdated { .. } => "position_updated",
            Self::PairDistance { .. } => "pair_distance",
            Self::SeparationViolation { .. } => "separation_violation",
            Self::PredictedConflict { .. } => "predicted_conflict",
            Self::CriticalAlert { .. } => "critical_alert",
            Self::Collision { .. } => "collision",
        }
    }
}

/// Destination for [`AirspaceEvent`]s.
///
/// Called outside the store lock; implementations may block briefly but
/// should not call back into the store.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: AirspaceEvent);
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn emit(&self, event: AirspaceEvent) {
        (**self).emit(event)
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: AirspaceEvent) {}
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<AirspaceEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Copy of everything recorded so far.
    pub fn events(&self) -> Vec<AirspaceEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Removes and returns everything recorded so far.
    pub fn drain(&self) -> Vec<AirspaceEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of recorded events of the given kind.
    pub fn count_kind(&self, kind: &str) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.kind() == kind)
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: AirspaceEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
