//! Event sink that forwards airspace events to `tracing`.

use airspace_core::{AirspaceEvent, EventSink};
use tracing::{debug, error, info, warn};

/// Logs every [`AirspaceEvent`] with structured fields.
///
/// Position updates and pair distances go to `debug`, alerts to
/// `warn`/`error`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: AirspaceEvent) {
        match event {
            AirspaceEvent::CommandApplied { id, velocity } => {
                info!(
                    aircraft = %id,
                    vx = velocity.x,
                    vy = velocity.y,
                    vz = velocity.z,
                    "Aircraft received new command"
                );
            }
            AirspaceEvent::PositionUpdated { id, position } => {
                debug!(aircraft = %id, x = position.x, y = position.y, z = position.z, "Aircraft moved");
            }
            AirspaceEvent::PairDistance { a, b, distance } => {
                debug!("Distance between Aircraft {} and {}: {:.2} units", a, b, distance);
            }
            AirspaceEvent::SeparationViolation { a, b, separation } => {
                warn!(
                    vertical = separation.vertical,
                    horizontal = separation.horizontal,
                    "ALERT: Live separation violation between Aircraft {} and {}",
                    a,
                    b
                );
            }
            AirspaceEvent::PredictedConflict { a, b, lookahead_secs, .. } => {
                warn!(
                    "WARNING: Predicted safety violation in {}s between Aircraft {} and {}",
                    lookahead_secs, a, b
                );
            }
            AirspaceEvent::CriticalAlert { a, b, lookahead_secs } => {
                error!(
                    "CRITICAL ALERT: Aircraft {} and {} may collide in {}s",
                    a, b, lookahead_secs
                );
            }
            AirspaceEvent::Collision { a, b, separation } => {
                error!(
                    distance = separation.distance,
                    "COLLISION between Aircraft {} and {}",
                    a,
                    b
                );
            }
        }
    }
}
