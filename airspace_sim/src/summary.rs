//! End-of-run summary.

use airspace_core::MonitorTotals;
use serde::Serialize;
use tracing::info;

/// Counters collected when a run stops.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Simulated or wall-clock seconds, depending on the context
    pub elapsed_secs: f64,

    /// Populated slots
    pub aircraft: usize,

    /// Aircraft still active at the end
    pub active: usize,

    /// Agents that ended because their aircraft was retired
    pub agents_retired: usize,

    /// Agents that ended on shutdown
    pub agents_stopped: usize,

    pub monitor: MonitorTotals,

    pub history_entries: u64,

    pub display_frames: u64,
}

impl RunSummary {
    pub fn log(&self) {
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        info!(
            "Ran {:.1}s: {} aircraft, {} still active",
            self.elapsed_secs, self.aircraft, self.active
        );
        info!(
            "Scans: {} | violations: {} | predicted: {} | critical: {} | collisions: {}",
            self.monitor.scans,
            self.monitor.violations,
            self.monitor.predicted_conflicts,
            self.monitor.critical_alerts,
            self.monitor.collisions
        );
        if self.history_entries > 0 {
            info!("History entries written: {}", self.history_entries);
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_json_fields() {
        let summary = RunSummary {
            aircraft: 3,
            active: 1,
            ..Default::default()
        };
        let json: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();

        assert_eq!(json["aircraft"], 3);
        assert_eq!(json["active"], 1);
        assert_eq!(json["monitor"]["collisions"], 0);
    }
}
