//! Simulator configuration.

use airspace_core::{AirspaceSchema, MonitorConfig};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::SimError;

/// Name of the published region when none is configured.
pub const DEFAULT_REGION_NAME: &str = "aircraft_shm";

/// Converts a seconds value into a `Duration`.
///
/// Negative, NaN, infinite and overflowing values are rejected.
pub fn secs_duration(name: &str, secs: f64) -> Result<Duration, SimError> {
    Duration::try_from_secs_f64(secs).map_err(|e| SimError::invalid_setting(name, format!("{} ({})", secs, e)))
}

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Table layout shared with every attacher
    pub schema: AirspaceSchema,

    /// Wall-clock period of each aircraft agent
    pub agent_period: Duration,

    /// Integration step applied per agent tick, in seconds
    pub time_step_secs: f32,

    /// Wall-clock period of the conflict monitor
    pub monitor_period: Duration,

    /// Period of the history logger
    pub history_period: Duration,

    /// Period of the position display and region publishing
    pub display_period: Duration,

    /// Separation thresholds and prediction horizon
    pub monitor: MonitorConfig,

    /// Where the region image is published (`None` = not published)
    pub region_path: Option<PathBuf>,

    /// Append-only history log
    pub history_path: PathBuf,

    /// Append-only operator command audit log
    pub audit_path: PathBuf,

    /// Stop on its own after this long (`None` = until interrupted)
    pub max_duration: Option<Duration>,

    /// Print the position listing every display tick
    pub print_positions: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            schema: AirspaceSchema::default(),
            agent_period: Duration::from_secs(1),
            time_step_secs: 1.0,
            monitor_period: Duration::from_secs(1),
            history_period: Duration::from_secs(20),
            display_period: Duration::from_secs(2),
            monitor: MonitorConfig::default(),
            region_path: Some(std::env::temp_dir().join(DEFAULT_REGION_NAME)),
            history_path: PathBuf::from("airspace_history.log"),
            audit_path: PathBuf::from("commands_log.txt"),
            max_duration: None,
            print_positions: true,
        }
    }
}

impl SimConfig {
    pub fn with_capacity(mut self, capacity: u16) -> Self {
        self.schema = AirspaceSchema::with_capacity(capacity);
        self
    }

    pub fn with_monitor(mut self, monitor: MonitorConfig) -> Self {
        self.monitor = monitor;
        self
    }

    /// Sets the agent and monitor period together.
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.agent_period = period;
        self.monitor_period = period;
        self
    }

    pub fn with_time_step(mut self, secs: f32) -> Self {
        self.time_step_secs = secs;
        self
    }

    pub fn with_history(mut self, path: impl Into<PathBuf>, period: Duration) -> Self {
        self.history_path = path.into();
        self.history_period = period;
        self
    }

    pub fn with_display_period(mut self, period: Duration) -> Self {
        self.display_period = period;
        self
    }

    pub fn with_region(mut self, path: Option<PathBuf>) -> Self {
        self.region_path = path;
        self
    }

    pub fn with_audit_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.audit_path = path.into();
        self
    }

    pub fn with_duration(mut self, duration: Option<Duration>) -> Self {
        self.max_duration = duration;
        self
    }

    pub fn with_print_positions(mut self, enabled: bool) -> Self {
        self.print_positions = enabled;
        self
    }
}
