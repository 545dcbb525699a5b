//! LockstepWorld - deterministic single-threaded stepping.
//!
//! Drives the same agents and monitor as the concurrent runtime, but in
//! a fixed order per tick: advance the virtual clock, tick every agent
//! in slot order, then scan. Scenario tests and the `step` command use
//! it to get reproducible results.

use airspace_core::{
    AgentExit, AircraftAgent, AirspaceStore, ConflictMonitor, EventSink, MonitorConfig,
    MonitorTotals, ScanReport, SlotIndex, TickOutcome,
};
use airspace_env::AirspaceContext;
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::secs_duration;
use crate::context::SimContext;
use crate::error::SimError;
use crate::history::HistoryLogger;
use crate::summary::RunSummary;

/// History logging on the virtual clock.
struct LockstepHistory {
    logger: HistoryLogger,
    period: Duration,
    next_due: Duration,
    entries: u64,
}

/// A store plus its agents and monitor, stepped in lockstep.
pub struct LockstepWorld {
    context: Arc<SimContext>,
    store: AirspaceStore,
    agents: Vec<AircraftAgent>,
    monitor: ConflictMonitor,
    step: Duration,
    history: Option<LockstepHistory>,
    tick_count: u64,
    agents_retired: usize,
}

impl LockstepWorld {
    /// Builds one agent per active slot currently in `store`.
    pub fn new(store: AirspaceStore, sink: Arc<dyn EventSink>, monitor: MonitorConfig) -> Self {
        let agents = store
            .snapshot()
            .iter()
            .enumerate()
            .filter(|(_, record)| record.active)
            .map(|(index, record)| {
                AircraftAgent::new(record.id, SlotIndex(index), store.clone(), sink.clone())
            })
            .collect();

        Self {
            context: SimContext::shared(),
            monitor: ConflictMonitor::new(store.clone(), sink, monitor),
            store,
            agents,
            step: Duration::from_secs(1),
            history: None,
            tick_count: 0,
            agents_retired: 0,
        }
    }

    /// Sets the integration step for every agent; the virtual clock
    /// advances by the same amount per tick.
    pub fn with_time_step(mut self, dt: f32) -> Result<Self, SimError> {
        self.step = secs_duration("time step", f64::from(dt))?;
        self.agents = self
            .agents
            .into_iter()
            .map(|agent| agent.with_time_step(dt))
            .collect();
        Ok(self)
    }

    /// Appends a history entry every `period` of virtual time, stamped
    /// with the context's wall clock.
    pub fn with_history(mut self, logger: HistoryLogger, period: Duration) -> Self {
        self.history = Some(LockstepHistory {
            logger,
            period,
            next_due: self.context.now() + period,
            entries: 0,
        });
        self
    }

    pub fn store(&self) -> &AirspaceStore {
        &self.store
    }

    pub fn context(&self) -> &Arc<SimContext> {
        &self.context
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Agents still running.
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn totals(&self) -> MonitorTotals {
        self.monitor.totals()
    }

    /// Advances one tick and returns the scan it ended with.
    pub fn tick(&mut self) -> ScanReport {
        self.context.advance_time(self.step);

        let mut retired = 0;
        self.agents.retain_mut(|agent| match agent.tick() {
            Ok(TickOutcome::Moved { .. }) => true,
            Ok(TickOutcome::Deactivated) => {
                debug!(aircraft = %agent.id(), exit = ?AgentExit::Deactivated, "Agent finished");
                retired += 1;
                false
            }
            Err(e) => {
                warn!(aircraft = %agent.id(), "Agent dropped: {}", e);
                false
            }
        });
        self.agents_retired += retired;

        self.tick_count += 1;
        let report = self.monitor.scan();
        self.log_history();
        report
    }

    fn log_history(&mut self) {
        let now = self.context.now();
        let Some(history) = self.history.as_mut() else {
            return;
        };
        if history.period.is_zero() || now < history.next_due {
            return;
        }

        while history.next_due <= now {
            history.next_due += history.period;
        }
        let timestamp = DateTime::<Local>::from(self.context.system_time());
        match history.logger.append(timestamp) {
            Ok(_) => history.entries += 1,
            Err(e) => warn!("History entry not written: {}", e),
        }
    }

    /// Runs `ticks` ticks and returns the monitor totals.
    pub fn run(&mut self, ticks: u64) -> MonitorTotals {
        for _ in 0..ticks {
            self.tick();
        }
        self.totals()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            elapsed_secs: self.context.now().as_secs_f64(),
            aircraft: self.store.count(),
            active: self.store.active_count(),
            agents_retired: self.agents_retired,
            agents_stopped: self.agents.len(),
            monitor: self.totals(),
            history_entries: self.history.as_ref().map_or(0, |h| h.entries),
            display_frames: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airspace_core::{AircraftId, AirspaceSchema, NullSink};
    use nalgebra::Vector3;

    #[test]
    fn test_lockstep_clock_and_motion() {
        let store = AirspaceStore::new(AirspaceSchema::with_capacity(4));
        store.create(AircraftId(1), Vector3::zeros(), Vector3::new(2.0, 0.0, 0.0)).unwrap();

        let mut world = LockstepWorld::new(store, Arc::new(NullSink), MonitorConfig::default())
            .with_time_step(0.5)
            .unwrap();
        world.run(4);

        assert_eq!(world.tick_count(), 4);
        assert_eq!(world.context().now(), Duration::from_secs(2));
        assert_eq!(world.store().snapshot()[0].position, Vector3::new(4.0, 0.0, 0.0));
    }

    #[test]
    fn test_lockstep_is_reproducible() {
        let build = || {
            let store = AirspaceStore::new(AirspaceSchema::with_capacity(16));
            for entry in crate::traffic::generate(9, 12, Default::default()) {
                store.create(entry.id, entry.position, entry.velocity).unwrap();
            }
            LockstepWorld::new(store, Arc::new(NullSink), MonitorConfig::default())
        };

        let (mut a, mut b) = (build(), build());
        assert_eq!(a.run(60), b.run(60));
        assert_eq!(a.store().snapshot(), b.store().snapshot());
    }

    #[test]
    fn test_time_step_must_be_a_duration() {
        for dt in [-1.0, f32::NAN, f32::INFINITY] {
            let world = LockstepWorld::new(AirspaceStore::default(), Arc::new(NullSink), MonitorConfig::default());
            assert!(matches!(world.with_time_step(dt), Err(SimError::InvalidSetting { .. })));
        }
    }

    #[test]
    fn test_history_uses_virtual_wall_clock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.log");
        let store = AirspaceStore::new(AirspaceSchema::with_capacity(4));
        store.create(AircraftId(5), Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0)).unwrap();

        let mut world = LockstepWorld::new(store.clone(), Arc::new(NullSink), MonitorConfig::default())
            .with_history(HistoryLogger::new(store, &path), Duration::from_secs(20));
        world.run(45);

        assert_eq!(world.summary().history_entries, 2);

        // Timestamps come from the virtual clock, 20 s apart
        let first = DateTime::<Local>::from(SimContext::new().system_time() + Duration::from_secs(20));
        let second = first + chrono::Duration::seconds(20);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains(&first.format("%a %b %e %H:%M:%S %Y").to_string()));
        assert!(contents.contains(&second.format("%a %b %e %H:%M:%S %Y").to_string()));
        assert!(contents.contains("Aircraft 5 Pos(20, 0, 0)"));
        assert!(contents.contains("Aircraft 5 Pos(40, 0, 0)"));
    }
}
