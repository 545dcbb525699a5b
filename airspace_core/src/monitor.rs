//! Conflict Monitor - pairwise separation, prediction and collision.
//!
//! Each scan works on a snapshot of the table, never on live records:
//!
//! ```text
//!   snapshot ──► for (i, j), i < j, both active:
//!                  live separation      ──► SeparationViolation
//!                  p + v·lookahead      ──► PredictedConflict ──► CriticalAlert
//!                  collision envelope   ──► deactivate_pair ──► Collision
//! ```
//!
//! Agents and the monitor contend for the same lock, so a scan may see a
//! pair before or after that tick's motion. The interleaving is
//! nondeterministic and detection is advisory.

use airspace_env::AirspaceContext;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::aircraft::{AircraftId, AircraftRecord, SlotIndex};
use crate::events::{AirspaceEvent, EventSink};
use crate::geometry::{CollisionEnvelope, Separation, SeparationMinima};
use crate::store::AirspaceStore;

/// Thresholds and horizons used by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Loss-of-separation box
    pub minima: SeparationMinima,

    /// Collision box
    pub collision: CollisionEnvelope,

    /// Extrapolation horizon in seconds (default: 30)
    pub lookahead_secs: f32,

    /// Predicted conflicts escalate to critical when the lookahead does
    /// not exceed this horizon (default: 120)
    pub critical_threshold_secs: f32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            minima: SeparationMinima::default(),
            collision: CollisionEnvelope::default(),
            lookahead_secs: 30.0,
            critical_threshold_secs: 120.0,
        }
    }
}

impl MonitorConfig {
    pub fn with_lookahead(mut self, secs: f32) -> Self {
        self.lookahead_secs = secs;
        self
    }

    pub fn with_critical_threshold(mut self, secs: f32) -> Self {
        self.critical_threshold_secs = secs;
        self
    }

    /// True when every predicted conflict is also critical.
    pub fn escalates_every_prediction(&self) -> bool {
        self.lookahead_secs <= self.critical_threshold_secs
    }
}

/// Everything the monitor concludes about one pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairAssessment {
    pub live: Separation,
    pub predicted: Separation,
    pub live_violation: bool,
    pub predicted_conflict: bool,
    pub critical: bool,
    pub collision: bool,
}

/// Outcome of one scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanReport {
    pub pairs_evaluated: usize,
    pub violations: Vec<(AircraftId, AircraftId)>,
    pub predicted_conflicts: Vec<(AircraftId, AircraftId)>,
    pub critical_alerts: usize,
    pub collisions: Vec<(AircraftId, AircraftId)>,
}

/// Running totals across scans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorTotals {
    pub scans: u64,
    pub pairs_evaluated: u64,
    pub violations: u64,
    pub predicted_conflicts: u64,
    pub critical_alerts: u64,
    pub collisions: u64,
}

impl MonitorTotals {
    pub fn absorb(&mut self, report: &ScanReport) {
        self.scans += 1;
        self.pairs_evaluated += report.pairs_evaluated as u64;
        self.violations += report.violations.len() as u64;
        self.predicted_conflicts += report.predicted_conflicts.len() as u64;
        self.critical_alerts += report.critical_alerts as u64;
        self.collisions += report.collisions.len() as u64;
    }
}

/// The periodic conflict scanner.
pub struct ConflictMonitor {
    store: AirspaceStore,
    sink: Arc<dyn EventSink>,
    config: MonitorConfig,
    totals: MonitorTotals,
}

impl ConflictMonitor {
    pub fn new(store: AirspaceStore, sink: Arc<dyn EventSink>, config: MonitorConfig) -> Self {
        if config.escalates_every_prediction() {
            warn!(
                lookahead = config.lookahead_secs,
                critical_threshold = config.critical_threshold_secs,
                "Lookahead is within the critical threshold: every predicted conflict escalates to critical"
            );
        }

        Self {
            store,
            sink,
            config,
            totals: MonitorTotals::default(),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn totals(&self) -> MonitorTotals {
        self.totals
    }

    /// Judges one pair of records. Pure: touches neither store nor sink.
    pub fn assess(&self, a: &AircraftRecord, b: &AircraftRecord) -> PairAssessment {
        let lookahead = self.config.lookahead_secs;

        let live = Separation::between(&a.position, &b.position);
        let predicted = Separation::between(
            &a.predicted_position(lookahead),
            &b.predicted_position(lookahead),
        );

        let predicted_conflict = self.config.minima.is_violated(&predicted);

        PairAssessment {
            live,
            predicted,
            live_violation: self.config.minima.is_violated(&live),
            predicted_conflict,
            critical: predicted_conflict && self.config.escalates_every_prediction(),
            collision: self.config.collision.contains(&live),
        }
    }

    /// Evaluates every active pair of a fresh snapshot once.
    ///
    /// An aircraft retired by a collision in this scan is skipped for
    /// the remaining pairs.
    pub fn scan(&mut self) -> ScanReport {
        let snapshot = self.store.snapshot();
        let mut retired: Vec<bool> = snapshot.iter().map(|r| !r.active).collect();
        let mut report = ScanReport::default();
        let lookahead_secs = self.config.lookahead_secs;

        for i in 0..snapshot.len() {
            for j in (i + 1)..snapshot.len() {
                if retired[i] || retired[j] {
                    continue;
                }

                let (a, b) = (&snapshot[i], &snapshot[j]);
                let assessment = self.assess(a, b);
                report.pairs_evaluated += 1;

                self.sink.emit(AirspaceEvent::PairDistance {
                    a: a.id,
                    b: b.id,
                    distance: assessment.live.distance,
                });

                if assessment.live_violation {
                    report.violations.push((a.id, b.id));
                    self.sink.emit(AirspaceEvent::SeparationViolation {
                        a: a.id,
                        b: b.id,
                        separation: assessment.live,
                    });
                }

                if assessment.predicted_conflict {
                    report.predicted_conflicts.push((a.id, b.id));
                    self.sink.emit(AirspaceEvent::PredictedConflict {
                        a: a.id,
                        b: b.id,
                        lookahead_secs,
                        separation: assessment.predicted,
                    });

                    if assessment.critical {
                        report.critical_alerts += 1;
                        self.sink.emit(AirspaceEvent::CriticalAlert {
                            a: a.id,
                            b: b.id,
                            lookahead_secs,
                        });
                    }
                }

                if assessment.collision && self.store.deactivate_pair(SlotIndex(i), SlotIndex(j)) {
                    retired[i] = true;
                    retired[j] = true;
                    report.collisions.push((a.id, b.id));
                    self.sink.emit(AirspaceEvent::Collision {
                        a: a.id,
                        b: b.id,
                        separation: assessment.live,
                    });
                }
            }
        }

        self.totals.absorb(&report);
        report
    }

    /// Scans every `period` until shutdown; returns the totals.
    pub async fn run<Ctx: AirspaceContext>(
        mut self,
        ctx: Arc<Ctx>,
        period: Duration,
        shutdown: CancellationToken,
    ) -> MonitorTotals {
        info!(
            lookahead = self.config.lookahead_secs,
            period_ms = period.as_millis() as u64,
            "Conflict monitor started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ctx.sleep(period) => {}
            }

            let report = self.scan();
            if !report.collisions.is_empty() {
                error!(collisions = report.collisions.len(), "Collisions detected this scan");
            }
            debug!(pairs = report.pairs_evaluated, "Conflict scan complete");
        }

        info!(scans = self.totals.scans, "Conflict monitor stopped");
        self.totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AircraftAgent;
    use crate::events::RecordingSink;
    use crate::schema::AirspaceSchema;
    use airspace_env::TokioContext;
    use nalgebra::Vector3;

    fn monitor_with(
        aircraft: &[(i32, [f32; 3], [f32; 3])],
        config: MonitorConfig,
    ) -> (AirspaceStore, Arc<RecordingSink>, ConflictMonitor) {
        let store = AirspaceStore::new(AirspaceSchema::with_capacity(8));
        for (id, p, v) in aircraft {
            store
                .create(AircraftId(*id), Vector3::from(*p), Vector3::from(*v))
                .unwrap();
        }
        let sink = RecordingSink::shared();
        let monitor = ConflictMonitor::new(store.clone(), sink.clone(), config);
        (store, sink, monitor)
    }

    #[test]
    fn test_assess_is_symmetric_in_distance() {
        let (store, _sink, monitor) = monitor_with(
            &[(1, [0.0, 1.0, 2.0], [1.0, 0.0, 0.0]), (2, [7.0, -3.0, 4.5], [0.0, 1.0, 0.0])],
            MonitorConfig::default(),
        );
        let records = store.snapshot();

        let ab = monitor.assess(&records[0], &records[1]);
        let ba = monitor.assess(&records[1], &records[0]);
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_violation_without_collision() {
        let (store, sink, mut monitor) = monitor_with(
            &[(1, [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]), (2, [0.0, 0.0, 0.9], [0.0, 0.0, 0.0])],
            MonitorConfig::default(),
        );

        for _ in 0..3 {
            let report = monitor.scan();
            assert_eq!(report.violations, vec![(AircraftId(1), AircraftId(2))]);
            assert!(report.collisions.is_empty());
        }

        assert_eq!(store.active_count(), 2);
        assert_eq!(sink.count_kind("separation_violation"), 3);
        assert_eq!(sink.count_kind("collision"), 0);
    }

    #[test]
    fn test_collision_retires_pair_once() {
        let (store, sink, mut monitor) = monitor_with(
            &[(1, [5.0, 0.0, 0.0], [1.0, 0.0, 0.0]), (2, [5.0, 0.0, 0.0], [-1.0, 0.0, 0.0])],
            MonitorConfig::default(),
        );

        let report = monitor.scan();
        assert_eq!(report.collisions, vec![(AircraftId(1), AircraftId(2))]);
        assert_eq!(store.active_count(), 0);

        let report = monitor.scan();
        assert_eq!(report, ScanReport::default());
        assert_eq!(sink.count_kind("collision"), 1);
        assert_eq!(monitor.totals().collisions, 1);
        assert_eq!(monitor.totals().scans, 2);
    }

    #[test]
    fn test_collided_aircraft_skipped_for_later_pairs() {
        // 1 and 2 collide; 3 sits on top of 2 but 2 is retired first
        let (store, _sink, mut monitor) = monitor_with(
            &[
                (1, [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
                (2, [0.1, 0.0, 0.0], [0.0, 0.0, 0.0]),
                (3, [0.2, 0.0, 0.0], [0.0, 0.0, 0.0]),
            ],
            MonitorConfig::default(),
        );

        let report = monitor.scan();
        assert_eq!(report.collisions, vec![(AircraftId(1), AircraftId(2))]);
        assert_eq!(report.pairs_evaluated, 1);

        let active: Vec<_> = store.snapshot().iter().map(|r| r.active).collect();
        assert_eq!(active, vec![false, false, true]);
    }

    #[test]
    fn test_predicted_conflict_without_live_alert() {
        let (_store, sink, mut monitor) = monitor_with(
            &[(1, [0.0, 0.0, 5.0], [1.0, 0.0, 0.0]), (2, [60.0, 0.0, 5.0], [-1.0, 0.0, 0.0])],
            MonitorConfig::default(),
        );

        let report = monitor.scan();
        assert!(report.violations.is_empty());
        assert_eq!(report.predicted_conflicts, vec![(AircraftId(1), AircraftId(2))]);
        assert_eq!(report.critical_alerts, 1);
        assert_eq!(sink.count_kind("predicted_conflict"), 1);
    }

    #[test]
    fn test_critical_threshold_is_independent() {
        let config = MonitorConfig::default().with_critical_threshold(10.0);
        assert!(!config.escalates_every_prediction());

        let (_store, sink, mut monitor) = monitor_with(
            &[(1, [0.0, 0.0, 5.0], [1.0, 0.0, 0.0]), (2, [60.0, 0.0, 5.0], [-1.0, 0.0, 0.0])],
            config,
        );

        let report = monitor.scan();
        assert_eq!(report.predicted_conflicts.len(), 1);
        assert_eq!(report.critical_alerts, 0);
        assert_eq!(sink.count_kind("critical_alert"), 0);
    }

    #[test]
    fn test_inactive_records_are_never_paired() {
        let (store, sink, mut monitor) = monitor_with(
            &[
                (1, [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
                (2, [50.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
                (3, [0.0, 0.0, 0.2], [0.0, 0.0, 0.0]),
            ],
            MonitorConfig::default(),
        );
        store.deactivate_pair(SlotIndex(0), SlotIndex(1));

        let report = monitor.scan();
        assert_eq!(report.pairs_evaluated, 0);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_pairs_visited_in_ascending_order() {
        let (_store, sink, mut monitor) = monitor_with(
            &[
                (30, [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
                (10, [100.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
                (20, [200.0, 0.0, 0.0], [0.0, 0.0, 0.0]),
            ],
            MonitorConfig::default(),
        );

        monitor.scan();
        let pairs: Vec<_> = sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                AirspaceEvent::PairDistance { a, b, .. } => Some((a.0, b.0)),
                _ => None,
            })
            .collect();
        assert_eq!(pairs, vec![(30, 10), (30, 20), (10, 20)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_with_agents_until_shutdown() {
        let (store, sink, monitor) = monitor_with(
            &[(1, [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]), (2, [10.0, 0.0, 0.0], [-1.0, 0.0, 0.0])],
            MonitorConfig::default(),
        );
        let ctx = TokioContext::shared();
        let shutdown = CancellationToken::new();

        let agents: Vec<_> = [(1, 0), (2, 1)]
            .into_iter()
            .map(|(id, slot)| {
                let agent = AircraftAgent::new(AircraftId(id), SlotIndex(slot), store.clone(), sink.clone());
                tokio::spawn(agent.run(ctx.clone(), Duration::from_secs(1), shutdown.clone()))
            })
            .collect();
        // Offset from the agents' ticks so every scan sees a settled tick
        let monitor = tokio::spawn(monitor.run(ctx.clone(), Duration::from_millis(500), shutdown.clone()));

        tokio::time::sleep(Duration::from_secs(20)).await;
        shutdown.cancel();

        for agent in agents {
            agent.await.unwrap();
        }
        let totals = monitor.await.unwrap();

        // Head-on at closure 2/s: both reach (5, 0, 0) at t=5
        assert_eq!(totals.collisions, 1);
        assert_eq!(store.active_count(), 0);
        assert_eq!(sink.count_kind("collision"), 1);
    }
}
