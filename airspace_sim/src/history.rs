//! History logger - periodic append-only snapshot records.

use airspace_core::{AircraftRecord, AirspaceStore};
use airspace_env::AirspaceContext;
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SimError;

/// Appends a timestamped record of every active aircraft to a file.
#[derive(Debug, Clone)]
pub struct HistoryLogger {
    store: AirspaceStore,
    path: PathBuf,
}

impl HistoryLogger {
    pub fn new(store: AirspaceStore, path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Renders one history entry.
    pub fn format_entry(timestamp: DateTime<Local>, records: &[AircraftRecord]) -> String {
        let mut entry = format!("\nTimestamp: {}\n", timestamp.format("%a %b %e %H:%M:%S %Y"));

        for r in records.iter().filter(|r| r.active) {
            let _ = writeln!(
                entry,
                "Aircraft {} Pos({}, {}, {}) Speed({}, {}, {})",
                r.id, r.position.x, r.position.y, r.position.z, r.velocity.x, r.velocity.y, r.velocity.z
            );
        }

        entry
    }

    /// Appends one entry; returns the number of aircraft written.
    ///
    /// The snapshot is taken first so the file write happens outside
    /// the store lock.
    pub fn append(&self, timestamp: DateTime<Local>) -> Result<usize, SimError> {
        let records = self.store.snapshot();
        let logged = records.iter().filter(|r| r.active).count();
        let entry = Self::format_entry(timestamp, &records);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(entry.as_bytes())?;

        Ok(logged)
    }

    /// Appends every `period` until shutdown; returns the entry count.
    ///
    /// File writes run on the blocking pool.
    pub async fn run<Ctx: AirspaceContext>(
        self,
        ctx: Arc<Ctx>,
        period: Duration,
        shutdown: CancellationToken,
    ) -> u64 {
        info!(path = %self.path.display(), "History logger started");
        let mut entries = 0;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ctx.sleep(period) => {}
            }

            let logger = self.clone();
            let timestamp = DateTime::<Local>::from(ctx.system_time());
            match tokio::task::spawn_blocking(move || logger.append(timestamp)).await {
                Ok(Ok(logged)) => {
                    entries += 1;
                    debug!(aircraft = logged, "History entry written");
                }
                Ok(Err(e)) => warn!("History entry not written: {}", e),
                Err(e) => warn!("History writer failed: {}", e),
            }
        }

        entries
    }
}
