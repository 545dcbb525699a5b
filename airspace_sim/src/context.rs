//! Simulation context implementing AirspaceContext with a virtual clock.

use airspace_env::AirspaceContext;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Simulation context backed by a manually advanced clock.
///
/// This implements `AirspaceContext` using:
/// - A virtual clock that only moves when advanced
/// - A fixed epoch so wall-clock timestamps are reproducible
/// - Simulated sleep that advances virtual time and yields
pub struct SimContext {
    /// Current virtual time (nanoseconds since simulation start)
    virtual_time_ns: Arc<Mutex<u64>>,

    /// Epoch offset (virtual time 0 maps to this wall-clock time)
    epoch: SystemTime,
}

impl SimContext {
    /// Creates a new SimContext starting at 2024-01-01 00:00:00 UTC.
    pub fn new() -> Self {
        Self::with_epoch(UNIX_EPOCH + Duration::from_secs(1704067200))
    }

    /// Creates a SimContext whose virtual time 0 maps to `epoch`.
    pub fn with_epoch(epoch: SystemTime) -> Self {
        Self {
            virtual_time_ns: Arc::new(Mutex::new(0)),
            epoch,
        }
    }

    /// Creates an Arc-wrapped context for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Advances virtual time by the given duration.
    pub fn advance_time(&self, duration: Duration) {
        let mut time = self.clock();
        *time += duration.as_nanos() as u64;
    }

    /// Returns the current virtual time in nanoseconds.
    pub fn time_ns(&self) -> u64 {
        *self.clock()
    }

    fn clock(&self) -> std::sync::MutexGuard<'_, u64> {
        self.virtual_time_ns
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SimContext {
    fn clone(&self) -> Self {
        Self {
            virtual_time_ns: Arc::clone(&self.virtual_time_ns),
            epoch: self.epoch,
        }
    }
}

#[async_trait]
impl AirspaceContext for SimContext {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.time_ns())
    }

    fn system_time(&self) -> SystemTime {
        self.epoch + self.now()
    }

    async fn sleep(&self, duration: Duration) {
        // Sleep advances virtual time; yield so other tasks get a turn
        self.advance_time(duration);
        tokio::task::yield_now().await;
    }
}
