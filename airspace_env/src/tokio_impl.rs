//! Production implementation of AirspaceContext using Tokio.

use crate::AirspaceContext;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::time::Instant;

/// Production context backed by the Tokio clock.
///
/// Monotonic time comes from `tokio::time::Instant`, so a runtime with a
/// paused clock (`start_paused = true`) drives it deterministically.
pub struct TokioContext {
    /// Start time for monotonic duration calculations
    start: Instant,
}

impl TokioContext {
    /// Creates a new TokioContext.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Creates an Arc-wrapped context for sharing across tasks.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for TokioContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AirspaceContext for TokioContext {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tokio_context_time() {
        let ctx = TokioContext::new();
        let t1 = ctx.now();
        ctx.sleep(Duration::from_millis(10)).await;
        let t2 = ctx.now();

        assert!(t2 > t1);
        assert!(t2 - t1 >= Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_context_paused_clock() {
        let ctx = TokioContext::new();
        ctx.sleep(Duration::from_secs(30)).await;

        // Paused clock auto-advances to the sleep deadline
        assert!(ctx.now() >= Duration::from_secs(30));
        assert!(ctx.now() < Duration::from_secs(31));
    }

    #[test]
    fn test_tokio_context_wall_clock() {
        let ctx = TokioContext::new();
        assert!(ctx.system_time() >= std::time::UNIX_EPOCH);
    }
}
