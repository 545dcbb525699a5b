//! Seeded random traffic for runs without a bootstrap file.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::bootstrap::BootstrapEntry;

/// Bounds for generated traffic.
#[derive(Debug, Clone, Copy)]
pub struct TrafficBounds {
    /// Horizontal extent: x, y in `[0, horizontal)`
    pub horizontal: f32,

    /// Altitude band: z in `[0, vertical)`
    pub vertical: f32,

    /// Maximum speed per axis
    pub max_speed: f32,
}

impl Default for TrafficBounds {
    fn default() -> Self {
        // Matches the 20×20 radar grid
        Self {
            horizontal: 20.0,
            vertical: 10.0,
            max_speed: 1.0,
        }
    }
}

/// Generates `count` aircraft with ids `1..=count`, reproducible per seed.
pub fn generate(seed: u64, count: usize, bounds: TrafficBounds) -> Vec<BootstrapEntry> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    (1..=count)
        .map(|id| {
            let position = [
                rng.gen_range(0.0..bounds.horizontal),
                rng.gen_range(0.0..bounds.horizontal),
                rng.gen_range(0.0..bounds.vertical),
            ];
            let velocity = [
                rng.gen_range(-bounds.max_speed..=bounds.max_speed),
                rng.gen_range(-bounds.max_speed..=bounds.max_speed),
                rng.gen_range(-bounds.max_speed..=bounds.max_speed) * 0.1,
            ];
            BootstrapEntry::new(id as i32, position, velocity)
        })
        .collect()
}
