//! Separation geometry.
//!
//! All predicates work on plain positions so the same code judges live
//! and extrapolated states:
//! - **Separation**: 3D distance, vertical gap, horizontal gap
//! - **Minima**: the loss-of-separation box (vertical AND horizontal)
//! - **Collision envelope**: the tighter box that retires both aircraft

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Geometric separation between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Separation {
    /// Euclidean distance in 3D
    pub distance: f32,

    /// `|z1 - z2|`
    pub vertical: f32,

    /// `sqrt(dx² + dy²)`
    pub horizontal: f32,
}

impl Separation {
    /// Measures the separation between two positions.
    pub fn between(a: &Vector3<f32>, b: &Vector3<f32>) -> Self {
        let delta = a - b;
        Self {
            distance: delta.norm(),
            vertical: delta.z.abs(),
            horizontal: (delta.x * delta.x + delta.y * delta.y).sqrt(),
        }
    }
}

/// Linear extrapolation: `position + velocity * lookahead`.
pub fn predict(position: &Vector3<f32>, velocity: &Vector3<f32>, lookahead: f32) -> Vector3<f32> {
    position + velocity * lookahead
}

/// Minimum separation standard.
///
/// Violated only when both the vertical and the horizontal gap are
/// below their minimum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeparationMinima {
    pub vertical: f32,
    pub horizontal: f32,
}

impl Default for SeparationMinima {
    fn default() -> Self {
        Self {
            vertical: 1.0,
            horizontal: 3.0,
        }
    }
}

impl SeparationMinima {
    pub fn is_violated(&self, separation: &Separation) -> bool {
        separation.vertical < self.vertical && separation.horizontal < self.horizontal
    }
}

/// Proximity at which two aircraft are considered collided.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionEnvelope {
    pub distance: f32,
    pub vertical: f32,
}

impl Default for CollisionEnvelope {
    fn default() -> Self {
        Self {
            distance: 0.5,
            vertical: 0.5,
        }
    }
}

impl CollisionEnvelope {
    pub fn contains(&self, separation: &Separation) -> bool {
        separation.distance < self.distance && separation.vertical < self.vertical
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn coord() -> impl Strategy<Value = f32> {
        -10_000.0f32..10_000.0f32
    }

    fn vector() -> impl Strategy<Value = Vector3<f32>> {
        (coord(), coord(), coord()).prop_map(|(x, y, z)| Vector3::new(x, y, z))
    }

    #[test]
    fn test_separation_components() {
        let sep = Separation::between(&Vector3::new(0.0, 0.0, 0.0), &Vector3::new(3.0, 4.0, 12.0));

        assert_relative_eq!(sep.distance, 13.0);
        assert_relative_eq!(sep.vertical, 12.0);
        assert_relative_eq!(sep.horizontal, 5.0);
    }

    #[test]
    fn test_minima_need_both_gaps() {
        let minima = SeparationMinima::default();

        // Close vertically, far horizontally
        let sep = Separation::between(&Vector3::zeros(), &Vector3::new(5.0, 0.0, 0.2));
        assert!(!minima.is_violated(&sep));

        // Close horizontally, far vertically
        let sep = Separation::between(&Vector3::zeros(), &Vector3::new(1.0, 0.0, 2.0));
        assert!(!minima.is_violated(&sep));

        let sep = Separation::between(&Vector3::zeros(), &Vector3::new(1.0, 1.0, 0.9));
        assert!(minima.is_violated(&sep));
    }

    #[test]
    fn test_minima_are_strict() {
        let minima = SeparationMinima::default();
        let sep = Separation::between(&Vector3::zeros(), &Vector3::new(3.0, 0.0, 0.0));
        assert!(!minima.is_violated(&sep));
    }

    #[test]
    fn test_collision_envelope() {
        let envelope = CollisionEnvelope::default();

        let sep = Separation::between(&Vector3::zeros(), &Vector3::new(0.0, 0.0, 0.4));
        assert!(envelope.contains(&sep));

        let sep = Separation::between(&Vector3::zeros(), &Vector3::new(0.0, 0.0, 0.9));
        assert!(!envelope.contains(&sep));

        // Purely horizontal offset inside the envelope
        let sep = Separation::between(&Vector3::zeros(), &Vector3::new(0.3, 0.3, 0.0));
        assert!(envelope.contains(&sep));
    }

    #[test]
    fn test_predict_head_on() {
        let a = predict(&Vector3::new(0.0, 0.0, 5.0), &Vector3::new(1.0, 0.0, 0.0), 30.0);
        let b = predict(&Vector3::new(60.0, 0.0, 5.0), &Vector3::new(-1.0, 0.0, 0.0), 30.0);
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn prop_distance_is_symmetric(a in vector(), b in vector()) {
            let ab = Separation::between(&a, &b);
            let ba = Separation::between(&b, &a);
            prop_assert_eq!(ab, ba);
        }

        #[test]
        fn prop_zero_lookahead_is_identity(p in vector(), v in vector()) {
            prop_assert_eq!(predict(&p, &v, 0.0), p);
        }
    }
}
