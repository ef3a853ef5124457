//! Surface distance estimation
//!
//! Far out, distance is the center distance minus an approximate radius.
//! Inside the refine cutoff a ray toward the target's anchor gives the real
//! surface distance; a miss falls back to the approximation.

use glam::Vec3;

use super::services::RayQuery;
use crate::tuning::LanderTuning;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceProbe {
    pub center: Vec3,
    /// Aim point for the refining ray
    pub anchor: Vec3,
    pub approx_radius: f32,
    pub refine_cutoff: f32,
}

impl DistanceProbe {
    pub fn new(center: Vec3, anchor: Vec3, approx_radius: f32, refine_cutoff: f32) -> Self {
        Self {
            center,
            anchor,
            approx_radius,
            refine_cutoff,
        }
    }

    pub fn from_tuning(tuning: &LanderTuning) -> Self {
        Self::new(
            tuning.target_center,
            tuning.target_anchor,
            tuning.approx_target_radius,
            tuning.ray_refine_cutoff,
        )
    }

    /// Center distance minus the approximate radius (never below `-approx_radius`)
    pub fn approximate(&self, position: Vec3) -> f32 {
        (self.center - position).length() - self.approx_radius
    }

    /// Best available surface distance from `position`
    pub fn distance(&self, position: Vec3, rays: &dyn RayQuery) -> f32 {
        let approx = self.approximate(position);
        if approx >= self.refine_cutoff {
            return approx;
        }
        let Some(dir) = (self.anchor - position).try_normalize() else {
            return approx;
        };
        match rays.raycast(position, dir, f32::INFINITY) {
            Some(hit) => hit.distance,
            None => {
                log::trace!("Distance ray missed, using approximation {:.1}", approx);
                approx
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::body::PointMassBody;
    use crate::sim::services::RayHit;
    use proptest::prelude::*;

    struct NoRays;

    impl RayQuery for NoRays {
        fn raycast(&self, _: Vec3, _: Vec3, _: f32) -> Option<RayHit> {
            None
        }
    }

    fn probe() -> DistanceProbe {
        let center = Vec3::new(0.0, -95000.0, 0.0);
        DistanceProbe::new(center, center, 200.0, 20000.0)
    }

    #[test]
    fn test_far_uses_approximation() {
        let p = probe();
        // A ray service that would hit is not consulted beyond the cutoff
        let rays = PointMassBody::new(1.0, 1.0, Vec3::ZERO).with_target(p.center, 150.0);
        assert_eq!(p.distance(Vec3::ZERO, &rays), 95000.0 - 200.0);
    }

    #[test]
    fn test_near_refines_with_ray() {
        let p = probe();
        let pos = Vec3::new(0.0, -85000.0, 0.0);
        let rays = PointMassBody::new(1.0, 1.0, pos).with_target(p.center, 150.0);
        let d = p.distance(pos, &rays);
        assert!((d - (10000.0 - 150.0)).abs() < 0.5);
    }

    #[test]
    fn test_miss_returns_exact_approximation() {
        let p = probe();
        let pos = Vec3::new(0.0, -85000.0, 0.0);
        assert_eq!(p.distance(pos, &NoRays), p.approximate(pos));
    }

    #[test]
    fn test_at_anchor_falls_back() {
        let p = probe();
        assert_eq!(p.distance(p.center, &NoRays), -200.0);
    }

    proptest! {
        #[test]
        fn prop_never_below_negative_radius(
            x in -100000.0f32..100000.0,
            y in -100000.0f32..100000.0,
            z in -100000.0f32..100000.0,
            hit_radius in 0.0f32..400.0,
        ) {
            let p = probe();
            let pos = Vec3::new(x, y, z);
            let rays = PointMassBody::new(1.0, 1.0, pos).with_target(p.center, hit_radius);
            prop_assert!(p.distance(pos, &rays) >= -p.approx_radius);
            prop_assert_eq!(p.distance(pos, &NoRays), p.approximate(pos));
        }
    }
}
