//! Reference physics service
//!
//! A single rigid body with scalar inertia, integrated with semi-implicit
//! Euler, plus an analytic ray query against a spherical target body. It is
//! what the native binary and the tests plug into the sequencer; a real game
//! engine replaces it through the same traits.

use glam::{Quat, Vec3};

use super::services::{
    CapsuleKinematics, ForceApplier, KinematicsReadWrite, PhysicsStep, RayHit, RayQuery,
};

/// Sphere standing in for the target body in ray queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSphere {
    pub center: Vec3,
    pub radius: f32,
}

#[derive(Debug, Clone)]
pub struct PointMassBody {
    pub mass: f32,
    /// Scalar moment of inertia
    pub inertia: f32,
    pub state: CapsuleKinematics,
    /// Target used by `raycast`; `None` means every ray misses
    pub target: Option<TargetSphere>,
    /// Accumulated for the next step
    force: Vec3,
    torque: Vec3,
    accel: Vec3,
}

impl PointMassBody {
    pub fn new(mass: f32, inertia: f32, position: Vec3) -> Self {
        Self {
            mass,
            inertia,
            state: CapsuleKinematics {
                position,
                ..Default::default()
            },
            target: None,
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
            accel: Vec3::ZERO,
        }
    }

    pub fn with_target(mut self, center: Vec3, radius: f32) -> Self {
        self.target = Some(TargetSphere { center, radius });
        self
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.state.linear_velocity = velocity;
        self
    }

    pub fn with_angular_velocity(mut self, angular_velocity: Vec3) -> Self {
        self.state.angular_velocity = angular_velocity;
        self
    }

    /// Net force accumulated since the last step (for inspection)
    pub fn pending_force(&self) -> Vec3 {
        self.force
    }

    pub fn pending_torque(&self) -> Vec3 {
        self.torque
    }
}

impl ForceApplier for PointMassBody {
    fn add_force_at_position(&mut self, force: Vec3, point: Vec3) {
        self.force += force;
        self.torque += (point - self.state.position).cross(force);
    }

    fn add_velocity_change(&mut self, delta_v: Vec3) {
        self.state.linear_velocity += delta_v;
    }

    fn add_acceleration(&mut self, accel: Vec3) {
        self.accel += accel;
    }
}

impl KinematicsReadWrite for PointMassBody {
    fn kinematics(&self) -> CapsuleKinematics {
        self.state
    }

    fn set_linear_velocity(&mut self, velocity: Vec3) {
        self.state.linear_velocity = velocity;
    }

    fn set_angular_velocity(&mut self, angular_velocity: Vec3) {
        self.state.angular_velocity = angular_velocity;
    }

    fn set_orientation(&mut self, orientation: Quat) {
        self.state.orientation = orientation.normalize();
    }
}

impl RayQuery for PointMassBody {
    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let sphere = self.target?;
        // |o + t d - c|^2 = r^2 with |d| = 1
        let oc = origin - sphere.center;
        let b = oc.dot(direction);
        let c = oc.length_squared() - sphere.radius * sphere.radius;
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        let sqrt_disc = disc.sqrt();
        let mut t = -b - sqrt_disc;
        if t < 0.0 {
            // Origin inside the sphere: exit point
            t = -b + sqrt_disc;
        }
        if t < 0.0 || t > max_distance {
            return None;
        }
        Some(RayHit {
            point: origin + direction * t,
            distance: t,
        })
    }
}

impl PhysicsStep for PointMassBody {
    fn step(&mut self, dt: f32) {
        let s = &mut self.state;
        if self.mass > 0.0 {
            s.linear_velocity += self.force / self.mass * dt;
        }
        s.linear_velocity += self.accel * dt;
        s.position += s.linear_velocity * dt;

        if self.inertia > 0.0 {
            s.angular_velocity += self.torque / self.inertia * dt;
        }
        let w = s.angular_velocity;
        if w.length_squared() > 0.0 {
            let spin = Quat::from_scaled_axis(w * dt);
            s.orientation = (spin * s.orientation).normalize();
        }

        self.force = Vec3::ZERO;
        self.torque = Vec3::ZERO;
        self.accel = Vec3::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_at_offset_makes_torque() {
        let mut body = PointMassBody::new(1.0, 1.0, Vec3::ZERO);
        body.add_force_at_position(Vec3::Y, Vec3::X);
        assert_eq!(body.pending_force(), Vec3::Y);
        assert!((body.pending_torque() - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_step_integrates_and_clears() {
        let mut body = PointMassBody::new(2.0, 1.0, Vec3::ZERO);
        body.add_force_at_position(Vec3::new(4.0, 0.0, 0.0), Vec3::ZERO);
        body.add_acceleration(Vec3::new(0.0, -1.0, 0.0));
        body.step(0.5);
        // v = (4/2)*0.5 = 1 along x, -0.5 along y
        assert!((body.state.linear_velocity - Vec3::new(1.0, -0.5, 0.0)).length() < 1e-6);
        assert!((body.state.position - Vec3::new(0.5, -0.25, 0.0)).length() < 1e-6);
        assert_eq!(body.pending_force(), Vec3::ZERO);

        // Accumulators were cleared: velocity holds
        body.step(0.5);
        assert!((body.state.linear_velocity - Vec3::new(1.0, -0.5, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_velocity_change_is_immediate() {
        let mut body = PointMassBody::new(10.0, 1.0, Vec3::ZERO);
        body.add_velocity_change(Vec3::X * 3.0);
        assert_eq!(body.kinematics().linear_velocity, Vec3::X * 3.0);
    }

    #[test]
    fn test_raycast_hits_sphere_surface() {
        let body = PointMassBody::new(1.0, 1.0, Vec3::ZERO).with_target(Vec3::new(0.0, -100.0, 0.0), 10.0);
        let hit = body.raycast(Vec3::ZERO, -Vec3::Y, f32::INFINITY).unwrap();
        assert!((hit.distance - 90.0).abs() < 1e-3);
        assert!((hit.point - Vec3::new(0.0, -90.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn test_raycast_misses() {
        let body = PointMassBody::new(1.0, 1.0, Vec3::ZERO).with_target(Vec3::new(0.0, -100.0, 0.0), 10.0);
        assert!(body.raycast(Vec3::ZERO, Vec3::Y, f32::INFINITY).is_none());
        assert!(body.raycast(Vec3::ZERO, -Vec3::Y, 50.0).is_none());
        assert!(PointMassBody::new(1.0, 1.0, Vec3::ZERO)
            .raycast(Vec3::ZERO, -Vec3::Y, f32::INFINITY)
            .is_none());
    }

    #[test]
    fn test_spin_rotates_orientation() {
        let mut body = PointMassBody::new(1.0, 1.0, Vec3::ZERO)
            .with_angular_velocity(Vec3::Y * std::f32::consts::FRAC_PI_2);
        body.step(1.0);
        let fwd = body.state.orientation * Vec3::Z;
        assert!((fwd - Vec3::X).length() < 1e-4);
    }
}
