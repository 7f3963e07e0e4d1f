use crate::constants::EPSILON;
use glam::{Quat, Vec3};
use rand::Rng;

/// Rescale `v` to `max` length iff it is longer; shorter vectors pass through
/// unchanged.
pub fn limit_magnitude(v: Vec3, max: f32) -> Vec3 {
    if max <= 0.0 {
        return Vec3::ZERO;
    }
    v.clamp_length_max(max)
}

/// Rotate the unit vector `current` toward the unit vector `desired` by at
/// most `max_angle` radians, returning a unit vector.
///
/// The dot product is clamped to [-1, 1] before `acos` since floating-point
/// rounding can push a normalized dot slightly out of domain. Antiparallel
/// inputs have no unique rotation plane; an arbitrary orthonormal axis is
/// used so the rotation still makes progress.
pub fn rotate_toward(current: Vec3, desired: Vec3, max_angle: f32) -> Vec3 {
    if max_angle <= 0.0 {
        return current;
    }
    let dot = current.dot(desired).clamp(-1.0, 1.0);
    let angle = dot.acos();
    if angle <= max_angle {
        return desired;
    }
    let axis = current.cross(desired);
    let axis = if axis.length_squared() > EPSILON * EPSILON {
        axis.normalize()
    } else {
        current.any_orthonormal_vector()
    };
    (Quat::from_axis_angle(axis, max_angle) * current).normalize()
}

/// Uniformly distributed point strictly inside the unit sphere, by rejection
/// sampling.
pub fn random_in_unit_sphere<R: Rng>(rng: &mut R) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
        );
        if v.length_squared() < 1.0 {
            return v;
        }
    }
}

/// Uniformly distributed unit vector.
pub fn random_unit_vector<R: Rng>(rng: &mut R) -> Vec3 {
    loop {
        let v = random_in_unit_sphere(rng);
        if v.length_squared() > EPSILON * EPSILON {
            return v.normalize();
        }
    }
}

/// Orthonormal basis with `forward` as the local +Z axis. Maps a local-space
/// offset into the world frame of an entity facing `forward`.
pub fn local_to_world(forward: Vec3, local: Vec3) -> Vec3 {
    let (side, up) = forward.any_orthonormal_pair();
    side * local.x + up * local.y + forward * local.z
}
