use crate::constants::EPSILON;
use crate::entity::FlockEntity;
use crate::math::rotate_toward;
use glam::Vec3;

/// Apply one tick of heading-constrained kinematics.
///
/// The entity accelerates from the steering force, its speed is clamped to
/// `max_speed`, its heading turns toward the velocity direction at no more
/// than `max_turn_rate` radians per second, and it advances along the heading
/// at the velocity's magnitude. Decoupling "which way it points" from "which
/// way the force pushed" is what produces banked turns instead of strafing.
pub fn apply(entity: &mut FlockEntity, force: Vec3, dt: f32) {
    debug_assert!(entity.mass > 0.0, "entity mass must be positive");

    let acceleration = force / entity.mass;
    entity.velocity += acceleration * dt;
    entity.velocity = entity.velocity.clamp_length_max(entity.max_speed);

    if entity.velocity.length_squared() > EPSILON * EPSILON {
        let desired = entity.velocity.normalize();
        entity.heading = rotate_toward(entity.heading, desired, entity.max_turn_rate * dt);
    }

    entity.position += entity.velocity.length() * entity.heading * dt;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_turner(position: Vec3) -> FlockEntity {
        let mut e = FlockEntity::new(0, position);
        // Effectively unconstrained turning for the translation-focused tests.
        e.max_turn_rate = 1000.0;
        e
    }

    #[test]
    fn force_accelerates_along_its_direction() {
        let mut e = fast_turner(Vec3::ZERO);
        e.mass = 2.0;
        apply(&mut e, Vec3::new(8.0, 0.0, 0.0), 0.5);
        // a = F/m = 4, dv = a*dt = 2.
        assert!((e.velocity - Vec3::new(2.0, 0.0, 0.0)).length() < 1.0e-5);
    }

    #[test]
    fn speed_is_clamped_to_max_speed() {
        let mut e = fast_turner(Vec3::ZERO);
        e.max_speed = 3.0;
        apply(&mut e, Vec3::new(1.0e6, 0.0, 0.0), 1.0);
        assert!(e.speed() <= 3.0 + 1.0e-4);
    }

    #[test]
    fn speed_clamp_holds_for_arbitrary_forces() {
        let mut e = fast_turner(Vec3::ZERO);
        e.max_speed = 4.0;
        for i in 0..50 {
            let force = Vec3::new(i as f32 * 10.0, -(i as f32), i as f32 * 3.0);
            apply(&mut e, force, 0.1);
            assert!(e.speed() <= 4.0 + 1.0e-4, "tick {i} speed {}", e.speed());
        }
    }

    #[test]
    fn zero_force_with_zero_velocity_moves_nothing() {
        let mut e = fast_turner(Vec3::new(1.0, 2.0, 3.0));
        let heading_before = e.heading;
        apply(&mut e, Vec3::ZERO, 0.02);
        assert_eq!(e.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(e.heading, heading_before);
    }

    #[test]
    fn movement_follows_heading_not_raw_velocity() {
        let mut e = FlockEntity::new(0, Vec3::ZERO);
        e.heading = Vec3::Z;
        e.max_turn_rate = 0.5;
        e.max_speed = 10.0;
        // One tick of sideways force: velocity points +x but the heading can
        // only turn 0.5 * dt radians toward it this tick.
        apply(&mut e, Vec3::new(100.0, 0.0, 0.0), 0.1);
        let dir = e.position.normalize();
        assert!(dir.dot(Vec3::Z) > 0.9, "moved along {dir}, expected near +z");
        assert!((e.position.length() - e.speed() * 0.1).abs() < 1.0e-4);
    }

    #[test]
    fn heading_turn_is_limited_by_turn_rate() {
        let mut e = FlockEntity::new(0, Vec3::ZERO);
        e.heading = Vec3::Z;
        e.max_turn_rate = 0.2;
        e.max_speed = 100.0;
        apply(&mut e, Vec3::new(1000.0, 0.0, 0.0), 1.0);
        let turned = e.heading.dot(Vec3::Z).clamp(-1.0, 1.0).acos();
        assert!(turned <= 0.2 + 1.0e-4, "turned {turned}");
        assert!((e.heading.length() - 1.0).abs() < 1.0e-5);
    }

    #[test]
    fn heading_snaps_to_velocity_within_turn_budget() {
        let mut e = fast_turner(Vec3::ZERO);
        apply(&mut e, Vec3::new(0.0, 5.0, 0.0), 1.0);
        assert!(e.heading.dot(Vec3::Y) > 0.9999);
    }

    #[test]
    fn reversing_force_turns_through_the_antiparallel_case() {
        let mut e = FlockEntity::new(0, Vec3::ZERO);
        e.heading = Vec3::Z;
        e.max_turn_rate = 0.3;
        // Velocity directly opposite the heading.
        e.velocity = Vec3::new(0.0, 0.0, -1.0);
        apply(&mut e, Vec3::ZERO, 1.0);
        assert!((e.heading.length() - 1.0).abs() < 1.0e-5);
        let turned = e.heading.dot(Vec3::Z).clamp(-1.0, 1.0).acos();
        assert!(turned > 0.0, "heading made no progress toward reversal");
    }
}
