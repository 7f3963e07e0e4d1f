use crate::behavior::{BehaviorSet, BehaviorWeights};
use crate::config::EntityConfig;
use glam::Vec3;

/// One simulated flock member.
///
/// `heading` is a unit vector independent of `velocity`: the integrator turns
/// it toward the velocity direction at a bounded angular rate, and the entity
/// always moves along `heading`. `wander_target` is the per-entity random-walk
/// point on the wander sphere, in the entity's local frame. `cell_index` is a
/// derived cache written by the last grid rebuild.
#[derive(Clone, Debug)]
pub struct FlockEntity {
    pub id: u32,
    pub position: Vec3,
    pub velocity: Vec3,
    pub heading: Vec3,
    pub mass: f32,
    pub max_speed: f32,
    pub max_force: f32,
    /// Maximum angular velocity in radians per second.
    pub max_turn_rate: f32,
    pub sight_radius: f32,
    pub behaviors: BehaviorSet,
    pub weights: BehaviorWeights,
    pub wander_target: Vec3,
    pub cell_index: usize,
}

impl FlockEntity {
    pub fn new(id: u32, position: Vec3) -> Self {
        Self {
            id,
            position,
            velocity: Vec3::ZERO,
            heading: Vec3::Z,
            mass: 1.0,
            max_speed: 10.0,
            max_force: 10.0,
            max_turn_rate: 5.0,
            sight_radius: 10.0,
            behaviors: BehaviorSet::empty(),
            weights: BehaviorWeights::default(),
            wander_target: Vec3::Z,
            cell_index: 0,
        }
    }

    /// Entity with the shared per-entity parameters from a config.
    pub fn from_config(id: u32, position: Vec3, config: &EntityConfig) -> Self {
        Self {
            mass: config.mass,
            max_speed: config.max_speed,
            max_force: config.max_force,
            max_turn_rate: config.max_turn_rate,
            sight_radius: config.sight_radius,
            behaviors: BehaviorSet::from_kinds(&config.behaviors),
            weights: config.weights,
            ..Self::new(id, position)
        }
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}
