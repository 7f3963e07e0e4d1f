use crate::behavior::BehaviorSet;
use crate::config::{SteeringPolicy, WanderParams};
use crate::constants::COINCIDENT_DIST_SQ;
use crate::entity::FlockEntity;
use crate::math::{limit_magnitude, local_to_world, random_in_unit_sphere, random_unit_vector};
use crate::rng;
use glam::Vec3;
use rand_chacha::ChaCha12Rng;

/// Per-entity steering force computation.
///
/// The engine is stateless per call apart from its RNG stream; the wander
/// random-walk target lives on the entity itself so entities sharing one
/// engine never share a wander state. `neighbors` indexes into `flock` and
/// must not contain the entity's own index — the caller filters it out.
pub struct SteeringEngine {
    policy: SteeringPolicy,
    wander: WanderParams,
    rng: ChaCha12Rng,
}

impl SteeringEngine {
    pub fn new(seed: u64) -> Self {
        Self::with_policy(seed, SteeringPolicy::default())
    }

    pub fn with_policy(seed: u64, policy: SteeringPolicy) -> Self {
        Self {
            policy,
            wander: WanderParams::default(),
            rng: rng::create_rng(seed),
        }
    }

    pub fn policy(&self) -> SteeringPolicy {
        self.policy
    }

    pub fn set_wander_params(&mut self, params: WanderParams) {
        self.wander = params;
    }

    /// Combined, weighted, magnitude-clamped steering force for one entity.
    pub fn compute(
        &mut self,
        entity: &mut FlockEntity,
        flock: &[FlockEntity],
        neighbors: &[u32],
        target: Vec3,
        dt: f32,
    ) -> Vec3 {
        match self.policy {
            SteeringPolicy::WeightedSum => self.weighted_sum(entity, flock, neighbors, target, dt),
            SteeringPolicy::Prioritized => self.prioritized(entity, flock, neighbors, target, dt),
        }
    }

    /// Sum every enabled behavior times its weight, then clamp the total to
    /// the entity's force budget by rescaling.
    fn weighted_sum(
        &mut self,
        entity: &mut FlockEntity,
        flock: &[FlockEntity],
        neighbors: &[u32],
        target: Vec3,
        dt: f32,
    ) -> Vec3 {
        let on = entity.behaviors;
        let weights = entity.weights;
        let mut total = Vec3::ZERO;

        if on.contains(BehaviorSet::SEPARATION) {
            total += self.separation(entity, flock, neighbors) * weights.separation;
        }
        if on.contains(BehaviorSet::ALIGNMENT) {
            total += alignment(entity, flock, neighbors) * weights.alignment;
        }
        if on.contains(BehaviorSet::COHESION) {
            total += cohesion(entity, flock, neighbors) * weights.cohesion;
        }
        if on.contains(BehaviorSet::WANDER) {
            total += self.wander(entity, dt) * weights.wander;
        }
        if on.contains(BehaviorSet::SEEK) {
            total += seek(entity, target) * weights.seek;
        }
        if on.contains(BehaviorSet::FLEE) {
            total += flee(entity, target) * weights.flee;
        }

        limit_magnitude(total, entity.max_force)
    }

    /// Evaluate behaviors in fixed priority order against a shrinking force
    /// budget; stop as soon as the budget is spent. Earlier behaviors win
    /// under saturation and the total never exceeds the budget.
    fn prioritized(
        &mut self,
        entity: &mut FlockEntity,
        flock: &[FlockEntity],
        neighbors: &[u32],
        target: Vec3,
        dt: f32,
    ) -> Vec3 {
        let on = entity.behaviors;
        let weights = entity.weights;
        let budget = entity.max_force;
        let mut total = Vec3::ZERO;

        if on.contains(BehaviorSet::FLEE) {
            let force = flee(entity, target) * weights.flee;
            if !accumulate_force(&mut total, force, budget) {
                return total;
            }
        }
        if on.contains(BehaviorSet::SEPARATION) {
            let force = self.separation(entity, flock, neighbors) * weights.separation;
            if !accumulate_force(&mut total, force, budget) {
                return total;
            }
        }
        if on.contains(BehaviorSet::ALIGNMENT) {
            let force = alignment(entity, flock, neighbors) * weights.alignment;
            if !accumulate_force(&mut total, force, budget) {
                return total;
            }
        }
        if on.contains(BehaviorSet::COHESION) {
            let force = cohesion(entity, flock, neighbors) * weights.cohesion;
            if !accumulate_force(&mut total, force, budget) {
                return total;
            }
        }
        if on.contains(BehaviorSet::SEEK) {
            let force = seek(entity, target) * weights.seek;
            if !accumulate_force(&mut total, force, budget) {
                return total;
            }
        }
        if on.contains(BehaviorSet::WANDER) {
            let force = self.wander(entity, dt) * weights.wander;
            if !accumulate_force(&mut total, force, budget) {
                return total;
            }
        }
        total
    }

    /// Repulsion from each neighbor, scaled inversely by distance so closer
    /// neighbors push harder. Coincident neighbors contribute a random unit
    /// direction instead of a near-infinite one.
    fn separation(&mut self, entity: &FlockEntity, flock: &[FlockEntity], neighbors: &[u32]) -> Vec3 {
        let mut force = Vec3::ZERO;
        for &i in neighbors {
            let to_entity = entity.position - flock[i as usize].position;
            let dist_sq = to_entity.length_squared();
            if dist_sq < COINCIDENT_DIST_SQ {
                force += random_unit_vector(&mut self.rng);
            } else {
                let dist = dist_sq.sqrt();
                force += (to_entity / dist) / dist;
            }
        }
        force
    }

    /// Random-walk a per-entity target over the surface of the wander sphere,
    /// project it ahead of the entity, and steer toward the projected point.
    fn wander(&mut self, entity: &mut FlockEntity, dt: f32) -> Vec3 {
        let jitter = random_in_unit_sphere(&mut self.rng) * (self.wander.jitter * dt);
        entity.wander_target = (entity.wander_target + jitter)
            .try_normalize()
            .unwrap_or(Vec3::Z)
            * self.wander.radius;

        let local = entity.wander_target + Vec3::new(0.0, 0.0, self.wander.distance);
        let world_point = entity.position + local_to_world(entity.heading, local);
        world_point - entity.position
    }
}

/// Velocity change that would carry the entity toward `target` at max speed.
fn seek(entity: &FlockEntity, target: Vec3) -> Vec3 {
    (target - entity.position).normalize_or_zero() * entity.max_speed - entity.velocity
}

fn flee(entity: &FlockEntity, target: Vec3) -> Vec3 {
    (entity.position - target).normalize_or_zero() * entity.max_speed - entity.velocity
}

/// Mean neighbor heading minus the entity's own heading; zero with no
/// neighbors.
fn alignment(entity: &FlockEntity, flock: &[FlockEntity], neighbors: &[u32]) -> Vec3 {
    if neighbors.is_empty() {
        return Vec3::ZERO;
    }
    let mut average = Vec3::ZERO;
    for &i in neighbors {
        average += flock[i as usize].heading;
    }
    average / neighbors.len() as f32 - entity.heading
}

/// Seek toward the neighbor centroid, normalized so cohesion's magnitude is
/// comparable to the other rules.
fn cohesion(entity: &FlockEntity, flock: &[FlockEntity], neighbors: &[u32]) -> Vec3 {
    if neighbors.is_empty() {
        return Vec3::ZERO;
    }
    let mut center = Vec3::ZERO;
    for &i in neighbors {
        center += flock[i as usize].position;
    }
    center /= neighbors.len() as f32;
    seek(entity, center).normalize_or_zero()
}

/// Add as much of `force` as the remaining budget allows. Returns false when
/// the budget was already spent or this add exhausted it — the caller stops
/// evaluating further behaviors either way.
fn accumulate_force(total: &mut Vec3, force: Vec3, max_force: f32) -> bool {
    let remaining = max_force - total.length();
    if remaining <= 0.0 {
        return false;
    }
    if force.length() <= remaining {
        *total += force;
        true
    } else {
        *total += force.normalize_or_zero() * remaining;
        false
    }
}
