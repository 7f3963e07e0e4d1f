use crate::behavior::{BehaviorKind, BehaviorWeights};
use crate::constants::{MAX_TOTAL_CELLS, MAX_TOTAL_ENTITIES};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How per-behavior forces are combined into one steering force.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SteeringPolicy {
    /// Sum all enabled weighted forces, clamp the total once at the end.
    #[default]
    WeightedSum,
    /// Evaluate in fixed priority order against a shrinking force budget.
    Prioritized,
}

/// Wander random-walk parameters, shared by all entities.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WanderParams {
    /// Maximum per-second displacement of the wander target.
    pub jitter: f32,
    /// Radius of the sphere the wander target is confined to.
    pub radius: f32,
    /// Forward offset of the wander sphere along the entity's heading.
    pub distance: f32,
}

impl Default for WanderParams {
    fn default() -> Self {
        Self {
            jitter: 1.0,
            radius: 1.0,
            distance: 1.0,
        }
    }
}

/// Per-entity parameters applied to every spawned entity.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EntityConfig {
    pub mass: f32,
    pub max_speed: f32,
    pub max_force: f32,
    /// Radians per second.
    pub max_turn_rate: f32,
    pub sight_radius: f32,
    pub behaviors: Vec<BehaviorKind>,
    pub weights: BehaviorWeights,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            mass: 1.0,
            max_speed: 10.0,
            max_force: 10.0,
            max_turn_rate: 5.0,
            sight_radius: 10.0,
            behaviors: vec![
                BehaviorKind::Separation,
                BehaviorKind::Alignment,
                BehaviorKind::Cohesion,
                BehaviorKind::Wander,
            ],
            weights: BehaviorWeights::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    /// Deterministic seed for reproducible runs.
    pub seed: u64,
    pub num_entities: usize,
    /// Cells along each axis of the spatial grid.
    pub cell_counts: [u32; 3],
    /// Initial grid working volume; rebuilds recompute it from entity positions.
    pub bounds_min: [f32; 3],
    pub bounds_max: [f32; 3],
    /// Entities spawn uniformly inside a sphere of this radius around the origin.
    pub spawn_radius: f32,
    /// Seek/flee target point.
    pub target: [f32; 3],
    /// Simulation timestep in seconds.
    pub dt: f32,
    /// When false, neighbor queries fall back to a brute-force scan.
    pub use_spatial_grid: bool,
    pub policy: SteeringPolicy,
    pub wander: WanderParams,
    pub entity: EntityConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            num_entities: 30,
            cell_counts: [10, 10, 10],
            bounds_min: [-50.0, -50.0, -50.0],
            bounds_max: [50.0, 50.0, 50.0],
            spawn_radius: 10.0,
            target: [0.0, 0.0, 0.0],
            dt: 0.02,
            use_spatial_grid: true,
            policy: SteeringPolicy::WeightedSum,
            wander: WanderParams::default(),
            entity: EntityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimConfigError {
    InvalidNumEntities,
    TooManyEntities { max: usize, actual: usize },
    InvalidCellCounts,
    TooManyCells { max: usize, actual: usize },
    InvalidBounds,
    InvalidSpawnRadius,
    InvalidTarget,
    InvalidDt,
    InvalidMass,
    InvalidMaxSpeed,
    InvalidMaxForce,
    InvalidMaxTurnRate,
    InvalidSightRadius,
    InvalidWeights,
    InvalidWanderParams,
}

impl fmt::Display for SimConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidNumEntities => write!(f, "num_entities must be greater than 0"),
            Self::TooManyEntities { max, actual } => {
                write!(f, "num_entities ({actual}) exceeds supported maximum ({max})")
            }
            Self::InvalidCellCounts => {
                write!(f, "cell_counts must all be greater than 0")
            }
            Self::TooManyCells { max, actual } => {
                write!(f, "total cell count ({actual}) exceeds supported maximum ({max})")
            }
            Self::InvalidBounds => {
                write!(f, "bounds_min must be finite and strictly below bounds_max on every axis")
            }
            Self::InvalidSpawnRadius => write!(f, "spawn_radius must be non-negative and finite"),
            Self::InvalidTarget => write!(f, "target must be finite"),
            Self::InvalidDt => write!(f, "dt must be positive and finite"),
            Self::InvalidMass => write!(f, "mass must be positive and finite"),
            Self::InvalidMaxSpeed => write!(f, "max_speed must be positive and finite"),
            Self::InvalidMaxForce => write!(f, "max_force must be non-negative and finite"),
            Self::InvalidMaxTurnRate => write!(f, "max_turn_rate must be non-negative and finite"),
            Self::InvalidSightRadius => write!(f, "sight_radius must be non-negative and finite"),
            Self::InvalidWeights => write!(f, "behavior weights must be finite and non-negative"),
            Self::InvalidWanderParams => write!(
                f,
                "wander jitter/distance must be non-negative and radius positive, all finite"
            ),
        }
    }
}

impl std::error::Error for SimConfigError {}

impl SimConfig {
    pub const MAX_TOTAL_ENTITIES: usize = MAX_TOTAL_ENTITIES;
    pub const MAX_TOTAL_CELLS: usize = MAX_TOTAL_CELLS;

    pub fn validate(&self) -> Result<(), SimConfigError> {
        self.validate_counts()?;
        self.validate_world()?;
        self.validate_entity()?;
        self.validate_wander()?;
        Ok(())
    }

    fn validate_counts(&self) -> Result<(), SimConfigError> {
        if self.num_entities == 0 {
            return Err(SimConfigError::InvalidNumEntities);
        }
        if self.num_entities > Self::MAX_TOTAL_ENTITIES {
            return Err(SimConfigError::TooManyEntities {
                max: Self::MAX_TOTAL_ENTITIES,
                actual: self.num_entities,
            });
        }
        if self.cell_counts.iter().any(|&c| c == 0) {
            return Err(SimConfigError::InvalidCellCounts);
        }
        let total_cells = self
            .cell_counts
            .iter()
            .try_fold(1usize, |acc, &c| acc.checked_mul(c as usize))
            .ok_or(SimConfigError::TooManyCells {
                max: Self::MAX_TOTAL_CELLS,
                actual: usize::MAX,
            })?;
        if total_cells > Self::MAX_TOTAL_CELLS {
            return Err(SimConfigError::TooManyCells {
                max: Self::MAX_TOTAL_CELLS,
                actual: total_cells,
            });
        }
        Ok(())
    }

    fn validate_world(&self) -> Result<(), SimConfigError> {
        let bounds_ok = self
            .bounds_min
            .iter()
            .zip(self.bounds_max.iter())
            .all(|(lo, hi)| lo.is_finite() && hi.is_finite() && lo < hi);
        if !bounds_ok {
            return Err(SimConfigError::InvalidBounds);
        }
        if !(self.spawn_radius.is_finite() && self.spawn_radius >= 0.0) {
            return Err(SimConfigError::InvalidSpawnRadius);
        }
        if !self.target.iter().all(|t| t.is_finite()) {
            return Err(SimConfigError::InvalidTarget);
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(SimConfigError::InvalidDt);
        }
        Ok(())
    }

    fn validate_entity(&self) -> Result<(), SimConfigError> {
        let e = &self.entity;
        if !(e.mass.is_finite() && e.mass > 0.0) {
            return Err(SimConfigError::InvalidMass);
        }
        if !(e.max_speed.is_finite() && e.max_speed > 0.0) {
            return Err(SimConfigError::InvalidMaxSpeed);
        }
        if !(e.max_force.is_finite() && e.max_force >= 0.0) {
            return Err(SimConfigError::InvalidMaxForce);
        }
        if !(e.max_turn_rate.is_finite() && e.max_turn_rate >= 0.0) {
            return Err(SimConfigError::InvalidMaxTurnRate);
        }
        if !(e.sight_radius.is_finite() && e.sight_radius >= 0.0) {
            return Err(SimConfigError::InvalidSightRadius);
        }
        if !e.weights.is_valid() {
            return Err(SimConfigError::InvalidWeights);
        }
        Ok(())
    }

    fn validate_wander(&self) -> Result<(), SimConfigError> {
        let w = &self.wander;
        let ok = w.jitter.is_finite()
            && w.jitter >= 0.0
            && w.radius.is_finite()
            && w.radius > 0.0
            && w.distance.is_finite()
            && w.distance >= 0.0;
        if !ok {
            return Err(SimConfigError::InvalidWanderParams);
        }
        Ok(())
    }
}
