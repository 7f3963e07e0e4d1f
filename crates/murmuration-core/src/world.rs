use crate::config::{SimConfig, SimConfigError};
use crate::constants::EPSILON;
use crate::entity::FlockEntity;
use crate::integrator;
use crate::metrics::{RunSummary, StepMetrics};
use crate::spatial::{GridError, SpatialGrid};
use crate::steering::SteeringEngine;
use glam::{UVec3, Vec3};
use std::fmt;
use std::time::Instant;

/// Per-phase wall-clock breakdown of one tick, in microseconds.
#[derive(Clone, Debug)]
pub struct StepTimings {
    pub grid_rebuild_us: u64,
    pub steering_us: u64,
    pub integrate_us: u64,
    pub total_us: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorldInitError {
    Config(SimConfigError),
    Grid(GridError),
    NoEntities,
    EntityCountMismatch { expected: usize, actual: usize },
    NonFiniteState { id: u32 },
    InvalidMass { id: u32 },
    InvalidMaxSpeed { id: u32 },
    DegenerateHeading { id: u32 },
}

impl fmt::Display for WorldInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid config: {e}"),
            Self::Grid(e) => write!(f, "invalid grid parameters: {e}"),
            Self::NoEntities => write!(f, "a flock needs at least one entity"),
            Self::EntityCountMismatch { expected, actual } => write!(
                f,
                "entities.len() ({actual}) must match config.num_entities ({expected})"
            ),
            Self::NonFiniteState { id } => {
                write!(f, "entity {id} has a non-finite position or velocity")
            }
            Self::InvalidMass { id } => {
                write!(f, "entity {id} mass must be positive and finite")
            }
            Self::InvalidMaxSpeed { id } => {
                write!(f, "entity {id} max_speed must be positive and finite")
            }
            Self::DegenerateHeading { id } => {
                write!(f, "entity {id} heading must have non-zero length")
            }
        }
    }
}

impl std::error::Error for WorldInitError {}

impl From<SimConfigError> for WorldInitError {
    fn from(e: SimConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<GridError> for WorldInitError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}

/// Thin per-tick orchestrator: rebuild the grid, gather neighbors, compute
/// steering, integrate.
///
/// Updates are double-buffered: every read of other entities during a tick
/// observes the start-of-tick snapshot, so results do not depend on entity
/// iteration order.
pub struct FlockWorld {
    pub entities: Vec<FlockEntity>,
    grid: SpatialGrid,
    engine: SteeringEngine,
    config: SimConfig,
    target: Vec3,
    step_index: usize,
    // Scratch buffers reused across ticks.
    snapshot: Vec<FlockEntity>,
    neighbor_buf: Vec<u32>,
    forces: Vec<Vec3>,
    last_mean_neighbors: f32,
}

impl FlockWorld {
    pub fn try_new(
        entities: Vec<FlockEntity>,
        config: SimConfig,
    ) -> Result<Self, WorldInitError> {
        config.validate()?;
        let mut entities = entities;
        Self::validate_entities(&mut entities, &config)?;

        let grid = SpatialGrid::new(
            UVec3::from_array(config.cell_counts),
            Vec3::from_array(config.bounds_min),
            Vec3::from_array(config.bounds_max),
        )?;
        let mut engine = SteeringEngine::with_policy(config.seed, config.policy);
        engine.set_wander_params(config.wander);
        let target = Vec3::from_array(config.target);

        Ok(Self {
            entities,
            grid,
            engine,
            config,
            target,
            step_index: 0,
            snapshot: Vec::new(),
            neighbor_buf: Vec::new(),
            forces: Vec::new(),
            last_mean_neighbors: 0.0,
        })
    }

    fn validate_entities(
        entities: &mut [FlockEntity],
        config: &SimConfig,
    ) -> Result<(), WorldInitError> {
        if entities.is_empty() {
            return Err(WorldInitError::NoEntities);
        }
        if entities.len() != config.num_entities {
            return Err(WorldInitError::EntityCountMismatch {
                expected: config.num_entities,
                actual: entities.len(),
            });
        }
        for entity in entities.iter_mut() {
            if !(entity.position.is_finite() && entity.velocity.is_finite()) {
                return Err(WorldInitError::NonFiniteState { id: entity.id });
            }
            if !(entity.mass.is_finite() && entity.mass > 0.0) {
                return Err(WorldInitError::InvalidMass { id: entity.id });
            }
            if !(entity.max_speed.is_finite() && entity.max_speed > 0.0) {
                return Err(WorldInitError::InvalidMaxSpeed { id: entity.id });
            }
            if !entity.heading.is_finite()
                || entity.heading.length_squared() <= EPSILON * EPSILON
            {
                return Err(WorldInitError::DegenerateHeading { id: entity.id });
            }
            entity.heading = entity.heading.normalize();
        }
        Ok(())
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// Advance the simulation by one tick of `dt` seconds.
    pub fn step(&mut self, dt: f32) -> StepTimings {
        let total_start = Instant::now();

        // 1. Rebuild the spatial index over the start-of-tick positions.
        let t0 = Instant::now();
        if self.config.use_spatial_grid {
            self.grid
                .rebuild(&mut self.entities)
                .expect("entity set is non-empty by construction");
        }
        let grid_rebuild_us = t0.elapsed().as_micros() as u64;

        self.snapshot.clone_from(&self.entities);

        // 2. Neighbor query + steering force per entity, against the snapshot.
        let t1 = Instant::now();
        self.forces.clear();
        let mut neighbor_total = 0usize;
        for i in 0..self.entities.len() {
            let center = self.snapshot[i].position;
            let sight = self.snapshot[i].sight_radius;
            if self.config.use_spatial_grid {
                self.grid
                    .query_range(&self.snapshot, center, sight, &mut self.neighbor_buf);
            } else {
                SpatialGrid::query_range_brute_force(
                    &self.snapshot,
                    center,
                    sight,
                    &mut self.neighbor_buf,
                );
            }
            // The entity never measures itself as its own neighbor; sorting
            // keeps the summation order independent of the query path.
            self.neighbor_buf.retain(|&j| j != i as u32);
            self.neighbor_buf.sort_unstable();
            neighbor_total += self.neighbor_buf.len();

            let force = self.engine.compute(
                &mut self.entities[i],
                &self.snapshot,
                &self.neighbor_buf,
                self.target,
                dt,
            );
            self.forces.push(force);
        }
        let steering_us = t1.elapsed().as_micros() as u64;

        // 3. Apply all forces after every entity has been evaluated.
        let t2 = Instant::now();
        for (entity, &force) in self.entities.iter_mut().zip(self.forces.iter()) {
            integrator::apply(entity, force, dt);
        }
        let integrate_us = t2.elapsed().as_micros() as u64;

        self.last_mean_neighbors = neighbor_total as f32 / self.entities.len() as f32;
        self.step_index += 1;

        StepTimings {
            grid_rebuild_us,
            steering_us,
            integrate_us,
            total_us: total_start.elapsed().as_micros() as u64,
        }
    }

    pub fn metrics(&self) -> StepMetrics {
        StepMetrics::collect(self.step_index, &self.entities, self.last_mean_neighbors)
    }

    /// Step `steps` times, sampling metrics every `sample_every` steps
    /// (0 samples only the final state).
    pub fn run(&mut self, steps: usize, sample_every: usize, dt: f32) -> RunSummary {
        let mut samples = Vec::new();
        for s in 0..steps {
            self.step(dt);
            if sample_every > 0 && (s + 1) % sample_every == 0 {
                samples.push(self.metrics());
            }
        }
        if sample_every == 0 || steps % sample_every.max(1) != 0 {
            samples.push(self.metrics());
        }
        RunSummary {
            schema_version: 1,
            steps,
            sample_every,
            samples,
        }
    }
}
