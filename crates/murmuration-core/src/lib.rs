pub mod behavior;
pub mod bounds;
pub mod config;
pub mod constants;
pub mod entity;
pub mod integrator;
pub mod math;
pub mod metrics;
pub mod rng;
pub mod spatial;
pub mod steering;
pub mod world;

pub use behavior::{BehaviorKind, BehaviorSet, BehaviorWeights};
pub use config::{EntityConfig, SimConfig, SimConfigError, SteeringPolicy, WanderParams};
pub use entity::FlockEntity;
pub use metrics::{RunSummary, StepMetrics};
pub use spatial::{GridError, SpatialGrid};
pub use steering::SteeringEngine;
pub use world::{FlockWorld, StepTimings, WorldInitError};
