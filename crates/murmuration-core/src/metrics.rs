use crate::entity::FlockEntity;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Aggregate flock state sampled at one step.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StepMetrics {
    pub step: usize,
    pub centroid: [f32; 3],
    pub mean_speed: f32,
    pub max_speed: f32,
    /// Length of the mean heading vector: 1.0 when the flock is perfectly
    /// aligned, near 0 when headings cancel out.
    pub heading_coherence: f32,
    /// Mean neighbor count observed by the last tick's range queries.
    pub mean_neighbor_count: f32,
}

fn default_schema_version() -> u32 {
    1
}

/// Serializable record of a full run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub steps: usize,
    pub sample_every: usize,
    pub samples: Vec<StepMetrics>,
}

impl StepMetrics {
    pub fn collect(step: usize, entities: &[FlockEntity], mean_neighbor_count: f32) -> Self {
        if entities.is_empty() {
            return Self {
                step,
                ..Self::default()
            };
        }
        let n = entities.len() as f32;
        let mut centroid = Vec3::ZERO;
        let mut heading_sum = Vec3::ZERO;
        let mut speed_sum = 0.0;
        let mut max_speed = 0.0f32;
        for entity in entities {
            centroid += entity.position;
            heading_sum += entity.heading;
            let speed = entity.speed();
            speed_sum += speed;
            max_speed = max_speed.max(speed);
        }
        Self {
            step,
            centroid: (centroid / n).to_array(),
            mean_speed: speed_sum / n,
            max_speed,
            heading_coherence: (heading_sum / n).length(),
            mean_neighbor_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_averages_positions_and_speeds() {
        let mut a = FlockEntity::new(0, Vec3::ZERO);
        a.velocity = Vec3::new(2.0, 0.0, 0.0);
        let mut b = FlockEntity::new(1, Vec3::new(4.0, 0.0, 0.0));
        b.velocity = Vec3::new(0.0, 4.0, 0.0);
        let m = StepMetrics::collect(3, &[a, b], 1.0);
        assert_eq!(m.step, 3);
        assert_eq!(m.centroid, [2.0, 0.0, 0.0]);
        assert!((m.mean_speed - 3.0).abs() < 1.0e-5);
        assert!((m.max_speed - 4.0).abs() < 1.0e-5);
    }

    #[test]
    fn aligned_flock_has_full_coherence() {
        let flock: Vec<FlockEntity> = (0..4)
            .map(|i| FlockEntity::new(i, Vec3::splat(i as f32)))
            .collect();
        let m = StepMetrics::collect(0, &flock, 0.0);
        assert!((m.heading_coherence - 1.0).abs() < 1.0e-5);
    }

    #[test]
    fn opposed_headings_cancel_coherence() {
        let mut a = FlockEntity::new(0, Vec3::ZERO);
        a.heading = Vec3::Z;
        let mut b = FlockEntity::new(1, Vec3::ONE);
        b.heading = -Vec3::Z;
        let m = StepMetrics::collect(0, &[a, b], 0.0);
        assert!(m.heading_coherence < 1.0e-5);
    }

    #[test]
    fn collect_on_empty_slice_is_all_zero() {
        let m = StepMetrics::collect(7, &[], 0.0);
        assert_eq!(m.step, 7);
        assert_eq!(m.mean_speed, 0.0);
    }

    #[test]
    fn run_summary_round_trips_through_json() {
        let summary = RunSummary {
            schema_version: 1,
            steps: 10,
            sample_every: 5,
            samples: vec![StepMetrics::default()],
        };
        let json = serde_json::to_string(&summary).unwrap();
        let back: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.steps, 10);
        assert_eq!(back.samples.len(), 1);
    }
}
