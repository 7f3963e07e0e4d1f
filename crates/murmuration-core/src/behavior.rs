use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// The set of steering behaviors enabled for an entity.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct BehaviorSet: u32 {
        const FLEE = 1 << 0;
        const SEPARATION = 1 << 1;
        const ALIGNMENT = 1 << 2;
        const COHESION = 1 << 3;
        const WANDER = 1 << 4;
        const SEEK = 1 << 5;
    }
}

/// Serde-friendly behavior name used in configuration files.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorKind {
    Flee,
    Separation,
    Alignment,
    Cohesion,
    Wander,
    Seek,
}

impl BehaviorKind {
    pub fn flag(self) -> BehaviorSet {
        match self {
            Self::Flee => BehaviorSet::FLEE,
            Self::Separation => BehaviorSet::SEPARATION,
            Self::Alignment => BehaviorSet::ALIGNMENT,
            Self::Cohesion => BehaviorSet::COHESION,
            Self::Wander => BehaviorSet::WANDER,
            Self::Seek => BehaviorSet::SEEK,
        }
    }
}

impl BehaviorSet {
    pub fn from_kinds(kinds: &[BehaviorKind]) -> Self {
        kinds.iter().fold(Self::empty(), |set, k| set | k.flag())
    }
}

/// One scalar weight per behavior kind, applied before combination.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BehaviorWeights {
    pub separation: f32,
    pub alignment: f32,
    pub cohesion: f32,
    pub wander: f32,
    pub seek: f32,
    pub flee: f32,
}

impl Default for BehaviorWeights {
    fn default() -> Self {
        Self {
            separation: 1.0,
            alignment: 1.0,
            cohesion: 1.0,
            wander: 1.0,
            seek: 1.0,
            flee: 1.0,
        }
    }
}

impl BehaviorWeights {
    /// All weights finite and non-negative.
    pub fn is_valid(&self) -> bool {
        [
            self.separation,
            self.alignment,
            self.cohesion,
            self.wander,
            self.seek,
            self.flee,
        ]
        .iter()
        .all(|w| w.is_finite() && *w >= 0.0)
    }
}
