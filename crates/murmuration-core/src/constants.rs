/// Magnitudes below this are treated as zero when normalizing or reorienting.
pub const EPSILON: f32 = 1.0e-5;

/// Squared-distance threshold under which two entities count as coincident
/// for separation purposes.
pub const COINCIDENT_DIST_SQ: f32 = 1.0e-3;

/// Per-axis floor for grid cell extents so a degenerate (single-point)
/// bounding volume still produces valid cell indices.
pub const MIN_CELL_EXTENT: f32 = 1.0e-6;

/// Upper bound on the total entity count a world will accept.
pub const MAX_TOTAL_ENTITIES: usize = 250_000;

/// Upper bound on the total cell count a grid will accept.
pub const MAX_TOTAL_CELLS: usize = 1 << 24;

/// Mixed into derived per-entity RNG seeds to keep streams independent.
pub const RNG_DERIVATION_PRIME: u64 = 0x9E37_79B9_7F4A_7C15;
