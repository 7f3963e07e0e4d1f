use crate::bounds::Aabb;
use crate::constants::{MAX_TOTAL_CELLS, MIN_CELL_EXTENT};
use crate::entity::FlockEntity;
use glam::{UVec3, Vec3};
use std::fmt;

/// Uniform grid over a dynamically recomputed working volume.
///
/// The cell layout is fixed at construction; `rebuild` re-derives the bounds
/// and per-axis cell sizes from the current entity set and fully replaces
/// every bucket. Buckets store indices into the slice passed to `rebuild`,
/// so queries must be issued against a slice with the same ordering.
pub struct SpatialGrid {
    cell_counts: UVec3,
    bounds: Aabb,
    cell_size: Vec3,
    cells: Vec<Vec<u32>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    ZeroCellCount,
    InvalidBounds,
    TooManyCells { max: usize, actual: usize },
    EmptyEntitySet,
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroCellCount => write!(f, "cell counts must all be greater than 0"),
            Self::InvalidBounds => {
                write!(f, "bounds must be finite with min strictly below max on every axis")
            }
            Self::TooManyCells { max, actual } => {
                write!(f, "total cell count ({actual}) exceeds supported maximum ({max})")
            }
            Self::EmptyEntitySet => write!(f, "cannot rebuild the grid from zero entities"),
        }
    }
}

impl std::error::Error for GridError {}

impl SpatialGrid {
    pub const MAX_TOTAL_CELLS: usize = MAX_TOTAL_CELLS;

    pub fn new(cell_counts: UVec3, min: Vec3, max: Vec3) -> Result<Self, GridError> {
        if cell_counts.cmpeq(UVec3::ZERO).any() {
            return Err(GridError::ZeroCellCount);
        }
        let finite = min.is_finite() && max.is_finite();
        if !finite || min.cmpge(max).any() {
            return Err(GridError::InvalidBounds);
        }
        let total = (cell_counts.x as usize)
            .checked_mul(cell_counts.y as usize)
            .and_then(|n| n.checked_mul(cell_counts.z as usize))
            .ok_or(GridError::TooManyCells {
                max: Self::MAX_TOTAL_CELLS,
                actual: usize::MAX,
            })?;
        if total > Self::MAX_TOTAL_CELLS {
            return Err(GridError::TooManyCells {
                max: Self::MAX_TOTAL_CELLS,
                actual: total,
            });
        }

        let bounds = Aabb::new(min, max);
        let cell_size = Self::derive_cell_size(&bounds, cell_counts);
        Ok(Self {
            cell_counts,
            bounds,
            cell_size,
            cells: vec![Vec::new(); total],
        })
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn cell_size(&self) -> Vec3 {
        self.cell_size
    }

    pub fn cell_counts(&self) -> UVec3 {
        self.cell_counts
    }

    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    /// Recompute the working volume from the entity positions, re-derive cell
    /// sizes, and repopulate every bucket from scratch. Records the linear
    /// cell index on each entity.
    pub fn rebuild(&mut self, entities: &mut [FlockEntity]) -> Result<(), GridError> {
        let (first, rest) = entities.split_first_mut().ok_or(GridError::EmptyEntitySet)?;

        let mut bounds = Aabb::from_point(first.position);
        for entity in rest.iter() {
            bounds.encapsulate(entity.position);
        }
        self.bounds = bounds;
        self.cell_size = Self::derive_cell_size(&self.bounds, self.cell_counts);

        for cell in &mut self.cells {
            cell.clear();
        }
        let first_index = self.linear_index(self.cell_coord(first.position));
        first.cell_index = first_index;
        self.cells[first_index].push(0);
        for (offset, entity) in rest.iter_mut().enumerate() {
            let index = self.linear_index(self.cell_coord(entity.position));
            entity.cell_index = index;
            self.cells[index].push(offset as u32 + 1);
        }
        Ok(())
    }

    /// Collect the indices of every entity within `radius` of `center`
    /// (inclusive boundary). Scans only the cells whose boxes overlap the
    /// query sphere; the result set equals a brute-force scan.
    pub fn query_range(
        &self,
        entities: &[FlockEntity],
        center: Vec3,
        radius: f32,
        out: &mut Vec<u32>,
    ) {
        out.clear();
        let radius = radius.max(0.0);
        let radius_sq = radius * radius;

        let lo = self.cell_coord(center - Vec3::splat(radius));
        let hi = self.cell_coord(center + Vec3::splat(radius));

        for z in lo.z..=hi.z {
            for y in lo.y..=hi.y {
                for x in lo.x..=hi.x {
                    let coord = UVec3::new(x, y, z);
                    let cell_min = self.cell_min(coord);
                    let cell_box = Aabb::new(cell_min, cell_min + self.cell_size);
                    if !cell_box.intersects_sphere(center, radius) {
                        continue;
                    }
                    for &i in &self.cells[self.linear_index(coord)] {
                        let d_sq = entities[i as usize].position.distance_squared(center);
                        if d_sq <= radius_sq {
                            out.push(i);
                        }
                    }
                }
            }
        }
    }

    /// O(n) reference scan with the same result contract as `query_range`.
    /// Kept as the non-partitioned fallback path and as the test oracle.
    pub fn query_range_brute_force(
        entities: &[FlockEntity],
        center: Vec3,
        radius: f32,
        out: &mut Vec<u32>,
    ) {
        out.clear();
        let radius = radius.max(0.0);
        let radius_sq = radius * radius;
        for (i, entity) in entities.iter().enumerate() {
            if entity.position.distance_squared(center) <= radius_sq {
                out.push(i as u32);
            }
        }
    }

    fn derive_cell_size(bounds: &Aabb, cell_counts: UVec3) -> Vec3 {
        (bounds.size() / cell_counts.as_vec3()).max(Vec3::splat(MIN_CELL_EXTENT))
    }

    /// Floor-then-clamp per axis, so positions on the max boundary (or any
    /// float edge case) still land in a valid cell.
    fn cell_coord(&self, position: Vec3) -> UVec3 {
        let rel = (position - self.bounds.min) / self.cell_size;
        UVec3::new(
            clamp_axis(rel.x, self.cell_counts.x),
            clamp_axis(rel.y, self.cell_counts.y),
            clamp_axis(rel.z, self.cell_counts.z),
        )
    }

    fn linear_index(&self, coord: UVec3) -> usize {
        (coord.x
            + coord.y * self.cell_counts.x
            + coord.z * self.cell_counts.x * self.cell_counts.y) as usize
    }

    fn cell_min(&self, coord: UVec3) -> Vec3 {
        self.bounds.min + coord.as_vec3() * self.cell_size
    }
}

fn clamp_axis(value: f32, count: u32) -> u32 {
    (value.floor() as i64).clamp(0, count as i64 - 1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn make_entities(positions: &[[f32; 3]]) -> Vec<FlockEntity> {
        positions
            .iter()
            .enumerate()
            .map(|(i, p)| FlockEntity::new(i as u32, Vec3::from_array(*p)))
            .collect()
    }

    fn make_grid() -> SpatialGrid {
        SpatialGrid::new(UVec3::splat(10), Vec3::splat(-50.0), Vec3::splat(50.0)).unwrap()
    }

    fn sorted_query(
        grid: &SpatialGrid,
        entities: &[FlockEntity],
        center: Vec3,
        radius: f32,
    ) -> Vec<u32> {
        let mut out = Vec::new();
        grid.query_range(entities, center, radius, &mut out);
        out.sort_unstable();
        out
    }

    #[test]
    fn new_rejects_zero_cell_count() {
        let result = SpatialGrid::new(UVec3::new(10, 0, 10), Vec3::ZERO, Vec3::ONE);
        assert_eq!(result.err(), Some(GridError::ZeroCellCount));
    }

    #[test]
    fn new_rejects_inverted_bounds() {
        let result = SpatialGrid::new(UVec3::splat(4), Vec3::ONE, Vec3::ZERO);
        assert_eq!(result.err(), Some(GridError::InvalidBounds));
    }

    #[test]
    fn new_rejects_non_finite_bounds() {
        let result = SpatialGrid::new(UVec3::splat(4), Vec3::splat(f32::NAN), Vec3::ONE);
        assert_eq!(result.err(), Some(GridError::InvalidBounds));
    }

    #[test]
    fn new_rejects_excessive_cell_total() {
        let result = SpatialGrid::new(UVec3::splat(1024), Vec3::ZERO, Vec3::ONE);
        assert!(matches!(result.err(), Some(GridError::TooManyCells { .. })));
    }

    #[test]
    fn rebuild_rejects_empty_entity_set() {
        let mut grid = make_grid();
        let mut entities: Vec<FlockEntity> = Vec::new();
        assert_eq!(grid.rebuild(&mut entities), Err(GridError::EmptyEntitySet));
    }

    #[test]
    fn rebuild_with_single_entity_degenerates_gracefully() {
        let mut grid = make_grid();
        let mut entities = make_entities(&[[3.0, 4.0, 5.0]]);
        grid.rebuild(&mut entities).unwrap();
        assert!(entities[0].cell_index < grid.total_cells());
        // The entity finds itself at radius 0.
        assert_eq!(sorted_query(&grid, &entities, entities[0].position, 0.0), vec![0]);
    }

    #[test]
    fn rebuild_tightens_bounds_to_entity_positions() {
        let mut grid = make_grid();
        let mut entities = make_entities(&[[1.0, 2.0, 3.0], [-4.0, 8.0, 0.0], [2.0, -1.0, 6.0]]);
        grid.rebuild(&mut entities).unwrap();
        assert_eq!(grid.bounds().min, Vec3::new(-4.0, -1.0, 0.0));
        assert_eq!(grid.bounds().max, Vec3::new(2.0, 8.0, 6.0));
    }

    #[test]
    fn every_entity_maps_to_exactly_one_valid_cell() {
        let mut rng = ChaCha12Rng::seed_from_u64(31);
        let mut entities: Vec<FlockEntity> = (0..500)
            .map(|i| {
                FlockEntity::new(
                    i,
                    Vec3::new(
                        rng.random_range(-80.0..80.0),
                        rng.random_range(-80.0..80.0),
                        rng.random_range(-80.0..80.0),
                    ),
                )
            })
            .collect();
        let mut grid = make_grid();
        grid.rebuild(&mut entities).unwrap();

        let mut per_cell = vec![0usize; grid.total_cells()];
        for entity in &entities {
            assert!(entity.cell_index < grid.total_cells());
            per_cell[entity.cell_index] += 1;
        }
        assert_eq!(per_cell.iter().sum::<usize>(), entities.len());
    }

    #[test]
    fn entity_on_max_boundary_lands_in_last_cell() {
        let mut grid = make_grid();
        // The second entity sits exactly on the recomputed bounds max.
        let mut entities = make_entities(&[[0.0, 0.0, 0.0], [10.0, 10.0, 10.0]]);
        grid.rebuild(&mut entities).unwrap();
        assert_eq!(entities[1].cell_index, grid.total_cells() - 1);
    }

    #[test]
    fn entity_exactly_at_radius_is_included() {
        let mut grid = make_grid();
        let mut entities = make_entities(&[[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [9.0, 0.0, 0.0]]);
        grid.rebuild(&mut entities).unwrap();
        assert_eq!(sorted_query(&grid, &entities, Vec3::ZERO, 4.0), vec![0, 1]);
    }

    #[test]
    fn negative_radius_behaves_as_zero() {
        let mut grid = make_grid();
        let mut entities = make_entities(&[[1.0, 0.0, 0.0], [5.0, 0.0, 0.0]]);
        grid.rebuild(&mut entities).unwrap();
        assert_eq!(
            sorted_query(&grid, &entities, Vec3::new(1.0, 0.0, 0.0), -3.0),
            vec![0]
        );
    }

    #[test]
    fn rebuild_fully_replaces_membership() {
        let mut grid = make_grid();
        let mut entities = make_entities(&[[0.0, 0.0, 0.0], [20.0, 0.0, 0.0]]);
        grid.rebuild(&mut entities).unwrap();
        assert_eq!(sorted_query(&grid, &entities, Vec3::ZERO, 1.0), vec![0]);

        entities[0].position = Vec3::new(20.0, 0.0, 0.0);
        grid.rebuild(&mut entities).unwrap();
        assert_eq!(
            sorted_query(&grid, &entities, Vec3::new(20.0, 0.0, 0.0), 1.0),
            vec![0, 1]
        );
        assert!(sorted_query(&grid, &entities, Vec3::ZERO, 1.0).is_empty());
    }

    #[test]
    fn query_matches_brute_force_on_random_flocks() {
        let mut rng = ChaCha12Rng::seed_from_u64(1234);
        for &count in &[1usize, 2, 5, 37, 200, 1500, 10_000] {
            let mut entities: Vec<FlockEntity> = (0..count)
                .map(|i| {
                    FlockEntity::new(
                        i as u32,
                        Vec3::new(
                            rng.random_range(-100.0..100.0),
                            rng.random_range(-100.0..100.0),
                            rng.random_range(-100.0..100.0),
                        ),
                    )
                })
                .collect();
            let mut grid = make_grid();
            grid.rebuild(&mut entities).unwrap();

            for _ in 0..20 {
                let center = Vec3::new(
                    rng.random_range(-120.0..120.0),
                    rng.random_range(-120.0..120.0),
                    rng.random_range(-120.0..120.0),
                );
                let radius = rng.random_range(0.0..60.0);

                let mut fast = Vec::new();
                grid.query_range(&entities, center, radius, &mut fast);
                fast.sort_unstable();

                let mut slow = Vec::new();
                SpatialGrid::query_range_brute_force(&entities, center, radius, &mut slow);
                slow.sort_unstable();

                assert_eq!(fast, slow, "count={count} center={center} radius={radius}");
            }
        }
    }

    #[test]
    fn query_matches_brute_force_with_clustered_positions() {
        // Many coincident / near-coincident entities stress the bucket path.
        let mut rng = ChaCha12Rng::seed_from_u64(99);
        let mut entities: Vec<FlockEntity> = (0..300)
            .map(|i| {
                let cluster = Vec3::splat((i % 3) as f32 * 10.0);
                FlockEntity::new(
                    i as u32,
                    cluster
                        + Vec3::new(
                            rng.random_range(-0.01..0.01),
                            rng.random_range(-0.01..0.01),
                            rng.random_range(-0.01..0.01),
                        ),
                )
            })
            .collect();
        let mut grid = make_grid();
        grid.rebuild(&mut entities).unwrap();

        for center in [Vec3::ZERO, Vec3::splat(10.0), Vec3::splat(5.0)] {
            for radius in [0.02f32, 5.0, 8.7, 20.0] {
                let mut fast = Vec::new();
                grid.query_range(&entities, center, radius, &mut fast);
                fast.sort_unstable();
                let mut slow = Vec::new();
                SpatialGrid::query_range_brute_force(&entities, center, radius, &mut slow);
                slow.sort_unstable();
                assert_eq!(fast, slow, "center={center} radius={radius}");
            }
        }
    }

    #[test]
    fn query_far_outside_bounds_returns_empty() {
        let mut grid = make_grid();
        let mut entities = make_entities(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]);
        grid.rebuild(&mut entities).unwrap();
        assert!(sorted_query(&grid, &entities, Vec3::splat(500.0), 10.0).is_empty());
    }
}
