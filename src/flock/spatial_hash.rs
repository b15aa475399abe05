use bevy::math::I64Vec3;
use bevy::prelude::*;
use rustc_hash::FxHashMap;

use super::registry::{BoidId, FlockRegistry, Neighbor, NeighborList, NeighborQuery};

/// Default edge length of one hash cell, matching the default perception radius.
pub const DEFAULT_CELL_SIZE: f32 = 500.0;

/// Spatial partitioning grid for neighbor queries in 3D space.
///
/// Space is divided into uniform cubic cells keyed by their integer
/// coordinates. Only occupied cells are stored, so the world is unbounded and
/// boids far outside any cage still hash correctly.
///
/// The grid holds snapshots: it is cleared and refilled once per tick before
/// steering runs, so every boid in a tick sees its flockmates' positions from
/// the start of that tick regardless of update order.
///
/// # Performance
///
/// - **Insert:** O(1) amortized
/// - **Query:** O(min(cells overlapping the query sphere, occupied cells) + k)
///   where k = boids in the visited cells
/// - **Clear:** O(cells); cells left empty by the previous tick are dropped,
///   so the map never outgrows the last two ticks' occupancy
#[derive(Resource, Debug)]
pub struct SpatialHash {
    cell_size: f32,
    cells: FxHashMap<IVec3, Vec<Neighbor>>,
    len: usize,
    /// Inclusive cell bounds of everything inserted since the last clear.
    bounds: Option<(IVec3, IVec3)>,
}

impl Default for SpatialHash {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl SpatialHash {
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            warn!("Invalid spatial hash cell size {}, using {}", cell_size, DEFAULT_CELL_SIZE);
            DEFAULT_CELL_SIZE
        };
        Self {
            cell_size,
            cells: FxHashMap::default(),
            len: 0,
            bounds: None,
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.cells.retain(|_, cell| !cell.is_empty());
        for cell in self.cells.values_mut() {
            cell.clear();
        }
        self.len = 0;
        self.bounds = None;
    }

    /// Number of cells currently held in the map, occupied or not.
    #[inline]
    pub fn stored_cells(&self) -> usize {
        self.cells.len()
    }

    fn cell_of(&self, pos: Vec3) -> IVec3 {
        (pos / self.cell_size).floor().as_ivec3()
    }

    /// Boids with a non-finite position are skipped; they cannot be anyone's neighbor.
    pub fn insert(&mut self, boid: Neighbor) {
        if !boid.position.is_finite() {
            return;
        }
        let cell = self.cell_of(boid.position);
        self.cells.entry(cell).or_default().push(boid);
        self.len += 1;
        self.bounds = Some(match self.bounds {
            Some((min, max)) => (min.min(cell), max.max(cell)),
            None => (cell, cell),
        });
    }

    /// Every boid within `radius` of `pos`, excluding `exclude`, that passes `keep`.
    pub fn query_radius<F>(&self, exclude: BoidId, pos: Vec3, radius: f32, mut keep: F) -> NeighborList
    where
        F: FnMut(&Neighbor) -> bool,
    {
        let mut result = NeighborList::new();
        if !pos.is_finite() || radius.is_nan() || radius < 0.0 {
            return result;
        }

        let Some((occupied_min, occupied_max)) = self.bounds else {
            return result;
        };

        // Clamp to occupied space; a huge radius must not walk empty cells.
        let min = self.cell_of(pos - Vec3::splat(radius)).max(occupied_min);
        let max = self.cell_of(pos + Vec3::splat(radius)).min(occupied_max);
        if min.cmpgt(max).any() {
            return result;
        }

        let radius_sq = radius * radius;
        let mut visit = |cell: &Vec<Neighbor>| {
            for boid in cell {
                if boid.id != exclude && boid.position.distance_squared(pos) <= radius_sq && keep(boid) {
                    result.push(*boid);
                }
            }
        };

        let span = max.as_i64vec3() - min.as_i64vec3() + I64Vec3::ONE;
        let range_cells = span.x.saturating_mul(span.y).saturating_mul(span.z);
        if range_cells > self.cells.len() as i64 {
            for (key, cell) in &self.cells {
                if key.cmpge(min).all() && key.cmple(max).all() {
                    visit(cell);
                }
            }
        } else {
            for z in min.z..=max.z {
                for y in min.y..=max.y {
                    for x in min.x..=max.x {
                        if let Some(cell) = self.cells.get(&IVec3::new(x, y, z)) {
                            visit(cell);
                        }
                    }
                }
            }
        }

        result
    }
}

/// Neighbor query restricted to the members of one flock.
pub struct FlockNeighbors<'a> {
    pub hash: &'a SpatialHash,
    pub registry: &'a FlockRegistry,
}

impl NeighborQuery for FlockNeighbors<'_> {
    fn neighbors(&self, agent: BoidId, origin: Vec3, radius: f32) -> NeighborList {
        self.hash
            .query_radius(agent, origin, radius, |boid| self.registry.contains(boid.id))
    }
}
