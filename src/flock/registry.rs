use bevy::ecs::entity::Entity;
use bevy::math::Vec3;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

/// Opaque identity of one boid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoidId(pub u64);

impl From<Entity> for BoidId {
    fn from(entity: Entity) -> Self {
        Self(entity.to_bits())
    }
}

/// Snapshot of a flockmate as seen by the acting boid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: BoidId,
    pub position: Vec3,
    pub velocity: Vec3,
}

pub type NeighborList = SmallVec<[Neighbor; 16]>;

/// Spatial query supplied by whoever places boids in a world.
///
/// Implementations return flockmates within `radius` of `origin` and must not
/// include `agent` itself.
pub trait NeighborQuery {
    fn neighbors(&self, agent: BoidId, origin: Vec3, radius: f32) -> NeighborList;
}

/// Never returns anyone. Useful for isolated boids and tests.
pub struct NoNeighbors;

impl NeighborQuery for NoNeighbors {
    fn neighbors(&self, _agent: BoidId, _origin: Vec3, _radius: f32) -> NeighborList {
        NeighborList::new()
    }
}

/// Brute-force query over a list of snapshots, filtered by distance.
impl NeighborQuery for Vec<Neighbor> {
    fn neighbors(&self, agent: BoidId, origin: Vec3, radius: f32) -> NeighborList {
        let radius_sq = radius * radius;
        self.iter()
            .filter(|n| n.id != agent && n.position.distance_squared(origin) <= radius_sq)
            .copied()
            .collect()
    }
}

/// Set of boids belonging to one flock.
#[derive(Debug, Clone, Default)]
pub struct FlockRegistry {
    members: FxHashSet<BoidId>,
}

impl FlockRegistry {
    /// Returns false if the boid was already a member.
    pub fn register(&mut self, id: BoidId) -> bool {
        self.members.insert(id)
    }

    /// Returns false if the boid was not a member.
    pub fn unregister(&mut self, id: BoidId) -> bool {
        self.members.remove(&id)
    }

    #[inline]
    pub fn contains(&self, id: BoidId) -> bool {
        self.members.contains(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = BoidId> + '_ {
        self.members.iter().copied()
    }
}
