use crate::geometry::Bounds;
use crate::thing::{Thing, ThingId, ThingKind, Texture};
use rstar::{RTree, RTreeObject, AABB};

/// Footprint record stored in the spatial index. Holds no ownership of the
/// entity; `id` points back into the world's storage.
#[derive(Clone, Debug, PartialEq)]
pub struct ThingLocation {
    pub id: ThingId,
    pub kind: ThingKind,
    pub texture: Texture,
    pub position: [f64; 2],
    pub radius: f64,
    pub solid: bool,
}

impl ThingLocation {
    pub fn of(thing: &Thing) -> Self {
        Self {
            id: thing.id,
            kind: thing.kind,
            texture: thing.texture,
            position: thing.position,
            radius: thing.radius,
            solid: thing.solid,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::around(self.position, self.radius)
    }
}

impl RTreeObject for ThingLocation {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let b = self.bounds();
        AABB::from_corners(b.min, b.max)
    }
}

/// R*-tree over entity footprints, mutated in place as things spawn, move
/// and get swept.
#[derive(Clone, Debug, Default)]
pub struct SpatialIndex {
    tree: RTree<ThingLocation>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }

    pub fn insert(&mut self, location: ThingLocation) {
        self.tree.insert(location);
    }

    /// Remove the exact record previously inserted. Returns whether it was present.
    pub fn remove(&mut self, location: &ThingLocation) -> bool {
        self.tree.remove(location).is_some()
    }

    /// Move an indexed record to `position`. `location` must be the record
    /// currently stored for the thing.
    pub fn relocate(&mut self, location: &ThingLocation, position: [f64; 2]) {
        let removed = self.tree.remove(location);
        debug_assert!(
            removed.is_some(),
            "relocating {} which is not indexed at {:?}",
            location.id,
            location.position
        );
        let mut moved = removed.unwrap_or_else(|| location.clone());
        moved.position = position;
        self.tree.insert(moved);
    }

    /// All records whose footprint box intersects `bounds`, except `exclude`.
    pub fn query_overlapping(
        &self,
        bounds: &Bounds,
        exclude: Option<ThingId>,
    ) -> impl Iterator<Item = &ThingLocation> + '_ {
        let envelope = AABB::from_corners(bounds.min, bounds.max);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .filter(move |loc| Some(loc.id) != exclude)
    }

    /// Whether any record of `kind` other than `exclude` intersects `bounds`.
    pub fn overlaps(&self, bounds: &Bounds, kind: ThingKind, exclude: Option<ThingId>) -> bool {
        self.query_overlapping(bounds, exclude)
            .any(|loc| loc.kind == kind)
    }

    /// Whether any solid record other than `exclude` intersects `bounds`.
    pub fn blocks(&self, bounds: &Bounds, exclude: Option<ThingId>) -> bool {
        self.query_overlapping(bounds, exclude).any(|loc| loc.solid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(id: u64, kind: ThingKind, x: f64, y: f64) -> ThingLocation {
        ThingLocation {
            id: ThingId(id),
            kind,
            texture: kind.texture(),
            position: [x, y],
            radius: 10.0,
            solid: kind.is_solid(),
        }
    }

    fn ids<'a>(it: impl Iterator<Item = &'a ThingLocation>) -> Vec<u64> {
        let mut v: Vec<u64> = it.map(|l| l.id.0).collect();
        v.sort_unstable();
        v
    }

    #[test]
    fn query_finds_intersecting_footprints() {
        let mut index = SpatialIndex::new();
        index.insert(loc(0, ThingKind::Clod, 50.0, 50.0));
        index.insert(loc(1, ThingKind::Plasmoid, 75.0, 50.0));
        index.insert(loc(2, ThingKind::Plasmoid, 200.0, 200.0));
        let found = ids(index.query_overlapping(&Bounds::around([62.0, 50.0], 4.0), None));
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn query_excludes_given_id() {
        let mut index = SpatialIndex::new();
        index.insert(loc(0, ThingKind::Diskoid, 50.0, 50.0));
        index.insert(loc(1, ThingKind::Diskoid, 55.0, 50.0));
        let found = ids(index.query_overlapping(&Bounds::around([50.0, 50.0], 1.0), Some(ThingId(0))));
        assert_eq!(found, vec![1]);
    }

    #[test]
    fn overlaps_filters_by_kind() {
        let mut index = SpatialIndex::new();
        index.insert(loc(0, ThingKind::Plasmoid, 50.0, 50.0));
        let area = Bounds::around([50.0, 50.0], 2.0);
        assert!(!index.overlaps(&area, ThingKind::Clod, None));
        assert!(index.overlaps(&area, ThingKind::Plasmoid, None));
        assert!(!index.overlaps(&area, ThingKind::Plasmoid, Some(ThingId(0))));
    }

    #[test]
    fn blocking_follows_the_solid_flag() {
        let mut index = SpatialIndex::new();
        index.insert(loc(0, ThingKind::Plasmoid, 50.0, 50.0));
        let area = Bounds::around([50.0, 50.0], 2.0);
        assert!(!index.blocks(&area, None));

        let mut wall = loc(1, ThingKind::Plasmoid, 52.0, 50.0);
        wall.solid = true;
        index.insert(wall);
        assert!(index.blocks(&area, None));
        assert!(!index.blocks(&area, Some(ThingId(1))));

        index.insert(loc(2, ThingKind::Clod, 200.0, 200.0));
        assert!(index.blocks(&Bounds::around([195.0, 200.0], 1.0), None));
    }

    #[test]
    fn relocate_moves_the_footprint() {
        let mut index = SpatialIndex::new();
        let original = loc(3, ThingKind::Diskoid, 50.0, 50.0);
        index.insert(original.clone());
        index.relocate(&original, [300.0, 300.0]);
        assert_eq!(index.len(), 1);
        assert!(!index.overlaps(&Bounds::around([50.0, 50.0], 1.0), ThingKind::Diskoid, None));
        assert!(index.overlaps(&Bounds::around([300.0, 300.0], 1.0), ThingKind::Diskoid, None));
    }

    #[test]
    fn relocate_keeps_one_record_per_thing() {
        let mut index = SpatialIndex::new();
        let mut current = loc(5, ThingKind::Diskoid, 50.0, 50.0);
        index.insert(current.clone());
        for step in 1..=5 {
            let to = [50.0 + 20.0 * step as f64, 50.0];
            index.relocate(&current, to);
            current.position = to;
            assert_eq!(index.len(), 1);
        }
        assert!(index.remove(&current));
        assert!(index.is_empty());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "not indexed")]
    fn relocate_of_stale_record_panics_in_debug() {
        let mut index = SpatialIndex::new();
        let stored = loc(6, ThingKind::Diskoid, 50.0, 50.0);
        index.insert(stored);
        let stale = loc(6, ThingKind::Diskoid, 60.0, 50.0);
        index.relocate(&stale, [100.0, 100.0]);
    }

    #[test]
    fn remove_requires_exact_record() {
        let mut index = SpatialIndex::new();
        let original = loc(4, ThingKind::Plasmoid, 10.0, 10.0);
        index.insert(original.clone());
        assert!(!index.remove(&loc(4, ThingKind::Plasmoid, 11.0, 10.0)));
        assert!(index.remove(&original));
        assert!(index.is_empty());
    }
}
