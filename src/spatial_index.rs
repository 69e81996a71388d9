//! Per-level spatial index over projected record coordinates.
//!
//! Each zoom level keeps an R*-tree of `(x, y, slot)` entries where `slot` is
//! the record's position in that level's table. The tree answers rectangle
//! queries directly and disc queries by filtering the disc's bounding box with
//! an exact squared-distance test.

use rstar::{AABB, RStarInsertionStrategy, RTree, RTreeObject, RTreeParams};
use smallvec::SmallVec;

/// Neighbor lists rarely exceed a handful of entries.
pub(crate) type SlotList = SmallVec<[usize; 16]>;

/// Tree layout with the node capacity the index is compiled for.
#[derive(Debug, Clone, Copy)]
pub struct LevelTreeParams;

impl RTreeParams for LevelTreeParams {
    const MIN_SIZE: usize = 4;
    const MAX_SIZE: usize = crate::config::COMPILED_NODE_SIZE;
    const REINSERTION_COUNT: usize = 2;
    type DefaultInsertionStrategy = RStarInsertionStrategy;
}

/// A projected record position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedRecord {
    pub x: f64,
    pub y: f64,
    pub slot: usize,
}

impl IndexedRecord {
    pub fn new(x: f64, y: f64, slot: usize) -> Self {
        Self { x, y, slot }
    }
}

impl RTreeObject for IndexedRecord {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

/// Spatial index for one zoom level.
#[derive(Debug, Clone)]
pub struct LevelTree {
    tree: RTree<IndexedRecord, LevelTreeParams>,
}

impl LevelTree {
    /// Bulk-load a static set of records.
    pub fn build(records: Vec<IndexedRecord>) -> Self {
        Self {
            tree: RTree::bulk_load_with_params(records),
        }
    }

    /// Add one record to an already built tree.
    pub fn insert(&mut self, record: IndexedRecord) {
        self.tree.insert(record);
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Slots of all records inside the closed rectangle, in ascending slot order.
    ///
    /// An inverted rectangle matches nothing.
    pub fn range(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> SlotList {
        if !(min_x <= max_x && min_y <= max_y) {
            return SlotList::new();
        }

        let envelope = AABB::from_corners([min_x, min_y], [max_x, max_y]);
        let mut slots: SlotList = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|record| record.slot)
            .collect();
        slots.sort_unstable();
        slots
    }

    /// Slots of all records within `radius` of `(x, y)`, in ascending slot order.
    pub fn within(&self, x: f64, y: f64, radius: f64) -> SlotList {
        let envelope = AABB::from_corners([x - radius, y - radius], [x + radius, y + radius]);
        let r2 = radius * radius;
        let mut slots: SlotList = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .filter(|record| sq_dist(x, y, record.x, record.y) <= r2)
            .map(|record| record.slot)
            .collect();
        slots.sort_unstable();
        slots
    }
}

impl Default for LevelTree {
    fn default() -> Self {
        Self::build(Vec::new())
    }
}

fn sq_dist(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    let dx = ax - bx;
    let dy = ay - by;
    dx * dx + dy * dy
}
