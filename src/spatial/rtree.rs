//! R-tree index of placed label boxes using the rstar crate.
//!
//! Label placement asks one question over and over: which already placed
//! labels share some of my span along the `ered` axis? The index answers it
//! with an envelope query that is unbounded along the ordering axis.

use rstar::{AABB, RTree, RTreeObject};

use crate::graph::NodeId;

/// An axis-aligned label box.
///
/// `x` runs along the `ered` axis, `y` along the ordering axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelRect {
    /// The node the label belongs to.
    pub node: NodeId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl LabelRect {
    /// Copy of this box moved to a new `y`.
    pub fn at_y(&self, y: f32) -> Self {
        Self { y, ..*self }
    }

    /// Whether the `x` spans touch or overlap.
    pub fn spans_overlap(&self, other: &LabelRect) -> bool {
        !(other.x + other.width < self.x || other.x > self.x + self.width)
    }

    /// Area shared with `other` (zero when the boxes only touch).
    pub fn overlap_area(&self, other: &LabelRect) -> f32 {
        let x_overlap = (self.x + self.width).min(other.x + other.width) - self.x.max(other.x);
        let y_overlap = (self.y + self.height).min(other.y + other.height) - self.y.max(other.y);
        if x_overlap <= 0.0 || y_overlap <= 0.0 {
            0.0
        } else {
            x_overlap * y_overlap
        }
    }
}

impl RTreeObject for LabelRect {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.x, self.y], [self.x + self.width, self.y + self.height])
    }
}

/// Spatial index of accepted label boxes.
pub struct LabelIndex {
    tree: RTree<LabelRect>,
}

impl LabelIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Record an accepted box.
    pub fn insert(&mut self, rect: LabelRect) {
        self.tree.insert(rect);
    }

    /// Every accepted box whose `x` span touches or overlaps `rect`'s.
    pub fn sharing_span(&self, rect: &LabelRect) -> Vec<LabelRect> {
        let column = AABB::from_corners([rect.x, f32::MIN], [rect.x + rect.width, f32::MAX]);
        self.tree
            .locate_in_envelope_intersecting(&column)
            .copied()
            .collect()
    }

    /// Largest `y` among the accepted boxes.
    pub fn max_y(&self) -> Option<f32> {
        self.tree.iter().map(|rect| rect.y).reduce(f32::max)
    }

    /// Get the number of boxes in the index.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for LabelIndex {
    fn default() -> Self {
        Self::new()
    }
}
