//! Node records.
//!
//! A [`Node`] is one row of the flat snapshot sent by the backend. Each node has:
//! - A unique name within the snapshot
//! - The name of its parent (empty for the root)
//! - The error reduction value (`ered`) it represents
//! - The set of parameter identifiers it owns
//!
//! [`AnnotatedNode`] is the same record after the annotation pass.

use serde::{Deserialize, Serialize};

/// Position of a node within one snapshot's hierarchy.
///
/// Only meaningful for the [`super::Hierarchy`] that produced it; a new
/// snapshot assigns fresh ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Index into the snapshot's node list.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Input record for one node of the decomposition tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(default)]
    pub parent: String,
    pub ered: f32,
    #[serde(default)]
    pub params: Vec<String>,
}

impl Node {
    pub fn new(
        name: impl Into<String>,
        parent: impl Into<String>,
        ered: f32,
        params: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            parent: parent.into(),
            ered,
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// The root is the node without a parent.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_empty()
    }
}

/// A node with every derived field filled in by the annotation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedNode {
    #[serde(flatten)]
    pub node: Node,
    /// Path length from the root (root = 0).
    pub depth: u32,
    /// Coordinate along the ordering axis.
    #[serde(rename = "x_pos", alias = "primary_pos")]
    pub primary_pos: f32,
    /// Collision-resolved label coordinate.
    #[serde(rename = "label_y", alias = "secondary_pos")]
    pub secondary_pos: f32,
    /// Whether the label was flipped to the slot above the node.
    pub label_above: bool,
    /// Width of the label box along the `ered` axis.
    pub label_width: f32,
    /// Compressed display strings, one per parameter group.
    pub param_names: Vec<String>,
    /// `param_names` joined for display.
    pub shortname: String,
    /// Concatenated shortnames of the root-first ancestor chain.
    pub sortname: String,
}
