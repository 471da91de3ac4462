//! Primary-position assignment.
//!
//! Two strategies place nodes along the ordering axis:
//!
//! - **Sequence:** every node, internal or leaf, gets its own slot. Nodes are
//!   ordered by sortname, so a subtree's nodes stay together and parents come
//!   before their children.
//! - **Balanced:** only leaves get slots (ordered by sortname, spaced by a
//!   fixed multiple of the slot). Each internal node is then placed, bottom-up,
//!   at the mean of its immediate children, in the manner of a cladogram. No
//!   attempt is made to minimize subtree width or edge crossings.

use crate::config::{LayoutConfig, LayoutMode};
use crate::error::StructuralError;
use crate::graph::{Hierarchy, NodeId};

/// Composite ordering key of every node: the shortnames of its root-first
/// ancestor chain, concatenated.
pub fn sortnames(hierarchy: &Hierarchy, shortnames: &[String]) -> Vec<String> {
    let mut out = vec![String::new(); hierarchy.len()];
    for id in hierarchy.depth_first() {
        let mut key = hierarchy
            .parent(id)
            .map(|parent| out[parent.index()].clone())
            .unwrap_or_default();
        key.push_str(&shortnames[id.index()]);
        out[id.index()] = key;
    }
    out
}

/// Sort ids by sortname; ties keep their incoming order.
fn by_sortname(mut ids: Vec<NodeId>, sortnames: &[String]) -> Vec<NodeId> {
    ids.sort_by(|a, b| sortnames[a.index()].cmp(&sortnames[b.index()]));
    ids
}

/// Primary position of every node, indexed by `NodeId`.
pub fn assign_positions(
    hierarchy: &Hierarchy,
    sortnames: &[String],
    config: &LayoutConfig,
) -> Result<Vec<f32>, StructuralError> {
    if hierarchy.is_empty() {
        return Err(StructuralError::EmptyTree);
    }
    Ok(match config.mode {
        LayoutMode::Sequence => sequence_positions(hierarchy, sortnames, config),
        LayoutMode::Balanced => balanced_positions(hierarchy, sortnames, config),
    })
}

fn sequence_positions(
    hierarchy: &Hierarchy,
    sortnames: &[String],
    config: &LayoutConfig,
) -> Vec<f32> {
    // Never closer than one slot, whatever the configured multiple.
    let step = config.sequence_spacing.max(1.0) * config.slot();
    let mut positions = vec![0.0; hierarchy.len()];
    for (rank, id) in by_sortname(hierarchy.depth_first(), sortnames).into_iter().enumerate() {
        positions[id.index()] = config.sequence_origin + rank as f32 * step;
    }
    positions
}

fn balanced_positions(
    hierarchy: &Hierarchy,
    sortnames: &[String],
    config: &LayoutConfig,
) -> Vec<f32> {
    let slot = config.slot();
    let origin = config.leaf_origin * slot;
    let step = config.leaf_spacing() * slot;

    let mut positions = vec![0.0; hierarchy.len()];
    for (rank, leaf) in by_sortname(hierarchy.leaves(), sortnames).into_iter().enumerate() {
        positions[leaf.index()] = origin + rank as f32 * step;
    }

    for id in hierarchy.post_order() {
        let children = hierarchy.children(id);
        if !children.is_empty() {
            let total: f32 = children.iter().map(|child| positions[child.index()]).sum();
            positions[id.index()] = total / children.len() as f32;
        }
    }
    positions
}
