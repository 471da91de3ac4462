//! Greedy label placement.
//!
//! Each node gets a label box starting at its `ered` coordinate and extending
//! by the measured label width. The box sits in one of two slots along the
//! ordering axis: just below the node marker (the default) or mirrored just
//! above it. Nodes are visited breadth-first; each one only looks at labels
//! accepted before it and never revisits an earlier choice, so the result
//! depends on visiting order.

use crate::config::LayoutConfig;
use crate::graph::{Hierarchy, NodeId};
use crate::measure::TextMeasure;
use crate::spatial::{LabelIndex, LabelRect};

/// Where one node's label ended up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LabelSlot {
    /// Top edge of the label box along the ordering axis.
    pub secondary_pos: f32,
    /// Whether the mirrored slot above the node was chosen.
    pub above: bool,
    /// Width of the box along the `ered` axis.
    pub width: f32,
}

/// Result of placing every label of a tree.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPlacement {
    /// Per node, indexed by `NodeId`.
    pub slots: Vec<LabelSlot>,
    /// Largest secondary coordinate used, for viewport sizing.
    pub max_secondary: f32,
}

/// The two candidate top edges for a node at `primary`.
fn candidate_rows(primary: f32, config: &LayoutConfig) -> (f32, f32) {
    let below = primary + config.node_size / 2.0 + config.label_gap;
    let above = below - config.node_size - config.label_height - 2.0 * config.label_gap;
    (below, above)
}

fn total_overlap(candidate: &LabelRect, placed: &[LabelRect]) -> f32 {
    placed.iter().map(|rect| candidate.overlap_area(rect)).sum()
}

/// Place the label of every node.
///
/// `primary` holds the primary position and `param_names` the compressed
/// display strings of each node, both indexed by `NodeId`.
pub fn place_labels(
    hierarchy: &Hierarchy,
    primary: &[f32],
    param_names: &[Vec<String>],
    config: &LayoutConfig,
    measure: &dyn TextMeasure,
) -> LabelPlacement {
    let mut index = LabelIndex::new();
    let mut slots = vec![LabelSlot::default(); hierarchy.len()];

    for id in hierarchy.breadth_first() {
        let slot = place_one(hierarchy, id, primary, param_names, config, measure, &index);
        index.insert(LabelRect {
            node: id,
            x: hierarchy.node(id).ered * config.ered_scale,
            y: slot.secondary_pos,
            width: slot.width,
            height: config.label_height,
        });
        slots[id.index()] = slot;
    }

    LabelPlacement {
        max_secondary: index.max_y().unwrap_or(0.0),
        slots,
    }
}

fn place_one(
    hierarchy: &Hierarchy,
    id: NodeId,
    primary: &[f32],
    param_names: &[Vec<String>],
    config: &LayoutConfig,
    measure: &dyn TextMeasure,
    index: &LabelIndex,
) -> LabelSlot {
    let width = config.label_inset + measure.measure(&param_names[id.index()]);
    let (below_y, above_y) = candidate_rows(primary[id.index()], config);
    let below = LabelRect {
        node: id,
        x: hierarchy.node(id).ered * config.ered_scale,
        y: below_y,
        width,
        height: config.label_height,
    };

    let neighbours = index.sharing_span(&below);
    if neighbours.is_empty() {
        return LabelSlot { secondary_pos: below_y, above: false, width };
    }

    let below_cost = total_overlap(&below, &neighbours);
    let above_cost = total_overlap(&below.at_y(above_y), &neighbours);
    if above_cost < below_cost {
        LabelSlot { secondary_pos: above_y, above: true, width }
    } else {
        LabelSlot { secondary_pos: below_y, above: false, width }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Node;
    use crate::measure::{FixedWidthMeasure, LabelPadding};

    fn measure() -> FixedWidthMeasure {
        FixedWidthMeasure {
            column_width: 5.0,
            padding: LabelPadding { base: 0.0, per_item: 0.0 },
        }
    }

    fn names(h: &Hierarchy, label: &str) -> Vec<Vec<String>> {
        vec![vec![label.to_string()]; h.len()]
    }

    fn rect_of(
        h: &Hierarchy,
        placement: &LabelPlacement,
        config: &LayoutConfig,
        name: &str,
    ) -> LabelRect {
        let id = h.get(name).unwrap();
        let slot = placement.slots[id.index()];
        LabelRect {
            node: id,
            x: h.node(id).ered * config.ered_scale,
            y: slot.secondary_pos,
            width: slot.width,
            height: config.label_height,
        }
    }

    #[test]
    fn test_lone_label_goes_below() {
        let h = Hierarchy::build(vec![Node::new("r", "", 0.0, vec!["a"])]).unwrap();
        let config = LayoutConfig::default();
        let placement = place_labels(&h, &[100.0], &names(&h, "abc"), &config, &measure());

        let slot = placement.slots[0];
        assert!(!slot.above);
        assert_eq!(slot.secondary_pos, 100.0 + 4.5 + 2.0);
        assert_eq!(slot.width, 15.0 + 15.0);
        assert_eq!(placement.max_secondary, slot.secondary_pos);
    }

    #[test]
    fn test_colliding_label_flips_above() {
        // Siblings at nearly the same primary position and the same ered.
        let h = Hierarchy::build(vec![
            Node::new("r", "", 0.0, vec!["p"]),
            Node::new("a", "r", 0.5, vec!["p"]),
            Node::new("b", "r", 0.5, vec!["p"]),
        ])
        .unwrap();
        let config = LayoutConfig::default();
        let primary = [0.0, 50.0, 55.0];
        let placement = place_labels(&h, &primary, &names(&h, "abcd"), &config, &measure());

        let a = rect_of(&h, &placement, &config, "a");
        let b = rect_of(&h, &placement, &config, "b");
        assert!(!placement.slots[1].above);
        assert!(placement.slots[2].above, "second label should move out of the way");
        assert!(a.spans_overlap(&b));
        assert!(
            (a.y - b.y).abs() >= config.label_height,
            "labels {a:?} and {b:?} overlap"
        );
        assert_eq!(a.overlap_area(&b), 0.0);
    }

    #[test]
    fn test_equal_cost_prefers_below() {
        // The earlier label shares the column but is far away along the
        // ordering axis, so both slots cost nothing.
        let h = Hierarchy::build(vec![
            Node::new("r", "", 0.0, vec!["p"]),
            Node::new("a", "r", 0.0, vec!["p"]),
        ])
        .unwrap();
        let config = LayoutConfig::default();
        let placement = place_labels(&h, &[0.0, 500.0], &names(&h, "x"), &config, &measure());
        assert!(!placement.slots[1].above);
        assert_eq!(placement.max_secondary, placement.slots[1].secondary_pos);
    }

    #[test]
    fn test_separate_columns_do_not_interact() {
        let h = Hierarchy::build(vec![
            Node::new("r", "", 0.0, vec!["p"]),
            Node::new("a", "r", 0.9, vec!["p"]),
        ])
        .unwrap();
        let config = LayoutConfig::default();
        let placement = place_labels(&h, &[10.0, 10.0], &names(&h, "x"), &config, &measure());
        assert!(!placement.slots[0].above);
        assert!(!placement.slots[1].above);
    }
}
