//! The annotation pass.
//!
//! One call turns a flat snapshot into an [`AnnotatedTree`]:
//!
//! 1. resolve the measurer (fails before any other work if none is installed)
//! 2. validate the full snapshot
//! 3. apply the selected group, then rebuild the visible tree
//! 4. compress each node's local parameters into display strings
//! 5. derive shortnames and sortnames
//! 6. assign primary positions
//! 7. place labels
//!
//! The pass owns a fresh copy of the records and shares nothing with earlier
//! passes.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::{LayoutConfig, LayoutMode};
use crate::error::Result;
use crate::graph::{AnnotatedNode, Hierarchy, Node, NodeId};
use crate::groups::Groups;
use crate::layout::labels::place_labels;
use crate::layout::position::{assign_positions, sortnames};
use crate::measure::TextMeasure;
use crate::names::{GLOBALS_MARKER, NameCompressor};
use crate::session::SessionContext;

/// Separator between the display strings of one node.
const SHORTNAME_SEPARATOR: &str = ", ";

/// Immutable result of one annotation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedTree {
    /// Visible nodes in input order.
    pub nodes: Vec<AnnotatedNode>,
    /// Largest secondary coordinate used by any label.
    pub max_secondary: f32,
    /// Global cutoff carried through for the renderer.
    pub global_limit: Option<f32>,
    pub mode: LayoutMode,
}

impl AnnotatedTree {
    pub fn get(&self, name: &str) -> Option<&AnnotatedNode> {
        self.nodes.iter().find(|n| n.node.name == name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Run a full pass over `nodes`.
///
/// `measure` overrides the process-wide measurer; with `None` the installed
/// one is used.
pub fn annotate(
    nodes: &[Node],
    config: &LayoutConfig,
    context: &SessionContext,
    groups: &Groups,
    measure: Option<&dyn TextMeasure>,
) -> Result<AnnotatedTree> {
    let measure = match measure {
        Some(measure) => measure,
        None => crate::measure::installed()?,
    };

    let full = Hierarchy::build(nodes.to_vec())?;
    let hierarchy = match context
        .group
        .as_deref()
        .and_then(|group| groups.filter(group, &full))
    {
        Some(visible) => Hierarchy::build(visible)?,
        None => full,
    };

    let param_names = compress_params(&hierarchy, config, context);
    let shortnames: Vec<String> = param_names
        .iter()
        .map(|names| names.join(SHORTNAME_SEPARATOR))
        .collect();
    let sortnames = sortnames(&hierarchy, &shortnames);

    let primary = assign_positions(&hierarchy, &sortnames, config)?;
    let labels = place_labels(&hierarchy, &primary, &param_names, config, measure);

    debug!(
        "annotated {} of {} nodes ({:?}), max secondary {:.1}",
        hierarchy.len(),
        nodes.len(),
        config.mode,
        labels.max_secondary
    );

    let annotated = hierarchy
        .nodes()
        .iter()
        .enumerate()
        .zip(param_names.into_iter().zip(shortnames).zip(sortnames))
        .map(|((index, node), ((param_names, shortname), sortname))| {
            let slot = labels.slots[index];
            AnnotatedNode {
                node: node.clone(),
                depth: hierarchy.depth(NodeId::new(index as u32)),
                primary_pos: primary[index],
                secondary_pos: slot.secondary_pos,
                label_above: slot.above,
                label_width: slot.width,
                param_names,
                shortname,
                sortname,
            }
        })
        .collect();

    Ok(AnnotatedTree {
        nodes: annotated,
        max_secondary: labels.max_secondary,
        global_limit: context.global_limit,
        mode: config.mode,
    })
}

/// Display strings of every node, indexed by `NodeId`.
///
/// Global parameters are left out of compression; a node holding any of them
/// gets the globals marker appended instead.
fn compress_params(
    hierarchy: &Hierarchy,
    config: &LayoutConfig,
    context: &SessionContext,
) -> Vec<Vec<String>> {
    let compressor = NameCompressor::new(&context.names, config);
    hierarchy
        .nodes()
        .iter()
        .map(|node| {
            let (global, mut local): (Vec<&str>, Vec<&str>) = node
                .params
                .iter()
                .map(String::as_str)
                .partition(|param| context.globals.contains(*param));
            if config.show_globals && !global.is_empty() {
                local.push(GLOBALS_MARKER);
            }
            compressor.compress(&local)
        })
        .collect()
}
