//! Layout configuration.
//!
//! All geometry is expressed in layout units (the same units the measurement
//! collaborator returns). The struct deserializes from partial objects, so a
//! caller only needs to send the fields it wants to override.

use serde::{Deserialize, Serialize};

/// Primary-position strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Every node gets its own slot, ordered by sortname.
    Sequence,
    /// Leaves are spaced evenly; internal nodes sit at the mean of their children.
    #[default]
    Balanced,
}

impl LayoutMode {
    /// Parse the selector used by the viewer (`sequence`/`long`, `balanced`/`normal`).
    pub fn from_selector(selector: &str) -> Option<Self> {
        match selector {
            "sequence" | "long" => Some(Self::Sequence),
            "balanced" | "normal" => Some(Self::Balanced),
            _ => None,
        }
    }
}

/// How a group with more than one variant index dimension is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiDimStyle {
    /// Enumerate the literal tuples.
    Flatten,
    /// Summarize each variant dimension independently.
    #[default]
    PerDimension,
}

/// Configuration for one annotation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Primary-position strategy.
    pub mode: LayoutMode,
    /// Height of one label box.
    pub label_height: f32,
    /// Extra room added to the label height to form one layout slot.
    pub label_padding: f32,
    /// Primary position of the first node in sequence mode.
    pub sequence_origin: f32,
    /// Slot multiple between consecutive nodes in sequence mode (at least 1).
    pub sequence_spacing: f32,
    /// Slot multiple between consecutive leaves in balanced mode.
    pub balanced_spacing: f32,
    /// Slot multiple in front of the first leaf in balanced mode.
    pub leaf_origin: f32,
    /// Use the tighter balanced spacing.
    pub compact: bool,
    /// Layout units per unit of `ered`, mapping reductions onto the label axis.
    pub ered_scale: f32,
    /// Diameter of the node marker the label is anchored against.
    pub node_size: f32,
    /// Gap between the node marker and its label.
    pub label_gap: f32,
    /// Fixed width added in front of the measured label text.
    pub label_inset: f32,
    /// Append the globals marker to nodes holding global parameters.
    pub show_globals: bool,
    /// Rendering of groups with several variant dimensions.
    pub multi_dim: MultiDimStyle,
    /// Index suffixes longer than this (in characters) are elided.
    pub max_suffix_len: usize,
}

impl LayoutConfig {
    /// Balanced spacing used when `compact` is set.
    pub const COMPACT_SPACING: f32 = 1.2;

    /// One layout slot: the minimum distance between sequence positions.
    pub fn slot(&self) -> f32 {
        self.label_height + self.label_padding
    }

    /// Slot multiple between leaves in balanced mode.
    pub fn leaf_spacing(&self) -> f32 {
        if self.compact {
            Self::COMPACT_SPACING
        } else {
            self.balanced_spacing
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            mode: LayoutMode::Balanced,
            label_height: 10.0,
            label_padding: 8.0,
            sequence_origin: 0.05,
            sequence_spacing: 1.1,
            balanced_spacing: 2.2,
            leaf_origin: 1.1,
            compact: false,
            ered_scale: 1000.0,
            node_size: 9.0,
            label_gap: 2.0,
            label_inset: 15.0,
            show_globals: true,
            multi_dim: MultiDimStyle::PerDimension,
            max_suffix_len: 12,
        }
    }
}
