//! Layout of an annotated decomposition tree.
//!
//! This module computes, for every node, a primary position along the
//! ordering axis and a collision-avoiding label slot, and assembles them with
//! the compressed parameter names into an [`AnnotatedTree`].

pub mod annotate;
pub mod labels;
pub mod position;

pub use annotate::{AnnotatedTree, annotate};
pub use labels::{LabelPlacement, LabelSlot, place_labels};
pub use position::{assign_positions, sortnames};
