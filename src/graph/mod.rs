//! Tree records and the hierarchy built from them.
//!
//! A snapshot arrives as a flat list of [`Node`] records linked by parent
//! name. [`Hierarchy`] validates that list and answers ancestor, descendant
//! and depth queries; [`AnnotatedNode`] carries the derived layout fields.

mod hierarchy;
mod node;

pub use hierarchy::Hierarchy;
pub use node::{AnnotatedNode, Node, NodeId};
