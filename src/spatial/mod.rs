//! Spatial indexing for label collision checks.
//!
//! This module provides an R-tree based index over placed label boxes so
//! that placement only compares a candidate against labels in its column.

mod rtree;

pub use rtree::{LabelIndex, LabelRect};
