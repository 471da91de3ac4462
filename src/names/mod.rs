//! Parameter name compression.
//!
//! Nodes own sets of parameter identifiers such as `mu_b[1,2]`. This module
//! groups them by prefix, renders each group as one compact label string, and
//! parses compressed index slots back into explicit tuples.

pub mod compress;
pub mod display;
pub mod index;
pub mod parse;

pub use compress::{CompressedGroup, ELLIPSIS, NameCompressor, compress_group, index_slots};
pub use display::{DisplayName, DisplayNames, GLOBALS_MARKER, NameKind, NameLookup};
pub use index::{ParamGroup, ParamName, group_by_prefix};
pub use parse::{MAX_RANGE_LEN, parse_index_strs};
