//! Compact display strings for parameter groups.
//!
//! Every prefix group is reduced to one string. Index dimensions that never
//! change collapse to their literal value, and a dimension that does change is
//! rendered as a `lo-hi` run when its values are contiguous:
//!
//! ```text
//! mu_b[1,1] mu_b[1,2] mu_b[1,3]   ->  mu_b[1,1-3]
//! gamma[1] gamma[4]               ->  gamma[1,4]
//! sigma                           ->  sigma
//! ```
//!
//! Groups with more than one varying dimension follow [`MultiDimStyle`], and any
//! suffix longer than the configured limit is replaced by an ellipsis.

use std::collections::BTreeSet;

use log::warn;

use super::display::NameLookup;
use super::index::{ParamGroup, group_by_prefix};
use crate::config::{LayoutConfig, MultiDimStyle};
use crate::error::EncodingError;

/// Placeholder for elided index information.
pub const ELLIPSIS: &str = "⋯";

/// A group reduced to its prefix and one rendered slot per index dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedGroup {
    pub prefix: String,
    /// Empty when no dimension varies.
    pub slots: Vec<String>,
}

impl CompressedGroup {
    /// The index text that goes between the brackets.
    pub fn suffix(&self) -> String {
        self.slots.join(",")
    }

    /// Final display string, using `names` to substitute the prefix.
    pub fn render(&self, names: &dyn NameLookup, max_suffix_len: usize) -> String {
        let display = names.lookup(&self.prefix).unwrap_or(self.prefix.as_str());
        let suffix = self.suffix();
        if suffix.chars().count() > max_suffix_len {
            format!("{display}[{ELLIPSIS}]")
        } else if suffix.is_empty() {
            display.to_owned()
        } else {
            format!("{display}[{suffix}]")
        }
    }
}

/// Compress one prefix group.
pub fn compress_group(
    group: &ParamGroup,
    style: MultiDimStyle,
) -> Result<CompressedGroup, EncodingError> {
    let tuples = group.tuples()?;
    Ok(CompressedGroup {
        prefix: group.prefix.clone(),
        slots: index_slots(&tuples, style),
    })
}

/// Render a set of equal-length index tuples as one string per dimension.
///
/// Returns an empty list when the tuples do not vary at all.
pub fn index_slots(tuples: &[Vec<i64>], style: MultiDimStyle) -> Vec<String> {
    let unique: BTreeSet<&Vec<i64>> = tuples.iter().collect();
    let Some(first) = unique.first().copied() else {
        return Vec::new();
    };
    let dims = first.len();

    let columns: Vec<BTreeSet<i64>> = (0..dims)
        .map(|d| unique.iter().map(|tuple| tuple[d]).collect())
        .collect();
    let variant: Vec<usize> = (0..dims).filter(|&d| columns[d].len() > 1).collect();

    let mut slots: Vec<String> = first.iter().map(i64::to_string).collect();
    match variant.as_slice() {
        [] => return Vec::new(),
        &[d] => {
            slots[d] = match contiguous_run(&columns[d]) {
                Some((lo, hi)) => format!("{lo}-{hi}"),
                None => {
                    let list = join_values(columns[d].iter());
                    if dims > 1 { format!("[{list}]") } else { list }
                }
            };
        }
        _ => match style {
            MultiDimStyle::Flatten => {
                let listed = unique
                    .iter()
                    .map(|tuple| format!("[{}]", join_values(tuple.iter())))
                    .collect::<Vec<_>>()
                    .join(",");
                return vec![listed];
            }
            MultiDimStyle::PerDimension => {
                let product: usize = variant.iter().map(|&d| columns[d].len()).product();
                let reconstructs = product == unique.len();
                for &d in &variant {
                    slots[d] = match contiguous_run(&columns[d]) {
                        Some((lo, hi)) if reconstructs => format!("{lo}-{hi}"),
                        Some((lo, hi)) => format!("({lo}-{hi})"),
                        None => ELLIPSIS.to_owned(),
                    };
                }
            }
        },
    }
    slots
}

/// `(lo, hi)` when the values form one gap-free run of more than one value.
fn contiguous_run(values: &BTreeSet<i64>) -> Option<(i64, i64)> {
    let lo = *values.first()?;
    let hi = *values.last()?;
    let span = usize::try_from(hi.checked_sub(lo)?).ok()? + 1;
    (values.len() > 1 && span == values.len()).then_some((lo, hi))
}

fn join_values<'a>(values: impl Iterator<Item = &'a i64>) -> String {
    values.map(i64::to_string).collect::<Vec<_>>().join(",")
}

/// Compresses whole parameter lists into display strings.
pub struct NameCompressor<'a> {
    names: &'a dyn NameLookup,
    style: MultiDimStyle,
    max_suffix_len: usize,
}

impl<'a> NameCompressor<'a> {
    pub fn new(names: &'a dyn NameLookup, config: &LayoutConfig) -> Self {
        Self {
            names,
            style: config.multi_dim,
            max_suffix_len: config.max_suffix_len,
        }
    }

    /// One display string per prefix group, in first-appearance order.
    ///
    /// A group that cannot be compressed falls back to its literal identifiers;
    /// the other groups are unaffected.
    pub fn compress<S: AsRef<str>>(&self, identifiers: &[S]) -> Vec<String> {
        let mut out = Vec::new();
        for group in group_by_prefix(identifiers) {
            match compress_group(&group, self.style) {
                Ok(compressed) => out.push(compressed.render(self.names, self.max_suffix_len)),
                Err(err) => {
                    warn!("showing `{}` uncompressed: {err}", group.prefix);
                    out.extend(group.members);
                }
            }
        }
        out
    }
}
