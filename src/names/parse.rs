//! Expand compressed index slots back into explicit tuples.
//!
//! Each token describes one dimension: either an inclusive `lo-hi` range or a
//! comma-separated list. Single-value dimensions broadcast across every row;
//! the remaining dimensions are zipped row by row.

use crate::error::EncodingError;

/// Longest range a single token may expand to. Longer spans are rejected as
/// unparsable instead of being allocated.
pub const MAX_RANGE_LEN: u64 = 1 << 20;

/// Expand one token per dimension into explicit index tuples.
///
/// `["1", "1-3"]` becomes `[[1, 1], [1, 2], [1, 3]]`. The bracket and
/// parenthesis decorations produced by the compressor are accepted.
pub fn parse_index_strs<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<Vec<i64>>, EncodingError> {
    let columns = tokens
        .iter()
        .map(|token| expand_token(token.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    let lengths: Vec<usize> = columns.iter().map(Vec::len).collect();
    let mut multi = lengths.iter().copied().filter(|&len| len > 1);
    let rows = match multi.next() {
        Some(len) => {
            if multi.any(|other| other != len) {
                return Err(EncodingError::InconsistentLength { lengths });
            }
            len
        }
        None if columns.is_empty() => 0,
        None => 1,
    };

    Ok((0..rows)
        .map(|row| {
            columns
                .iter()
                .map(|column| if column.len() == 1 { column[0] } else { column[row] })
                .collect()
        })
        .collect())
}

fn expand_token(token: &str) -> Result<Vec<i64>, EncodingError> {
    let token = token.trim();
    let unwrapped = token
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .unwrap_or(token);
    if let Some((lo, hi)) = split_range(unwrapped) {
        return expand_range(lo, hi)
            .ok_or_else(|| EncodingError::UnparsableRange(token.to_owned()));
    }

    let list = token
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .unwrap_or(token);
    list.split(',')
        .map(|value| value.trim().parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| EncodingError::UnparsableList(token.to_owned()))
}

/// Split `lo-hi` at the separator. A leading `-` is the sign of `lo`, so
/// `-3--1` splits into `-3` and `-1` while `-1` is not a range.
fn split_range(token: &str) -> Option<(&str, &str)> {
    if token.contains(',') {
        return None;
    }
    let at = token
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c == '-')
        .map(|(at, _)| at)?;
    Some((&token[..at], &token[at + 1..]))
}

fn expand_range(lo: &str, hi: &str) -> Option<Vec<i64>> {
    let lo = lo.trim().parse::<i64>().ok()?;
    let hi = hi.trim().parse::<i64>().ok()?;
    let span = u64::try_from(hi.checked_sub(lo)?).ok()?;
    (span < MAX_RANGE_LEN).then(|| (lo..=hi).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MultiDimStyle;
    use crate::names::compress::index_slots;

    #[test]
    fn test_range_with_broadcast_constant() {
        assert_eq!(
            parse_index_strs(&["1", "1-3"]).unwrap(),
            vec![vec![1, 1], vec![1, 2], vec![1, 3]]
        );
    }

    #[test]
    fn test_lists_zip_row_by_row() {
        assert_eq!(
            parse_index_strs(&["1,4", "2-3", "7"]).unwrap(),
            vec![vec![1, 2, 7], vec![4, 3, 7]]
        );
    }

    #[test]
    fn test_decorated_tokens() {
        assert_eq!(
            parse_index_strs(&["2", "[1,3,5]"]).unwrap(),
            vec![vec![2, 1], vec![2, 3], vec![2, 5]]
        );
        assert_eq!(parse_index_strs(&["(1-2)"]).unwrap(), vec![vec![1], vec![2]]);
    }

    #[test]
    fn test_all_single_values_give_one_row() {
        assert_eq!(parse_index_strs(&["4", "2"]).unwrap(), vec![vec![4, 2]]);
        assert!(parse_index_strs::<&str>(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_reversed_range_fails() {
        assert_eq!(
            parse_index_strs(&["3-1"]).unwrap_err(),
            EncodingError::UnparsableRange("3-1".into())
        );
    }

    #[test]
    fn test_malformed_range_fails() {
        assert!(matches!(
            parse_index_strs(&["1-2-3"]),
            Err(EncodingError::UnparsableRange(_))
        ));
        assert!(matches!(
            parse_index_strs(&["a-3"]),
            Err(EncodingError::UnparsableRange(_))
        ));
    }

    #[test]
    fn test_oversized_range_fails() {
        assert_eq!(
            parse_index_strs(&["0-9223372036854775806"]).unwrap_err(),
            EncodingError::UnparsableRange("0-9223372036854775806".into())
        );
        assert!(matches!(
            parse_index_strs(&["-9223372036854775808-9223372036854775807"]),
            Err(EncodingError::UnparsableRange(_))
        ));
        let widest = format!("1-{MAX_RANGE_LEN}");
        assert_eq!(parse_index_strs(&[widest]).unwrap().len() as u64, MAX_RANGE_LEN);
    }

    #[test]
    fn test_negative_indices() {
        assert_eq!(parse_index_strs(&["-1"]).unwrap(), vec![vec![-1]]);
        assert_eq!(
            parse_index_strs(&["-3--1"]).unwrap(),
            vec![vec![-3], vec![-2], vec![-1]]
        );
        assert_eq!(
            parse_index_strs(&["-2,4"]).unwrap(),
            vec![vec![-2], vec![4]]
        );
    }

    #[test]
    fn test_non_integer_list_fails() {
        assert_eq!(
            parse_index_strs(&["1,x"]).unwrap_err(),
            EncodingError::UnparsableList("1,x".into())
        );
        assert!(matches!(
            parse_index_strs(&["⋯"]),
            Err(EncodingError::UnparsableList(_))
        ));
    }

    #[test]
    fn test_unequal_lengths_fail() {
        assert_eq!(
            parse_index_strs(&["1-3", "1,2"]).unwrap_err(),
            EncodingError::InconsistentLength { lengths: vec![3, 2] }
        );
    }

    #[test]
    fn test_inverts_single_variant_compression() {
        let original = vec![vec![5, 2, 9], vec![5, 3, 9], vec![5, 4, 9]];
        let slots = index_slots(&original, MultiDimStyle::PerDimension);
        assert_eq!(slots, vec!["5", "2-4", "9"]);
        assert_eq!(parse_index_strs(&slots).unwrap(), original);

        let scattered = vec![vec![1], vec![4], vec![6]];
        let slots = index_slots(&scattered, MultiDimStyle::PerDimension);
        assert_eq!(parse_index_strs(&slots).unwrap(), scattered);

        let negative = vec![vec![-3, 0], vec![-2, 0], vec![-1, 0]];
        let slots = index_slots(&negative, MultiDimStyle::PerDimension);
        assert_eq!(slots, vec!["-3--1", "0"]);
        assert_eq!(parse_index_strs(&slots).unwrap(), negative);
    }
}
