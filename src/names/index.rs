//! Parameter identifiers and prefix groups.
//!
//! An identifier is a prefix optionally followed by a bracketed,
//! comma-separated integer tuple: `theta`, `mu[3]`, `mu_b[1,7]`.

use crate::error::EncodingError;

/// A parsed parameter identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamName {
    pub prefix: String,
    pub indices: Vec<i64>,
}

impl ParamName {
    /// Split an identifier into its prefix and index tuple.
    pub fn parse(identifier: &str) -> Result<Self, EncodingError> {
        let unparsable = || EncodingError::UnparsableIdentifier(identifier.to_owned());

        let Some((prefix, rest)) = identifier.split_once('[') else {
            return Ok(Self {
                prefix: identifier.to_owned(),
                indices: Vec::new(),
            });
        };
        let body = rest.strip_suffix(']').ok_or_else(unparsable)?;
        let indices = body
            .split(',')
            .map(|part| part.trim().parse::<i64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| unparsable())?;

        Ok(Self {
            prefix: prefix.to_owned(),
            indices,
        })
    }

    /// Text before the first bracket.
    pub fn prefix_of(identifier: &str) -> &str {
        identifier
            .split_once('[')
            .map_or(identifier, |(prefix, _)| prefix)
    }
}

/// Identifiers sharing one prefix, in first-appearance order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamGroup {
    pub prefix: String,
    pub members: Vec<String>,
}

impl ParamGroup {
    /// Index tuples of every member.
    ///
    /// Fails if a member is malformed or the members disagree on dimensionality.
    pub fn tuples(&self) -> Result<Vec<Vec<i64>>, EncodingError> {
        let mut tuples: Vec<Vec<i64>> = Vec::with_capacity(self.members.len());
        for member in &self.members {
            let parsed = ParamName::parse(member)?;
            if let Some(first) = tuples.first() {
                if first.len() != parsed.indices.len() {
                    return Err(EncodingError::DimensionMismatch {
                        prefix: self.prefix.clone(),
                        expected: first.len(),
                        found: parsed.indices.len(),
                    });
                }
            }
            tuples.push(parsed.indices);
        }
        Ok(tuples)
    }
}

/// Partition identifiers into prefix groups, preserving first-appearance order.
pub fn group_by_prefix<S: AsRef<str>>(identifiers: &[S]) -> Vec<ParamGroup> {
    let mut groups: Vec<ParamGroup> = Vec::new();
    for identifier in identifiers {
        let identifier = identifier.as_ref();
        let prefix = ParamName::prefix_of(identifier);
        match groups.iter_mut().find(|group| group.prefix == prefix) {
            Some(group) => group.members.push(identifier.to_owned()),
            None => groups.push(ParamGroup {
                prefix: prefix.to_owned(),
                members: vec![identifier.to_owned()],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_and_indexed() {
        assert_eq!(
            ParamName::parse("sigma").unwrap(),
            ParamName { prefix: "sigma".into(), indices: vec![] }
        );
        assert_eq!(
            ParamName::parse("mu_b[1, 12]").unwrap(),
            ParamName { prefix: "mu_b".into(), indices: vec![1, 12] }
        );
    }

    #[test]
    fn test_parse_rejects_malformed_suffix() {
        assert!(matches!(
            ParamName::parse("mu[1,x]"),
            Err(EncodingError::UnparsableIdentifier(_))
        ));
        assert!(matches!(
            ParamName::parse("mu[1"),
            Err(EncodingError::UnparsableIdentifier(_))
        ));
    }

    #[test]
    fn test_grouping_keeps_first_appearance_order() {
        let groups = group_by_prefix(&["b[1]", "a", "b[2]", "ab[1]"]);
        let prefixes: Vec<_> = groups.iter().map(|g| g.prefix.as_str()).collect();
        assert_eq!(prefixes, vec!["b", "a", "ab"]);
        assert_eq!(groups[0].members, vec!["b[1]", "b[2]"]);
    }

    #[test]
    fn test_dimension_mismatch() {
        let group = ParamGroup {
            prefix: "theta".into(),
            members: vec!["theta[1]".into(), "theta[1,2]".into()],
        };
        assert_eq!(
            group.tuples().unwrap_err(),
            EncodingError::DimensionMismatch {
                prefix: "theta".into(),
                expected: 1,
                found: 2
            }
        );
    }
}
