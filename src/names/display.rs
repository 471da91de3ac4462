//! User-facing names for parameter prefixes.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Prefix of the marker group appended to nodes that hold global parameters.
pub const GLOBALS_MARKER: &str = "__globals__";

/// Substitutes a parameter prefix with its display form.
pub trait NameLookup {
    /// `None` means the literal prefix is shown.
    fn lookup(&self, prefix: &str) -> Option<&str>;
}

impl NameLookup for HashMap<String, String> {
    fn lookup(&self, prefix: &str) -> Option<&str> {
        self.get(prefix).map(String::as_str)
    }
}

/// How a display name was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameKind {
    /// Generated abbreviation.
    Short,
    /// User-supplied TeX source.
    Latex,
    /// User-supplied text.
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayName {
    #[serde(rename = "type")]
    pub kind: NameKind,
    /// Source form (abbreviation, TeX or text).
    pub name: String,
    /// Form shown in labels.
    pub formatted_name: String,
}

/// Prefix → display name mapping for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayNames {
    names: BTreeMap<String, DisplayName>,
}

impl DisplayNames {
    /// A mapping holding only the globals marker.
    pub fn new() -> Self {
        let mut names = BTreeMap::new();
        names.insert(
            GLOBALS_MARKER.to_owned(),
            DisplayName {
                kind: NameKind::Latex,
                name: "\\bar{g}".to_owned(),
                formatted_name: "ḡ".to_owned(),
            },
        );
        Self { names }
    }

    pub fn get(&self, prefix: &str) -> Option<&DisplayName> {
        self.names.get(prefix)
    }

    pub fn insert(&mut self, prefix: impl Into<String>, name: DisplayName) {
        self.names.insert(prefix.into(), name);
    }

    /// Map `prefix` to literal text.
    pub fn insert_plain(&mut self, prefix: impl Into<String>, text: impl Into<String>) {
        let text = text.into();
        self.insert(
            prefix,
            DisplayName {
                kind: NameKind::Plain,
                name: text.clone(),
                formatted_name: text,
            },
        );
    }

    pub fn remove(&mut self, prefix: &str) -> Option<DisplayName> {
        self.names.remove(prefix)
    }

    /// Give every unseen prefix its generated abbreviation.
    ///
    /// Returns how many names were added.
    pub fn register_defaults<'p>(&mut self, prefixes: impl IntoIterator<Item = &'p str>) -> usize {
        let mut added = 0;
        for prefix in prefixes {
            if !self.names.contains_key(prefix) {
                let short = abbreviate(prefix);
                self.names.insert(
                    prefix.to_owned(),
                    DisplayName {
                        kind: NameKind::Short,
                        name: short.clone(),
                        formatted_name: short,
                    },
                );
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for DisplayNames {
    fn default() -> Self {
        Self::new()
    }
}

impl NameLookup for DisplayNames {
    fn lookup(&self, prefix: &str) -> Option<&str> {
        self.names.get(prefix).map(|name| name.formatted_name.as_str())
    }
}

/// First character of each `_`-separated segment: `factor_loadings` → `fl`.
pub fn abbreviate(prefix: &str) -> String {
    prefix
        .split('_')
        .filter_map(|segment| segment.chars().next())
        .collect()
}
