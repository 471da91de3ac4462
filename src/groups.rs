//! Named subsets of tree nodes.
//!
//! A group restricts the visible tree. Selecting one keeps its members and
//! every ancestor of a member, so the filtered records still form one rooted
//! tree.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::GroupError;
use crate::graph::{Hierarchy, Node, NodeId};

/// Group name → member node names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Groups {
    groups: BTreeMap<String, BTreeSet<String>>,
}

impl Groups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a group. Names must be non-empty and unused.
    pub fn define(
        &mut self,
        name: impl Into<String>,
        nodes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<(), GroupError> {
        let name = name.into();
        if name.is_empty() {
            return Err(GroupError::EmptyName);
        }
        if self.groups.contains_key(&name) {
            return Err(GroupError::AlreadyExists(name));
        }
        self.groups
            .insert(name, nodes.into_iter().map(Into::into).collect());
        Ok(())
    }

    /// Returns `true` if the group existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.groups.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.groups.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Group names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Add the members of `other`, uniting groups that share a name.
    pub fn merge(&mut self, other: Groups) {
        for (name, members) in other.groups {
            self.groups.entry(name).or_default().extend(members);
        }
    }

    /// Drop members that are not in `hierarchy`, then drop empty groups.
    ///
    /// Returns whether anything changed.
    pub fn prune(&mut self, hierarchy: &Hierarchy) -> bool {
        let mut changed = false;
        for members in self.groups.values_mut() {
            let before = members.len();
            members.retain(|name| hierarchy.get(name).is_some());
            changed |= members.len() != before;
        }
        let before = self.groups.len();
        self.groups.retain(|_, members| !members.is_empty());
        changed | (self.groups.len() != before)
    }

    /// Add every ancestor of every member to its group.
    ///
    /// Returns whether anything changed.
    pub fn expand(&mut self, hierarchy: &Hierarchy) -> bool {
        let mut changed = false;
        for members in self.groups.values_mut() {
            let ancestors: Vec<String> = members
                .iter()
                .filter_map(|name| hierarchy.get(name))
                .flat_map(|id| hierarchy.ancestors(id))
                .map(|id| hierarchy.node(id).name.clone())
                .collect();
            for name in ancestors {
                changed |= members.insert(name);
            }
        }
        changed
    }

    /// Records visible when `group` is selected, in input order.
    ///
    /// `None` when the group is unknown, meaning no filter applies.
    pub fn filter(&self, group: &str, hierarchy: &Hierarchy) -> Option<Vec<Node>> {
        let members = self.groups.get(group)?;
        let visible: HashSet<_> = members
            .iter()
            .filter_map(|name| hierarchy.get(name))
            .flat_map(|id| hierarchy.ancestors(id))
            .collect();
        Some(
            hierarchy
                .nodes()
                .iter()
                .enumerate()
                .filter(|(index, _)| visible.contains(&NodeId::new(*index as u32)))
                .map(|(_, node)| node.clone())
                .collect(),
        )
    }
}
