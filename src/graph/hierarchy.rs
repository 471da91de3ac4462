//! Hierarchy - name-indexed tree built from a flat snapshot.
//!
//! The Hierarchy stores the parent→child topology using petgraph's StableGraph
//! and keeps the input records in their original order, so that a `NodeId`
//! doubles as an index into both the graph and the record list.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::{Dfs, DfsPostOrder};
use petgraph::{Directed, Direction};

use super::node::{Node, NodeId};
use crate::error::StructuralError;

/// A validated, read-only tree over one snapshot.
///
/// This struct manages:
/// - Topology via petgraph (edges point parent → child)
/// - The records, indexed by `NodeId`
/// - Name lookup
/// - Depth of every node (root = 0)
#[derive(Debug, Clone)]
pub struct Hierarchy {
    /// Edges point from parent to child.
    graph: StableGraph<NodeId, (), Directed>,

    /// Records in input order.
    nodes: Vec<Node>,

    /// Map from node name to its id.
    by_name: HashMap<String, NodeId>,

    /// Children of each node, in input order.
    children: Vec<Vec<NodeId>>,

    /// Depth of each node.
    depths: Vec<u32>,

    root: NodeId,
}

impl Hierarchy {
    /// Build and validate a hierarchy from a flat record list.
    ///
    /// Fails if the list is empty, a name repeats, a parent is missing, there
    /// is not exactly one root, or some nodes only reach each other.
    pub fn build(nodes: Vec<Node>) -> Result<Self, StructuralError> {
        if nodes.is_empty() {
            return Err(StructuralError::EmptyTree);
        }

        let mut graph = StableGraph::with_capacity(nodes.len(), nodes.len());
        let mut by_name = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            let id = NodeId(i as u32);
            if by_name.insert(node.name.clone(), id).is_some() {
                return Err(StructuralError::DuplicateName(node.name.clone()));
            }
            graph.add_node(id);
        }

        let mut roots = Vec::new();
        let mut children = vec![Vec::new(); nodes.len()];
        for (i, node) in nodes.iter().enumerate() {
            if node.is_root() {
                roots.push(i);
                continue;
            }
            let parent = by_name.get(&node.parent).copied().ok_or_else(|| {
                StructuralError::MissingParent {
                    node: node.name.clone(),
                    parent: node.parent.clone(),
                }
            })?;
            graph.add_edge(NodeIndex::new(parent.index()), NodeIndex::new(i), ());
            children[parent.index()].push(NodeId(i as u32));
        }

        let root = match roots.as_slice() {
            [] => return Err(StructuralError::MissingRoot),
            [root] => NodeId(*root as u32),
            _ => {
                return Err(StructuralError::MultipleRoots(
                    roots.iter().map(|&i| nodes[i].name.clone()).collect(),
                ));
            }
        };

        // Every node has exactly one parent, so anything the root cannot reach
        // sits on a parent cycle.
        let mut reached = HashSet::with_capacity(nodes.len());
        let mut dfs = Dfs::new(&graph, NodeIndex::new(root.index()));
        while let Some(index) = dfs.next(&graph) {
            reached.insert(index.index());
        }
        if reached.len() != nodes.len() {
            let stranded = (0..nodes.len())
                .filter(|i| !reached.contains(i))
                .map(|i| nodes[i].name.clone())
                .collect();
            return Err(StructuralError::Cycle(stranded));
        }

        let mut depths = vec![0u32; nodes.len()];
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            for &child in &children[id.index()] {
                depths[child.index()] = depths[id.index()] + 1;
                queue.push_back(child);
            }
        }

        Ok(Self {
            graph,
            nodes,
            by_name,
            children,
            depths,
            root,
        })
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A built hierarchy always holds at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Records in input order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Look a node up by name.
    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.graph
            .neighbors_directed(NodeIndex::new(id.index()), Direction::Incoming)
            .next()
            .map(|index| NodeId(index.index() as u32))
    }

    /// Immediate children in input order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.children[id.index()]
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.children[id.index()].is_empty()
    }

    /// Path length from the root.
    pub fn depth(&self, id: NodeId) -> u32 {
        self.depths[id.index()]
    }

    // =========================================================================
    // Traversals
    // =========================================================================

    /// The node itself followed by each ancestor up to the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// The node and all of its descendants, depth-first, children in input order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Whole tree in depth-first pre-order.
    pub fn depth_first(&self) -> Vec<NodeId> {
        self.descendants(self.root)
    }

    /// Whole tree level by level, children in input order.
    pub fn breadth_first(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut queue = VecDeque::from([self.root]);
        while let Some(id) = queue.pop_front() {
            out.push(id);
            queue.extend(self.children(id).iter().copied());
        }
        out
    }

    /// Every node after all of its descendants.
    pub fn post_order(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut dfs = DfsPostOrder::new(&self.graph, NodeIndex::new(self.root.index()));
        while let Some(index) = dfs.next(&self.graph) {
            out.push(self.graph[index]);
        }
        out
    }

    /// Leaves in depth-first order.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.depth_first()
            .into_iter()
            .filter(|&id| self.is_leaf(id))
            .collect()
    }

    /// Give the records back, e.g. to build a filtered snapshot.
    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }
}
