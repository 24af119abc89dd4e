//! Arena-backed phylogenetic tree with cached aggregates.

use arbor_core::errors::{ArborError, ErrorInfo};
use arbor_core::SMALLEST_EDGE_LENGTH;

use crate::newick::{self, NewickOptions};
use crate::split::{Split, TreeId};
use crate::taxa::TaxonMap;

/// Index into the tree's node arena.
pub type NodeId = usize;

/// A single node of a [`Tree`].
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Parent node (`None` for the root).
    pub parent: Option<NodeId>,
    /// Child nodes in Newick order.
    pub children: Vec<NodeId>,
    /// Length of the edge joining this node to its parent (0 for the root).
    pub edge_length: f64,
    /// Taxon label, if the description carried one.
    pub name: Option<String>,
    /// Leaf index (`Some` exactly for leaves).
    pub leaf_index: Option<usize>,
}

impl Node {
    /// True if this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Phylogenetic tree stored as a node arena numbered in preorder.
///
/// Node 0 is the root and the arena order is a valid preorder, which is what
/// the cached traversal exposes. Leaf count and total edge length are cached
/// on construction and kept in sync by the edge-length mutators.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
    preorder: Vec<NodeId>,
    num_leaves: usize,
    total_edge_length: f64,
    rooted: bool,
}

impl Tree {
    /// Builds a tree from nodes already numbered in preorder (root first).
    pub(crate) fn from_preorder_nodes(nodes: Vec<Node>, rooted: bool) -> Self {
        let preorder: Vec<NodeId> = (0..nodes.len()).collect();
        let num_leaves = nodes.iter().filter(|node| node.is_leaf()).count();
        let total_edge_length = nodes.iter().skip(1).map(|node| node.edge_length).sum();
        Self {
            nodes,
            preorder,
            num_leaves,
            total_edge_length,
            rooted,
        }
    }

    /// Parses a Newick description, resolving labels through a fresh open
    /// taxon map.
    pub fn from_newick(text: &str, allow_polytomies: bool, rooted: bool) -> Result<Self, ArborError> {
        let mut taxa = TaxonMap::open();
        Self::from_newick_with(
            text,
            &NewickOptions {
                allow_polytomies,
                rooted,
            },
            &mut taxa,
        )
    }

    /// Parses a Newick description, resolving labels through `taxa`.
    pub fn from_newick_with(
        text: &str,
        options: &NewickOptions,
        taxa: &mut TaxonMap,
    ) -> Result<Self, ArborError> {
        newick::parse(text, options, taxa)
    }

    /// Serializes the tree back to Newick with `precision` decimal places.
    pub fn to_newick(&self, precision: usize) -> String {
        newick::write(self, precision)
    }

    /// The root node id.
    pub fn root(&self) -> NodeId {
        0
    }

    /// Access a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// All nodes, in preorder.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Cached preorder traversal (root first).
    pub fn preorder(&self) -> &[NodeId] {
        &self.preorder
    }

    /// Number of leaves.
    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    /// Number of edges (every node except the root owns one).
    pub fn num_edges(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    /// Whether the tree is treated as rooted.
    pub fn is_rooted(&self) -> bool {
        self.rooted
    }

    /// Sum of all edge lengths.
    pub fn total_edge_length(&self) -> f64 {
        self.total_edge_length
    }

    /// Edge lengths in preorder, root excluded.
    pub fn edge_lengths(&self) -> Vec<f64> {
        self.nodes.iter().skip(1).map(|node| node.edge_length).collect()
    }

    /// Replaces every edge length (preorder, root excluded). Lengths below
    /// [`SMALLEST_EDGE_LENGTH`] are raised to it.
    pub fn set_edge_lengths(&mut self, lengths: &[f64]) -> Result<(), ArborError> {
        if lengths.len() != self.num_edges() {
            return Err(ArborError::Invariant(
                ErrorInfo::new("edge-count", "edge-length vector does not match tree")
                    .with_context("expected", self.num_edges().to_string())
                    .with_context("actual", lengths.len().to_string()),
            ));
        }
        let mut total = 0.0;
        for (node, &length) in self.nodes.iter_mut().skip(1).zip(lengths) {
            node.edge_length = length.max(SMALLEST_EDGE_LENGTH);
            total += node.edge_length;
        }
        self.total_edge_length = total;
        Ok(())
    }

    /// Leaf labels ordered by leaf index (`None` where a leaf is unnamed).
    pub fn leaf_names(&self) -> Vec<Option<String>> {
        let mut names = vec![None; self.num_leaves];
        for node in &self.nodes {
            if let Some(index) = node.leaf_index {
                names[index] = node.name.clone();
            }
        }
        names
    }

    /// Computes the canonical, non-trivial split of every internal edge.
    ///
    /// A single bottom-up pass: each node's leaf set is the union of its
    /// children's, computed once.
    pub fn compute_splits(&self) -> TreeId {
        let n = self.num_leaves;
        let mut below: Vec<Split> = vec![Split::new(n); self.nodes.len()];
        let mut splits = TreeId::new();
        for &id in self.preorder.iter().rev() {
            let node = &self.nodes[id];
            let mut leaves = Split::new(n);
            match node.leaf_index {
                Some(index) => leaves.set_leaf(index),
                None => {
                    for &child in &node.children {
                        leaves.union_with(&below[child]);
                    }
                }
            }
            if node.parent.is_some() && !node.is_leaf() {
                let canonical = leaves.clone().canonicalize();
                if !canonical.is_trivial() {
                    splits.insert(canonical);
                }
            }
            below[id] = leaves;
        }
        splits
    }
}
