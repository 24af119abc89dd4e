#![deny(missing_docs)]

//! Tree topology bookkeeping for the arbor sampler: splits, tree ids,
//! Newick/Nexus input and the topology summary of sampled trees.

/// Topology digests for reports.
pub mod hash;
/// Newick reader and writer.
pub mod newick;
/// Nexus and bare-Newick tree files.
pub mod nexus;
/// Bipartitions and tree ids.
pub mod split;
/// Topology grouping of sampled trees.
pub mod summary;
/// Taxon label tables.
pub mod taxa;
/// Arena-backed trees.
pub mod tree;

pub use hash::topology_hash;
pub use newick::NewickOptions;
pub use nexus::{parse_tree_file, read_tree_file, TreeFile, TreesBlock};
pub use split::{Split, TreeId};
pub use summary::{RankingRow, SummaryReport, TopologyEntry, TreeSummary};
pub use taxa::TaxonMap;
pub use tree::{Node, NodeId, Tree};
