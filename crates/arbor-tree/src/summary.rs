use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use arbor_core::errors::{ArborError, ErrorInfo};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::hash::topology_hash;
use crate::newick::NewickOptions;
use crate::nexus::read_tree_file;
use crate::split::TreeId;
use crate::taxa::TaxonMap;
use crate::tree::Tree;

/// Groups sampled trees by topology.
///
/// Every stored Newick is cached by position and its index appears in exactly
/// one group, so the group sizes always add up to
/// [`TreeSummary::num_stored_trees`].
#[derive(Debug, Clone, Default)]
pub struct TreeSummary {
    tree_ids: BTreeMap<TreeId, Vec<usize>>,
    newicks: Vec<String>,
    taxa: TaxonMap,
    options: NewickOptions,
}

impl TreeSummary {
    /// Creates an empty summary parsing trees as unrooted and binary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty summary with explicit Newick options.
    pub fn with_options(options: NewickOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Replaces the taxon map used to resolve leaf labels.
    pub fn set_taxa(&mut self, taxa: TaxonMap) {
        self.taxa = taxa;
    }

    /// Taxon map used to resolve leaf labels.
    pub fn taxa(&self) -> &TaxonMap {
        &self.taxa
    }

    /// Stores `newick` and files it under its topology.
    ///
    /// When `tree_id_hint` is given it is trusted as the topology of `newick`
    /// and the text is not parsed. A description that fails to parse leaves
    /// the summary untouched. Returns the index assigned to the tree.
    pub fn add_tree(&mut self, newick: &str, tree_id_hint: Option<TreeId>) -> Result<usize, ArborError> {
        let tree_id = match tree_id_hint {
            Some(tree_id) => tree_id,
            None => Tree::from_newick_with(newick, &self.options, &mut self.taxa)?.compute_splits(),
        };
        let index = self.newicks.len();
        self.newicks.push(newick.to_string());
        self.tree_ids.entry(tree_id).or_default().push(index);
        Ok(index)
    }

    /// Ingests every tree of the file at `path`, skipping the first `skip`
    /// trees of each trees block. Returns the number of trees added.
    ///
    /// Trees added before a failure stay in the summary.
    pub fn read_treefile(&mut self, path: &Path, skip: usize) -> Result<usize, ArborError> {
        let file = read_tree_file(path)?;
        info!(
            path = %path.display(),
            blocks = file.blocks.len(),
            trees = file.num_trees(),
            "read tree file"
        );
        let mut added = 0usize;
        for block in &file.blocks {
            if !file.taxa.is_empty() {
                self.taxa = TaxonMap::closed(file.taxa.iter().cloned());
            }
            for (token, label) in &block.translate {
                self.taxa.add_alias(token.clone(), label.clone());
            }
            for newick in block.newicks.iter().skip(skip) {
                let index = self.add_tree(newick, None)?;
                debug!(index, "stored tree");
                added += 1;
            }
        }
        info!(added, topologies = self.num_topologies(), "tree file ingested");
        Ok(added)
    }

    /// `(count, tree id)` pairs sorted ascending; the most frequent topology
    /// comes last and ties fall back to tree id order.
    pub fn sort_by_frequency(&self) -> Vec<(usize, TreeId)> {
        let mut sorted: Vec<(usize, TreeId)> = self
            .tree_ids
            .iter()
            .map(|(tree_id, members)| (members.len(), tree_id.clone()))
            .collect();
        sorted.sort();
        sorted
    }

    /// Most frequently sampled topology and its count.
    pub fn most_frequent(&self) -> Option<(usize, &TreeId)> {
        self.tree_ids
            .iter()
            .map(|(tree_id, members)| (members.len(), tree_id))
            .max()
    }

    /// Rebuilds the tree stored at `index` from its cached Newick.
    pub fn get_tree(&self, index: usize) -> Result<Tree, ArborError> {
        let newick = self.get_newick(index)?;
        let mut taxa = self.taxa.clone();
        Tree::from_newick_with(newick, &self.options, &mut taxa)
    }

    /// Cached Newick text of the tree at `index`.
    pub fn get_newick(&self, index: usize) -> Result<&str, ArborError> {
        self.newicks
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| {
                ArborError::Index(
                    ErrorInfo::new("tree-index", "index is not below the number of stored trees")
                        .with_context("index", index.to_string())
                        .with_context("stored", self.newicks.len().to_string()),
                )
            })
    }

    /// Number of cached trees.
    pub fn num_stored_trees(&self) -> usize {
        self.newicks.len()
    }

    /// Number of distinct topologies.
    pub fn num_topologies(&self) -> usize {
        self.tree_ids.len()
    }

    /// Groups as `(tree id, member indices)` in tree id order.
    pub fn groups(&self) -> impl Iterator<Item = (&TreeId, &[usize])> {
        self.tree_ids
            .iter()
            .map(|(tree_id, members)| (tree_id, members.as_slice()))
    }

    /// Empties both the groups and the Newick cache.
    pub fn clear(&mut self) {
        self.tree_ids.clear();
        self.newicks.clear();
    }

    /// Builds the topology listing and frequency ranking.
    pub fn report(&self) -> SummaryReport {
        let topologies: Vec<TopologyEntry> = self
            .tree_ids
            .iter()
            .enumerate()
            .map(|(position, (tree_id, members))| TopologyEntry {
                topology: position + 1,
                count: members.len(),
                trees: members.clone(),
                hash: topology_hash(tree_id),
                splits: tree_id.iter().map(|split| split.pattern()).collect(),
            })
            .collect();
        let mut ranked: Vec<(usize, usize)> = topologies
            .iter()
            .map(|entry| (entry.count, entry.topology))
            .collect();
        ranked.sort();
        let ranking = ranked
            .into_iter()
            .rev()
            .map(|(frequency, topology)| RankingRow { topology, frequency })
            .collect();
        SummaryReport {
            num_trees: self.newicks.len(),
            topologies,
            ranking,
        }
    }
}

/// One distinct topology in a [`SummaryReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyEntry {
    /// 1-based topology number, in tree id order.
    pub topology: usize,
    /// Number of trees with this topology.
    pub count: usize,
    /// Indices of those trees, in insertion order.
    pub trees: Vec<usize>,
    /// Stable topology digest.
    pub hash: String,
    /// Split patterns (`*`/`-`, leaf 0 first).
    pub splits: Vec<String>,
}

/// Row of the frequency ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingRow {
    /// Topology number.
    pub topology: usize,
    /// Number of trees sampled with it.
    pub frequency: usize,
}

/// Serializable digest of a [`TreeSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryReport {
    /// Number of trees stored.
    pub num_trees: usize,
    /// Topologies in tree id order.
    pub topologies: Vec<TopologyEntry>,
    /// Topologies by descending frequency.
    pub ranking: Vec<RankingRow>,
}

impl SummaryReport {
    /// Human readable listing followed by the frequency table.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Read {} trees", self.num_trees);
        for entry in &self.topologies {
            let _ = writeln!(
                out,
                "Topology {} seen in these {} trees:",
                entry.topology, entry.count
            );
            let members: Vec<String> = entry.trees.iter().map(usize::to_string).collect();
            let _ = writeln!(out, "  {}", members.join(" "));
        }
        let _ = writeln!(out, "\nTopologies sorted by sample frequency:");
        let _ = writeln!(out, "{:>20} {:>20}", "topology", "frequency");
        for row in &self.ranking {
            let _ = writeln!(out, "{:>20} {:>20}", row.topology, row.frequency);
        }
        out
    }

    /// Pretty-printed JSON form of the report.
    pub fn to_json(&self) -> Result<String, ArborError> {
        serde_json::to_string_pretty(self)
            .map_err(|err| ArborError::Serde(ErrorInfo::new("report-serialize", err.to_string())))
    }
}
