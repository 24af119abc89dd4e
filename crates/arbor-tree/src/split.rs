use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

const WORD_BITS: usize = 64;

/// Bipartition of the leaf set induced by one tree edge.
///
/// Leaves are packed into `u64` words, leaf `i` occupying bit `i % 64` of word
/// `i / 64`. A split is usually held in canonical orientation: the side that
/// does **not** contain leaf 0. The two complementary bit-vectors describing
/// one bipartition therefore compare, hash and sort identically once
/// canonicalized.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Split {
    words: Vec<u64>,
    nleaves: usize,
}

/// Set of splits identifying an unrooted tree topology.
///
/// Stored as an ordered set so equality does not depend on the order in
/// which a traversal produced the splits.
pub type TreeId = BTreeSet<Split>;

impl Split {
    /// Creates an empty split over `nleaves` leaves.
    pub fn new(nleaves: usize) -> Self {
        Self {
            words: vec![0; nleaves.div_ceil(WORD_BITS)],
            nleaves,
        }
    }

    /// Creates a split with the given leaves set (not canonicalized).
    pub fn from_leaves(nleaves: usize, leaves: impl IntoIterator<Item = usize>) -> Self {
        let mut split = Self::new(nleaves);
        for leaf in leaves {
            split.set_leaf(leaf);
        }
        split
    }

    /// Number of leaves the split is defined over.
    pub fn nleaves(&self) -> usize {
        self.nleaves
    }

    /// Raw packed words.
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Marks `leaf` as belonging to this side.
    ///
    /// # Panics
    /// Panics when `leaf` is not below the leaf count.
    pub fn set_leaf(&mut self, leaf: usize) {
        assert!(
            leaf < self.nleaves,
            "leaf {leaf} out of range for split over {} leaves",
            self.nleaves
        );
        self.words[leaf / WORD_BITS] |= 1u64 << (leaf % WORD_BITS);
    }

    /// Whether `leaf` lies on this side.
    pub fn contains(&self, leaf: usize) -> bool {
        leaf < self.nleaves && self.words[leaf / WORD_BITS] & (1u64 << (leaf % WORD_BITS)) != 0
    }

    /// Adds every leaf of `other` to this side.
    ///
    /// # Panics
    /// Panics when the two splits are defined over different leaf counts.
    pub fn union_with(&mut self, other: &Split) {
        assert_eq!(
            self.nleaves, other.nleaves,
            "cannot combine splits over different leaf counts"
        );
        for (word, other_word) in self.words.iter_mut().zip(&other.words) {
            *word |= *other_word;
        }
    }

    /// The opposite side of the bipartition.
    pub fn complement(&self) -> Split {
        let mut words: Vec<u64> = self.words.iter().map(|word| !word).collect();
        let tail = self.nleaves % WORD_BITS;
        if tail != 0 {
            if let Some(last) = words.last_mut() {
                *last &= (1u64 << tail) - 1;
            }
        }
        Split {
            words,
            nleaves: self.nleaves,
        }
    }

    /// Returns the canonical orientation: the side not containing leaf 0.
    pub fn canonicalize(self) -> Split {
        if self.contains(0) {
            self.complement()
        } else {
            self
        }
    }

    /// Whether the split is already in canonical orientation.
    pub fn is_canonical(&self) -> bool {
        !self.contains(0)
    }

    /// Number of leaves on this side.
    pub fn count(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Whether the bipartition separates fewer than two leaves from the rest.
    /// Leaf edges (and degenerate root edges) induce trivial splits.
    pub fn is_trivial(&self) -> bool {
        let side = self.count();
        let other = self.nleaves - side;
        side < 2 || other < 2
    }

    /// Leaf indices on this side, ascending.
    pub fn leaves(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.nleaves).filter(move |&leaf| self.contains(leaf))
    }

    /// One character per leaf, `*` for leaves on this side and `-` otherwise.
    pub fn pattern(&self) -> String {
        (0..self.nleaves)
            .map(|leaf| if self.contains(leaf) { '*' } else { '-' })
            .collect()
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern())
    }
}
