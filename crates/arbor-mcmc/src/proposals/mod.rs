mod pinvar;
mod statefreq;
mod tree_length;

pub use pinvar::PinvarProposal;
pub use statefreq::StateFreqProposal;
pub use tree_length::TreeLengthProposal;

use serde::{Deserialize, Serialize};

use crate::updater::Proposal;

/// Proposal kinds selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProposalKind {
    /// Dirichlet move on the state frequencies.
    StateFreqs,
    /// Multiplier move on the tree length.
    TreeLength,
    /// Sliding-window move on the proportion of invariable sites.
    Pinvar,
}

impl ProposalKind {
    /// Instantiates the kind.
    pub fn build(self) -> Box<dyn Proposal> {
        match self {
            ProposalKind::StateFreqs => Box::new(StateFreqProposal::new()),
            ProposalKind::TreeLength => Box::new(TreeLengthProposal::new()),
            ProposalKind::Pinvar => Box::new(PinvarProposal::new()),
        }
    }
}
