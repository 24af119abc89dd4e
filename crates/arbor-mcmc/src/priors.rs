use arbor_core::errors::{ArborError, ErrorInfo};
use arbor_core::special::ln_gamma;
use arbor_tree::Tree;
use serde::{Deserialize, Serialize};

/// Components of the Gamma-Dirichlet edge-length prior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeLengthPrior {
    /// Gamma log density of the tree length.
    pub tree_length: f64,
    /// Dirichlet log density of the edge-length proportions.
    pub proportions: f64,
    /// Sum of both components.
    pub total: f64,
}

/// Log prior of the edge lengths of `tree`.
///
/// `params` holds `[a, b, c]`: the tree length `TL` follows Gamma(shape `a`,
/// scale `b`) and the proportions `e_i / TL` of the `E` edges follow a
/// symmetric Dirichlet with concentration `c`. `E` is `2n - 2` for rooted and
/// `2n - 3` for unrooted trees. With `c == 1` only `lnGamma(E)` remains of the
/// Dirichlet term.
pub fn edge_length_prior(tree: &Tree, params: &[f64]) -> Result<EdgeLengthPrior, ArborError> {
    let [a, b, c] = params else {
        return Err(ArborError::Invariant(
            ErrorInfo::new("prior-parameter-count", "edge-length prior takes [a, b, c]")
                .with_context("len", params.len().to_string()),
        ));
    };
    let (a, b, c) = (*a, *b, *c);

    let tl = tree.total_edge_length();
    let n = tree.num_leaves() as f64;
    let num_edges = 2.0 * n - if tree.is_rooted() { 2.0 } else { 3.0 };

    let tree_length = (a - 1.0) * tl.ln() - tl / b - a * b.ln() - ln_gamma(a);

    let mut proportions = ln_gamma(num_edges * c);
    if c != 1.0 {
        proportions -= ln_gamma(c) * num_edges;
        let log_props: f64 = tree.edge_lengths().iter().map(|&len| (len / tl).ln()).sum();
        proportions += (c - 1.0) * log_props;
    }

    Ok(EdgeLengthPrior {
        tree_length,
        proportions,
        total: tree_length + proportions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_tree_length_term() {
        let tree = Tree::from_newick("(1:0.5,2:0.5,3:1.0);", false, false).unwrap();
        let prior = edge_length_prior(&tree, &[1.0, 1.0, 1.0]).unwrap();
        assert!((prior.tree_length + 2.0).abs() < 1e-12);
        // three edges: only lnGamma(3) survives
        assert!((prior.proportions - 2.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn non_flat_dirichlet_includes_proportions() {
        let tree = Tree::from_newick("(1:0.5,2:0.5,3:1.0);", false, false).unwrap();
        let prior = edge_length_prior(&tree, &[1.0, 1.0, 2.0]).unwrap();
        let expected = ln_gamma(6.0) - 3.0 * ln_gamma(2.0) + (0.25_f64.ln() * 2.0 + 0.5_f64.ln());
        assert!((prior.proportions - expected).abs() < 1e-10);
        assert!((prior.total - prior.tree_length - prior.proportions).abs() < 1e-15);
    }

    #[test]
    fn wrong_parameter_count() {
        let tree = Tree::from_newick("(1,2,3);", false, false).unwrap();
        let err = edge_length_prior(&tree, &[1.0, 1.0]).unwrap_err();
        assert!(err.is_invariant());
    }
}
