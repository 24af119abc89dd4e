use arbor_core::derive_substream_seed;

/// Derives the deterministic seed of the chain at `chain_index` in a ladder.
pub fn chain_seed(master_seed: u64, chain_index: usize) -> u64 {
    derive_substream_seed(master_seed, chain_index as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chains_get_distinct_seeds() {
        assert_eq!(chain_seed(7, 0), chain_seed(7, 0));
        assert_ne!(chain_seed(7, 0), chain_seed(7, 1));
        assert_ne!(chain_seed(7, 0), chain_seed(8, 0));
    }
}
