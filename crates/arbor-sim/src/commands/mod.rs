pub mod sample;
pub mod summarize;

use std::path::Path;

use arbor_core::ArborError;
use arbor_tree::{TaxonMap, TreeFile};

/// Taxon map implied by a tree file: closed over its `TAXLABELS` when
/// present, with the first block's translate table as aliases.
pub fn taxa_for(file: &TreeFile) -> TaxonMap {
    let mut taxa = if file.taxa.is_empty() {
        TaxonMap::open()
    } else {
        TaxonMap::closed(file.taxa.iter().cloned())
    };
    if let Some(block) = file.blocks.first() {
        for (token, label) in &block.translate {
            taxa.add_alias(token.clone(), label.clone());
        }
    }
    taxa
}

pub fn write_text(path: &Path, contents: &str) -> Result<(), ArborError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| ArborError::io("output-mkdir", parent, err))?;
    }
    std::fs::write(path, contents).map_err(|err| ArborError::io("output-write", path, err))
}
