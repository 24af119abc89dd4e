use std::collections::BTreeMap;

use arbor_core::errors::{ArborError, ErrorInfo};
use indexmap::IndexSet;

/// Ordered table mapping taxon labels to leaf indices.
///
/// An open map assigns the next free index to labels it has not seen; a
/// closed map (built from a Nexus `TAXLABELS` command) rejects them. Aliases
/// hold Nexus `TRANSLATE` entries and are consulted before the labels.
#[derive(Debug, Clone, Default)]
pub struct TaxonMap {
    labels: IndexSet<String>,
    aliases: BTreeMap<String, String>,
    closed: bool,
}

impl TaxonMap {
    /// Creates an empty map that accepts new labels.
    pub fn open() -> Self {
        Self::default()
    }

    /// Creates a map restricted to the given labels, in order.
    pub fn closed<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
            aliases: BTreeMap::new(),
            closed: true,
        }
    }

    /// Whether unknown labels are rejected.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of labels known to the map.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether no labels are known yet.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Whether a translate table has been registered.
    pub fn has_aliases(&self) -> bool {
        !self.aliases.is_empty()
    }

    /// Registers a translate-table entry `token -> label`.
    pub fn add_alias(&mut self, token: impl Into<String>, label: impl Into<String>) {
        self.aliases.insert(token.into(), label.into());
    }

    /// Label stored at `index`.
    pub fn label(&self, index: usize) -> Option<&str> {
        self.labels.get_index(index).map(String::as_str)
    }

    /// Applies the translate table to a raw token.
    pub fn translate<'a>(&'a self, token: &'a str) -> &'a str {
        self.aliases.get(token).map(String::as_str).unwrap_or(token)
    }

    /// Resolves a label to its leaf index, registering it when the map is open.
    pub fn resolve(&mut self, token: &str) -> Result<usize, ArborError> {
        let label = self.translate(token).to_string();
        if let Some(index) = self.labels.get_index_of(&label) {
            return Ok(index);
        }
        if self.closed {
            return Err(ArborError::Parse(
                ErrorInfo::new("unknown-taxon", format!("unknown taxon label '{label}'"))
                    .with_context("label", label),
            ));
        }
        let (index, _) = self.labels.insert_full(label);
        Ok(index)
    }
}
