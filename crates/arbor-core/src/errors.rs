//! Error values returned by every arbor crate.
//!
//! Each failure carries an [`ErrorInfo`]: a kebab-case `code` that tests and
//! tools match on, a message for people, and optional context pairs such as
//! the node or file position involved.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Code, message and context of one failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Kebab-case identifier, e.g. `duplicate-taxon`.
    pub code: String,
    /// What went wrong.
    pub message: String,
    /// Where it went wrong: node ids, positions, file paths.
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Suggested fix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Payload with no context and no hint.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Records `key = value`; a repeated key keeps the last value.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Attaches a suggested fix.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Renders as `message [code]; key=value; hint: ...`.
impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.message, self.code)?;
        for (key, value) in &self.context {
            write!(f, "; {key}={value}")?;
        }
        match &self.hint {
            Some(hint) => write!(f, "; hint: {hint}"),
            None => Ok(()),
        }
    }
}

/// Failure families of the sampler. Callers branch on the family and read
/// the payload through [`ArborError::info`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum ArborError {
    /// Newick or Nexus text that cannot be read as a tree.
    #[error("parse error: {0}")]
    Parse(ErrorInfo),
    /// Stored-tree lookup past the end.
    #[error("index error: {0}")]
    Index(ErrorInfo),
    /// A state the sampler must never reach, such as frequencies off the simplex.
    #[error("invariant violation: {0}")]
    Invariant(ErrorInfo),
    /// Settings rejected before or at the start of a run.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Reading or writing files.
    #[error("io error: {0}")]
    Io(ErrorInfo),
    /// Distribution parameters the random source refuses.
    #[error("rng error: {0}")]
    Rng(ErrorInfo),
    /// JSON or YAML encoding.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl ArborError {
    /// Payload, whatever the family.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            ArborError::Parse(info)
            | ArborError::Index(info)
            | ArborError::Invariant(info)
            | ArborError::Config(info)
            | ArborError::Io(info)
            | ArborError::Rng(info)
            | ArborError::Serde(info) => info,
        }
    }

    /// Whether the error signals a programming defect rather than bad input.
    pub fn is_invariant(&self) -> bool {
        matches!(self, ArborError::Invariant(_))
    }

    /// Wraps an I/O failure on `path`.
    pub fn io(code: &str, path: &std::path::Path, err: std::io::Error) -> Self {
        ArborError::Io(
            ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
        )
    }
}
