//! Reader for tree files: Nexus `TAXA`/`TREES` blocks or bare Newick.

use std::fs;
use std::path::Path;

use arbor_core::errors::{ArborError, ErrorInfo};

/// One `TREES` block (or the whole of a bare Newick file).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreesBlock {
    /// `TRANSLATE` entries as `(token, label)` pairs.
    pub translate: Vec<(String, String)>,
    /// Newick descriptions, each terminated by `;`.
    pub newicks: Vec<String>,
}

/// Parsed content of a tree file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeFile {
    /// Labels from the last `TAXLABELS` command, if any.
    pub taxa: Vec<String>,
    /// Trees blocks in file order.
    pub blocks: Vec<TreesBlock>,
}

impl TreeFile {
    /// Total number of trees across all blocks.
    pub fn num_trees(&self) -> usize {
        self.blocks.iter().map(|block| block.newicks.len()).sum()
    }
}

fn format_error(message: impl Into<String>) -> ArborError {
    ArborError::Parse(ErrorInfo::new("file-format", message))
}

/// Reads and parses the tree file at `path`.
pub fn read_tree_file(path: &Path) -> Result<TreeFile, ArborError> {
    let text = fs::read_to_string(path).map_err(|err| ArborError::io("tree-file-read", path, err))?;
    parse_tree_file(&text).map_err(|err| match err {
        ArborError::Parse(info) => {
            ArborError::Parse(info.with_context("path", path.display().to_string()))
        }
        other => other,
    })
}

/// Parses tree-file content held in memory.
pub fn parse_tree_file(text: &str) -> Result<TreeFile, ArborError> {
    let statements = split_statements(text)?;
    let is_nexus = statements
        .first()
        .is_some_and(|first| first.trim_start().to_ascii_uppercase().starts_with("#NEXUS"));
    if !is_nexus {
        let newicks: Vec<String> = statements
            .into_iter()
            .map(|statement| strip_comments(&statement).trim().to_string())
            .filter(|statement| !statement.is_empty())
            .map(|statement| format!("{statement};"))
            .collect();
        return Ok(TreeFile {
            taxa: Vec::new(),
            blocks: vec![TreesBlock {
                translate: Vec::new(),
                newicks,
            }],
        });
    }

    let mut file = TreeFile::default();
    let mut block: Option<String> = None;
    for (position, raw) in statements.iter().enumerate() {
        let raw = if position == 0 {
            raw.trim_start()
                .get("#NEXUS".len()..)
                .unwrap_or_default()
        } else {
            raw.as_str()
        };
        let statement = strip_comments(raw);
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        let (command, rest) = split_command(statement);
        match (block.as_deref(), command.as_str()) {
            (_, "BEGIN") => {
                let name = rest.trim().to_ascii_uppercase();
                if name == "TREES" {
                    file.blocks.push(TreesBlock::default());
                }
                block = Some(name);
            }
            (_, "END") | (_, "ENDBLOCK") => block = None,
            (Some("TAXA"), "TAXLABELS") => {
                file.taxa = tokenize(rest)?;
            }
            (Some("TREES"), "TRANSLATE") => {
                let current = file
                    .blocks
                    .last_mut()
                    .ok_or_else(|| format_error("TRANSLATE outside a TREES block"))?;
                current.translate = parse_translate(rest)?;
            }
            (Some("TREES"), "TREE") | (Some("TREES"), "UTREE") => {
                let current = file
                    .blocks
                    .last_mut()
                    .ok_or_else(|| format_error("TREE outside a TREES block"))?;
                current.newicks.push(tree_description(statement)?);
            }
            (None, other) => {
                return Err(format_error(format!("command '{other}' outside any block")));
            }
            _ => {}
        }
    }
    Ok(file)
}

/// Splits on `;` outside quotes and comments, keeping comments in place.
fn split_statements(text: &str) -> Result<Vec<String>, ArborError> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut comment_depth = 0usize;
    for ch in text.chars() {
        match ch {
            '[' if !in_quote => comment_depth += 1,
            ']' if !in_quote && comment_depth > 0 => comment_depth -= 1,
            '\'' if comment_depth == 0 => in_quote = !in_quote,
            ';' if !in_quote && comment_depth == 0 => {
                statements.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(ch);
    }
    if in_quote || comment_depth > 0 {
        return Err(format_error("unterminated quote or comment"));
    }
    if !current.trim().is_empty() {
        let trailing = strip_comments(&current);
        if !trailing.trim().is_empty() {
            return Err(format_error("last statement is missing its ';'"));
        }
    }
    Ok(statements)
}

fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_quote = false;
    let mut depth = 0usize;
    for ch in text.chars() {
        match ch {
            '[' if !in_quote => depth += 1,
            ']' if !in_quote && depth > 0 => depth -= 1,
            _ if depth > 0 => {}
            '\'' => {
                in_quote = !in_quote;
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

fn split_command(statement: &str) -> (String, &str) {
    let end = statement
        .find(|ch: char| ch.is_whitespace())
        .unwrap_or(statement.len());
    (statement[..end].to_ascii_uppercase(), &statement[end..])
}

/// Whitespace separated tokens, honouring single quotes.
fn tokenize(text: &str) -> Result<Vec<String>, ArborError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() || ch == ',' {
            chars.next();
            continue;
        }
        let mut token = String::new();
        if ch == '\'' {
            chars.next();
            loop {
                match chars.next() {
                    Some('\'') if chars.peek() == Some(&'\'') => {
                        chars.next();
                        token.push('\'');
                    }
                    Some('\'') => break,
                    Some(other) => token.push(other),
                    None => return Err(format_error("unterminated quoted token")),
                }
            }
        } else {
            while let Some(&next) = chars.peek() {
                if next.is_whitespace() || next == ',' {
                    break;
                }
                token.push(next);
                chars.next();
            }
        }
        tokens.push(token);
    }
    Ok(tokens)
}

fn parse_translate(text: &str) -> Result<Vec<(String, String)>, ArborError> {
    let mut pairs = Vec::new();
    for entry in text.split(',') {
        let tokens = tokenize(entry)?;
        match tokens.as_slice() {
            [] => continue,
            [token, label] => pairs.push((token.clone(), label.clone())),
            _ => {
                return Err(format_error(format!(
                    "malformed TRANSLATE entry '{}'",
                    entry.trim()
                )))
            }
        }
    }
    Ok(pairs)
}

/// Extracts the Newick part of `TREE name = [&R] (...)`, with its `;`.
fn tree_description(raw: &str) -> Result<String, ArborError> {
    let equals = raw
        .find('=')
        .ok_or_else(|| format_error("TREE command without '='"))?;
    let newick = strip_comments(&raw[equals + 1..]);
    let newick = newick.trim();
    if newick.is_empty() {
        return Err(format_error("TREE command without a description"));
    }
    Ok(format!("{newick};"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_newick_file() {
        let file = parse_tree_file("(1,2,3);\n((1,2),3,4);\n").unwrap();
        assert_eq!(file.blocks.len(), 1);
        assert_eq!(file.blocks[0].newicks, vec!["(1,2,3);", "((1,2),3,4);"]);
    }

    #[test]
    fn nexus_blocks() {
        let text = "#NEXUS\n\
            begin taxa;\n  dimensions ntax=3;\n  taxlabels A 'B c' C;\nend;\n\
            begin trees;\n  translate 1 A, 2 'B c', 3 C;\n\
              tree one = [&U] (1:0.1,2:0.2,3:0.3);\n\
              tree two = (2,1,3);\nend;\n";
        let file = parse_tree_file(text).unwrap();
        assert_eq!(file.taxa, vec!["A", "B c", "C"]);
        assert_eq!(file.num_trees(), 2);
        let block = &file.blocks[0];
        assert_eq!(block.translate[1], ("2".to_string(), "B c".to_string()));
        assert_eq!(block.newicks[0], "(1:0.1,2:0.2,3:0.3);");
    }

    #[test]
    fn other_blocks_are_skipped() {
        let text = "#NEXUS\nbegin paup;\n set autoclose=yes;\nend;\nbegin trees;\n tree t = (1,2,3);\nend;";
        let file = parse_tree_file(text).unwrap();
        assert_eq!(file.num_trees(), 1);
    }

    #[test]
    fn missing_terminator_is_reported() {
        let err = parse_tree_file("#NEXUS\nbegin trees;\n tree t = (1,2,3)").unwrap_err();
        assert_eq!(err.info().code, "file-format");
    }
}
