//! Newick reader and writer.
//!
//! Grammar accepted by the reader:
//! ```text
//! tree     = subtree ';'
//! subtree  = '(' subtree (',' subtree)* ')' label | label
//! label    = name? (':' length)?
//! ```
//! Names may be single-quoted (`''` escapes a quote). Bracketed comments such
//! as `[&R]` are skipped wherever whitespace is allowed.

use std::fmt::Write as _;

use arbor_core::errors::{ArborError, ErrorInfo};
use arbor_core::SMALLEST_EDGE_LENGTH;

use crate::taxa::TaxonMap;
use crate::tree::{Node, Tree};

/// Options controlling how a Newick description becomes a [`Tree`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NewickOptions {
    /// Accept internal nodes with more than two children.
    pub allow_polytomies: bool,
    /// Keep a bifurcating root instead of merging its two edges.
    pub rooted: bool,
}

#[derive(Debug, Clone, Default)]
struct RawNode {
    parent: Option<usize>,
    children: Vec<usize>,
    name: Option<String>,
    edge_length: Option<f64>,
}

fn parse_error(code: &str, message: impl Into<String>, pos: usize) -> ArborError {
    ArborError::Parse(ErrorInfo::new(code, message).with_context("position", pos.to_string()))
}

/// Parses `text` into a tree, resolving leaf labels through `taxa`.
pub fn parse(text: &str, options: &NewickOptions, taxa: &mut TaxonMap) -> Result<Tree, ArborError> {
    let raw = Scanner::new(text).scan()?;
    build(raw, options, taxa)
}

struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            input: text.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_filler(&mut self) -> Result<(), ArborError> {
        while let Some(byte) = self.peek() {
            if byte.is_ascii_whitespace() {
                self.pos += 1;
            } else if byte == b'[' {
                let start = self.pos;
                while self.peek().is_some_and(|b| b != b']') {
                    self.pos += 1;
                }
                if self.peek().is_none() {
                    return Err(parse_error("unterminated-comment", "comment never closed", start));
                }
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(())
    }

    fn scan(mut self) -> Result<Vec<RawNode>, ArborError> {
        let mut nodes = vec![RawNode::default()];
        let mut current = 0usize;
        self.skip_filler()?;
        loop {
            let Some(byte) = self.peek() else {
                return Err(parse_error(
                    "missing-semicolon",
                    "Newick description must end with ';'",
                    self.pos,
                ));
            };
            match byte {
                b'(' => {
                    if !nodes[current].children.is_empty() || nodes[current].name.is_some() {
                        return Err(parse_error("unexpected-paren", "unexpected '('", self.pos));
                    }
                    self.pos += 1;
                    current = push_child(&mut nodes, current);
                }
                b',' => {
                    let Some(parent) = nodes[current].parent else {
                        return Err(parse_error("unexpected-comma", "',' outside parentheses", self.pos));
                    };
                    self.pos += 1;
                    current = push_child(&mut nodes, parent);
                }
                b')' => {
                    let Some(parent) = nodes[current].parent else {
                        return Err(parse_error("unbalanced-parens", "too many ')'", self.pos));
                    };
                    self.pos += 1;
                    current = parent;
                }
                b':' => {
                    self.pos += 1;
                    let length = self.read_length()?;
                    if nodes[current].edge_length.is_some() {
                        return Err(parse_error("duplicate-length", "edge length given twice", self.pos));
                    }
                    nodes[current].edge_length = Some(length);
                }
                b';' => {
                    if nodes[current].parent.is_some() {
                        return Err(parse_error("unbalanced-parens", "missing ')'", self.pos));
                    }
                    self.pos += 1;
                    self.skip_filler()?;
                    if self.pos < self.input.len() {
                        return Err(parse_error("trailing-text", "text after ';'", self.pos));
                    }
                    return Ok(nodes);
                }
                _ => {
                    let name = self.read_name()?;
                    let node = &mut nodes[current];
                    if node.name.is_some() || node.edge_length.is_some() {
                        return Err(parse_error("unexpected-label", "unexpected label", self.pos));
                    }
                    node.name = Some(name);
                }
            }
            self.skip_filler()?;
        }
    }

    fn read_name(&mut self) -> Result<String, ArborError> {
        let start = self.pos;
        if self.peek() == Some(b'\'') {
            self.pos += 1;
            let mut name = Vec::new();
            loop {
                match self.peek() {
                    None => return Err(parse_error("unterminated-quote", "quoted label never closed", start)),
                    Some(b'\'') if self.input.get(self.pos + 1) == Some(&b'\'') => {
                        name.push(b'\'');
                        self.pos += 2;
                    }
                    Some(b'\'') => {
                        self.pos += 1;
                        break;
                    }
                    Some(byte) => {
                        name.push(byte);
                        self.pos += 1;
                    }
                }
            }
            return Ok(String::from_utf8_lossy(&name).into_owned());
        }
        while let Some(byte) = self.peek() {
            if byte.is_ascii_whitespace() || b"(),:;[".contains(&byte) {
                break;
            }
            self.pos += 1;
        }
        Ok(String::from_utf8_lossy(&self.input[start..self.pos]).into_owned())
    }

    fn read_length(&mut self) -> Result<f64, ArborError> {
        self.skip_filler()?;
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if byte.is_ascii_whitespace() || b"(),:;[".contains(&byte) {
                break;
            }
            self.pos += 1;
        }
        let token = String::from_utf8_lossy(&self.input[start..self.pos]);
        let length: f64 = token.parse().map_err(|_| {
            parse_error("invalid-edge-length", format!("invalid edge length '{token}'"), start)
        })?;
        if length < 0.0 || !length.is_finite() {
            return Err(parse_error(
                "negative-edge-length",
                format!("edge length {length} is not allowed"),
                start,
            ));
        }
        Ok(length)
    }
}

fn push_child(nodes: &mut Vec<RawNode>, parent: usize) -> usize {
    let id = nodes.len();
    nodes.push(RawNode {
        parent: Some(parent),
        ..RawNode::default()
    });
    nodes[parent].children.push(id);
    id
}

fn structure_error(code: &str, message: impl Into<String>) -> ArborError {
    ArborError::Parse(ErrorInfo::new(code, message))
}

fn build(mut raw: Vec<RawNode>, options: &NewickOptions, taxa: &mut TaxonMap) -> Result<Tree, ArborError> {
    for (id, node) in raw.iter().enumerate() {
        let degree = node.children.len();
        if degree == 1 {
            return Err(structure_error("unifurcation", "node with a single child")
                .with_node(id));
        }
        let limit = match (id, options.rooted) {
            (0, false) => 3,
            _ => 2,
        };
        if degree > limit && !options.allow_polytomies {
            return Err(structure_error(
                "polytomy",
                format!("node with {degree} children while polytomies are disallowed"),
            )
            .with_node(id));
        }
    }

    if !options.rooted {
        unroot(&mut raw);
    }

    // Renumber in preorder; merged nodes drop out because nothing points at them.
    let mut order = Vec::with_capacity(raw.len());
    let mut stack = vec![0usize];
    while let Some(id) = stack.pop() {
        order.push(id);
        stack.extend(raw[id].children.iter().rev().copied());
    }
    let mut new_id = vec![usize::MAX; raw.len()];
    for (position, &old) in order.iter().enumerate() {
        new_id[old] = position;
    }

    let leaves: Vec<usize> = order
        .iter()
        .copied()
        .filter(|&id| raw[id].children.is_empty())
        .collect();
    if leaves.len() < 2 {
        return Err(structure_error("too-few-leaves", "a tree needs at least two leaves"));
    }
    let mut leaf_index_of = vec![None; raw.len()];
    for (id, index) in resolve_leaves(&raw, &leaves, taxa)? {
        leaf_index_of[id] = Some(index);
    }

    let mut nodes = Vec::with_capacity(order.len());
    for &old in &order {
        let node = &raw[old];
        let leaf_index = leaf_index_of[old];
        let edge_length = if old == 0 {
            0.0
        } else {
            node.edge_length.unwrap_or(0.0).max(SMALLEST_EDGE_LENGTH)
        };
        nodes.push(Node {
            parent: node.parent.map(|parent| new_id[parent]),
            children: node.children.iter().map(|&child| new_id[child]).collect(),
            edge_length,
            name: node.name.clone(),
            leaf_index,
        });
    }
    Ok(Tree::from_preorder_nodes(nodes, options.rooted))
}

/// Removes a bifurcating root by merging its two edges into one.
fn unroot(raw: &mut [RawNode]) {
    if raw[0].children.len() != 2 {
        return;
    }
    let Some(slot) = raw[0]
        .children
        .iter()
        .position(|&child| !raw[child].children.is_empty())
    else {
        return;
    };
    let absorbed = raw[0].children[slot];
    let sibling = raw[0].children[1 - slot];
    let absorbed_length = raw[absorbed].edge_length.unwrap_or(0.0);
    let sibling_length = raw[sibling].edge_length.unwrap_or(0.0);
    raw[sibling].edge_length = Some(sibling_length + absorbed_length);

    let grandchildren = std::mem::take(&mut raw[absorbed].children);
    for &grandchild in &grandchildren {
        raw[grandchild].parent = Some(0);
    }
    let mut children = grandchildren;
    children.insert(if slot == 0 { children.len() } else { 0 }, sibling);
    raw[0].children = children;
}

fn resolve_leaves(
    raw: &[RawNode],
    leaves: &[usize],
    taxa: &mut TaxonMap,
) -> Result<Vec<(usize, usize)>, ArborError> {
    let n = leaves.len();
    let mut names = Vec::with_capacity(n);
    for &id in leaves {
        match raw[id].name.as_deref() {
            Some(name) if !name.is_empty() => names.push(name),
            _ => {
                return Err(structure_error("unlabeled-leaf", "every leaf needs a label").with_node(id))
            }
        }
    }

    let numeric = !taxa.is_closed()
        && !taxa.has_aliases()
        && names
            .iter()
            .all(|name| name.parse::<usize>().is_ok_and(|number| number >= 1));

    // New labels land in `scratch` and reach `taxa` only if every leaf checks out.
    let mut scratch = taxa.clone();
    let mut seen = vec![false; n];
    let mut resolved = Vec::with_capacity(n);
    for (&id, name) in leaves.iter().zip(names) {
        let index = if numeric {
            name.parse::<usize>().map(|number| number - 1).unwrap_or(usize::MAX)
        } else {
            scratch.resolve(name)?
        };
        if index >= n {
            return Err(ArborError::Parse(
                ErrorInfo::new(
                    "leaf-index",
                    format!("leaf '{name}' maps to index {index} but the tree has {n} leaves"),
                )
                .with_hint("every tree must contain the same taxa"),
            ));
        }
        if seen[index] {
            return Err(ArborError::Parse(
                ErrorInfo::new("duplicate-taxon", format!("taxon '{name}' appears twice"))
                    .with_context("label", name),
            ));
        }
        seen[index] = true;
        resolved.push((id, index));
    }
    *taxa = scratch;
    Ok(resolved)
}

trait WithNode {
    fn with_node(self, id: usize) -> Self;
}

impl WithNode for ArborError {
    fn with_node(self, id: usize) -> Self {
        match self {
            ArborError::Parse(info) => ArborError::Parse(info.with_context("node", id.to_string())),
            other => other,
        }
    }
}

/// Serializes `tree` to Newick with `precision` decimal places on edge lengths.
pub fn write(tree: &Tree, precision: usize) -> String {
    let mut buf = String::new();
    write_subtree(tree, tree.root(), precision, &mut buf);
    buf.push(';');
    buf
}

fn write_subtree(tree: &Tree, id: usize, precision: usize, buf: &mut String) {
    let node = &tree.nodes()[id];
    if node.is_leaf() {
        match (&node.name, node.leaf_index) {
            (Some(name), _) => buf.push_str(&quote_label(name)),
            (None, Some(index)) => {
                let _ = write!(buf, "{}", index + 1);
            }
            (None, None) => {}
        }
    } else {
        buf.push('(');
        for (i, &child) in node.children.iter().enumerate() {
            if i > 0 {
                buf.push(',');
            }
            write_subtree(tree, child, precision, buf);
        }
        buf.push(')');
    }
    if node.parent.is_some() {
        let _ = write!(buf, ":{:.*}", precision, node.edge_length);
    }
}

fn quote_label(label: &str) -> String {
    if label
        .bytes()
        .any(|byte| byte.is_ascii_whitespace() || b"(),:;[]'".contains(&byte))
    {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}
