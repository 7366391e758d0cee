//! Raw comment storage.
//!
//! Comments live in side maps keyed on node identity rather than inside the
//! nodes themselves, so rewrites can move, replace or suppress them without
//! touching node internals. `has_trailing_newline` distinguishes a comment
//! on its own line from an inline comment (casts emit the latter).

use rustc_hash::FxHashMap;

use crate::arena::NodeId;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CommentKind {
    Line,
    Block,
}

/// A source-level or synthesized comment, full text included
/// (`// ...` or `/* ... */`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawComment {
    pub kind: CommentKind,
    pub text: String,
    pub has_trailing_newline: bool,
}

impl RawComment {
    pub fn block(text: impl Into<String>) -> Self {
        RawComment {
            kind: CommentKind::Block,
            text: text.into(),
            has_trailing_newline: true,
        }
    }

    pub fn block_inline(text: impl Into<String>) -> Self {
        RawComment {
            kind: CommentKind::Block,
            text: text.into(),
            has_trailing_newline: false,
        }
    }

    pub fn line(text: impl Into<String>) -> Self {
        RawComment {
            kind: CommentKind::Line,
            text: text.into(),
            has_trailing_newline: true,
        }
    }

    /// A structured comment is a block comment opening with `/**` - the only
    /// form the tag parser accepts.
    pub fn is_structured(&self) -> bool {
        self.kind == CommentKind::Block && self.text.starts_with("/**")
    }
}

/// Leading/trailing comment lists per node.
#[derive(Debug, Default)]
pub struct CommentStore {
    leading: FxHashMap<u32, Vec<RawComment>>,
    trailing: FxHashMap<u32, Vec<RawComment>>,
}

impl CommentStore {
    pub fn leading(&self, node: NodeId) -> &[RawComment] {
        self.leading.get(&node.0).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn trailing(&self, node: NodeId) -> &[RawComment] {
        self.trailing.get(&node.0).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set_leading(&mut self, node: NodeId, comments: Vec<RawComment>) {
        if comments.is_empty() {
            self.leading.remove(&node.0);
        } else {
            self.leading.insert(node.0, comments);
        }
    }

    pub fn set_trailing(&mut self, node: NodeId, comments: Vec<RawComment>) {
        if comments.is_empty() {
            self.trailing.remove(&node.0);
        } else {
            self.trailing.insert(node.0, comments);
        }
    }

    pub fn add_leading(&mut self, node: NodeId, comment: RawComment) {
        self.leading.entry(node.0).or_default().push(comment);
    }

    pub fn take_leading(&mut self, node: NodeId) -> Vec<RawComment> {
        self.leading.remove(&node.0).unwrap_or_default()
    }

    pub fn remove_all(&mut self, node: NodeId) {
        self.leading.remove(&node.0);
        self.trailing.remove(&node.0);
    }
}
