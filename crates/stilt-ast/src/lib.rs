//! Syntax tree for the stilt translator.
//!
//! This crate provides:
//! - `NodeArena` - arena allocation and node identity (`NodeId`)
//! - `NodeKind` and its payload structs - the statement/member/expression
//!   forms the translator rewrites
//! - Raw comment storage in side maps keyed on node identity
//!
//! The tree is produced by an external parser/checker pipeline; this crate
//! only defines the shape the translator consumes and the constructors the
//! translator needs for synthesized output nodes.

pub mod arena;
pub mod comments;
pub mod node;

pub use arena::{NodeArena, NodeId};
pub use comments::{CommentKind, RawComment};
pub use node::*;
