//! Node arena: allocation, identity, child traversal.

use serde::Serialize;

use stilt_common::Span;

use crate::comments::{CommentStore, RawComment};
use crate::node::{Node, NodeKind};

/// Index of a node in its arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// Owns every node of one source file, plus its comments and source text.
///
/// One arena per file; the transformer allocates synthesized nodes into the
/// same arena it reads from.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
    pub file_name: String,
    pub source_text: String,
    pub comments: CommentStore,
}

impl NodeArena {
    pub fn new(file_name: impl Into<String>, source_text: impl Into<String>) -> Self {
        NodeArena {
            nodes: Vec::new(),
            file_name: file_name.into(),
            source_text: source_text.into(),
            comments: CommentStore::default(),
        }
    }

    pub fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { kind, span });
        id
    }

    /// Allocate a synthesized node with a dummy span.
    pub fn synth(&mut self, kind: NodeKind) -> NodeId {
        self.alloc(kind, Span::dummy())
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.get(id).map(|n| &n.kind)
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.get(id).map(|n| n.span).unwrap_or_else(Span::dummy)
    }

    /// Original source text covered by a node.
    pub fn source_slice(&self, id: NodeId) -> &str {
        self.span(id).slice(&self.source_text)
    }

    /// Direct children of a node, in source order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        match &node.kind {
            NodeKind::SourceFile(f) => out.extend(&f.statements),
            NodeKind::ClassDecl(c) => {
                for clause in &c.heritage {
                    out.extend(&clause.types);
                }
                out.extend(&c.members);
            }
            NodeKind::InterfaceDecl(i) => {
                for clause in &i.heritage {
                    out.extend(&clause.types);
                }
                out.extend(&i.members);
            }
            NodeKind::FunctionDecl(f)
            | NodeKind::Constructor(f)
            | NodeKind::MethodDecl(f)
            | NodeKind::GetAccessor(f)
            | NodeKind::SetAccessor(f)
            | NodeKind::MethodSignature(f)
            | NodeKind::FunctionExpr(f) => {
                out.extend(&f.params);
                out.extend(f.body);
            }
            NodeKind::VariableStatement(v) => out.extend(&v.declarations),
            NodeKind::VariableDeclaration(d) => out.extend(d.initializer),
            NodeKind::EnumDecl(e) => out.extend(&e.members),
            NodeKind::ModuleDecl(m) => out.extend(&m.body),
            NodeKind::ExpressionStatement(e) => out.push(*e),
            NodeKind::IfStatement(i) => {
                out.push(i.condition);
                out.push(i.then_branch);
                out.extend(i.else_branch);
            }
            NodeKind::Block(stmts) => out.extend(stmts),
            NodeKind::PropertyDecl(p) | NodeKind::PropertySignature(p) => {
                out.extend(p.initializer)
            }
            NodeKind::Param(p) => out.extend(p.initializer),
            NodeKind::PropertyAccess(p) => out.push(p.object),
            NodeKind::ElementAccess(e) => {
                out.push(e.object);
                out.push(e.index);
            }
            NodeKind::CallExpr(c) => {
                out.push(c.callee);
                out.extend(&c.args);
            }
            NodeKind::Paren(e)
            | NodeKind::AsExpr(e)
            | NodeKind::TypeAssertion(e)
            | NodeKind::NonNullExpr(e) => out.push(*e),
            NodeKind::Assignment(a) => {
                out.push(a.left);
                out.push(a.right);
            }
            NodeKind::TypeAliasDecl(_)
            | NodeKind::ImportDecl(_)
            | NodeKind::ImportEqualsDecl(_)
            | NodeKind::NotEmittedStatement
            | NodeKind::ForwardDeclareStatement(_)
            | NodeKind::IndexSignature
            | NodeKind::EnumMember(_)
            | NodeKind::Ident(_)
            | NodeKind::StringLit(_)
            | NodeKind::NumberLit(_)
            | NodeKind::BoolLit(_) => {}
        }
        out
    }

    /// Drop every comment attached to this node and its subtree.
    ///
    /// Used for constructor parameter properties: their doc comments must
    /// not be mistaken for field annotations downstream.
    pub fn strip_comments_recursive(&mut self, id: NodeId) {
        self.comments.remove_all(id);
        for child in self.children(id) {
            self.strip_comments_recursive(child);
        }
    }

    // ---------------------------------------------------------------------
    // Constructors for synthesized output shapes
    // ---------------------------------------------------------------------

    pub fn ident(&mut self, name: impl Into<String>) -> NodeId {
        self.synth(NodeKind::Ident(name.into()))
    }

    pub fn string_lit(&mut self, value: impl Into<String>) -> NodeId {
        self.synth(NodeKind::StringLit(value.into()))
    }

    pub fn property_access(&mut self, object: NodeId, property: impl Into<String>) -> NodeId {
        self.synth(NodeKind::PropertyAccess(Box::new(
            crate::node::PropertyAccess {
                object,
                property: property.into(),
            },
        )))
    }

    /// `a.b.c` from a base identifier and a dotted path.
    pub fn dotted(&mut self, base: impl Into<String>, path: &[&str]) -> NodeId {
        let mut expr = self.ident(base);
        for part in path {
            expr = self.property_access(expr, *part);
        }
        expr
    }

    pub fn expression_statement(&mut self, expr: NodeId) -> NodeId {
        self.synth(NodeKind::ExpressionStatement(expr))
    }

    pub fn block(&mut self, statements: Vec<NodeId>) -> NodeId {
        self.synth(NodeKind::Block(statements))
    }

    /// `if (false) { ... }` - the dead branch member-type declarations live in.
    pub fn if_false(&mut self, body: Vec<NodeId>) -> NodeId {
        let condition = self.synth(NodeKind::BoolLit(false));
        let then_branch = self.block(body);
        self.synth(NodeKind::IfStatement(Box::new(crate::node::IfStatement {
            condition,
            then_branch,
            else_branch: None,
        })))
    }

    pub fn assignment(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.synth(NodeKind::Assignment(Box::new(crate::node::Assignment {
            left,
            right,
        })))
    }

    pub fn not_emitted_statement(&mut self, comments: Vec<RawComment>) -> NodeId {
        let id = self.synth(NodeKind::NotEmittedStatement);
        self.comments.set_leading(id, comments);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::*;

    #[test]
    fn test_alloc_and_get() {
        let mut arena = NodeArena::new("test.ts", "");
        let id = arena.ident("foo");
        assert_eq!(arena.get(id).unwrap().as_ident(), Some("foo"));
        assert!(arena.get(NodeId::NONE).is_none());
    }

    #[test]
    fn test_dotted_builds_nested_access() {
        let mut arena = NodeArena::new("test.ts", "");
        let expr = arena.dotted("C", &["prototype", "x"]);
        let NodeKind::PropertyAccess(outer) = &arena.get(expr).unwrap().kind else {
            panic!("expected property access");
        };
        assert_eq!(outer.property, "x");
        let NodeKind::PropertyAccess(inner) = &arena.get(outer.object).unwrap().kind else {
            panic!("expected nested property access");
        };
        assert_eq!(inner.property, "prototype");
    }

    #[test]
    fn test_strip_comments_recursive() {
        let mut arena = NodeArena::new("test.ts", "");
        let inner = arena.ident("x");
        let stmt = arena.expression_statement(inner);
        arena.comments.add_leading(stmt, RawComment::block("/** @type {string} */"));
        arena.comments.add_leading(inner, RawComment::line("// hi"));
        arena.strip_comments_recursive(stmt);
        assert!(arena.comments.leading(stmt).is_empty());
        assert!(arena.comments.leading(inner).is_empty());
    }
}
