//! Annotation Transformer
//!
//! Rewrites a type-checked source file into its annotation-dialect form:
//! type information moves into structured comments, declarations that have
//! no runtime form (interfaces, type aliases) are lowered or dropped, casts
//! become commented parentheses, and imports gain forward declares.
//!
//! The visitor dispatches on node kind. Anything nested in an ambient
//! declaration is left for the externs generator.

use stilt_ast::{
    modifiers, BindingName, NodeArena, NodeId, NodeKind, RawComment, VariableStatement,
};
use stilt_common::{Diagnostic, ModuleKind, TranslatorHost};
use stilt_sema::{Checker, TypeKey};

use crate::jsdoc::{self, Tag};
use crate::module_translator::ModuleTranslator;

/// Output of one file's transformation: the rewritten top-level statement
/// list (nodes live in the input arena) and the diagnostics that
/// accumulated along the way.
pub struct AnnotationResult {
    pub statements: Vec<NodeId>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Rewrite a non-declaration source file.
pub fn annotate_source_file(
    arena: &mut NodeArena,
    source_file: NodeId,
    checker: &Checker<'_>,
    host: &dyn TranslatorHost,
) -> AnnotationResult {
    let statements = match arena.get(source_file).and_then(|n| n.as_source_file()) {
        Some(file) => file.statements.clone(),
        None => Vec::new(),
    };
    let file_name = arena.file_name.clone();
    let mtt = ModuleTranslator::new(host, checker, file_name, false);
    let mut annotator = Annotator { arena, mtt };

    let mut out = Vec::new();
    for stmt in statements {
        out.extend(annotator.visit_statement(stmt));
    }
    let out = annotator.mtt.insert_forward_declares(annotator.arena, out);
    AnnotationResult {
        statements: out,
        diagnostics: annotator.mtt.diagnostics,
    }
}

pub(crate) struct Annotator<'a, 'h> {
    pub(crate) arena: &'a mut NodeArena,
    pub(crate) mtt: ModuleTranslator<'h>,
}

impl<'a, 'h> Annotator<'a, 'h> {
    fn visit_statement(&mut self, stmt: NodeId) -> Vec<NodeId> {
        let Some(node) = self.arena.get(stmt) else {
            return vec![stmt];
        };
        if node.is_ambient() {
            return vec![stmt];
        }
        match &node.kind {
            NodeKind::ClassDecl(_) => self.visit_class(stmt),
            NodeKind::InterfaceDecl(_) => self.visit_interface(stmt),
            NodeKind::FunctionDecl(_) => {
                self.visit_function_like(stmt);
                vec![stmt]
            }
            NodeKind::VariableStatement(_) => self.visit_variable_statement(stmt),
            NodeKind::TypeAliasDecl(_) => self.visit_type_alias(stmt),
            NodeKind::ImportDecl(_) => self.visit_import(stmt),
            NodeKind::ExpressionStatement(expr) => {
                let expr = *expr;
                self.visit_expression(expr);
                vec![stmt]
            }
            NodeKind::IfStatement(if_stmt) => {
                let (cond, then_branch, else_branch) =
                    (if_stmt.condition, if_stmt.then_branch, if_stmt.else_branch);
                self.visit_expression(cond);
                self.visit_nested_statement(then_branch);
                if let Some(else_branch) = else_branch {
                    self.visit_nested_statement(else_branch);
                }
                vec![stmt]
            }
            NodeKind::Block(_) => {
                self.visit_block(stmt);
                vec![stmt]
            }
            _ => vec![stmt],
        }
    }

    /// A nested statement position that cannot be split in place.
    fn visit_nested_statement(&mut self, stmt: NodeId) {
        if matches!(self.arena.kind(stmt), Some(NodeKind::Block(_))) {
            self.visit_block(stmt);
        } else {
            self.visit_statement(stmt);
        }
    }

    fn visit_block(&mut self, block: NodeId) {
        let Some(NodeKind::Block(stmts)) = self.arena.kind(block) else {
            return;
        };
        let stmts = stmts.clone();
        let mut rewritten = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            rewritten.extend(self.visit_statement(stmt));
        }
        if let Some(node) = self.arena.get_mut(block) {
            node.kind = NodeKind::Block(rewritten);
        }
    }

    // -----------------------------------------------------------------
    // Classes and interfaces (heritage/member logic in class_members.rs)
    // -----------------------------------------------------------------

    fn visit_class(&mut self, stmt: NodeId) -> Vec<NodeId> {
        let Some(class) = self.arena.get(stmt).and_then(|n| n.as_class().cloned()) else {
            return vec![stmt];
        };

        let mut doc = self.mtt.get_mutable_jsdoc(self.arena, stmt);
        if class.modifiers & modifiers::ABSTRACT != 0 {
            doc.add_tag(Tag::new("abstract"));
        }
        if !class.type_params.is_empty() {
            let names: Vec<&str> = class.type_params.iter().map(|tp| tp.name.as_str()).collect();
            let mut tag = Tag::new("template");
            tag.text = Some(names.join(", "));
            doc.add_tag(tag);
        }
        let has_runtime_extends = class
            .heritage
            .iter()
            .any(|c| c.token == stilt_ast::HeritageToken::Extends);
        self.add_heritage_tags(&mut doc, &class.heritage, false, has_runtime_extends);
        doc.update_comment(self.arena);

        // Snapshot member types before the constructor is visited: visiting
        // the constructor strips the parameter-property comments this reads.
        let member_decl = self.member_type_declaration(
            class.name.as_deref(),
            &class.members,
            false,
        );

        for &member in &class.members {
            self.visit_member(member);
        }

        let mut out = vec![stmt];
        out.extend(member_decl);
        out
    }

    fn visit_interface(&mut self, stmt: NodeId) -> Vec<NodeId> {
        let Some(iface) = self.arena.get(stmt).and_then(|n| n.as_interface().cloned()) else {
            return vec![stmt];
        };

        // A name that is also a value already owns the runtime namespace;
        // emitting a function for it would collide.
        let symbol = self.mtt.checker.symbol_at_location(stmt);
        let is_also_value = symbol
            .and_then(|s| self.mtt.checker.symbol(s))
            .is_some_and(|s| s.is_value());
        if is_also_value {
            let span = self.arena.span(stmt);
            self.mtt.debug_warn(
                span,
                format!(
                    "interface {} is also a value; skipping interface emission",
                    iface.name
                ),
            );
            return Vec::new();
        }

        let mut tags = vec![Tag::new("record")];
        let only_properties = iface.members.iter().all(|&m| {
            matches!(
                self.arena.kind(m),
                Some(NodeKind::PropertySignature(_)) | None
            )
        });
        if only_properties {
            tags.push(Tag::new("struct"));
        }
        if !iface.type_params.is_empty() {
            let names: Vec<&str> = iface.type_params.iter().map(|tp| tp.name.as_str()).collect();
            let mut tag = Tag::new("template");
            tag.text = Some(names.join(", "));
            tags.push(tag);
        }

        let body = self.arena.block(Vec::new());
        let fn_decl = self.arena.synth(NodeKind::FunctionDecl(Box::new(
            stilt_ast::FunctionLike {
                name: Some(iface.name.clone()),
                modifiers: iface.modifiers & modifiers::EXPORT,
                type_params: Vec::new(),
                params: Vec::new(),
                body: Some(body),
            },
        )));
        let mut doc = self.mtt.get_mutable_jsdoc(self.arena, fn_decl);
        for tag in tags {
            doc.add_tag(tag);
        }
        self.add_heritage_tags(&mut doc, &iface.heritage, true, false);
        doc.update_comment(self.arena);

        let member_decl =
            self.member_type_declaration(Some(&iface.name), &iface.members, true);

        let mut out = vec![fn_decl];
        out.extend(member_decl);
        out
    }

    fn visit_member(&mut self, member: NodeId) {
        let Some(node) = self.arena.get(member) else {
            return;
        };
        match &node.kind {
            NodeKind::Constructor(func) => {
                let params = func.params.clone();
                for param in params {
                    let is_parameter_property = self
                        .arena
                        .get(param)
                        .and_then(|n| n.as_param())
                        .is_some_and(|p| p.is_parameter_property());
                    if is_parameter_property {
                        // The downstream tooling must not read a parameter's
                        // doc comment as field annotations.
                        self.arena.strip_comments_recursive(param);
                    }
                }
                self.visit_function_like(member);
            }
            NodeKind::MethodDecl(_) | NodeKind::GetAccessor(_) | NodeKind::SetAccessor(_) => {
                self.visit_function_like(member);
            }
            NodeKind::PropertyDecl(_) => self.reserialize_property_comment(member),
            _ => {}
        }
    }

    /// Attach a composite signature comment to a function-like declaration
    /// with a body. Bodiless overloads and abstract methods are handled by
    /// the member-type-declaration pass instead.
    fn visit_function_like(&mut self, fn_id: NodeId) {
        let Some(func) = self
            .arena
            .get(fn_id)
            .and_then(|n| n.as_function_like().cloned())
        else {
            return;
        };
        let Some(body) = func.body else {
            return;
        };

        let (tags, _param_names) = self.mtt.function_type_jsdoc(self.arena, &[fn_id], Vec::new());
        let mut doc = self.mtt.get_mutable_jsdoc(self.arena, fn_id);
        let mut kept: Vec<Tag> = doc
            .tags
            .iter()
            .filter(|t| t.tag_name.is_empty())
            .cloned()
            .collect();
        kept.extend(tags);
        doc.replace_tags(kept);
        doc.update_comment(self.arena);

        for &param in &func.params {
            let initializer = self
                .arena
                .get(param)
                .and_then(|n| n.as_param())
                .and_then(|p| p.initializer);
            if let Some(init) = initializer {
                self.visit_expression(init);
            }
        }
        self.visit_block(body);
    }

    /// Re-serialize the property's structured comment through the
    /// escape-illegal-tags pass.
    fn reserialize_property_comment(&mut self, member: NodeId) {
        let mut doc = self.mtt.get_mutable_jsdoc(self.arena, member);
        if doc.tags.is_empty() {
            return;
        }
        let escaped = jsdoc::escape_illegal_tags(std::mem::take(&mut doc.tags));
        doc.replace_tags(escaped);
        doc.update_comment(self.arena);

        let initializer = self
            .arena
            .get(member)
            .and_then(|n| n.as_property())
            .and_then(|p| p.initializer);
        if let Some(init) = initializer {
            self.visit_expression(init);
        }
    }

    // -----------------------------------------------------------------
    // Variable statements
    // -----------------------------------------------------------------

    fn visit_variable_statement(&mut self, stmt: NodeId) -> Vec<NodeId> {
        let Some(NodeKind::VariableStatement(vs)) = self.arena.kind(stmt) else {
            return vec![stmt];
        };
        let vs = (**vs).clone();

        if vs.declarations.len() <= 1 {
            if let Some(&decl) = vs.declarations.first() {
                self.annotate_declarator(stmt, decl);
            }
            return vec![stmt];
        }

        // One statement per declarator. The structured comment follows the
        // first statement; plain comments ride on a placeholder so the
        // printer keeps them.
        let leading = self.arena.comments.take_leading(stmt);
        let (structured, plain): (Vec<RawComment>, Vec<RawComment>) =
            leading.into_iter().partition(|c| c.is_structured());

        let mut out = Vec::new();
        if !plain.is_empty() {
            out.push(self.arena.not_emitted_statement(plain));
        }
        for (i, &decl) in vs.declarations.iter().enumerate() {
            let single = self.arena.synth(NodeKind::VariableStatement(Box::new(
                VariableStatement {
                    modifiers: vs.modifiers,
                    kind: vs.kind,
                    declarations: vec![decl],
                },
            )));
            if i == 0 && !structured.is_empty() {
                self.arena.comments.set_leading(single, structured.clone());
            }
            self.annotate_declarator(single, decl);
            out.push(single);
        }
        out
    }

    fn annotate_declarator(&mut self, stmt: NodeId, decl: NodeId) {
        let Some(declarator) = self
            .arena
            .get(decl)
            .and_then(|n| n.as_variable_declaration().cloned())
        else {
            return;
        };
        if let Some(init) = declarator.initializer {
            self.visit_expression(init);
        }
        // Destructuring has no annotation syntax.
        if declarator.name == BindingName::Pattern {
            return;
        }
        let declared = self.mtt.checker.type_at_location(decl);
        // With an initializer present the downstream optimizer infers a
        // better type than the blacklist fallback `?`.
        if declarator.initializer.is_some() && self.mtt.type_is_blacklisted(declared) {
            return;
        }
        let type_str = self.mtt.type_to_closure(declared);
        let mut doc = self.mtt.get_mutable_jsdoc(self.arena, stmt);
        doc.add_tag(Tag::with_type("type", type_str));
        doc.update_comment(self.arena);
    }

    // -----------------------------------------------------------------
    // Type aliases
    // -----------------------------------------------------------------

    fn visit_type_alias(&mut self, stmt: NodeId) -> Vec<NodeId> {
        let Some(NodeKind::TypeAliasDecl(alias)) = self.arena.kind(stmt) else {
            return Vec::new();
        };
        let alias = (**alias).clone();

        let Some(symbol) = self.mtt.checker.symbol_at_location(stmt) else {
            return Vec::new();
        };
        // The exports object is a value namespace; a same-named value wins.
        if self
            .mtt
            .checker
            .symbol(symbol)
            .is_some_and(|s| s.is_value())
        {
            return Vec::new();
        }
        if alias.modifiers & modifiers::EXPORT == 0 {
            return Vec::new();
        }
        if self.mtt.host.options().module != ModuleKind::CommonJs {
            return Vec::new();
        }

        self.mtt.blacklist_type_parameters(&alias.type_params);
        let aliased = self.mtt.checker.declared_type_of_symbol(symbol);
        let type_str = self.mtt.type_to_closure(aliased);

        let exports = self.arena.ident("exports");
        let access = self.arena.property_access(exports, alias.name.clone());
        let typedef_stmt = self.arena.expression_statement(access);
        let comment = jsdoc::serialize_tags(&[Tag::with_type("typedef", type_str)], false);
        self.arena
            .comments
            .set_leading(typedef_stmt, vec![RawComment::block(comment)]);
        vec![typedef_stmt]
    }

    // -----------------------------------------------------------------
    // Imports
    // -----------------------------------------------------------------

    fn visit_import(&mut self, stmt: NodeId) -> Vec<NodeId> {
        let Some(NodeKind::ImportDecl(import)) = self.arena.kind(stmt) else {
            return vec![stmt];
        };
        let import = (**import).clone();

        // Side-effect imports have no bindings to keep alive.
        let Some(clause) = &import.clause else {
            return vec![stmt];
        };
        // A script without a module symbol has no type namespace either.
        if self.mtt.checker.symbol_at_location(stmt).is_none() {
            return vec![stmt];
        }

        let mut path = import.module_specifier.clone();
        if self.mtt.host.options().convert_index_import_shorthand {
            if let Some(stripped) = path.strip_suffix("/index") {
                path = stripped.to_string();
            }
        }
        self.mtt
            .forward_declare(&path, true, clause.default_name.is_some());
        vec![stmt]
    }

    // -----------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------

    pub(crate) fn visit_expression(&mut self, expr: NodeId) {
        let Some(node) = self.arena.get(expr) else {
            return;
        };
        match &node.kind {
            NodeKind::AsExpr(inner) | NodeKind::TypeAssertion(inner) => {
                let inner = *inner;
                let target = self.mtt.checker.type_at_location(expr);
                let type_str = self.mtt.type_to_closure(target);
                self.rewrite_cast(expr, inner, type_str);
            }
            NodeKind::NonNullExpr(inner) => {
                let inner = *inner;
                let input = self.mtt.checker.type_at_location(inner);
                let type_str = self.mtt.type_to_closure_non_null(input);
                self.rewrite_cast(expr, inner, type_str);
            }
            NodeKind::PropertyAccess(access) => {
                let (object, property) = (access.object, access.property.clone());
                self.visit_expression(object);
                self.maybe_quote_property_access(expr, object, &property);
            }
            NodeKind::ElementAccess(access) => {
                let (object, index) = (access.object, access.index);
                self.visit_expression(object);
                self.visit_expression(index);
            }
            NodeKind::CallExpr(call) => {
                let (callee, args) = (call.callee, call.args.clone());
                self.visit_expression(callee);
                for arg in args {
                    self.visit_expression(arg);
                }
            }
            NodeKind::Paren(inner) => {
                let inner = *inner;
                self.visit_expression(inner);
            }
            NodeKind::Assignment(assign) => {
                let (left, right) = (assign.left, assign.right);
                self.visit_expression(left);
                self.visit_expression(right);
            }
            NodeKind::FunctionExpr(func) => {
                if let Some(body) = func.body {
                    self.visit_block(body);
                }
            }
            _ => {}
        }
    }

    /// Rewrite a cast or non-null assertion into a parenthesized cast:
    /// `(/** @type {T} */ (expr))`, inline comment, no trailing newline.
    fn rewrite_cast(&mut self, cast: NodeId, inner: NodeId, type_str: String) {
        self.visit_expression(inner);
        let inner_paren = self.arena.synth(NodeKind::Paren(inner));
        let comment =
            jsdoc::serialize_tags(&[Tag::with_type("type", type_str)], false);
        self.arena
            .comments
            .set_leading(inner_paren, vec![RawComment::block_inline(comment)]);
        if let Some(node) = self.arena.get_mut(cast) {
            node.kind = NodeKind::Paren(inner_paren);
        }
    }

    /// Dotted access into an index-signature shape reads through the index,
    /// which the downstream optimizer only allows via quoted access.
    fn maybe_quote_property_access(&mut self, expr: NodeId, object: NodeId, property: &str) {
        if self.mtt.host.options().disable_auto_quoting {
            return;
        }
        let object_type = self.mtt.checker.type_at_location(object);
        let shape = match self.mtt.checker.lookup(object_type) {
            Some(TypeKey::Reference { symbol, .. }) => {
                let declared = self.mtt.checker.declared_type_of_symbol(*symbol);
                self.mtt.checker.lookup(declared)
            }
            other => other,
        };
        let Some(TypeKey::ObjectWithIndex(shape)) = shape else {
            return;
        };
        if shape.properties.iter().any(|p| p.name == property) {
            return;
        }
        let span = self.arena.span(expr);
        self.mtt.debug_warn(
            span,
            format!("quoting access to {property}: the receiver type only has an index signature"),
        );
        let index = self.arena.string_lit(property);
        if let Some(node) = self.arena.get_mut(expr) {
            node.kind = NodeKind::ElementAccess(Box::new(stilt_ast::ElementAccess {
                object,
                index,
            }));
        }
    }
}
