//! Per-source-file translation state.
//!
//! `ModuleTranslator` owns everything that accumulates while one file is
//! rewritten: symbol aliases, forward declares, diagnostics. It is created
//! when a file begins processing and discarded once the forward declares
//! have been spliced in; nothing here is shared between files.

use rustc_hash::{FxHashMap, FxHashSet};

use stilt_ast::{NodeArena, NodeId, NodeKind, RawComment, TypeParam};
use stilt_common::{Diagnostic, Span, TranslatorHost};
use stilt_sema::{Checker, SymbolId, TypeId, TypeKey};

use crate::jsdoc::{self, Tag};
use crate::type_translator::TypeTranslator;

/// A synthetic import that keeps a module's type namespace reachable even
/// when the runtime import is dropped. At most one per module path.
#[derive(Debug, Clone)]
pub struct ForwardDeclare {
    pub module_path: String,
    /// Canonical module name from the host.
    pub module_name: String,
    pub alias: String,
    pub explicitly_imported: bool,
    pub default_import: bool,
}

pub struct ModuleTranslator<'a> {
    pub host: &'a dyn TranslatorHost,
    pub checker: &'a Checker<'a>,
    pub file_name: String,
    /// Symbol identity -> local alias name currently in scope.
    pub symbol_aliases: FxHashMap<SymbolId, String>,
    forward_declares: Vec<ForwardDeclare>,
    forward_declared_paths: FxHashMap<String, usize>,
    pub diagnostics: Vec<Diagnostic>,
    pub is_for_externs: bool,
    pub(crate) blacklisted_type_params: FxHashSet<String>,
    next_forward_declare: u32,
}

impl<'a> ModuleTranslator<'a> {
    pub fn new(
        host: &'a dyn TranslatorHost,
        checker: &'a Checker<'a>,
        file_name: impl Into<String>,
        is_for_externs: bool,
    ) -> Self {
        ModuleTranslator {
            host,
            checker,
            file_name: file_name.into(),
            symbol_aliases: FxHashMap::default(),
            forward_declares: Vec::new(),
            forward_declared_paths: FxHashMap::default(),
            diagnostics: Vec::new(),
            is_for_externs,
            blacklisted_type_params: FxHashSet::default(),
            next_forward_declare: 0,
        }
    }

    // ---------------------------------------------------------------------
    // Diagnostics
    // ---------------------------------------------------------------------

    pub fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics
            .push(Diagnostic::error(&self.file_name, span, message));
    }

    /// Non-actionable warning; recorded only when the host accepts them.
    pub fn debug_warn(&mut self, span: Span, message: impl Into<String>) {
        if !self.host.options().log_warnings {
            return;
        }
        let diag = Diagnostic::warning(&self.file_name, span, message);
        tracing::debug!(file = %diag.file, "{}", diag.message_text);
        self.host.log_warning(&diag);
        self.diagnostics.push(diag);
    }

    // ---------------------------------------------------------------------
    // Type rendering
    // ---------------------------------------------------------------------

    pub fn type_to_closure(&mut self, type_id: TypeId) -> String {
        TypeTranslator::new(self).translate(type_id)
    }

    /// Input type with the null/undefined atoms removed, for non-null
    /// assertions.
    pub fn type_to_closure_non_null(&mut self, type_id: TypeId) -> String {
        let non_null = self.checker.non_nullable_type(type_id);
        self.type_to_closure(non_null)
    }

    /// Register type-parameter names so they render as `?` from here on.
    /// The annotation dialect supports only unconstrained templates, so the
    /// names never resolve to anything the downstream checker could see.
    pub fn blacklist_type_parameters(&mut self, type_params: &[TypeParam]) {
        for tp in type_params {
            self.blacklisted_type_params.insert(tp.name.clone());
        }
    }

    pub fn symbol_is_blacklisted(&self, symbol: SymbolId) -> bool {
        let Some(sym) = self.checker.symbol(symbol) else {
            return false;
        };
        sym.module_path
            .as_deref()
            .is_some_and(|path| self.host.options().type_blacklist_paths.contains(path))
    }

    /// Whether the declared type's canonical symbol lives in a blacklisted
    /// module.
    pub fn type_is_blacklisted(&self, type_id: TypeId) -> bool {
        match self.checker.lookup(type_id) {
            Some(TypeKey::Reference { symbol, .. }) => self.symbol_is_blacklisted(*symbol),
            _ => false,
        }
    }

    /// Name a symbol the way the emitted file can see it: a local alias if
    /// one is registered, otherwise the name dotted through its namespace
    /// parents, behind a forward-declare alias when the symbol lives in
    /// another module. Externs skip aliasing entirely; their output is
    /// global.
    pub fn qualified_name(&mut self, symbol: SymbolId) -> Option<String> {
        if let Some(alias) = self.symbol_aliases.get(&symbol) {
            return Some(alias.clone());
        }
        let sym = self.checker.symbol(symbol)?;
        let mut segments = vec![sym.exported_name().to_string()];
        let mut parent = sym.parent;
        while let Some(parent_sym) = self.checker.symbol(parent) {
            if !parent_sym.has_any_flags(stilt_sema::symbol_flags::NAMESPACE) {
                break;
            }
            segments.push(parent_sym.exported_name().to_string());
            parent = parent_sym.parent;
        }
        segments.reverse();
        let dotted = segments.join(".");

        match sym.module_path.clone() {
            Some(path) if !self.is_for_externs => {
                let alias = self.forward_declare(&path, false, false);
                Some(format!("{alias}.{dotted}"))
            }
            _ => Some(dotted),
        }
    }

    // ---------------------------------------------------------------------
    // Forward declares
    // ---------------------------------------------------------------------

    /// Reserve a local alias for a module and record intent. Re-registering
    /// a known path only ORs the flags.
    pub fn forward_declare(
        &mut self,
        module_path: &str,
        explicitly_imported: bool,
        default_import: bool,
    ) -> String {
        if let Some(&idx) = self.forward_declared_paths.get(module_path) {
            let fd = &mut self.forward_declares[idx];
            fd.explicitly_imported |= explicitly_imported;
            fd.default_import |= default_import;
            return fd.alias.clone();
        }
        self.next_forward_declare += 1;
        let alias = format!("fwd_{}", self.next_forward_declare);
        let module_name = self
            .host
            .path_to_module_name(&self.file_name, module_path);
        self.forward_declared_paths
            .insert(module_path.to_string(), self.forward_declares.len());
        self.forward_declares.push(ForwardDeclare {
            module_path: module_path.to_string(),
            module_name,
            alias: alias.clone(),
            explicitly_imported,
            default_import,
        });
        alias
    }

    pub fn forward_declares(&self) -> &[ForwardDeclare] {
        &self.forward_declares
    }

    /// Splice one synthetic statement per registered module into the
    /// statement list: after the fileoverview comment and any directive
    /// prologue, before the first semantic statement.
    pub fn insert_forward_declares(
        &self,
        arena: &mut NodeArena,
        mut statements: Vec<NodeId>,
    ) -> Vec<NodeId> {
        if self.forward_declares.is_empty() {
            return statements;
        }

        // Detach a fileoverview comment from the first statement onto its
        // own placeholder so the forward declares land below it.
        if let Some(&first) = statements.first() {
            let leading = arena.comments.take_leading(first);
            let (fileoverview, rest): (Vec<RawComment>, Vec<RawComment>) =
                leading.into_iter().partition(|c| {
                    c.is_structured()
                        && jsdoc::parse_comment(&c.text)
                            .is_some_and(|tags| tags.iter().any(|t| t.tag_name == "fileoverview"))
                });
            arena.comments.set_leading(first, rest);
            if !fileoverview.is_empty() {
                let placeholder = arena.not_emitted_statement(fileoverview);
                statements.insert(0, placeholder);
            }
        }

        let mut insert_at = 0;
        for (i, &stmt) in statements.iter().enumerate() {
            let is_prologue = match arena.kind(stmt) {
                Some(NodeKind::NotEmittedStatement) => true,
                Some(NodeKind::ExpressionStatement(expr)) => {
                    matches!(arena.kind(*expr), Some(NodeKind::StringLit(_)))
                }
                _ => false,
            };
            if is_prologue {
                insert_at = i + 1;
            } else {
                break;
            }
        }

        for fd in self.forward_declares.iter().rev() {
            let stmt = arena.synth(NodeKind::ForwardDeclareStatement(Box::new(
                stilt_ast::ForwardDeclareStatement {
                    module_name: fd.module_name.clone(),
                    alias: fd.alias.clone(),
                    explicitly_imported: fd.explicitly_imported,
                },
            )));
            statements.insert(insert_at, stmt);
        }
        statements
    }

    // ---------------------------------------------------------------------
    // Mutable JSDoc
    // ---------------------------------------------------------------------

    /// Handle over a node's structured leading comment. Mutations become
    /// visible on the node only after `update_comment`.
    pub fn get_mutable_jsdoc(&self, arena: &NodeArena, node: NodeId) -> MutableJsDoc {
        let tags = arena
            .comments
            .leading(node)
            .iter()
            .rev()
            .find(|c| c.is_structured())
            .and_then(|c| jsdoc::parse_comment(&c.text))
            .unwrap_or_default();
        MutableJsDoc {
            node,
            tags,
            dirty: false,
        }
    }

    // ---------------------------------------------------------------------
    // Composite function-type comments
    // ---------------------------------------------------------------------

    /// Fold one or more same-named declarations (overloads, or a single
    /// declaration) into a composite signature: per-index parameter types
    /// union across overloads (padded where arities differ), return types
    /// union, parameter names from the first overload. Returns the tags and
    /// the parameter names for emission.
    pub fn function_type_jsdoc(
        &mut self,
        arena: &NodeArena,
        overloads: &[NodeId],
        extra_tags: Vec<Tag>,
    ) -> (Vec<Tag>, Vec<String>) {
        let mut tags = extra_tags;
        let mut param_names: Vec<String> = Vec::new();
        let mut param_types: Vec<Vec<String>> = Vec::new();
        let mut param_optional: Vec<bool> = Vec::new();
        let mut param_rest: Vec<bool> = Vec::new();
        let mut param_destructuring: Vec<bool> = Vec::new();
        let mut return_types: Vec<String> = Vec::new();
        let mut this_type: Option<String> = None;
        let mut max_arity = 0usize;
        let mut is_constructor = false;

        for (overload_index, &fn_id) in overloads.iter().enumerate() {
            let Some(node) = arena.get(fn_id) else {
                continue;
            };
            if matches!(node.kind, NodeKind::Constructor(_)) {
                is_constructor = true;
            }
            let Some(func) = node.as_function_like() else {
                continue;
            };
            self.blacklist_type_parameters(&func.type_params);
            max_arity = max_arity.max(func.params.len());

            for (i, &param_id) in func.params.iter().enumerate() {
                let Some(param) = arena.get(param_id).and_then(|n| n.as_param().cloned()) else {
                    continue;
                };
                let name = match &param.name {
                    stilt_ast::BindingName::Ident(n) => n.clone(),
                    stilt_ast::BindingName::Pattern => format!("__{i}"),
                };
                if overload_index == 0 {
                    param_names.push(name);
                }
                let param_type = self.checker.type_at_location(param_id);
                let rendered = if param.dot_dot_dot {
                    match self.checker.lookup(param_type) {
                        Some(TypeKey::Array(element)) => self.type_to_closure(*element),
                        _ => "?".to_string(),
                    }
                } else {
                    self.type_to_closure(param_type)
                };
                if param_types.len() <= i {
                    param_types.push(Vec::new());
                    param_optional.push(false);
                    param_rest.push(false);
                    param_destructuring.push(false);
                }
                if !param_types[i].contains(&rendered) {
                    param_types[i].push(rendered);
                }
                param_optional[i] |= param.question || param.initializer.is_some();
                param_rest[i] |= param.dot_dot_dot;
                param_destructuring[i] |=
                    matches!(param.name, stilt_ast::BindingName::Pattern);
            }

            let (ret, this) = self.return_and_this_type(fn_id);
            if let Some(this) = this {
                this_type.get_or_insert(this);
            }
            if !return_types.contains(&ret) {
                return_types.push(ret);
            }
        }

        // A shorter overload makes the trailing parameters optional.
        for (i, optional) in param_optional.iter_mut().enumerate() {
            let declared_everywhere = overloads.iter().all(|&fn_id| {
                arena
                    .get(fn_id)
                    .and_then(|n| n.as_function_like())
                    .map_or(true, |f| f.params.len() > i)
            });
            *optional |= !declared_everywhere;
        }

        // Pad names for overloads whose first signature was the short one.
        while param_names.len() < max_arity {
            param_names.push(format!("__{}", param_names.len()));
        }

        if let Some(this) = this_type {
            tags.push(Tag::with_type("this", this));
        }
        for i in 0..max_arity {
            let mut type_str = union_of(&param_types[i]);
            if param_rest[i] {
                type_str = format!("...{type_str}");
            } else if param_optional[i] {
                type_str.push('=');
            }
            let mut tag = Tag::param(param_names[i].clone(), type_str);
            tag.optional = param_optional[i];
            tag.rest_param = param_rest[i];
            tag.destructuring = param_destructuring[i];
            tags.push(tag);
        }

        let all_void = return_types.iter().all(|r| r == "void");
        if !is_constructor && !return_types.is_empty() && !all_void {
            tags.push(Tag::with_type("return", union_of(&return_types)));
        }

        (tags, param_names)
    }

    fn return_and_this_type(&mut self, fn_id: NodeId) -> (String, Option<String>) {
        let fn_type = self.checker.type_at_location(fn_id);
        match self.checker.lookup(fn_type) {
            Some(TypeKey::Function(shape)) => {
                let shape = shape.clone();
                let this = shape.this_type.map(|t| self.type_to_closure(t));
                let ret = if shape.return_type == TypeId::VOID {
                    "void".to_string()
                } else {
                    self.type_to_closure(shape.return_type)
                };
                (ret, this)
            }
            _ => ("?".to_string(), None),
        }
    }
}

fn union_of(rendered: &[String]) -> String {
    match rendered.len() {
        0 => "?".to_string(),
        1 => rendered[0].clone(),
        _ => format!("({})", rendered.join("|")),
    }
}

/// `(tags, dirty)` handle over a node's structured leading comment.
pub struct MutableJsDoc {
    node: NodeId,
    pub tags: Vec<Tag>,
    dirty: bool,
}

impl MutableJsDoc {
    /// Append a tag. Exact duplicates and second copies of singleton tags
    /// are dropped, so re-running the transformer over its own output stays
    /// a no-op at the tag level.
    pub fn add_tag(&mut self, tag: Tag) {
        if self.tags.iter().any(|t| *t == tag) {
            return;
        }
        if jsdoc::is_singleton_tag(&tag.tag_name)
            && self.tags.iter().any(|t| t.tag_name == tag.tag_name)
        {
            return;
        }
        self.tags.push(tag);
        self.dirty = true;
    }

    /// Throw away whatever was parsed and start from the given tags.
    pub fn replace_tags(&mut self, tags: Vec<Tag>) {
        self.tags = tags;
        self.dirty = true;
    }

    /// Rewrite the node's leading comment: the structured comment (if any)
    /// is replaced by the serialized tags; plain comments stay untouched.
    pub fn update_comment(&self, arena: &mut NodeArena) {
        if !self.dirty {
            return;
        }
        let existing = arena.comments.take_leading(self.node);
        let mut kept: Vec<RawComment> = existing
            .into_iter()
            .filter(|c| !c.is_structured())
            .collect();
        if !self.tags.is_empty() {
            kept.push(RawComment::block(jsdoc::serialize_tags(&self.tags, true)));
        }
        arena.comments.set_leading(self.node, kept);
    }
}
