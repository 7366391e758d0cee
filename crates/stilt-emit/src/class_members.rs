//! Heritage clause translation and member-type declarations.
//!
//! A member-type declaration is a dead `if (false) { ... }` block emitted as
//! a sibling of a class or interface. The runtime never executes it; the
//! downstream analyzer reads the `@type` and signature comments off its
//! statements to learn the members' types.

use stilt_ast::{
    modifiers, BindingName, FunctionLike, HeritageClause, HeritageToken, NodeId, NodeKind,
    ParamDecl, RawComment,
};
use stilt_sema::{symbol_flags, SymbolId, TypeKey};

use crate::annotator::Annotator;
use crate::jsdoc::{self, Tag};
use crate::module_translator::MutableJsDoc;

impl<'a, 'h> Annotator<'a, 'h> {
    /// Translate heritage clauses into `extends`/`implements` tags.
    ///
    /// Class `extends` clauses survive at the syntax level and need no tag
    /// (ambient declarations never reach this visitor; the externs path
    /// emits its own heritage tags); everything else resolves through the
    /// checker. A class-typed target in an `implements` position maps to
    /// `extends`: the annotation dialect has a single inheritance slot.
    pub(crate) fn add_heritage_tags(
        &mut self,
        doc: &mut MutableJsDoc,
        heritage: &[HeritageClause],
        is_interface: bool,
        has_runtime_extends: bool,
    ) {
        for clause in heritage {
            for &type_expr in &clause.types {
                let Some(symbol) = self.mtt.checker.symbol_at_location(type_expr) else {
                    doc.add_tag(Tag::text_only(
                        "could not resolve supertype, class definition may be incomplete",
                    ));
                    continue;
                };
                // A resolvable class extends clause survives at the syntax
                // level; the runtime keeps the inheritance.
                if !is_interface && clause.token == HeritageToken::Extends {
                    continue;
                }
                let Some(resolved) = self.resolve_heritage_symbol(symbol) else {
                    continue;
                };
                if self.mtt.symbol_is_blacklisted(resolved) {
                    continue;
                }
                let Some(sym) = self.mtt.checker.symbol(resolved) else {
                    continue;
                };

                let tag_name = if is_interface {
                    "extends"
                } else if sym.has_any_flags(symbol_flags::CLASS) {
                    if clause.token == HeritageToken::Implements && has_runtime_extends {
                        // The runtime extends already fills the inheritance
                        // slot; a second extends tag would fight it.
                        continue;
                    }
                    "extends"
                } else if sym.has_any_flags(symbol_flags::INTERFACE) {
                    "implements"
                } else {
                    // A value-only name does not exist in the type
                    // namespace.
                    continue;
                };

                if let Some(name) = self.mtt.qualified_name(resolved) {
                    doc.add_tag(Tag::with_type(tag_name, name));
                }
            }
        }
    }

    /// Follow alias imports and type aliases to the symbol a heritage
    /// expression ultimately names.
    fn resolve_heritage_symbol(&mut self, symbol: SymbolId) -> Option<SymbolId> {
        let mut current = symbol;
        // Bounded walk; alias cycles come from declaration merging.
        for _ in 0..16 {
            let sym = self.mtt.checker.symbol(current)?;
            if sym.has_any_flags(symbol_flags::ALIAS) && !sym.alias_target.is_none() {
                current = sym.alias_target;
                continue;
            }
            if sym.is_type_alias() {
                let declared = self.mtt.checker.declared_type_of_symbol(current);
                match self.mtt.checker.lookup(declared) {
                    Some(TypeKey::Reference { symbol: target, .. }) if *target != current => {
                        current = *target;
                        continue;
                    }
                    _ => return None,
                }
            }
            return Some(current);
        }
        None
    }

    /// Build the dead-code sibling block describing every member the
    /// runtime-level emit cannot carry a type for. Returns `None` when
    /// there is nothing to declare or the type has no name.
    pub(crate) fn member_type_declaration(
        &mut self,
        type_name: Option<&str>,
        members: &[NodeId],
        is_interface: bool,
    ) -> Option<NodeId> {
        let type_name = type_name?;

        let mut static_props: Vec<NodeId> = Vec::new();
        let mut instance_props: Vec<NodeId> = Vec::new();
        let mut parameter_props: Vec<NodeId> = Vec::new();
        let mut method_likes: Vec<NodeId> = Vec::new();
        let mut unhandled: Vec<NodeId> = Vec::new();
        let mut saw_constructor = false;

        for &member in members {
            let Some(node) = self.arena.get(member) else {
                continue;
            };
            match &node.kind {
                NodeKind::PropertyDecl(p) | NodeKind::PropertySignature(p) => {
                    if p.name.is_none() {
                        unhandled.push(member);
                    } else if p.modifiers & modifiers::STATIC != 0 {
                        static_props.push(member);
                    } else {
                        instance_props.push(member);
                    }
                }
                NodeKind::Constructor(func) => {
                    // Only the first constructor; additional ones can only
                    // appear in ambient code and merge on the externs path.
                    if saw_constructor {
                        continue;
                    }
                    saw_constructor = true;
                    for &param in &func.params {
                        let is_prop = self
                            .arena
                            .get(param)
                            .and_then(|n| n.as_param())
                            .is_some_and(ParamDecl::is_parameter_property);
                        if is_prop {
                            parameter_props.push(param);
                        }
                    }
                }
                NodeKind::MethodDecl(f) | NodeKind::GetAccessor(f) | NodeKind::SetAccessor(f) => {
                    let is_abstract =
                        f.modifiers & modifiers::ABSTRACT != 0 || f.body.is_none();
                    if is_interface || is_abstract {
                        method_likes.push(member);
                    }
                }
                NodeKind::MethodSignature(_) => {
                    if is_interface {
                        method_likes.push(member);
                    } else {
                        unhandled.push(member);
                    }
                }
                NodeKind::IndexSignature => unhandled.push(member),
                _ => unhandled.push(member),
            }
        }

        if static_props.is_empty()
            && instance_props.is_empty()
            && parameter_props.is_empty()
            && method_likes.is_empty()
            && unhandled.is_empty()
        {
            return None;
        }

        let mut statements = Vec::new();
        for prop in static_props {
            statements.extend(self.property_type_statement(type_name, prop, true));
        }
        for prop in instance_props {
            statements.extend(self.property_type_statement(type_name, prop, false));
        }
        for param in parameter_props {
            statements.extend(self.parameter_property_statement(type_name, param));
        }
        for method in method_likes {
            statements.extend(self.method_type_statement(type_name, method));
        }
        for member in unhandled {
            statements.push(self.unhandled_member_placeholder(member));
        }

        Some(self.arena.if_false(statements))
    }

    /// `/** @type {T} */ C.prototype.x;` (instance) or `C.x;` (static).
    fn property_type_statement(
        &mut self,
        type_name: &str,
        prop: NodeId,
        is_static: bool,
    ) -> Option<NodeId> {
        let decl = self.arena.get(prop).and_then(|n| n.as_property().cloned())?;
        let name = decl.name?;
        let declared = self.mtt.checker.type_at_location(prop);
        let type_str = self.optional_aware_type(declared, decl.question);

        let mut tags = vec![Tag::with_type("type", type_str)];
        if decl.decorators.iter().any(|d| d == "Export") {
            tags.push(Tag::new("export"));
        }
        Some(self.member_access_statement(type_name, &name, is_static, tags))
    }

    fn parameter_property_statement(
        &mut self,
        type_name: &str,
        param: NodeId,
    ) -> Option<NodeId> {
        let decl = self.arena.get(param).and_then(|n| n.as_param().cloned())?;
        let BindingName::Ident(name) = decl.name else {
            return None;
        };
        let declared = self.mtt.checker.type_at_location(param);
        let type_str = self.optional_aware_type(declared, decl.question);
        let tags = vec![Tag::with_type("type", type_str)];
        Some(self.member_access_statement(type_name, &name, false, tags))
    }

    /// An optional property of otherwise-unknown type still has to admit
    /// undefined; `?` alone swallows it.
    fn optional_aware_type(&mut self, declared: stilt_sema::TypeId, optional: bool) -> String {
        let type_str = self.mtt.type_to_closure(declared);
        if optional && type_str == "?" {
            "?|undefined".to_string()
        } else {
            type_str
        }
    }

    fn member_access_statement(
        &mut self,
        type_name: &str,
        member_name: &str,
        is_static: bool,
        tags: Vec<Tag>,
    ) -> NodeId {
        let access = if is_static {
            self.arena.dotted(type_name, &[member_name])
        } else {
            self.arena.dotted(type_name, &["prototype", member_name])
        };
        let stmt = self.arena.expression_statement(access);
        let comment = jsdoc::serialize_tags(&tags, true);
        self.arena
            .comments
            .set_leading(stmt, vec![RawComment::block(comment)]);
        stmt
    }

    /// `C.prototype.m = function(a, b) {};` with the composite signature
    /// comment; the empty function keeps the declared arity.
    fn method_type_statement(&mut self, type_name: &str, method: NodeId) -> Option<NodeId> {
        let Some(func) = self
            .arena
            .get(method)
            .and_then(|n| n.as_function_like().cloned())
        else {
            return None;
        };
        let Some(name) = func.name.clone() else {
            let span = self.arena.span(method);
            self.mtt.error(span, "anonymous abstract member");
            return None;
        };
        let is_static = func.modifiers & modifiers::STATIC != 0;
        let is_abstract = func.modifiers & modifiers::ABSTRACT != 0;

        let extra = if is_abstract {
            vec![Tag::new("abstract")]
        } else {
            Vec::new()
        };
        let (tags, param_names) =
            self.mtt
                .function_type_jsdoc(self.arena, &[method], extra);

        let params: Vec<NodeId> = param_names
            .iter()
            .map(|p| {
                self.arena.synth(NodeKind::Param(Box::new(ParamDecl {
                    name: BindingName::Ident(p.clone()),
                    modifiers: modifiers::NONE,
                    dot_dot_dot: false,
                    question: false,
                    initializer: None,
                })))
            })
            .collect();
        let body = self.arena.block(Vec::new());
        let empty_fn = self.arena.synth(NodeKind::FunctionExpr(Box::new(
            FunctionLike {
                name: None,
                modifiers: modifiers::NONE,
                type_params: Vec::new(),
                params,
                body: Some(body),
            },
        )));

        let target = if is_static {
            self.arena.dotted(type_name, &[&name])
        } else {
            self.arena.dotted(type_name, &["prototype", &name])
        };
        let assignment = self.arena.assignment(target, empty_fn);
        let stmt = self.arena.expression_statement(assignment);
        let comment = jsdoc::serialize_tags(&tags, true);
        self.arena
            .comments
            .set_leading(stmt, vec![RawComment::block(comment)]);
        Some(stmt)
    }

    /// Members with no annotation story keep their original text in a
    /// placeholder comment.
    fn unhandled_member_placeholder(&mut self, member: NodeId) -> NodeId {
        let source = self.arena.source_slice(member).to_string();
        let escaped = jsdoc::escape_comment_text(&source);
        let comment = RawComment::block(format!(
            "/* TODO: handle unrecognized member:\n{escaped}\n*/"
        ));
        self.arena.not_emitted_statement(vec![comment])
    }
}
