//! Externs Generator
//!
//! Walks declaration-only statements and prints a flat, namespaced stub in
//! the annotation dialect. Nested namespaces flatten into dotted paths;
//! declared external modules mangle into identifiers under a single root
//! object; overloads and declaration merging collapse into one stub per
//! name. Unhandled constructs leave a TODO comment rather than a hole.

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

use stilt_ast::{
    modifiers, BindingName, ImportEqualsTarget, ModuleName, NodeArena, NodeId, NodeKind,
};
use stilt_common::{Diagnostic, TranslatorHost};
use stilt_sema::Checker;

use crate::jsdoc::{self, Tag};
use crate::module_translator::ModuleTranslator;

/// Root object every `declare module "spec"` flattens under.
pub const DECLARED_MODULE_ROOT: &str = "stilt_declare_module";

/// Names whose externs would collide with the environment the output runs
/// in. Hard constant; declarations with these names are skipped entirely.
static BLACKLISTED_EXTERNS_NAMES: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    [
        "exports",
        "global",
        "module",
        "ErrorConstructor",
        "Symbol",
        "WorkerGlobalScope",
    ]
    .into_iter()
    .collect()
});

pub struct ExternsResult {
    pub output: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Generate externs for a declaration file (or the ambient statements of a
/// non-declaration file).
pub fn generate_externs(
    arena: &NodeArena,
    source_file: NodeId,
    checker: &Checker<'_>,
    host: &dyn TranslatorHost,
) -> ExternsResult {
    let statements = match arena.get(source_file).and_then(|n| n.as_source_file()) {
        Some(file) if file.is_declaration_file => file.statements.clone(),
        // In a regular file only the ambient statements have externs.
        Some(file) => file
            .statements
            .iter()
            .copied()
            .filter(|&s| arena.get(s).is_some_and(|n| n.is_ambient()))
            .collect(),
        None => Vec::new(),
    };
    let file_name = arena.file_name.clone();
    let mtt = ModuleTranslator::new(host, checker, file_name, true);
    let mut generator = ExternsGenerator {
        arena,
        mtt,
        out: String::new(),
        declared_module_root_emitted: false,
        emitted_stubs: FxHashSet::default(),
    };
    let namespace = Vec::new();
    for stmt in statements {
        generator.visit_statement(stmt, &namespace);
    }
    ExternsResult {
        output: generator.out,
        diagnostics: generator.mtt.diagnostics,
    }
}

struct ExternsGenerator<'a, 'h> {
    arena: &'a NodeArena,
    mtt: ModuleTranslator<'h>,
    out: String,
    declared_module_root_emitted: bool,
    /// Qualified names whose constructor/function stub is already out;
    /// later declarations of the same name only contribute members.
    emitted_stubs: FxHashSet<String>,
}

impl<'a, 'h> ExternsGenerator<'a, 'h> {
    fn visit_statement(&mut self, stmt: NodeId, namespace: &[String]) {
        let Some(node) = self.arena.get(stmt) else {
            return;
        };
        match &node.kind {
            NodeKind::ModuleDecl(_) => self.emit_module(stmt, namespace),
            NodeKind::ImportEqualsDecl(_) => self.emit_import_equals(stmt, namespace),
            NodeKind::ClassDecl(_) | NodeKind::InterfaceDecl(_) => {
                self.emit_class_or_interface(stmt, namespace)
            }
            NodeKind::FunctionDecl(_) => self.emit_function(stmt, namespace),
            NodeKind::VariableStatement(_) => self.emit_variable_statement(stmt, namespace),
            NodeKind::EnumDecl(_) => self.emit_enum(stmt, namespace),
            NodeKind::TypeAliasDecl(_) => self.emit_type_alias(stmt, namespace),
            NodeKind::ImportDecl(_) | NodeKind::NotEmittedStatement => {}
            other => {
                self.writeln(&format!(
                    "// TODO: {}: externs not implemented",
                    kind_name(other)
                ));
            }
        }
    }

    // -----------------------------------------------------------------
    // Namespaces and declared modules
    // -----------------------------------------------------------------

    fn emit_module(&mut self, stmt: NodeId, namespace: &[String]) {
        let Some(NodeKind::ModuleDecl(module)) = self.arena.kind(stmt) else {
            return;
        };
        let module = (**module).clone();
        match &module.name {
            ModuleName::Ident(name) => {
                // `declare global` augments the top level rather than
                // opening a namespace.
                if name == "global" {
                    for &inner in &module.body {
                        self.visit_statement(inner, &[]);
                    }
                    return;
                }
                if self.is_first_declaration(stmt, namespace, name) {
                    self.writeln("/** @const */");
                    if namespace.is_empty() {
                        self.writeln(&format!("var {name} = {{}};"));
                    } else {
                        self.writeln(&format!("{}.{name} = {{}};", namespace.join(".")));
                    }
                }
                let nested = extend_namespace(namespace, name);
                for &inner in &module.body {
                    self.visit_statement(inner, &nested);
                }
            }
            ModuleName::StringLit(spec) => {
                if !self.declared_module_root_emitted {
                    self.declared_module_root_emitted = true;
                    self.writeln("/** @const */");
                    self.writeln(&format!("var {DECLARED_MODULE_ROOT} = {{}};"));
                }
                let mangled = mangle_module_name(spec);
                if self.emitted_stubs.insert(format!("{DECLARED_MODULE_ROOT}.{mangled}")) {
                    self.writeln("/** @const */");
                    self.writeln(&format!("{DECLARED_MODULE_ROOT}.{mangled} = {{}};"));
                }
                let nested = vec![DECLARED_MODULE_ROOT.to_string(), mangled];
                for &inner in &module.body {
                    self.visit_statement(inner, &nested);
                }
            }
        }
    }

    fn emit_import_equals(&mut self, stmt: NodeId, namespace: &[String]) {
        let Some(NodeKind::ImportEqualsDecl(import)) = self.arena.kind(stmt) else {
            return;
        };
        let import = (**import).clone();
        if import.name == "ng" {
            self.writeln(&format!("// Skipping problematic import {} = ...;", import.name));
            return;
        }
        match &import.target {
            ImportEqualsTarget::Require(spec) => {
                self.writeln(&format!(
                    "// TODO: import {} = require({spec:?}) has no externs form",
                    import.name
                ));
            }
            ImportEqualsTarget::DottedName(path) => {
                self.writeln("/** @const */");
                let qualified = qualify(namespace, &import.name);
                let target = path.join(".");
                if namespace.is_empty() {
                    self.writeln(&format!("var {qualified} = {target};"));
                } else {
                    self.writeln(&format!("{qualified} = {target};"));
                }
            }
        }
    }

    // -----------------------------------------------------------------
    // Classes and interfaces
    // -----------------------------------------------------------------

    fn emit_class_or_interface(&mut self, stmt: NodeId, namespace: &[String]) {
        let Some(node) = self.arena.get(stmt) else {
            return;
        };
        let (name, heritage, members, type_params, is_interface) = match &node.kind {
            NodeKind::ClassDecl(c) => {
                let Some(name) = c.name.clone() else {
                    let span = node.span;
                    self.mtt.error(span, "anonymous class in externs");
                    return;
                };
                (
                    name,
                    c.heritage.clone(),
                    c.members.clone(),
                    c.type_params.clone(),
                    false,
                )
            }
            NodeKind::InterfaceDecl(i) => (
                i.name.clone(),
                i.heritage.clone(),
                i.members.clone(),
                i.type_params.clone(),
                true,
            ),
            _ => return,
        };
        if BLACKLISTED_EXTERNS_NAMES.contains(name.as_str()) {
            return;
        }
        // Constrained templates do not exist downstream; the names render
        // as ? inside every signature below.
        self.mtt.blacklist_type_parameters(&type_params);

        let qualified = qualify(namespace, &name);
        let is_first = self.is_first_declaration(stmt, namespace, &name);

        if is_first {
            let mut tags = if is_interface {
                vec![Tag::new("record"), Tag::new("struct")]
            } else {
                vec![Tag::new("constructor"), Tag::new("struct")]
            };
            self.add_externs_heritage(&mut tags, &heritage, is_interface);

            let constructors: Vec<NodeId> = members
                .iter()
                .copied()
                .filter(|&m| matches!(self.arena.kind(m), Some(NodeKind::Constructor(_))))
                .collect();
            let (tags, param_names) = if constructors.is_empty() {
                (tags, Vec::new())
            } else {
                self.mtt.function_type_jsdoc(self.arena, &constructors, tags)
            };

            self.writeln(&jsdoc::serialize_tags(&tags, false));
            let params = param_names.join(", ");
            if namespace.is_empty() {
                self.writeln(&format!("function {name}({params}) {{}}"));
            } else {
                self.writeln(&format!("{qualified} = function({params}) {{}};"));
            }
        }

        self.emit_type_members(&qualified, &members);
    }

    fn add_externs_heritage(
        &mut self,
        tags: &mut Vec<Tag>,
        heritage: &[stilt_ast::HeritageClause],
        is_interface: bool,
    ) {
        use stilt_sema::symbol_flags;
        for clause in heritage {
            for &type_expr in &clause.types {
                let Some(symbol) = self.mtt.checker.symbol_at_location(type_expr) else {
                    tags.push(Tag::text_only(
                        "could not resolve supertype, class definition may be incomplete",
                    ));
                    continue;
                };
                if self.mtt.symbol_is_blacklisted(symbol) {
                    continue;
                }
                let Some(sym) = self.mtt.checker.symbol(symbol) else {
                    continue;
                };
                let tag_name = if is_interface || sym.has_any_flags(symbol_flags::CLASS) {
                    "extends"
                } else if sym.has_any_flags(symbol_flags::INTERFACE) {
                    "implements"
                } else {
                    continue;
                };
                if let Some(name) = self.mtt.qualified_name(symbol) {
                    if !tags
                        .iter()
                        .any(|t| t.tag_name == tag_name && t.type_str.as_deref() == Some(&name))
                    {
                        tags.push(Tag::with_type(tag_name, name));
                    }
                }
            }
        }
    }

    fn emit_type_members(&mut self, qualified: &str, members: &[NodeId]) {
        // Methods merge per (name, static); remember what is out already.
        let mut emitted_methods: FxHashSet<(String, bool)> = FxHashSet::default();

        for &member in members {
            let Some(node) = self.arena.get(member) else {
                continue;
            };
            match &node.kind {
                NodeKind::Constructor(_) => {}
                NodeKind::PropertyDecl(p) | NodeKind::PropertySignature(p) => {
                    let Some(prop_name) = p.name.clone() else {
                        self.writeln("// TODO: member with computed name in externs");
                        continue;
                    };
                    let is_static = p.modifiers & modifiers::STATIC != 0;
                    let optional = p.question;
                    let declared = self.mtt.checker.type_at_location(member);
                    let mut type_str = self.mtt.type_to_closure(declared);
                    if optional && type_str == "?" {
                        type_str = "?|undefined".to_string();
                    }
                    self.writeln(&jsdoc::serialize_tags(
                        &[Tag::with_type("type", type_str)],
                        false,
                    ));
                    if is_static {
                        self.writeln(&format!("{qualified}.{prop_name};"));
                    } else {
                        self.writeln(&format!("{qualified}.prototype.{prop_name};"));
                    }
                }
                NodeKind::MethodDecl(f) | NodeKind::MethodSignature(f) => {
                    let Some(method_name) = f.name.clone() else {
                        self.writeln("// TODO: member with computed name in externs");
                        continue;
                    };
                    let is_static = f.modifiers & modifiers::STATIC != 0;
                    let key = (method_name.clone(), is_static);
                    if !emitted_methods.insert(key) {
                        continue;
                    }
                    // Every same-named overload in this declaration merges
                    // into one function stub.
                    let overloads: Vec<NodeId> = members
                        .iter()
                        .copied()
                        .filter(|&m| {
                            self.arena
                                .get(m)
                                .and_then(|n| n.as_function_like())
                                .is_some_and(|g| {
                                    g.name.as_deref() == Some(method_name.as_str())
                                        && (g.modifiers & modifiers::STATIC != 0) == is_static
                                })
                        })
                        .collect();
                    let (tags, param_names) =
                        self.mtt.function_type_jsdoc(self.arena, &overloads, Vec::new());
                    self.writeln(&jsdoc::serialize_tags(&tags, false));
                    let params = param_names.join(", ");
                    if is_static {
                        self.writeln(&format!(
                            "{qualified}.{method_name} = function({params}) {{}};"
                        ));
                    } else {
                        self.writeln(&format!(
                            "{qualified}.prototype.{method_name} = function({params}) {{}};"
                        ));
                    }
                }
                other => {
                    self.writeln(&format!(
                        "// TODO: {}: externs member not implemented",
                        kind_name(other)
                    ));
                }
            }
        }
    }

    // -----------------------------------------------------------------
    // Functions, variables, enums, typedefs
    // -----------------------------------------------------------------

    fn emit_function(&mut self, stmt: NodeId, namespace: &[String]) {
        let Some(func) = self
            .arena
            .get(stmt)
            .and_then(|n| n.as_function_like().cloned())
        else {
            return;
        };
        let Some(name) = func.name else {
            let span = self.arena.span(stmt);
            self.mtt.error(span, "anonymous function in externs");
            return;
        };
        if BLACKLISTED_EXTERNS_NAMES.contains(name.as_str()) {
            return;
        }
        // All overloads merge into the stub emitted at the first one.
        let overloads = self.gather_overloads(stmt, &name);
        if overloads.first() != Some(&stmt) {
            return;
        }
        let (tags, param_names) = self.mtt.function_type_jsdoc(self.arena, &overloads, Vec::new());
        if !tags.is_empty() {
            self.writeln(&jsdoc::serialize_tags(&tags, false));
        }
        let params = param_names.join(", ");
        if namespace.is_empty() {
            self.writeln(&format!("function {name}({params}) {{}}"));
        } else {
            self.writeln(&format!(
                "{} = function({params}) {{}};",
                qualify(namespace, &name)
            ));
        }
    }

    /// Declarations sharing this statement's symbol, falling back to the
    /// statement alone when the checker knows nothing.
    fn gather_overloads(&self, stmt: NodeId, _name: &str) -> Vec<NodeId> {
        let from_symbol = self
            .mtt
            .checker
            .symbol_at_location(stmt)
            .and_then(|s| self.mtt.checker.symbol(s))
            .map(|sym| {
                sym.declarations
                    .iter()
                    .copied()
                    .filter(|&d| {
                        matches!(self.arena.kind(d), Some(NodeKind::FunctionDecl(_)))
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        if from_symbol.is_empty() {
            vec![stmt]
        } else {
            from_symbol
        }
    }

    fn emit_variable_statement(&mut self, stmt: NodeId, namespace: &[String]) {
        let Some(NodeKind::VariableStatement(vs)) = self.arena.kind(stmt) else {
            return;
        };
        let declarations = vs.declarations.clone();
        for decl in declarations {
            let Some(declarator) = self
                .arena
                .get(decl)
                .and_then(|n| n.as_variable_declaration().cloned())
            else {
                continue;
            };
            let BindingName::Ident(name) = declarator.name else {
                self.writeln("// TODO: destructuring variable declaration in externs");
                continue;
            };
            if BLACKLISTED_EXTERNS_NAMES.contains(name.as_str()) {
                continue;
            }
            let declared = self.mtt.checker.type_at_location(decl);
            let type_str = self.mtt.type_to_closure(declared);
            self.writeln(&jsdoc::serialize_tags(&[Tag::with_type("type", type_str)], false));
            if namespace.is_empty() {
                self.writeln(&format!("var {name};"));
            } else {
                self.writeln(&format!("{};", qualify(namespace, &name)));
            }
        }
    }

    fn emit_enum(&mut self, stmt: NodeId, namespace: &[String]) {
        let Some(NodeKind::EnumDecl(decl)) = self.arena.kind(stmt) else {
            return;
        };
        let decl = (**decl).clone();
        let qualified = qualify(namespace, &decl.name);
        self.writeln("/** @const */");
        if namespace.is_empty() {
            self.writeln(&format!("var {} = {{}};", decl.name));
        } else {
            self.writeln(&format!("{qualified} = {{}};"));
        }
        for &member in &decl.members {
            let Some(NodeKind::EnumMember(m)) = self.arena.kind(member) else {
                continue;
            };
            if !is_valid_identifier(&m.name) {
                self.writeln(&format!(
                    "// TODO: {}: enum member name is not a valid identifier",
                    m.name
                ));
                continue;
            }
            self.writeln("/** @const {number} */");
            self.writeln(&format!("{qualified}.{};", m.name));
        }
    }

    fn emit_type_alias(&mut self, stmt: NodeId, namespace: &[String]) {
        let Some(NodeKind::TypeAliasDecl(alias)) = self.arena.kind(stmt) else {
            return;
        };
        let alias = (**alias).clone();
        self.mtt.blacklist_type_parameters(&alias.type_params);
        let type_str = match self.mtt.checker.symbol_at_location(stmt) {
            Some(symbol) => {
                let declared = self.mtt.checker.declared_type_of_symbol(symbol);
                self.mtt.type_to_closure(declared)
            }
            None => "?".to_string(),
        };
        self.writeln(&jsdoc::serialize_tags(&[Tag::with_type("typedef", type_str)], false));
        if namespace.is_empty() {
            self.writeln(&format!("var {};", alias.name));
        } else {
            self.writeln(&format!("{};", qualify(namespace, &alias.name)));
        }
    }

    // -----------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------

    /// First-declaration check keyed on the symbol's declaration list, with
    /// a seen-name fallback when the checker has no symbol.
    fn is_first_declaration(&mut self, stmt: NodeId, namespace: &[String], name: &str) -> bool {
        let qualified = qualify(namespace, name);
        if let Some(sym) = self
            .mtt
            .checker
            .symbol_at_location(stmt)
            .and_then(|s| self.mtt.checker.symbol(s))
        {
            if let Some(&first) = sym.declarations.first() {
                self.emitted_stubs.insert(qualified);
                return first == stmt;
            }
        }
        self.emitted_stubs.insert(qualified.clone())
    }

    fn writeln(&mut self, line: &str) {
        self.out.push_str(line);
        self.out.push('\n');
    }
}

fn qualify(namespace: &[String], name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}.{name}", namespace.join("."))
    }
}

fn extend_namespace(namespace: &[String], name: &str) -> Vec<String> {
    let mut out = namespace.to_vec();
    out.push(name.to_string());
    out
}

/// `"foo-bar/baz"` becomes `foo_bar_baz`: underscores double first so the
/// mapping stays injective, then everything non-alphanumeric flattens.
fn mangle_module_name(spec: &str) -> String {
    spec.replace('_', "__")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn kind_name(kind: &NodeKind) -> &'static str {
    match kind {
        NodeKind::SourceFile(_) => "source file",
        NodeKind::ClassDecl(_) => "class",
        NodeKind::InterfaceDecl(_) => "interface",
        NodeKind::FunctionDecl(_) => "function",
        NodeKind::VariableStatement(_) => "variable statement",
        NodeKind::TypeAliasDecl(_) => "type alias",
        NodeKind::EnumDecl(_) => "enum",
        NodeKind::ModuleDecl(_) => "module",
        NodeKind::ImportDecl(_) => "import",
        NodeKind::ImportEqualsDecl(_) => "import equals",
        NodeKind::ExpressionStatement(_) => "expression statement",
        NodeKind::IfStatement(_) => "if statement",
        NodeKind::Block(_) => "block",
        NodeKind::IndexSignature => "index signature",
        NodeKind::GetAccessor(_) => "get accessor",
        NodeKind::SetAccessor(_) => "set accessor",
        _ => "unknown construct",
    }
}
