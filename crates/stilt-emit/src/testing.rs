//! Shared fixtures for tests.
//!
//! There is no parser in this workspace, so tests build programs by hand:
//! the arena is built through `stilt_ast` constructors, and a
//! `ProgramBuilder` owns the semantic tables the external pipeline would
//! normally populate, handing out a `Checker` over them.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use stilt_ast::{NodeArena, NodeId, NodeKind, SourceFile};
use stilt_common::{Diagnostic, TranslatorHost, TranslatorOptions};
use stilt_sema::{
    Checker, NodeSymbolMap, Symbol, SymbolArena, SymbolId, TypeId, TypeInterner,
};

pub static DEFAULT_OPTIONS: Lazy<TranslatorOptions> = Lazy::new(|| TranslatorOptions {
    log_warnings: true,
    ..TranslatorOptions::default()
});

/// Host with a dotted-path module naming scheme.
pub struct TestHost {
    pub options: TranslatorOptions,
}

impl TestHost {
    pub fn new() -> Self {
        TestHost {
            options: DEFAULT_OPTIONS.clone(),
        }
    }

    pub fn with_options(options: TranslatorOptions) -> Self {
        TestHost { options }
    }
}

impl Default for TestHost {
    fn default() -> Self {
        TestHost::new()
    }
}

impl TranslatorHost for TestHost {
    fn path_to_module_name(&self, _importer_path: &str, imported_path: &str) -> String {
        imported_path
            .trim_start_matches("./")
            .trim_end_matches(".ts")
            .replace('/', ".")
    }

    fn options(&self) -> &TranslatorOptions {
        &self.options
    }

    fn log_warning(&self, _diag: &Diagnostic) {}
}

/// Wrap statements into a `SourceFile` node.
pub fn source_file(arena: &mut NodeArena, statements: Vec<NodeId>) -> NodeId {
    let file_name = arena.file_name.clone();
    arena.synth(NodeKind::SourceFile(Box::new(SourceFile {
        file_name,
        statements,
        is_declaration_file: false,
    })))
}

/// The semantic tables a checked program carries, kept separate from the
/// arena so the transformer can take the arena mutably while the checker
/// reads these.
#[derive(Default)]
pub struct ProgramBuilder {
    pub symbols: SymbolArena,
    pub types: TypeInterner,
    pub node_symbols: NodeSymbolMap,
    pub node_types: FxHashMap<u32, TypeId>,
    pub symbol_types: FxHashMap<SymbolId, TypeId>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        ProgramBuilder::default()
    }

    pub fn checker(&self) -> Checker<'_> {
        Checker::new(
            &self.symbols,
            &self.types,
            &self.node_symbols,
            &self.node_types,
            &self.symbol_types,
        )
    }

    pub fn declare_symbol(&mut self, flags: u32, name: &str) -> SymbolId {
        self.symbols.alloc(Symbol::new(flags, name))
    }

    /// A symbol declared in another module; type references to it go
    /// through a forward declare.
    pub fn declare_foreign_symbol(&mut self, flags: u32, name: &str, module: &str) -> SymbolId {
        let mut symbol = Symbol::new(flags, name);
        symbol.module_path = Some(module.to_string());
        self.symbols.alloc(symbol)
    }

    pub fn set_node_type(&mut self, node: NodeId, type_id: TypeId) {
        self.node_types.insert(node.0, type_id);
    }

    pub fn set_node_symbol(&mut self, node: NodeId, symbol: SymbolId) {
        self.node_symbols.set(node, symbol);
    }

    pub fn set_symbol_type(&mut self, symbol: SymbolId, type_id: TypeId) {
        self.symbol_types.insert(symbol, type_id);
    }

    /// Mark a declaration as belonging to a symbol (both directions).
    pub fn add_declaration(&mut self, symbol: SymbolId, node: NodeId) {
        if let Some(sym) = self.symbols.get_mut(symbol) {
            sym.declarations.push(node);
        }
        self.node_symbols.set(node, symbol);
    }
}
