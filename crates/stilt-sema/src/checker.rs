//! Read-only checker facade.
//!
//! The translator consumes the external type checker through this narrow
//! query surface. Every table is populated up front (by the driver or the
//! test fixture); queries never mutate, so the facade can be shared between
//! per-file transformations and called re-entrantly from any visitor.

use rustc_hash::FxHashMap;

use stilt_ast::NodeId;

use crate::symbols::{NodeSymbolMap, Symbol, SymbolArena, SymbolId};
use crate::types::{TypeId, TypeInterner, TypeKey};

pub struct Checker<'a> {
    symbols: &'a SymbolArena,
    types: &'a TypeInterner,
    node_symbols: &'a NodeSymbolMap,
    node_types: &'a FxHashMap<u32, TypeId>,
    symbol_types: &'a FxHashMap<SymbolId, TypeId>,
}

impl<'a> Checker<'a> {
    pub fn new(
        symbols: &'a SymbolArena,
        types: &'a TypeInterner,
        node_symbols: &'a NodeSymbolMap,
        node_types: &'a FxHashMap<u32, TypeId>,
        symbol_types: &'a FxHashMap<SymbolId, TypeId>,
    ) -> Self {
        Checker {
            symbols,
            types,
            node_symbols,
            node_types,
            symbol_types,
        }
    }

    pub fn types(&self) -> &'a TypeInterner {
        self.types
    }

    pub fn symbol_at_location(&self, node: NodeId) -> Option<SymbolId> {
        self.node_symbols.get(node)
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&'a Symbol> {
        self.symbols.get(id)
    }

    /// One aliasing step. Callers that need the ultimate target loop with
    /// their own cycle detection; declaration merging can produce alias
    /// cycles.
    pub fn aliased_symbol(&self, id: SymbolId) -> SymbolId {
        match self.symbols.get(id) {
            Some(sym) if !sym.alias_target.is_none() => sym.alias_target,
            _ => id,
        }
    }

    pub fn declared_type_of_symbol(&self, id: SymbolId) -> TypeId {
        self.symbol_types.get(&id).copied().unwrap_or(TypeId::ERROR)
    }

    pub fn type_at_location(&self, node: NodeId) -> TypeId {
        if node.is_none() {
            return TypeId::ERROR;
        }
        self.node_types.get(&node.0).copied().unwrap_or(TypeId::ERROR)
    }

    pub fn non_nullable_type(&self, id: TypeId) -> TypeId {
        self.types.non_nullable(id)
    }

    pub fn lookup(&self, id: TypeId) -> Option<&'a TypeKey> {
        self.types.lookup(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::symbol_flags;

    #[test]
    fn test_missing_lookups_degrade_to_error_type() {
        let symbols = SymbolArena::new();
        let types = TypeInterner::new();
        let node_symbols = NodeSymbolMap::new();
        let node_types = FxHashMap::default();
        let symbol_types = FxHashMap::default();
        let checker = Checker::new(&symbols, &types, &node_symbols, &node_types, &symbol_types);

        assert_eq!(checker.type_at_location(NodeId(7)), TypeId::ERROR);
        assert_eq!(checker.declared_type_of_symbol(SymbolId(7)), TypeId::ERROR);
    }

    #[test]
    fn test_aliased_symbol_single_step() {
        let mut symbols = SymbolArena::new();
        let target = symbols.alloc(Symbol::new(symbol_flags::CLASS, "C"));
        let mut alias = Symbol::new(symbol_flags::ALIAS, "A");
        alias.alias_target = target;
        let alias_id = symbols.alloc(alias);

        let types = TypeInterner::new();
        let node_symbols = NodeSymbolMap::new();
        let node_types = FxHashMap::default();
        let symbol_types = FxHashMap::default();
        let checker = Checker::new(&symbols, &types, &node_symbols, &node_types, &symbol_types);

        assert_eq!(checker.aliased_symbol(alias_id), target);
        assert_eq!(checker.aliased_symbol(target), target);
    }
}
