//! Semantic model for the stilt translator.
//!
//! This crate provides:
//! - `Symbol` / `SymbolArena` - named entities and their flags
//! - `TypeId` / `TypeInterner` - interned checker-level types
//! - `Checker` - the read-only query facade the translator consumes
//!
//! The actual binder and type checker are external collaborators; a driver
//! (or the test fixture) populates these tables before translation starts.

pub mod checker;
pub mod symbols;
pub mod types;

pub use checker::Checker;
pub use symbols::{symbol_flags, NodeSymbolMap, Symbol, SymbolArena, SymbolId};
pub use types::{
    FunctionShape, LiteralValue, ObjectShape, ParamType, PropertyType, TypeId, TypeInterner,
    TypeKey,
};
