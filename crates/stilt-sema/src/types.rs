//! Checker-level types, interned.
//!
//! `TypeId` values below `INTERN_BASE` are intrinsics and never hit the
//! intern table. Everything else is a `TypeKey` deduplicated by structure.
//!
//! Interning a union eagerly interns its non-nullable projection so that
//! `non_nullable_type` is a plain lookup at query time; the interner is
//! shared read-only between files once populated.

use rustc_hash::FxHashMap;

use crate::symbols::SymbolId;

/// Unique identifier for a type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeId(pub u32);

impl TypeId {
    pub const ERROR: TypeId = TypeId(0);
    pub const ANY: TypeId = TypeId(1);
    pub const UNKNOWN: TypeId = TypeId(2);
    pub const NEVER: TypeId = TypeId(3);
    pub const VOID: TypeId = TypeId(4);
    pub const UNDEFINED: TypeId = TypeId(5);
    pub const NULL: TypeId = TypeId(6);
    pub const BOOLEAN: TypeId = TypeId(7);
    pub const NUMBER: TypeId = TypeId(8);
    pub const STRING: TypeId = TypeId(9);
    pub const BIGINT: TypeId = TypeId(10);
    pub const SYMBOL: TypeId = TypeId(11);
    pub const OBJECT: TypeId = TypeId(12);

    /// First id handed out by the intern table.
    pub const INTERN_BASE: u32 = 100;

    pub fn is_intrinsic(&self) -> bool {
        self.0 < Self::INTERN_BASE
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    /// Number literals keep their source spelling; no float in the key.
    Number(String),
    String(String),
    Boolean(bool),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PropertyType {
    pub name: String,
    pub type_id: TypeId,
    pub optional: bool,
}

/// Shape of an anonymous object type. `string_index` is the value type of a
/// string index signature, when one is declared.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ObjectShape {
    pub properties: Vec<PropertyType>,
    pub string_index: Option<TypeId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParamType {
    pub name: Option<String>,
    pub type_id: TypeId,
    pub optional: bool,
    pub rest: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FunctionShape {
    pub this_type: Option<TypeId>,
    pub params: Vec<ParamType>,
    pub return_type: TypeId,
}

/// Structure of a non-intrinsic type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Literal(LiteralValue),
    Union(Vec<TypeId>),
    Intersection(Vec<TypeId>),
    Array(TypeId),
    Tuple(Vec<TypeId>),
    Object(ObjectShape),
    /// Object shape dominated by its index signature.
    ObjectWithIndex(ObjectShape),
    Function(Box<FunctionShape>),
    TypeParameter(String),
    Reference {
        symbol: SymbolId,
        type_args: Vec<TypeId>,
    },
}

/// Dedup-by-structure storage for types.
#[derive(Debug, Default)]
pub struct TypeInterner {
    keys: Vec<TypeKey>,
    ids: FxHashMap<TypeKey, TypeId>,
    /// Union -> the same union with null/undefined removed.
    non_nullable: FxHashMap<TypeId, TypeId>,
}

impl TypeInterner {
    pub fn new() -> Self {
        TypeInterner::default()
    }

    pub fn intern(&mut self, key: TypeKey) -> TypeId {
        if let Some(&id) = self.ids.get(&key) {
            return id;
        }
        let id = TypeId(TypeId::INTERN_BASE + self.keys.len() as u32);
        self.keys.push(key.clone());
        self.ids.insert(key.clone(), id);
        if let TypeKey::Union(members) = &key {
            let id_non_null = self.intern_non_nullable(members);
            self.non_nullable.insert(id, id_non_null);
        }
        id
    }

    fn intern_non_nullable(&mut self, members: &[TypeId]) -> TypeId {
        let remaining: Vec<TypeId> = members
            .iter()
            .copied()
            .filter(|&m| m != TypeId::NULL && m != TypeId::UNDEFINED)
            .collect();
        match remaining.len() {
            0 => TypeId::NEVER,
            1 => remaining[0],
            _ => self.intern(TypeKey::Union(remaining)),
        }
    }

    pub fn lookup(&self, id: TypeId) -> Option<&TypeKey> {
        if id.is_intrinsic() {
            return None;
        }
        self.keys.get((id.0 - TypeId::INTERN_BASE) as usize)
    }

    /// The type with null and undefined removed. Intrinsic null/undefined
    /// collapse to `never`; non-union types pass through unchanged.
    pub fn non_nullable(&self, id: TypeId) -> TypeId {
        if id == TypeId::NULL || id == TypeId::UNDEFINED {
            return TypeId::NEVER;
        }
        self.non_nullable.get(&id).copied().unwrap_or(id)
    }

    pub fn union_members(&self, id: TypeId) -> Option<&[TypeId]> {
        match self.lookup(id)? {
            TypeKey::Union(members) => Some(members),
            _ => None,
        }
    }

    /// Convenience constructors used by drivers and tests.
    pub fn union(&mut self, members: Vec<TypeId>) -> TypeId {
        self.intern(TypeKey::Union(members))
    }

    pub fn array(&mut self, element: TypeId) -> TypeId {
        self.intern(TypeKey::Array(element))
    }

    pub fn reference(&mut self, symbol: SymbolId, type_args: Vec<TypeId>) -> TypeId {
        self.intern(TypeKey::Reference { symbol, type_args })
    }

    pub fn type_param(&mut self, name: impl Into<String>) -> TypeId {
        self.intern(TypeKey::TypeParameter(name.into()))
    }
}
