//! Type-String Translator - Convert checker-level types to Closure syntax
//!
//! This module handles type lowering: converting an interned `TypeId` into
//! a type string the annotation dialect understands (`string`,
//! `(string|number)`, `!Foo<?>`, `function(this: !Bar, number): string`).
//!
//! One translator per translation request; it borrows the per-file
//! `ModuleTranslator` so symbol naming can register aliases and forward
//! declares as a side effect of rendering.

use rustc_hash::FxHashSet;

use stilt_sema::{symbol_flags, LiteralValue, ObjectShape, SymbolId, TypeId, TypeKey};

use crate::module_translator::ModuleTranslator;

/// Renders one type. Tracks recursion depth and the alias chains already
/// followed, so cyclic aliasing (possible with declaration merging)
/// degrades to `?` instead of looping.
pub struct TypeTranslator<'m, 'h> {
    mtt: &'m mut ModuleTranslator<'h>,
    depth: u32,
    seen_aliases: FxHashSet<SymbolId>,
}

const MAX_DEPTH: u32 = 16;

impl<'m, 'h> TypeTranslator<'m, 'h> {
    pub fn new(mtt: &'m mut ModuleTranslator<'h>) -> Self {
        TypeTranslator {
            mtt,
            depth: 0,
            seen_aliases: FxHashSet::default(),
        }
    }

    /// Convert a `TypeId` to a Closure type string.
    pub fn translate(&mut self, type_id: TypeId) -> String {
        if self.mtt.host.options().untyped {
            return "?".to_string();
        }
        if self.depth >= MAX_DEPTH {
            return "?".to_string();
        }
        self.depth += 1;
        let result = self.translate_inner(type_id);
        self.depth -= 1;
        result
    }

    fn translate_inner(&mut self, type_id: TypeId) -> String {
        if type_id.is_intrinsic() {
            return self.translate_intrinsic(type_id).to_string();
        }

        let Some(key) = self.mtt.checker.lookup(type_id) else {
            // No structure and not an intrinsic: nothing sound to say.
            return "?".to_string();
        };
        let key = key.clone();

        match key {
            TypeKey::Literal(literal) => match literal {
                LiteralValue::String(_) => "string".to_string(),
                LiteralValue::Number(_) => "number".to_string(),
                LiteralValue::Boolean(_) => "boolean".to_string(),
            },

            TypeKey::Union(members) => self.translate_union(&members),

            // Closure has no intersection types.
            TypeKey::Intersection(_) => "?".to_string(),

            TypeKey::Array(element) => format!("!Array<{}>", self.translate(element)),

            TypeKey::Tuple(elements) => self.translate_tuple(&elements),

            TypeKey::Object(shape) => self.translate_object(&shape),

            TypeKey::ObjectWithIndex(shape) => {
                let value = shape.string_index.unwrap_or(TypeId::ANY);
                format!("!Object<string,{}>", self.translate(value))
            }

            TypeKey::Function(shape) => {
                let mut parts = Vec::new();
                if let Some(this_type) = shape.this_type {
                    parts.push(format!("this: {}", self.translate(this_type)));
                }
                for param in &shape.params {
                    let rendered = self.translate(param.type_id);
                    if param.rest {
                        parts.push(format!("...{rendered}"));
                    } else if param.optional {
                        parts.push(format!("{rendered}="));
                    } else {
                        parts.push(rendered);
                    }
                }
                format!(
                    "function({}): {}",
                    parts.join(", "),
                    self.translate(shape.return_type)
                )
            }

            TypeKey::TypeParameter(name) => {
                if self.mtt.blacklisted_type_params.contains(&name) {
                    "?".to_string()
                } else {
                    name
                }
            }

            TypeKey::Reference { symbol, type_args } => {
                self.translate_reference(symbol, &type_args)
            }
        }
    }

    fn translate_intrinsic(&self, type_id: TypeId) -> &'static str {
        match type_id {
            TypeId::VOID => "void",
            TypeId::UNDEFINED => "undefined",
            TypeId::NULL => "null",
            TypeId::BOOLEAN => "boolean",
            TypeId::NUMBER => "number",
            TypeId::STRING => "string",
            TypeId::BIGINT => "bigint",
            TypeId::SYMBOL => "symbol",
            TypeId::OBJECT => "!Object",
            // any, unknown, never and error all lower to unknown.
            _ => "?",
        }
    }

    fn translate_union(&mut self, members: &[TypeId]) -> String {
        if members.is_empty() {
            return "?".to_string();
        }
        let has_nullish = members
            .iter()
            .any(|&m| m == TypeId::NULL || m == TypeId::UNDEFINED);
        let rest: Vec<TypeId> = members
            .iter()
            .copied()
            .filter(|&m| m != TypeId::NULL && m != TypeId::UNDEFINED)
            .collect();

        // A union with the null/undefined atoms is spelled `?Foo` when the
        // remaining type is a prefixable named type; primitives keep the
        // atoms as listed members.
        if has_nullish && rest.len() == 1 {
            let rendered = self.translate(rest[0]);
            if let Some(stripped) = rendered.strip_prefix('!') {
                return format!("?{stripped}");
            }
        }

        let parts: Vec<String> = members.iter().map(|&m| self.translate(m)).collect();
        format!("({})", parts.join("|"))
    }

    fn translate_tuple(&mut self, elements: &[TypeId]) -> String {
        // Closure has no tuple types; degrade to an array of the union.
        let mut parts: Vec<String> = Vec::new();
        for &element in elements {
            let rendered = self.translate(element);
            if !parts.contains(&rendered) {
                parts.push(rendered);
            }
        }
        match parts.len() {
            0 => "!Array<?>".to_string(),
            1 => format!("!Array<{}>", parts[0]),
            _ => format!("!Array<({})>", parts.join("|")),
        }
    }

    fn translate_object(&mut self, shape: &ObjectShape) -> String {
        if shape.properties.is_empty() {
            return "!Object".to_string();
        }
        let mut members = Vec::with_capacity(shape.properties.len());
        for property in &shape.properties {
            let mut rendered = self.translate(property.type_id);
            if property.optional {
                rendered = format!("({rendered}|undefined)");
            }
            members.push(format!("{}: {}", property.name, rendered));
        }
        format!("{{{}}}", members.join(", "))
    }

    fn translate_reference(&mut self, symbol: SymbolId, type_args: &[TypeId]) -> String {
        let Some(resolved) = self.resolve_alias_chain(symbol) else {
            return "?".to_string();
        };
        if self.mtt.symbol_is_blacklisted(resolved) {
            return "?".to_string();
        }
        let Some(sym) = self.mtt.checker.symbol(resolved) else {
            return "?".to_string();
        };

        // Enums lower to their member type namespace-qualified name too,
        // but a type parameter reference must honor the scope blacklist.
        if sym.has_any_flags(symbol_flags::TYPE_PARAMETER) {
            if self.mtt.blacklisted_type_params.contains(&sym.escaped_name) {
                return "?".to_string();
            }
            return sym.escaped_name.clone();
        }

        let is_array = sym.escaped_name == "Array" && sym.module_path.is_none();
        let name = if is_array {
            "Array".to_string()
        } else {
            match self.mtt.qualified_name(resolved) {
                Some(name) => name,
                None => return "?".to_string(),
            }
        };

        let args = if type_args.is_empty() {
            String::new()
        } else {
            let rendered: Vec<String> = type_args.iter().map(|&a| self.translate(a)).collect();
            format!("<{}>", rendered.join(", "))
        };
        format!("!{name}{args}")
    }

    /// Follow alias symbols to the ultimate target, breaking cycles by
    /// falling back to `?` with a debug warning.
    fn resolve_alias_chain(&mut self, symbol: SymbolId) -> Option<SymbolId> {
        let mut current = symbol;
        loop {
            if !self.seen_aliases.insert(current) {
                let span = stilt_common::Span::dummy();
                self.mtt
                    .debug_warn(span, "cyclic symbol aliasing; emitting ?");
                return None;
            }
            let sym = self.mtt.checker.symbol(current)?;
            if !sym.has_any_flags(symbol_flags::ALIAS) || sym.alias_target.is_none() {
                return Some(current);
            }
            current = sym.alias_target;
        }
    }
}
