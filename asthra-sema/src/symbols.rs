// Symbol tables: strictly nested scopes with innermost-first lookup, plus
// the process-wide module-alias registry. Scopes are reached only from
// their unit's analyzer thread; only the alias registry crosses threads
// and it is a concurrent map.

use std::collections::HashMap;
use std::sync::OnceLock;

use asthra_ast::{ByteSpan, Visibility};
use dashmap::DashMap;

use crate::types::TypeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    Method,
    Field,
    Type,
    EnumVariant,
    ModuleAlias,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: TypeId,
    pub visibility: Visibility,
    pub is_mutable: bool,
    pub is_initialized: bool,
    pub is_predeclared: bool,
    pub is_instance_method: bool,
    pub is_generic: bool,
    pub type_param_count: usize,
    pub decl_span: ByteSpan,
}

impl Symbol {
    pub fn variable(name: &str, ty: TypeId, is_mutable: bool, span: ByteSpan) -> Self {
        Self {
            name: name.to_string(),
            kind: SymbolKind::Variable,
            ty,
            visibility: Visibility::Private,
            is_mutable,
            is_initialized: true,
            is_predeclared: false,
            is_instance_method: false,
            is_generic: false,
            type_param_count: 0,
            decl_span: span,
        }
    }

    pub fn function(name: &str, ty: TypeId, visibility: Visibility, span: ByteSpan) -> Self {
        Self {
            name: name.to_string(),
            kind: SymbolKind::Function,
            ty,
            visibility,
            is_mutable: false,
            is_initialized: true,
            is_predeclared: false,
            is_instance_method: false,
            is_generic: false,
            type_param_count: 0,
            decl_span: span,
        }
    }

    pub fn type_symbol(
        name: &str,
        ty: TypeId,
        visibility: Visibility,
        type_param_count: usize,
        span: ByteSpan,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind: SymbolKind::Type,
            ty,
            visibility,
            is_mutable: false,
            is_initialized: true,
            is_predeclared: false,
            is_instance_method: false,
            is_generic: type_param_count > 0,
            type_param_count,
            decl_span: span,
        }
    }
}

/// Stack of nested scopes. Lookup consults the innermost scope first and
/// walks to the root; insertion always targets the innermost scope.
#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<HashMap<String, Symbol>>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn exit_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1, "cannot exit the root scope");
        self.scopes.pop();
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Insert into the innermost scope; false if the name already exists
    /// there (shadowing an outer scope is fine).
    pub fn insert(&mut self, symbol: Symbol) -> bool {
        let scope = self
            .scopes
            .last_mut()
            .unwrap_or_else(|| unreachable!("scope stack is never empty"));
        if scope.contains_key(&symbol.name) {
            return false;
        }
        scope.insert(symbol.name.clone(), symbol);
        true
    }

    pub fn lookup_local(&self, name: &str) -> Option<&Symbol> {
        self.scopes.last()?.get(name)
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
    }

    /// Every name visible from the current scope, for "did you mean"
    /// suggestions.
    pub fn visible_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .scopes
            .iter()
            .flat_map(|scope| scope.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Process-wide module alias registry (import "x" as y). Concurrent units
/// resolve aliases while others register; registration of a conflicting
/// alias is rejected.
#[derive(Debug, Default)]
pub struct ModuleAliasRegistry {
    aliases: DashMap<String, String>,
}

impl ModuleAliasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `alias -> module`. Returns false if the alias is already
    /// bound to a different module.
    pub fn register(&self, alias: &str, module: &str) -> bool {
        match self.aliases.entry(alias.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(existing) => existing.get().as_str() == module,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(module.to_string());
                true
            }
        }
    }

    /// Single-level alias resolution.
    pub fn resolve(&self, alias: &str) -> Option<String> {
        self.aliases.get(alias).map(|entry| entry.clone())
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

static GLOBAL_ALIASES: OnceLock<ModuleAliasRegistry> = OnceLock::new();

/// Lazily-initialized process-wide registry shared by concurrent units.
pub fn global_alias_registry() -> &'static ModuleAliasRegistry {
    GLOBAL_ALIASES.get_or_init(ModuleAliasRegistry::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> Symbol {
        Symbol::variable(name, TypeId(0), false, 0..0)
    }

    #[test]
    fn test_scope_nesting() {
        let mut scopes = ScopeStack::new();
        assert!(scopes.insert(sym("outer")));

        scopes.enter_scope();
        assert!(scopes.insert(sym("inner")));

        // Both visible from the inner scope
        assert!(scopes.lookup("outer").is_some());
        assert!(scopes.lookup("inner").is_some());
        // Only `inner` is local
        assert!(scopes.lookup_local("outer").is_none());
        assert!(scopes.lookup_local("inner").is_some());

        scopes.exit_scope();
        // Inner symbols die with their scope
        assert!(scopes.lookup("inner").is_none());
        assert!(scopes.lookup("outer").is_some());
    }

    #[test]
    fn test_duplicate_in_same_scope() {
        let mut scopes = ScopeStack::new();
        assert!(scopes.insert(sym("x")));
        assert!(!scopes.insert(sym("x")));

        // Shadowing in a child scope is allowed
        scopes.enter_scope();
        assert!(scopes.insert(sym("x")));
    }

    #[test]
    fn test_sibling_scopes_are_invisible() {
        let mut scopes = ScopeStack::new();

        scopes.enter_scope();
        scopes.insert(sym("a"));
        scopes.exit_scope();

        scopes.enter_scope();
        assert!(scopes.lookup("a").is_none());
        scopes.exit_scope();
    }

    #[test]
    fn test_alias_registry() {
        let registry = ModuleAliasRegistry::new();
        assert!(registry.register("io", "stdlib/io"));
        assert!(registry.register("io", "stdlib/io"));
        assert!(!registry.register("io", "other/io"));
        assert_eq!(registry.resolve("io").as_deref(), Some("stdlib/io"));
        assert_eq!(registry.resolve("net"), None);
    }
}
