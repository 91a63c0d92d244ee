//! Phase 1: lexical name resolution.
//!
//! Resolution walks the scope chain from the querying scope to the file's
//! module root. At each scope the `(scope, name)` definition index is
//! consulted; at the root, the file's import list takes over, following
//! export chains for named imports and returning the import definition's
//! own id for namespace and module-as-named imports. Results are cached
//! per `(scope, name)` and are deterministic for a registry snapshot.

use crate::resolution::state::ResolutionState;
use crate::storage::{
    DefinitionRegistry, ExportRegistry, ImportGraph, ResolvedImport, ScopeRegistry,
};
use crate::symbol::ImportKind;
use crate::types::{ScopeId, SymbolId, SymbolName};
use std::cell::RefCell;
use std::collections::HashMap;

pub struct NameResolver<'a> {
    definitions: &'a DefinitionRegistry,
    scopes: &'a ScopeRegistry,
    exports: &'a ExportRegistry,
    imports: &'a ImportGraph,
    cache: RefCell<HashMap<(ScopeId, SymbolName), Option<SymbolId>>>,
}

impl<'a> NameResolver<'a> {
    pub fn new(
        definitions: &'a DefinitionRegistry,
        scopes: &'a ScopeRegistry,
        exports: &'a ExportRegistry,
        imports: &'a ImportGraph,
    ) -> Self {
        Self {
            definitions,
            scopes,
            exports,
            imports,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn resolve(&self, scope_id: &ScopeId, name: &str) -> Option<SymbolId> {
        let key = (scope_id.clone(), SymbolName::from(name));
        if let Some(cached) = self.cache.borrow().get(&key) {
            return cached.clone();
        }
        let result = self.resolve_uncached(scope_id, name);
        self.cache.borrow_mut().insert(key, result.clone());
        result
    }

    fn resolve_uncached(&self, scope_id: &ScopeId, name: &str) -> Option<SymbolId> {
        if let Some(id) = self.definitions.lookup(scope_id, name) {
            tracing::trace!("[phase1] '{name}' found in scope {scope_id}");
            return Some(id.clone());
        }

        let scope = self.scopes.get(scope_id)?;
        match &scope.parent_id {
            Some(parent) => self.resolve(parent, name),
            None => {
                // Module root: the import list is consulted here, never via
                // the scope index (imports are excluded from it).
                let file = &scope.location.file_path;
                let import = self.imports.import_named(file, name)?;
                self.resolve_import(import)
            }
        }
    }

    /// Resolve one import to its terminal symbol (or module handle).
    pub fn resolve_import(&self, import: &ResolvedImport) -> Option<SymbolId> {
        match import.details.import_kind {
            // The import itself is the referable module handle.
            ImportKind::Namespace | ImportKind::SideEffect => {
                Some(import.import_symbol.clone())
            }
            ImportKind::Named => {
                // An explicit export wins over a same-named submodule;
                // the submodule handle is the fallback (module-as-named).
                let lookup = import
                    .details
                    .original_name
                    .as_deref()
                    .unwrap_or(&import.details.local_name);
                if let Some(target) = import.target.as_ref() {
                    if let Some(symbol) =
                        self.exports.resolve_export_chain(target, lookup, self.imports)
                    {
                        return Some(symbol);
                    }
                }
                if import.is_module_as_named() {
                    return Some(import.import_symbol.clone());
                }
                tracing::debug!(
                    "[phase1] named import '{}' unresolved",
                    import.details.local_name
                );
                None
            }
            ImportKind::Default => {
                let target = import.target.as_ref()?;
                self.exports
                    .resolve_export_chain(target, "default", self.imports)
            }
        }
    }

    /// Copy every successful cached resolution into the snapshot's
    /// per-scope tables.
    pub fn drain_into(&self, state: &mut ResolutionState) {
        for ((scope, name), result) in self.cache.borrow().iter() {
            if let Some(symbol) = result {
                state
                    .resolutions_by_scope
                    .entry(scope.clone())
                    .or_default()
                    .insert(name.clone(), symbol.clone());
            }
        }
    }
}
