//! The authoritative definition registry.
//!
//! Indexed by symbol id, by file, by `(scope, name)`, and by kind class.
//! Import definitions are deliberately excluded from the `(scope, name)`
//! index; the name resolver consults the file's import list separately, so
//! imports never shadow same-named local definitions.

use crate::symbol::Definition;
use crate::types::{FilePath, KindClass, ScopeId, SymbolId, SymbolName};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Default)]
pub struct DefinitionRegistry {
    by_symbol: HashMap<SymbolId, Definition>,
    by_file: HashMap<FilePath, Vec<SymbolId>>,
    by_scope: HashMap<ScopeId, HashMap<SymbolName, SymbolId>>,
    by_kind_class: HashMap<KindClass, BTreeSet<SymbolId>>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a file's definitions. Equivalent to remove + insert.
    pub fn update(&mut self, file_path: &FilePath, definitions: &[Definition]) {
        self.remove(file_path);

        let mut ids = Vec::with_capacity(definitions.len());
        for def in definitions {
            ids.push(def.symbol_id.clone());
            if def.kind != crate::types::DefinitionKind::Import {
                // First binding wins: later same-name definitions in one
                // scope (Python rebinding) do not displace the original.
                self.by_scope
                    .entry(def.defining_scope_id.clone())
                    .or_default()
                    .entry(def.name.clone())
                    .or_insert_with(|| def.symbol_id.clone());
            }
            self.by_kind_class
                .entry(def.kind.kind_class())
                .or_default()
                .insert(def.symbol_id.clone());
            self.by_symbol.insert(def.symbol_id.clone(), def.clone());
        }
        self.by_file.insert(file_path.clone(), ids);
    }

    pub fn remove(&mut self, file_path: &FilePath) {
        let Some(ids) = self.by_file.remove(file_path) else {
            return;
        };
        for id in ids {
            if let Some(def) = self.by_symbol.remove(&id) {
                if let Some(scope_entries) = self.by_scope.get_mut(&def.defining_scope_id) {
                    if scope_entries.get(&def.name) == Some(&def.symbol_id) {
                        scope_entries.remove(&def.name);
                    }
                    if scope_entries.is_empty() {
                        self.by_scope.remove(&def.defining_scope_id);
                    }
                }
                if let Some(set) = self.by_kind_class.get_mut(&def.kind.kind_class()) {
                    set.remove(&def.symbol_id);
                }
            }
        }
    }

    pub fn get(&self, id: &SymbolId) -> Option<&Definition> {
        self.by_symbol.get(id)
    }

    /// The `(scope, name)` lexical index. Never matches imports.
    pub fn lookup(&self, scope_id: &ScopeId, name: &str) -> Option<&SymbolId> {
        self.by_scope.get(scope_id).and_then(|m| m.get(name))
    }

    pub fn in_file(&self, file_path: &FilePath) -> impl Iterator<Item = &Definition> {
        self.by_file
            .get(file_path)
            .into_iter()
            .flatten()
            .filter_map(|id| self.by_symbol.get(id))
    }

    pub fn of_kind_class(&self, class: KindClass) -> impl Iterator<Item = &Definition> {
        self.by_kind_class
            .get(&class)
            .into_iter()
            .flatten()
            .filter_map(|id| self.by_symbol.get(id))
    }

    pub fn contains_file(&self, file_path: &FilePath) -> bool {
        self.by_file.contains_key(file_path)
    }

    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }

    /// The innermost definition whose span contains a 1-based position.
    pub fn definition_at(
        &self,
        file_path: &FilePath,
        line: u32,
        column: u32,
    ) -> Option<&Definition> {
        self.in_file(file_path)
            .filter(|d| d.location.contains_position(line, column))
            .min_by_key(|d| {
                (
                    d.location.end_line - d.location.start_line,
                    d.location.end_column,
                )
            })
    }
}
