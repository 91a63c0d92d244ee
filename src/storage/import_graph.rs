//! The project import graph.
//!
//! For each file: its imports with resolved target files, precomputed
//! submodule paths for Python-style module-as-named imports, and a reverse
//! index from files to their dependents. Resolution happens against the
//! indexed file set; imports of external packages simply stay unresolved.

use crate::symbol::ImportDetails;
use crate::types::{FilePath, SymbolId, SymbolName};
use std::collections::{BTreeSet, HashMap};

/// One import of a file, with resolution results.
#[derive(Debug, Clone)]
pub struct ResolvedImport {
    pub local_name: SymbolName,
    pub details: ImportDetails,
    /// The import definition's own id: the referable handle for namespace
    /// and module-as-named imports.
    pub import_symbol: SymbolId,
    /// Target file of the module specifier, when it names an indexed file.
    pub target: Option<FilePath>,
    /// For `from P import m` where `m` is a submodule file (and the Rust
    /// `use crate::a::b` analog): the submodule's file.
    pub submodule_target: Option<FilePath>,
}

impl ResolvedImport {
    /// The file this import reads names from, preferring the submodule.
    pub fn effective_target(&self) -> Option<&FilePath> {
        self.submodule_target.as_ref().or(self.target.as_ref())
    }

    pub fn is_module_as_named(&self) -> bool {
        self.submodule_target.is_some()
    }
}

#[derive(Debug, Default)]
pub struct ImportGraph {
    imports: HashMap<FilePath, Vec<ResolvedImport>>,
    dependents: HashMap<FilePath, BTreeSet<FilePath>>,
}

impl ImportGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, file_path: &FilePath, imports: Vec<ResolvedImport>) {
        self.remove(file_path);
        for import in &imports {
            for target in [&import.target, &import.submodule_target]
                .into_iter()
                .flatten()
            {
                self.dependents
                    .entry(target.clone())
                    .or_default()
                    .insert(file_path.clone());
            }
        }
        self.imports.insert(file_path.clone(), imports);
    }

    pub fn remove(&mut self, file_path: &FilePath) {
        if let Some(imports) = self.imports.remove(file_path) {
            for import in imports {
                for target in [import.target, import.submodule_target].into_iter().flatten() {
                    if let Some(set) = self.dependents.get_mut(&target) {
                        set.remove(file_path);
                        if set.is_empty() {
                            self.dependents.remove(&target);
                        }
                    }
                }
            }
        }
    }

    pub fn imports_of(&self, file_path: &FilePath) -> &[ResolvedImport] {
        self.imports
            .get(file_path)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Look up an import by the name it binds locally.
    pub fn import_named(&self, file_path: &FilePath, local_name: &str) -> Option<&ResolvedImport> {
        self.imports_of(file_path)
            .iter()
            .find(|i| i.local_name.as_ref() == local_name)
    }

    /// Files importing from `file_path`, directly.
    pub fn dependents(&self, file_path: &FilePath) -> BTreeSet<FilePath> {
        self.dependents.get(file_path).cloned().unwrap_or_default()
    }

    /// Files with at least one unresolved import. Candidates for
    /// re-resolution whenever the indexed file set changes.
    pub fn files_with_unresolved(&self) -> Vec<FilePath> {
        let mut out: Vec<FilePath> = self
            .imports
            .iter()
            .filter(|(_, imports)| imports.iter().any(|i| i.effective_target().is_none()))
            .map(|(f, _)| f.clone())
            .collect();
        out.sort();
        out
    }

    pub fn files(&self) -> impl Iterator<Item = &FilePath> {
        self.imports.keys()
    }
}
