//! The per-file export registry, with re-export chain following.

use crate::storage::ImportGraph;
use crate::symbol::{Definition, ImportDetails};
use crate::types::{DefinitionKind, FilePath, SymbolId, SymbolName};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

/// One exported name of a file: either a local definition or a forwarded
/// import that the chain resolver follows.
#[derive(Debug, Clone)]
pub struct ExportEntry {
    pub symbol_id: Option<SymbolId>,
    pub import_def: Option<ImportDetails>,
    pub is_reexport: bool,
}

#[derive(Debug, Default)]
pub struct ExportRegistry {
    by_file: HashMap<FilePath, IndexMap<SymbolName, ExportEntry>>,
}

impl ExportRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a file's export table from its definitions.
    pub fn update(&mut self, file_path: &FilePath, definitions: &[Definition]) {
        let mut table: IndexMap<SymbolName, ExportEntry> = IndexMap::new();
        for def in definitions {
            if !def.is_exported {
                continue;
            }
            let export_name: SymbolName = if def.export.as_ref().is_some_and(|e| e.is_default) {
                "default".into()
            } else {
                def.exported_name().into()
            };
            let is_reexport = def.export.as_ref().is_some_and(|e| e.is_reexport);
            let entry = if def.kind == DefinitionKind::Import {
                ExportEntry {
                    symbol_id: Some(def.symbol_id.clone()),
                    import_def: def.as_import().cloned(),
                    is_reexport: true,
                }
            } else {
                ExportEntry {
                    symbol_id: Some(def.symbol_id.clone()),
                    import_def: None,
                    is_reexport,
                }
            };
            table.insert(export_name, entry);
        }
        self.by_file.insert(file_path.clone(), table);
    }

    pub fn remove(&mut self, file_path: &FilePath) {
        self.by_file.remove(file_path);
    }

    pub fn exports_of(
        &self,
        file_path: &FilePath,
    ) -> Option<&IndexMap<SymbolName, ExportEntry>> {
        self.by_file.get(file_path)
    }

    pub fn get(&self, file_path: &FilePath, name: &str) -> Option<&ExportEntry> {
        self.by_file.get(file_path).and_then(|t| t.get(name))
    }

    /// Follow re-export hops from `(file, name)` to the terminal defining
    /// symbol. Cycles are detected with a `(file, name)` visited set and
    /// resolve to `None`.
    pub fn resolve_export_chain(
        &self,
        file_path: &FilePath,
        name: &str,
        imports: &ImportGraph,
    ) -> Option<SymbolId> {
        let mut visited: HashSet<(FilePath, SymbolName)> = HashSet::new();
        let mut current_file = file_path.clone();
        let mut current_name: SymbolName = name.into();

        loop {
            if !visited.insert((current_file.clone(), current_name.clone())) {
                tracing::debug!(
                    "export chain cycle at {current_file}:{current_name}; resolving to nothing"
                );
                return None;
            }

            let entry = self.get(&current_file, &current_name)?;
            let Some(import_def) = &entry.import_def else {
                return entry.symbol_id.clone();
            };

            // A forwarded import: hop to the source module and continue
            // under the original name.
            let resolved = imports.import_named(&current_file, &import_def.local_name)?;
            let next_file = resolved.effective_target()?.clone();

            // A module-as-named re-export terminates at the import handle.
            if resolved.is_module_as_named() {
                return Some(resolved.import_symbol.clone());
            }

            let next_name = import_def
                .original_name
                .clone()
                .unwrap_or_else(|| import_def.local_name.clone());
            current_file = next_file;
            current_name = next_name;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::import_graph::ResolvedImport;
    use crate::symbol::{DefinitionDetails, ExportInfo, ImportKind};
    use crate::types::{Location, ScopeId, ScopeKind};

    fn loc(file: &str, line: u32) -> Location {
        Location::new(FilePath::new(file), line, 1, line, 40)
    }

    fn scope(file: &str) -> ScopeId {
        ScopeId::derive(ScopeKind::Module, &Location::new(FilePath::new(file), 1, 1, 99, 1))
    }

    fn exported_fn(file: &str, name: &str) -> Definition {
        Definition::new(DefinitionKind::Function, name, loc(file, 1), scope(file))
            .exported(ExportInfo::default())
    }

    fn reexport(file: &str, name: &str, from: &str) -> Definition {
        Definition::new(DefinitionKind::Import, name, loc(file, 1), scope(file))
            .with_details(DefinitionDetails::Import(ImportDetails {
                local_name: name.into(),
                original_name: None,
                source_module_path: from.into(),
                import_kind: ImportKind::Named,
            }))
            .exported(ExportInfo {
                export_name: None,
                is_default: false,
                is_reexport: true,
            })
    }

    fn link(graph: &mut ImportGraph, file: &str, def: &Definition, target: Option<&str>) {
        let details = def.as_import().unwrap().clone();
        graph.update(
            &FilePath::new(file),
            vec![ResolvedImport {
                local_name: details.local_name.clone(),
                import_symbol: def.symbol_id.clone(),
                details,
                target: target.map(FilePath::new),
                submodule_target: None,
            }],
        );
    }

    #[test]
    fn test_direct_export_resolves_to_symbol() {
        let mut reg = ExportRegistry::new();
        let graph = ImportGraph::new();
        let file = FilePath::new("original.ts");
        let def = exported_fn("original.ts", "helper");
        let expected = def.symbol_id.clone();
        reg.update(&file, &[def]);

        assert_eq!(
            reg.resolve_export_chain(&file, "helper", &graph),
            Some(expected)
        );
        assert_eq!(reg.resolve_export_chain(&file, "absent", &graph), None);
    }

    #[test]
    fn test_reexport_chain_two_hops() {
        let mut reg = ExportRegistry::new();
        let mut graph = ImportGraph::new();

        let original = FilePath::new("original.ts");
        let barrel = FilePath::new("index.ts");
        let def = exported_fn("original.ts", "helper");
        let expected = def.symbol_id.clone();
        reg.update(&original, &[def]);

        let forward = reexport("index.ts", "helper", "./original");
        link(&mut graph, "index.ts", &forward, Some("original.ts"));
        reg.update(&barrel, &[forward]);

        assert_eq!(
            reg.resolve_export_chain(&barrel, "helper", &graph),
            Some(expected)
        );
    }

    #[test]
    fn test_reexport_cycle_returns_none() {
        let mut reg = ExportRegistry::new();
        let mut graph = ImportGraph::new();

        let a = FilePath::new("a.ts");
        let b = FilePath::new("b.ts");
        let fwd_a = reexport("a.ts", "x", "./b");
        let fwd_b = reexport("b.ts", "x", "./a");
        link(&mut graph, "a.ts", &fwd_a, Some("b.ts"));
        link(&mut graph, "b.ts", &fwd_b, Some("a.ts"));
        reg.update(&a, &[fwd_a]);
        reg.update(&b, &[fwd_b]);

        assert_eq!(reg.resolve_export_chain(&a, "x", &graph), None);
    }

    #[test]
    fn test_unresolved_hop_returns_none() {
        let mut reg = ExportRegistry::new();
        let mut graph = ImportGraph::new();
        let a = FilePath::new("a.ts");
        let fwd = reexport("a.ts", "x", "./missing");
        link(&mut graph, "a.ts", &fwd, None);
        reg.update(&a, &[fwd]);

        assert_eq!(reg.resolve_export_chain(&a, "x", &graph), None);
    }
}
