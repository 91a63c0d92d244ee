//! The project orchestrator.
//!
//! Owns every registry, drives per-file indexing, rebuilds the import
//! graph and resolution snapshot after each change, and exposes the query
//! surface. Single-threaded and synchronous: a successful `update_file`
//! happens-before any subsequent query, and queries reflect the cumulative
//! effect of all prior updates and removals.
//!
//! Per-file problems (oversized files, parse failures, malformed captures,
//! unresolved imports) are recovered into diagnostics attached to the
//! file; they never fail a project operation.

use crate::config::Settings;
use crate::error::{Diagnostic, IndexError, IndexResult};
use crate::graph::{CallGraph, CallGraphBuilder};
use crate::indexing::FileIndexer;
use crate::parsing::adapter::{AdapterFactory, FileSet, LanguageAdapter};
use crate::parsing::Language;
use crate::resolution::{CallReference, CallResolver, NameResolver, ResolutionState};
use crate::storage::{
    DefinitionRegistry, ExportRegistry, ImportGraph, ReferenceRegistry, ResolvedImport,
    ScopeRegistry, TypeRegistry,
};
use crate::symbol::{Definition, ImportKind, LexicalScope, Reference, ReferenceKind};
use crate::types::{
    DefinitionKind, FilePath, KindClass, Location, Point, ScopeId, SymbolId, SymbolName, TypeId,
};
use std::collections::{BTreeSet, HashMap};
use tree_sitter::{InputEdit, Tree};

/// Lifecycle state of a file known to the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Indexed,
    Errored,
}

/// An import paired with the definition it resolves to, if any.
#[derive(Debug, Clone)]
pub struct ImportWithDefinition {
    pub import: Definition,
    pub resolved: Option<Definition>,
}

/// An exported name of a file with its backing definition.
#[derive(Debug, Clone)]
pub struct ExportedSymbol {
    pub name: SymbolName,
    pub definition: Option<Definition>,
}

pub struct Project {
    settings: Settings,
    adapters: HashMap<Language, Box<dyn LanguageAdapter>>,
    trees: HashMap<FilePath, Tree>,
    sources: HashMap<FilePath, String>,
    /// Files currently indexed; the universe import resolution sees.
    files: BTreeSet<FilePath>,
    file_states: HashMap<FilePath, FileState>,
    diagnostics: HashMap<FilePath, Vec<Diagnostic>>,
    definitions: DefinitionRegistry,
    scopes: ScopeRegistry,
    exports: ExportRegistry,
    references: ReferenceRegistry,
    types: TypeRegistry,
    import_graph: ImportGraph,
    resolution: ResolutionState,
}

impl Project {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            adapters: HashMap::new(),
            trees: HashMap::new(),
            sources: HashMap::new(),
            files: BTreeSet::new(),
            file_states: HashMap::new(),
            diagnostics: HashMap::new(),
            definitions: DefinitionRegistry::new(),
            scopes: ScopeRegistry::new(),
            exports: ExportRegistry::new(),
            references: ReferenceRegistry::new(),
            types: TypeRegistry::new(),
            import_graph: ImportGraph::new(),
            resolution: ResolutionState::default(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ----- mutation ------------------------------------------------------

    /// Index or re-index a file. Unknown extensions and disabled languages
    /// are no-ops; per-file problems become diagnostics, not errors.
    pub fn update_file(&mut self, path: &str, source: &str) -> IndexResult<()> {
        let file = FilePath::new(path);
        let Some(language) = Language::from_path(&file) else {
            tracing::debug!("ignoring '{file}': unknown extension");
            return Ok(());
        };
        if !self.settings.language_enabled(language.config_key()) {
            return Ok(());
        }
        self.ensure_adapter(language)?;
        self.index_file(file, language, source.to_string(), None);
        Ok(())
    }

    /// Apply an incremental edit, reusing the previous syntax tree.
    pub fn update_file_range(
        &mut self,
        path: &str,
        start: Point,
        old_end: Point,
        new_text: &str,
    ) -> IndexResult<()> {
        let file = FilePath::new(path);
        let Some(language) = Language::from_path(&file) else {
            return Ok(());
        };
        let source = self
            .sources
            .get(&file)
            .ok_or_else(|| IndexError::FileNotIndexed { path: file.clone() })?;

        let start_byte =
            byte_offset(source, start).ok_or_else(|| IndexError::InvalidEdit {
                path: file.clone(),
                reason: format!("start point {}:{} out of range", start.row, start.column),
            })?;
        let old_end_byte =
            byte_offset(source, old_end).ok_or_else(|| IndexError::InvalidEdit {
                path: file.clone(),
                reason: format!("end point {}:{} out of range", old_end.row, old_end.column),
            })?;
        if old_end_byte < start_byte {
            return Err(IndexError::InvalidEdit {
                path: file,
                reason: "end point precedes start point".to_string(),
            });
        }

        let mut new_source = String::with_capacity(source.len() + new_text.len());
        new_source.push_str(&source[..start_byte]);
        new_source.push_str(new_text);
        new_source.push_str(&source[old_end_byte..]);

        let edit = InputEdit {
            start_byte,
            old_end_byte,
            new_end_byte: start_byte + new_text.len(),
            start_position: start.into(),
            old_end_position: old_end.into(),
            new_end_position: advance_point(start, new_text).into(),
        };
        let old_tree = self.trees.get(&file).map(|t| {
            let mut tree = t.clone();
            tree.edit(&edit);
            tree
        });

        self.ensure_adapter(language)?;
        self.index_file(file, language, new_source, old_tree);
        Ok(())
    }

    /// Drop every trace of a file and re-resolve its dependents.
    pub fn remove_file(&mut self, path: &str) -> IndexResult<()> {
        let file = FilePath::new(path);
        if !self.files.contains(&file) && !self.file_states.contains_key(&file) {
            return Ok(());
        }
        let dependents = self.import_graph.dependents(&file);
        self.evict_file(&file);

        let mut import_rebuild: BTreeSet<FilePath> = dependents.clone();
        import_rebuild.extend(self.import_graph.files_with_unresolved());
        for f in &import_rebuild {
            self.rebuild_imports(f);
        }
        self.rebuild_type_edges();

        let mut seed = dependents;
        seed.insert(file);
        self.recompute_resolution(seed);
        Ok(())
    }

    fn evict_file(&mut self, file: &FilePath) {
        self.definitions.remove(file);
        self.scopes.remove(file);
        self.exports.remove(file);
        self.references.remove(file);
        self.types.remove(file);
        self.import_graph.remove(file);
        self.files.remove(file);
        self.trees.remove(file);
        self.sources.remove(file);
        self.diagnostics.remove(file);
        self.file_states.remove(file);
    }

    fn ensure_adapter(&mut self, language: Language) -> IndexResult<()> {
        if self.adapters.contains_key(&language) {
            return Ok(());
        }
        let adapter = AdapterFactory::create(language).map_err(|e| IndexError::AdapterInit {
            language: language.name().to_string(),
            reason: e.to_string(),
        })?;
        self.adapters.insert(language, adapter);
        Ok(())
    }

    fn index_file(
        &mut self,
        file: FilePath,
        language: Language,
        source: String,
        old_tree: Option<Tree>,
    ) {
        let mut diagnostics = Vec::new();

        if source.len() > self.settings.max_file_size {
            tracing::warn!(
                "'{file}' is {} bytes, over the {} byte limit",
                source.len(),
                self.settings.max_file_size
            );
            diagnostics.push(Diagnostic::FileTooLarge {
                size: source.len(),
                limit: self.settings.max_file_size,
            });
            let dependents = self.import_graph.dependents(&file);
            self.evict_file(&file);
            self.diagnostics.insert(file.clone(), diagnostics);
            self.file_states.insert(file.clone(), FileState::Errored);
            let mut seed = dependents;
            seed.insert(file);
            self.recompute_resolution(seed);
            return;
        }

        let adapter = self
            .adapters
            .get_mut(&language)
            .expect("adapter ensured before indexing");
        let tree = adapter.parse(&source, old_tree.as_ref());

        let (index, state) = match tree {
            Some(tree) => {
                let adapter: &dyn LanguageAdapter = adapter.as_ref();
                let (index, mut pass_diags) =
                    FileIndexer::index(adapter, &tree, &file, &source, &self.settings);
                diagnostics.append(&mut pass_diags);
                self.trees.insert(file.clone(), tree);
                (index, FileState::Indexed)
            }
            None => {
                // Parse failure: the file is indexed as empty.
                tracing::warn!("parser produced no tree for '{file}'");
                diagnostics.push(Diagnostic::ParseFailure {
                    reason: "parser produced no tree".to_string(),
                });
                self.trees.remove(&file);
                (
                    crate::indexing::SemanticIndex::empty(file.clone(), language),
                    FileState::Errored,
                )
            }
        };

        self.files.insert(file.clone());
        self.sources.insert(file.clone(), source);
        self.definitions.update(&file, &index.definitions);
        self.scopes.update(&file, &index.root_scope_id, &index.scopes);
        self.exports.update(&file, &index.definitions);
        self.references.update(&file, index.references);
        self.types.update(&file, &index.type_descriptors);
        self.file_states.insert(file.clone(), state);
        self.diagnostics.insert(file.clone(), diagnostics);

        // The file set changed, so previously-unresolved imports anywhere
        // may now resolve, and this file's own imports need (re)resolution.
        let mut import_rebuild: BTreeSet<FilePath> = BTreeSet::new();
        import_rebuild.insert(file.clone());
        import_rebuild.extend(self.import_graph.dependents(&file));
        import_rebuild.extend(self.import_graph.files_with_unresolved());
        for f in &import_rebuild {
            self.rebuild_imports(f);
        }
        self.rebuild_type_edges();

        let mut seed = import_rebuild;
        seed.insert(file);
        self.recompute_resolution(seed);
    }

    /// Resolve a file's imports against the current file set and store the
    /// results in the import graph.
    fn rebuild_imports(&mut self, file: &FilePath) {
        let Some(language) = Language::from_path(file) else {
            return;
        };
        let Some(adapter) = self.adapters.get(&language) else {
            return;
        };
        let file_set = FileSet::new(&self.files);

        let mut resolved = Vec::new();
        let mut unresolved_diags = Vec::new();
        for def in self.definitions.in_file(file) {
            let Some(details) = def.as_import() else {
                continue;
            };
            let target =
                adapter.resolve_import_path(file, &details.source_module_path, &file_set);
            let submodule_target = if details.import_kind == ImportKind::Named {
                let member = details
                    .original_name
                    .as_deref()
                    .unwrap_or(&details.local_name);
                adapter.resolve_submodule_import_path(
                    file,
                    &details.source_module_path,
                    member,
                    &file_set,
                )
            } else {
                None
            };

            if target.is_none()
                && submodule_target.is_none()
                && is_project_specifier(&details.source_module_path)
            {
                unresolved_diags.push(Diagnostic::UnresolvedImport {
                    import_path: details.source_module_path.to_string(),
                    location: def.location.clone(),
                });
            }

            resolved.push(ResolvedImport {
                local_name: details.local_name.clone(),
                details: details.clone(),
                import_symbol: def.symbol_id.clone(),
                target,
                submodule_target,
            });
        }
        self.import_graph.update(file, resolved);

        if !unresolved_diags.is_empty() {
            let entry = self.diagnostics.entry(file.clone()).or_default();
            entry.retain(|d| !matches!(d, Diagnostic::UnresolvedImport { .. }));
            entry.extend(unresolved_diags);
        } else if let Some(entry) = self.diagnostics.get_mut(file) {
            entry.retain(|d| !matches!(d, Diagnostic::UnresolvedImport { .. }));
        }
    }

    /// Re-resolve every type's parent and interface names. Names are
    /// resolved at the owning file's module scope, through imports when
    /// needed; unresolved names are retried on the next rebuild.
    fn rebuild_type_edges(&mut self) {
        let names = NameResolver::new(
            &self.definitions,
            &self.scopes,
            &self.exports,
            &self.import_graph,
        );
        let definitions = &self.definitions;
        let scopes = &self.scopes;
        self.types.rebuild_edges(|file, name| {
            let root = scopes.root_of(file)?;
            let symbol = names.resolve(root, name)?;
            let def = definitions.get(&symbol)?;
            if def.kind.kind_class() != KindClass::Type {
                return None;
            }
            Some(TypeId::derive(&def.name, &def.location.file_path))
        });
    }

    /// Rebuild the resolution snapshot for the seed files plus their
    /// dependents, bounded by the configured hop budget, and swap it in.
    fn recompute_resolution(&mut self, seed: BTreeSet<FilePath>) {
        let mut affected = seed.clone();
        let mut frontier = seed;
        for _ in 0..self.settings.resolution.fixpoint_hops {
            let mut next = BTreeSet::new();
            for f in &frontier {
                next.extend(self.import_graph.dependents(f));
            }
            next.retain(|f| !affected.contains(f));
            if next.is_empty() {
                break;
            }
            affected.extend(next.iter().cloned());
            frontier = next;
        }

        let mut state = self.resolution.clone();
        state.evict_files(&affected);

        let indexed: Vec<FilePath> = affected
            .iter()
            .filter(|f| self.files.contains(*f))
            .cloned()
            .collect();

        let names = NameResolver::new(
            &self.definitions,
            &self.scopes,
            &self.exports,
            &self.import_graph,
        );
        let resolver = CallResolver::new(
            &self.definitions,
            &self.scopes,
            &self.exports,
            &self.import_graph,
            &self.types,
            &self.references,
            &names,
            self.settings.resolution.max_inheritance_depth,
        );

        for file in &indexed {
            let result = resolver.resolve_file(file);
            state.insert_file_calls(file.clone(), result.calls, result.indirect);

            // Eagerly resolve the remaining reference names so the scope
            // tables answer go-to-definition and find-references queries.
            for reference in self.references.in_file(file) {
                if matches!(
                    reference.kind,
                    ReferenceKind::Read | ReferenceKind::Write | ReferenceKind::Type
                ) {
                    let _ = names.resolve(&reference.scope_id, &reference.name);
                }
            }
        }
        names.drain_into(&mut state);

        // Dependent recomputation is bounded by the hop budget, but no
        // resolution may outlive its definition: scrub entries whose
        // symbol left the registry (file isolation, scope-table honesty).
        self.scrub_dangling(&mut state);

        // Atomic swap: queries only ever see a complete snapshot.
        self.resolution = state;
    }

    fn scrub_dangling(&self, state: &mut ResolutionState) {
        let definitions = &self.definitions;
        for table in state.resolutions_by_scope.values_mut() {
            table.retain(|_, symbol| definitions.get(symbol).is_some());
        }
        state.resolutions_by_scope.retain(|_, table| !table.is_empty());
        for calls in state.resolved_calls_by_file.values_mut() {
            for call in calls.iter_mut() {
                call.resolutions
                    .retain(|r| definitions.get(&r.symbol_id).is_some());
            }
        }
        for calls in state.calls_by_caller_scope.values_mut() {
            for call in calls.iter_mut() {
                call.resolutions
                    .retain(|r| definitions.get(&r.symbol_id).is_some());
            }
        }
        for set in state.indirect_by_file.values_mut() {
            set.retain(|s| definitions.get(s).is_some());
        }
    }

    // ----- queries -------------------------------------------------------

    pub fn indexed_files(&self) -> Vec<FilePath> {
        self.files.iter().cloned().collect()
    }

    pub fn file_state(&self, path: &str) -> Option<FileState> {
        self.file_states.get(&FilePath::new(path)).copied()
    }

    pub fn diagnostics(&self, path: &str) -> &[Diagnostic] {
        self.diagnostics
            .get(&FilePath::new(path))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_test_file(&self, path: &str) -> bool {
        let file = FilePath::new(path);
        Language::from_path(&file)
            .and_then(|l| self.adapters.get(&l))
            .is_some_and(|a| a.detect_test_file(&file))
    }

    /// The definition a position refers to: through a reference when the
    /// position sits on one, else the innermost definition containing it.
    pub fn go_to_definition(&self, path: &str, point: Point) -> Option<Definition> {
        let file = FilePath::new(path);
        let reference = self
            .references
            .in_file(&file)
            .iter()
            .find(|r| r.location.contains_point(point));

        if let Some(reference) = reference {
            let symbol = self.resolve_reference(reference)?;
            return self.definitions.get(&symbol).cloned();
        }

        self.definitions
            .definition_at(&file, point.row + 1, point.column + 1)
            .cloned()
    }

    fn resolve_reference(&self, reference: &Reference) -> Option<SymbolId> {
        if reference.kind == ReferenceKind::Call {
            let calls = self.resolution.calls_in_file(&reference.location.file_path);
            if let Some(call) = calls.iter().find(|c| c.location == reference.location) {
                return call.resolutions.first().map(|r| r.symbol_id.clone());
            }
        }
        if let Some(symbol) = self
            .resolution
            .resolutions_by_scope
            .get(&reference.scope_id)
            .and_then(|m| m.get(&reference.name))
        {
            return Some(symbol.clone());
        }
        // Fall back to a fresh lexical resolution for references the
        // snapshot did not cover (member accesses, stale scopes).
        let names = NameResolver::new(
            &self.definitions,
            &self.scopes,
            &self.exports,
            &self.import_graph,
        );
        names.resolve(&reference.scope_id, &reference.name)
    }

    /// Every reference location resolving to the given symbol, ordered by
    /// position.
    pub fn find_references(&self, symbol_id: &SymbolId) -> Vec<Location> {
        let mut out = Vec::new();

        for calls in self.resolution.resolved_calls_by_file.values() {
            for call in calls {
                if call.resolutions.iter().any(|r| r.symbol_id == *symbol_id) {
                    out.push(call.location.clone());
                }
            }
        }

        let mut files: Vec<&FilePath> = self.references.files().collect();
        files.sort();
        for file in files {
            for reference in self.references.in_file(file) {
                if reference.kind == ReferenceKind::Call {
                    continue;
                }
                let resolved = self
                    .resolution
                    .resolutions_by_scope
                    .get(&reference.scope_id)
                    .and_then(|m| m.get(&reference.name));
                if resolved == Some(symbol_id) {
                    out.push(reference.location.clone());
                }
            }
        }

        out.sort_by(|a, b| {
            (a.file_path.as_str(), a.start_line, a.start_column).cmp(&(
                b.file_path.as_str(),
                b.start_line,
                b.start_column,
            ))
        });
        out.dedup();
        out
    }

    pub fn get_definition(&self, symbol_id: &SymbolId) -> Option<Definition> {
        self.definitions.get(symbol_id).cloned()
    }

    pub fn get_definitions(&self, path: &str) -> Vec<Definition> {
        self.definitions
            .in_file(&FilePath::new(path))
            .cloned()
            .collect()
    }

    /// A file's resolved calls, in source order.
    pub fn resolved_calls(&self, path: &str) -> &[CallReference] {
        self.resolution.calls_in_file(&FilePath::new(path))
    }

    pub fn get_imports_with_definitions(&self, path: &str) -> Vec<ImportWithDefinition> {
        let file = FilePath::new(path);
        let names = NameResolver::new(
            &self.definitions,
            &self.scopes,
            &self.exports,
            &self.import_graph,
        );
        self.definitions
            .in_file(&file)
            .filter(|d| d.kind == DefinitionKind::Import)
            .map(|import_def| {
                let resolved = self
                    .import_graph
                    .import_named(&file, &import_def.name)
                    .and_then(|i| names.resolve_import(i))
                    .and_then(|s| self.definitions.get(&s))
                    .cloned();
                ImportWithDefinition {
                    import: import_def.clone(),
                    resolved,
                }
            })
            .collect()
    }

    pub fn get_exports(&self, path: &str) -> Vec<ExportedSymbol> {
        let file = FilePath::new(path);
        let Some(table) = self.exports.exports_of(&file) else {
            return Vec::new();
        };
        table
            .iter()
            .map(|(name, _)| {
                let definition = self
                    .exports
                    .resolve_export_chain(&file, name, &self.import_graph)
                    .and_then(|s| self.definitions.get(&s))
                    .cloned();
                ExportedSymbol {
                    name: name.clone(),
                    definition,
                }
            })
            .collect()
    }

    pub fn get_scope_tree(&self, path: &str) -> Vec<LexicalScope> {
        self.scopes
            .in_file(&FilePath::new(path))
            .cloned()
            .collect()
    }

    pub fn get_call_graph(&self) -> CallGraph {
        CallGraphBuilder::build(&self.definitions, &self.resolution, |file| {
            Language::from_path(file)
                .and_then(|l| self.adapters.get(&l))
                .is_some_and(|a| a.detect_test_file(file))
        })
    }

    pub fn get_type_descriptor(&self, type_id: &TypeId) -> Option<crate::symbol::TypeDescriptor> {
        self.types.descriptor(type_id).cloned()
    }

    pub fn get_inheritance_chain(&self, type_id: &TypeId) -> Vec<TypeId> {
        self.types
            .inheritance_chain(type_id, self.settings.resolution.max_inheritance_depth)
    }

    pub fn find_subclasses(&self, type_id: &TypeId) -> Vec<Definition> {
        self.types
            .subclasses_of(type_id, self.settings.resolution.max_inheritance_depth)
            .into_iter()
            .filter_map(|tid| self.types.descriptor(&tid))
            .filter_map(|td| self.definitions.get(&td.symbol_id))
            .cloned()
            .collect()
    }

    pub fn find_implementations(&self, interface_id: &TypeId) -> Vec<Definition> {
        self.types
            .implementers_of(interface_id)
            .into_iter()
            .filter_map(|tid| self.types.descriptor(&tid))
            .filter_map(|td| self.definitions.get(&td.symbol_id))
            .cloned()
            .collect()
    }

    /// Derive the `TypeId` of a type declared in a file.
    pub fn type_id(&self, name: &str, path: &str) -> TypeId {
        TypeId::derive(name, &FilePath::new(path))
    }

    /// Look up a scope id for navigation queries.
    pub fn scope_at(&self, path: &str, point: Point) -> Option<ScopeId> {
        self.scopes
            .innermost_at(&FilePath::new(path), point.row + 1, point.column + 1)
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

/// Project-relative specifiers that should have resolved: unresolved ones
/// are diagnosed, external packages are not.
fn is_project_specifier(specifier: &str) -> bool {
    specifier.starts_with('.')
        || specifier.starts_with("crate")
        || specifier.starts_with("self")
        || specifier.starts_with("super")
}

/// Byte offset of a 0-based point into `source`. Columns count bytes.
fn byte_offset(source: &str, point: Point) -> Option<usize> {
    let mut offset = 0usize;
    for (row, line) in source.split('\n').enumerate() {
        if row == point.row as usize {
            let column = point.column as usize;
            if column > line.len() {
                return None;
            }
            return Some(offset + column);
        }
        offset += line.len() + 1;
    }
    // A point exactly one past the last line (end of file).
    if point.row as usize == source.split('\n').count() && point.column == 0 {
        return Some(source.len());
    }
    None
}

/// The 0-based point at the end of `text` inserted at `start`.
fn advance_point(start: Point, text: &str) -> Point {
    match text.rfind('\n') {
        Some(last_newline) => Point {
            row: start.row + text.matches('\n').count() as u32,
            column: (text.len() - last_newline - 1) as u32,
        },
        None => Point {
            row: start.row,
            column: start.column + text.len() as u32,
        },
    }
}
