//! The per-file output of the indexing pipeline.

use crate::parsing::Language;
use crate::symbol::{Definition, ImportDetails, LexicalScope, Reference, TypeDescriptor};
use crate::types::{DefinitionKind, FilePath, ScopeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Everything the four passes learned about one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticIndex {
    pub file_path: FilePath,
    pub language: Language,
    pub root_scope_id: ScopeId,
    pub scopes: IndexMap<ScopeId, LexicalScope>,
    pub definitions: Vec<Definition>,
    /// Source order.
    pub references: Vec<Reference>,
    pub type_descriptors: Vec<TypeDescriptor>,
}

impl SemanticIndex {
    /// An index with no contents, used for files that failed to parse.
    pub fn empty(file_path: FilePath, language: Language) -> Self {
        use crate::types::{Location, ScopeKind};
        let span = Location::new(file_path.clone(), 1, 1, 1, 1);
        let root = LexicalScope::new(ScopeKind::Module, span, None);
        let root_id = root.id.clone();
        let mut scopes = IndexMap::new();
        scopes.insert(root_id.clone(), root);
        Self {
            file_path,
            language,
            root_scope_id: root_id,
            scopes,
            definitions: Vec::new(),
            references: Vec::new(),
            type_descriptors: Vec::new(),
        }
    }

    /// Import definitions, in source order.
    pub fn imports(&self) -> impl Iterator<Item = (&Definition, &ImportDetails)> {
        self.definitions.iter().filter_map(|d| {
            if d.kind == DefinitionKind::Import {
                d.as_import().map(|i| (d, i))
            } else {
                None
            }
        })
    }

    pub fn definitions_of_kind(
        &self,
        kind: DefinitionKind,
    ) -> impl Iterator<Item = &Definition> {
        self.definitions.iter().filter(move |d| d.kind == kind)
    }

    pub fn definition_by_name(&self, name: &str) -> Option<&Definition> {
        self.definitions.iter().find(|d| d.name.as_ref() == name)
    }
}
