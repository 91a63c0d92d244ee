//! The per-file indexing pipeline.
//!
//! Four passes over one file's captures: scope tree, definitions,
//! references, type metadata. The passes are language-agnostic; everything
//! language-specific comes through the [`crate::parsing::LanguageAdapter`].

pub mod definition_builder;
pub mod reference_builder;
pub mod scope_builder;
pub mod semantic_index;
pub mod type_preprocessor;

pub use definition_builder::DefinitionBuilder;
pub use reference_builder::ReferenceBuilder;
pub use scope_builder::{ScopeBuilder, ScopeTree};
pub use semantic_index::SemanticIndex;
pub use type_preprocessor::TypePreprocessor;

use crate::config::Settings;
use crate::error::Diagnostic;
use crate::parsing::adapter::{ExtractionContext, LanguageAdapter};
use crate::parsing::query::{CaptureCategory, run_capture_query};
use crate::types::{FilePath, Location};
use tree_sitter::Tree;

/// Runs the four passes over a parsed file.
pub struct FileIndexer;

impl FileIndexer {
    pub fn index(
        adapter: &dyn LanguageAdapter,
        tree: &Tree,
        file_path: &FilePath,
        source: &str,
        settings: &Settings,
    ) -> (SemanticIndex, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let root = tree.root_node();
        let captures = run_capture_query(adapter.capture_query(), root, source, file_path);

        let boundaries = captures
            .iter()
            .filter(|c| c.category == CaptureCategory::Scope)
            .filter_map(|c| adapter.scope_boundary(c, source))
            .collect();
        let file_span = Location::from_node(file_path, &root);
        let scope_tree = ScopeBuilder::build(file_path, file_span, boundaries, &mut diagnostics);

        let ctx = ExtractionContext {
            file_path,
            scopes: &scope_tree,
        };
        let definitions = DefinitionBuilder::build(adapter, &captures, source, &ctx, &mut diagnostics);
        let references = ReferenceBuilder::build(adapter, &captures, source, &ctx);
        let type_descriptors = TypePreprocessor::build(file_path, &definitions, &scope_tree);

        let mut index = SemanticIndex {
            file_path: file_path.clone(),
            language: adapter.language(),
            root_scope_id: scope_tree.root_id.clone(),
            scopes: scope_tree.scopes,
            definitions,
            references,
            type_descriptors,
        };
        adapter.finalize_index(tree, source, &mut index, settings);
        (index, diagnostics)
    }
}
