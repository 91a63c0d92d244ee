//! TypeScript language adapter.
//!
//! Reuses the ECMAScript extraction routines; the TypeScript grammar is a
//! superset of the JavaScript one, and the shared code handles the added
//! node kinds (interfaces, enums, type aliases, parameter wrappers).

use crate::config::Settings;
use crate::error::{Diagnostic, ParseResult};
use crate::indexing::SemanticIndex;
use crate::parsing::adapter::{
    ExportSpec, ExtractionContext, FileSet, LanguageAdapter, ScopeBoundary, compile_query,
    init_parser,
};
use crate::parsing::javascript::extract;
use crate::parsing::query::CaptureNode;
use crate::parsing::Language;
use crate::symbol::{Definition, Reference};
use crate::types::FilePath;
use tree_sitter::{Parser, Query, Tree};

/// The capture query set; part of the external contract.
pub const QUERY_SOURCE: &str = include_str!("queries.scm");

pub struct TypeScriptAdapter {
    parser: Parser,
    query: Query,
}

impl TypeScriptAdapter {
    pub fn new() -> ParseResult<Self> {
        let language: tree_sitter::Language =
            tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into();
        let parser = init_parser(&language, "TypeScript")?;
        let query = compile_query(&language, "TypeScript", QUERY_SOURCE)?;
        Ok(Self { parser, query })
    }
}

impl LanguageAdapter for TypeScriptAdapter {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn parse(&mut self, source: &str, old_tree: Option<&Tree>) -> Option<Tree> {
        self.parser.parse(source, old_tree)
    }

    fn capture_query(&self) -> &Query {
        &self.query
    }

    fn scope_boundary(&self, cap: &CaptureNode, source: &str) -> Option<ScopeBoundary> {
        extract::scope_boundary(cap, source)
    }

    fn extract_definitions(
        &self,
        cap: &CaptureNode,
        source: &str,
        ctx: &ExtractionContext,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Definition> {
        extract::extract_definitions(cap, source, ctx, diagnostics)
    }

    fn extract_exports(
        &self,
        cap: &CaptureNode,
        source: &str,
        ctx: &ExtractionContext,
        _diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<ExportSpec> {
        extract::extract_exports(cap, source, ctx)
    }

    fn classify_reference(
        &self,
        cap: &CaptureNode,
        source: &str,
        ctx: &ExtractionContext,
    ) -> Option<Reference> {
        extract::classify_reference(cap, source, ctx)
    }

    fn finalize_index(
        &self,
        tree: &Tree,
        source: &str,
        index: &mut SemanticIndex,
        _settings: &Settings,
    ) {
        extract::finalize_callbacks(tree, source, index);
    }

    fn detect_test_file(&self, path: &FilePath) -> bool {
        extract::detect_test_file(path)
    }

    fn resolve_import_path(
        &self,
        source_file: &FilePath,
        import_path: &str,
        files: &FileSet,
    ) -> Option<FilePath> {
        extract::resolve_import_path(source_file, import_path, files)
    }

    fn self_keyword(&self) -> &'static str {
        "this"
    }
}
