//! The language adapter contract.
//!
//! One adapter per language owns the tree-sitter parser, the compiled
//! capture query set, and every language-specific rule: where scopes begin
//! and end, how definition and reference captures become typed records, how
//! import specifiers map to project files, and what counts as a test file.
//! The indexing passes stay language-agnostic by calling through this trait.

use crate::error::{Diagnostic, ParseError, ParseResult};
use crate::indexing::ScopeTree;
use crate::parsing::query::CaptureNode;
use crate::parsing::{Language, javascript, python, rust, typescript};
use crate::symbol::{Definition, ExportInfo, ImportDetails, Reference};
use crate::types::{FilePath, Location, ScopeKind, SymbolName};
use std::collections::BTreeSet;
use tree_sitter::{Node, Query, Tree};

/// The three positions of a scope-forming construct: where its name lives
/// (belonging to the parent scope) and the span of the scope itself.
#[derive(Debug, Clone)]
pub struct ScopeBoundary {
    pub kind: ScopeKind,
    /// Name node span; `None` for anonymous scopes (blocks, lambdas).
    pub symbol_location: Option<Location>,
    pub scope_location: Location,
    pub name: Option<SymbolName>,
}

/// Snapshot of the project's indexed file paths, used for import path
/// resolution. Imports resolve against indexed files, never the filesystem.
pub struct FileSet<'a> {
    files: &'a BTreeSet<FilePath>,
}

impl<'a> FileSet<'a> {
    pub fn new(files: &'a BTreeSet<FilePath>) -> Self {
        Self { files }
    }

    pub fn contains(&self, path: &FilePath) -> bool {
        self.files.contains(path)
    }

    /// First candidate present in the project, in the order given.
    pub fn first_present<I>(&self, candidates: I) -> Option<FilePath>
    where
        I: IntoIterator<Item = String>,
    {
        candidates
            .into_iter()
            .map(|c| FilePath::new(&c))
            .find(|p| self.contains(p))
    }
}

/// Read-only context handed to extraction hooks.
pub struct ExtractionContext<'a> {
    pub file_path: &'a FilePath,
    pub scopes: &'a ScopeTree,
}

/// Export forms that cannot be attached to a declaration in place:
/// `export { X }`, `export { X as Y }`, `export default X`, and re-exports.
#[derive(Debug, Clone)]
pub enum ExportSpec {
    /// Export of a name already defined in this file.
    Named {
        local_name: SymbolName,
        info: ExportInfo,
        location: Location,
    },
    /// `export { X } from "./m"`: a forwarding import definition.
    Reexport {
        import: ImportDetails,
        info: ExportInfo,
        location: Location,
    },
}

/// Position-based node equality: kind and byte span, never pointer or id
/// identity. Parsers may reuse or replace nodes across reparses.
pub fn same_node(a: &Node, b: &Node) -> bool {
    a.kind_id() == b.kind_id() && a.start_byte() == b.start_byte() && a.end_byte() == b.end_byte()
}

/// Node text helper; empty on any UTF-8 slicing problem.
pub fn node_text<'s>(node: &Node, source: &'s str) -> &'s str {
    node.utf8_text(source.as_bytes()).unwrap_or_default()
}

/// Walk up from `node` until a node of `kind` is found.
pub fn ancestor_of_kind<'t>(node: &Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut current = node.parent();
    while let Some(n) = current {
        if n.kind() == kind {
            return Some(n);
        }
        current = n.parent();
    }
    None
}

/// Strip generics, whitespace, and reference sigils from a type annotation,
/// keeping the base type name: `Promise<Foo>` stays `Promise`, `&mut Bar`
/// becomes `Bar`, `&dyn Handler` becomes `Handler`, `list[int]` becomes
/// `list`.
pub fn base_type_name(annotation: &str) -> SymbolName {
    let mut trimmed = annotation.trim().trim_start_matches(':').trim();
    loop {
        let stripped = trimmed
            .trim_start_matches('&')
            .trim_start_matches("mut ")
            .trim_start_matches("dyn ")
            .trim_start_matches("impl ")
            .trim();
        if stripped == trimmed {
            break;
        }
        trimmed = stripped;
    }
    let end = trimmed
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
        .unwrap_or(trimmed.len());
    trimmed[..end].trim().into()
}

/// Join a relative specifier onto a directory and normalize `.`/`..`
/// segments. Returns `None` when `..` escapes the project root.
pub(crate) fn join_and_normalize(dir: &str, relative: &str) -> Option<String> {
    let mut segments: Vec<&str> = if dir.is_empty() {
        Vec::new()
    } else {
        dir.split('/').collect()
    };
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}

/// Language-specific behavior behind a uniform interface.
pub trait LanguageAdapter: Send {
    fn language(&self) -> Language;

    /// Parse source, reusing `old_tree` for incremental edits when given.
    fn parse(&mut self, source: &str, old_tree: Option<&Tree>) -> Option<Tree>;

    /// The compiled `@category.entity[.qualifier]` capture query set.
    fn capture_query(&self) -> &Query;

    /// Map a scope capture to its three positions. `None` skips the capture.
    fn scope_boundary(&self, cap: &CaptureNode, source: &str) -> Option<ScopeBoundary>;

    /// Produce typed definitions for a definition or import capture.
    /// Malformed captures push a diagnostic and return empty.
    fn extract_definitions(
        &self,
        cap: &CaptureNode,
        source: &str,
        ctx: &ExtractionContext,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Definition>;

    /// Produce export specs for an export capture (clause/default/re-export
    /// forms; declarations carry their export flag directly).
    fn extract_exports(
        &self,
        _cap: &CaptureNode,
        _source: &str,
        _ctx: &ExtractionContext,
        _diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<ExportSpec> {
        Vec::new()
    }

    /// Classify a reference capture, or `None` when the identifier is a
    /// binding occurrence or otherwise not a reference.
    fn classify_reference(
        &self,
        cap: &CaptureNode,
        source: &str,
        ctx: &ExtractionContext,
    ) -> Option<Reference>;

    /// Post-extraction pass over the completed index: implicit exports,
    /// `__all__` filtering, and similar whole-file rules.
    fn finalize_index(
        &self,
        _tree: &Tree,
        _source: &str,
        _index: &mut crate::indexing::SemanticIndex,
        _settings: &crate::config::Settings,
    ) {
    }

    /// Heuristic test-file detection from the path alone.
    fn detect_test_file(&self, path: &FilePath) -> bool;

    /// Resolve an import specifier to an indexed project file.
    fn resolve_import_path(
        &self,
        source_file: &FilePath,
        import_path: &str,
        files: &FileSet,
    ) -> Option<FilePath>;

    /// Resolve `name` as a submodule of `package_path` (Python
    /// `from P import m` where `m` is a module file).
    fn resolve_submodule_import_path(
        &self,
        _source_file: &FilePath,
        _package_path: &str,
        _name: &str,
        _files: &FileSet,
    ) -> Option<FilePath> {
        None
    }

    /// The language's self-instance keyword (`this` / `self`).
    fn self_keyword(&self) -> &'static str;
}

/// Creates adapters for the supported languages.
pub struct AdapterFactory;

impl AdapterFactory {
    pub fn create(language: Language) -> ParseResult<Box<dyn LanguageAdapter>> {
        Ok(match language {
            Language::JavaScript => Box::new(javascript::JavaScriptAdapter::new()?),
            Language::TypeScript => Box::new(typescript::TypeScriptAdapter::new()?),
            Language::Python => Box::new(python::PythonAdapter::new()?),
            Language::Rust => Box::new(rust::RustAdapter::new()?),
        })
    }
}

/// Shared constructor plumbing: set the grammar and compile the query set.
pub(crate) fn init_parser(
    language: &tree_sitter::Language,
    language_name: &str,
) -> ParseResult<tree_sitter::Parser> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(language)
        .map_err(|e| ParseError::ParserInit {
            language: language_name.to_string(),
            reason: e.to_string(),
        })?;
    Ok(parser)
}

pub(crate) fn compile_query(
    language: &tree_sitter::Language,
    language_name: &str,
    source: &str,
) -> ParseResult<Query> {
    Query::new(language, source).map_err(|e| ParseError::ParserInit {
        language: language_name.to_string(),
        reason: format!("query compilation failed: {e}"),
    })
}
