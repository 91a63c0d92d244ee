//! JavaScript language adapter.

pub(crate) mod extract;

use crate::config::Settings;
use crate::error::{Diagnostic, ParseResult};
use crate::indexing::SemanticIndex;
use crate::parsing::adapter::{
    ExportSpec, ExtractionContext, FileSet, LanguageAdapter, ScopeBoundary, compile_query,
    init_parser,
};
use crate::parsing::query::CaptureNode;
use crate::parsing::Language;
use crate::symbol::{Definition, Reference};
use crate::types::FilePath;
use tree_sitter::{Parser, Query, Tree};

/// The capture query set; part of the external contract.
pub const QUERY_SOURCE: &str = include_str!("queries.scm");

pub struct JavaScriptAdapter {
    parser: Parser,
    query: Query,
}

impl JavaScriptAdapter {
    pub fn new() -> ParseResult<Self> {
        let language: tree_sitter::Language = tree_sitter_javascript::LANGUAGE.into();
        let parser = init_parser(&language, "JavaScript")?;
        let query = compile_query(&language, "JavaScript", QUERY_SOURCE)?;
        Ok(Self { parser, query })
    }
}

impl LanguageAdapter for JavaScriptAdapter {
    fn language(&self) -> Language {
        Language::JavaScript
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexing::FileIndexer;
    use crate::symbol::{CallType, Receiver, ReferenceKind};
    use crate::types::DefinitionKind;

    fn index_source(source: &str) -> SemanticIndex {
        let mut adapter = JavaScriptAdapter::new().unwrap();
        let tree = adapter.parse(source, None).unwrap();
        let file = FilePath::new("test.js");
        let settings = Settings::default();
        let (index, _diags) = FileIndexer::index(&adapter, &tree, &file, source, &settings);
        index
    }

    #[test]
    fn test_function_and_calls() {
        let index = index_source(
            "function helper() { return 42; }\nfunction main() { helper(); helper(); }\n",
        );
        let helper = index.definition_by_name("helper").unwrap();
        assert_eq!(helper.kind, DefinitionKind::Function);

        let calls: Vec<_> = index
            .references
            .iter()
            .filter(|r| r.kind == ReferenceKind::Call)
            .collect();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.name.as_ref() == "helper"));
        assert!(calls.iter().all(|c| c.call_type == Some(CallType::Function)));
    }

    #[test]
    fn test_exported_function_flag() {
        let index = index_source("export function main() {}\nfunction local() {}\n");
        assert!(index.definition_by_name("main").unwrap().is_exported);
        assert!(!index.definition_by_name("local").unwrap().is_exported);
    }

    #[test]
    fn test_class_with_methods() {
        let index = index_source(
            "class Calc {\n  constructor(x) { this.x = x; }\n  add(n) { return this.x + n; }\n}\n",
        );
        let class = index.definition_by_name("Calc").unwrap();
        assert_eq!(class.kind, DefinitionKind::Class);

        let ctor = index.definition_by_name("constructor").unwrap();
        assert_eq!(ctor.kind, DefinitionKind::Constructor);

        let add = index.definition_by_name("add").unwrap();
        assert_eq!(add.kind, DefinitionKind::Method);
        assert_eq!(
            add.as_callable().unwrap().enclosing_type.as_deref(),
            Some("Calc")
        );

        let td = index
            .type_descriptors
            .iter()
            .find(|t| t.name.as_ref() == "Calc")
            .unwrap();
        assert_eq!(td.members.len(), 2);
    }

    #[test]
    fn test_method_call_receiver() {
        let index = index_source("const calc = new Calc();\ncalc.add(1);\n");
        let call = index
            .references
            .iter()
            .find(|r| r.kind == ReferenceKind::Call && r.name.as_ref() == "add")
            .unwrap();
        assert_eq!(call.call_type, Some(CallType::Method));
        assert_eq!(call.receiver, Some(Receiver::Named("calc".into())));

        let calc = index.definition_by_name("calc").unwrap();
        assert_eq!(
            calc.as_variable().unwrap().value_type.as_deref(),
            Some("Calc")
        );
    }

    #[test]
    fn test_arrow_bound_to_variable_is_one_function() {
        let index = index_source("const fmt = (s) => s.trim();\n");
        let fmt = index.definition_by_name("fmt").unwrap();
        assert_eq!(fmt.kind, DefinitionKind::Function);
        // No sibling variable definition under the same name.
        assert_eq!(
            index
                .definitions
                .iter()
                .filter(|d| d.name.as_ref() == "fmt")
                .count(),
            1
        );
    }

    #[test]
    fn test_imports() {
        let index = index_source(
            "import def from \"./a\";\nimport * as ns from \"./b\";\nimport { x, y as z } from \"./c\";\nimport \"./side\";\n",
        );
        let imports: Vec<_> = index.imports().collect();
        assert_eq!(imports.len(), 5);

        let (_, def) = imports
            .iter()
            .find(|(d, _)| d.name.as_ref() == "def")
            .unwrap();
        assert_eq!(def.import_kind, crate::symbol::ImportKind::Default);
        assert_eq!(def.original_name.as_deref(), Some("default"));

        let (_, ns) = imports
            .iter()
            .find(|(d, _)| d.name.as_ref() == "ns")
            .unwrap();
        assert_eq!(ns.import_kind, crate::symbol::ImportKind::Namespace);

        let (_, z) = imports
            .iter()
            .find(|(d, _)| d.name.as_ref() == "z")
            .unwrap();
        assert_eq!(z.original_name.as_deref(), Some("y"));
        assert_eq!(z.source_module_path.as_ref(), "./c");
    }

    #[test]
    fn test_reexport_emits_forwarding_import() {
        let index = index_source("export { helper } from \"./original\";\n");
        let (def, import) = index.imports().next().unwrap();
        assert!(def.is_exported);
        assert!(def.export.as_ref().unwrap().is_reexport);
        assert_eq!(import.local_name.as_ref(), "helper");
        assert_eq!(import.source_module_path.as_ref(), "./original");
    }

    #[test]
    fn test_variable_reassignment_writes() {
        let index = index_source(
            "let x = new Foo();\nx.foo();\nx = new Bar();\nx.bar();\n",
        );
        let writes: Vec<_> = index
            .references
            .iter()
            .filter(|r| r.kind == ReferenceKind::Write)
            .collect();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].assigned_type.as_deref(), Some("Bar"));

        let x = index.definition_by_name("x").unwrap();
        assert_eq!(x.as_variable().unwrap().value_type.as_deref(), Some("Foo"));
    }

    #[test]
    fn test_collection_members() {
        let index = index_source(
            "const handlers = {\n  start: () => 1,\n  stop() { return 2; },\n};\nhandlers.start();\n",
        );
        let handlers = index.definition_by_name("handlers").unwrap();
        let members = &handlers.as_variable().unwrap().collection_members;
        assert!(members.iter().any(|m| m.as_ref() == "start"));
        assert!(members.iter().any(|m| m.as_ref() == "stop"));
    }

    #[test]
    fn test_callback_context_recorded() {
        let index = index_source(
            "const transform = (x) => x + 1;\nfunction run(items) { items.map(transform); }\n",
        );
        let transform = index.definition_by_name("transform").unwrap();
        let ctx = transform
            .as_callable()
            .unwrap()
            .callback_context
            .as_ref()
            .unwrap();
        assert!(ctx.is_callback);
        assert_eq!(ctx.callee_name.as_deref(), Some("map"));
        assert_eq!(ctx.argument_index, Some(0));
        assert!(ctx.receiver_is_external);
    }

    #[test]
    fn test_this_receiver() {
        let index = index_source(
            "class A {\n  run() { this.helper(); }\n  helper() {}\n}\n",
        );
        let call = index
            .references
            .iter()
            .find(|r| r.kind == ReferenceKind::Call && r.name.as_ref() == "helper")
            .unwrap();
        assert_eq!(call.receiver, Some(Receiver::SelfInstance));
    }

    #[test]
    fn test_detect_test_file() {
        let adapter = JavaScriptAdapter::new().unwrap();
        assert!(adapter.detect_test_file(&FilePath::new("src/app.test.js")));
        assert!(adapter.detect_test_file(&FilePath::new("src/__tests__/app.js")));
        assert!(!adapter.detect_test_file(&FilePath::new("src/app.js")));
    }
}
