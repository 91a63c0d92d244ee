//! Python language adapter.
//!
//! Python-specific rules live here: `:`-delimited scope boundaries,
//! assignment-based variable definitions, relative and package imports,
//! implicit module exports with optional `__all__` filtering, and
//! submodule resolution for `from P import m`.

use crate::config::Settings;
use crate::error::{Diagnostic, ParseResult};
use crate::indexing::SemanticIndex;
use crate::parsing::adapter::{
    ExtractionContext, FileSet, LanguageAdapter, ScopeBoundary, ancestor_of_kind, base_type_name,
    compile_query, init_parser, join_and_normalize, node_text, same_node,
};
use crate::parsing::query::CaptureNode;
use crate::parsing::Language;
use crate::symbol::{
    CallType, CallableDetails, CallbackContext, Definition, DefinitionDetails, ExportInfo,
    ImportDetails, ImportKind, Parameter, Receiver, Reference, ReferenceKind, TypeDetails,
    VariableDetails,
};
use crate::types::{DefinitionKind, FilePath, Location, ScopeKind, SymbolName};
use std::collections::HashSet;
use tree_sitter::{Node, Parser, Query, Tree};

/// The capture query set; part of the external contract.
pub const QUERY_SOURCE: &str = include_str!("queries.scm");

pub struct PythonAdapter {
    parser: Parser,
    query: Query,
}

impl PythonAdapter {
    pub fn new() -> ParseResult<Self> {
        let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
        let parser = init_parser(&language, "Python")?;
        let query = compile_query(&language, "Python", QUERY_SOURCE)?;
        Ok(Self { parser, query })
    }
}

fn is_field(parent: &Node, field: &str, node: &Node) -> bool {
    parent
        .child_by_field_name(field)
        .is_some_and(|c| same_node(&c, node))
}

fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn strip_quotes(s: &str) -> &str {
    s.trim_matches(|c| c == '"' || c == '\'')
}

/// The scope a callable creates: parameters through body end.
fn callable_scope_span(file: &FilePath, node: &Node) -> Location {
    let start = node
        .child_by_field_name("parameters")
        .or_else(|| node.child_by_field_name("body"))
        .map(|n| n.start_position())
        .unwrap_or_else(|| node.start_position());
    Location::new(
        file.clone(),
        start.row as u32 + 1,
        start.column as u32 + 1,
        node.end_position().row as u32 + 1,
        node.end_position().column as u32 + 1,
    )
}

/// Whether a definition node sits inside a class body or a function body,
/// whichever is nearer.
fn enclosing_definition<'t>(node: &Node<'t>) -> Option<Node<'t>> {
    let mut current = node.parent();
    while let Some(n) = current {
        if matches!(n.kind(), "class_definition" | "function_definition") {
            return Some(n);
        }
        current = n.parent();
    }
    None
}

fn extract_parameters(
    file: &FilePath,
    node: &Node,
    source: &str,
) -> (Vec<Parameter>, Vec<(SymbolName, Location)>) {
    let mut params = Vec::new();
    let mut bindings = Vec::new();
    let Some(list) = node.child_by_field_name("parameters") else {
        return (params, bindings);
    };

    for child in named_children(&list) {
        match child.kind() {
            "identifier" => {
                let name = node_text(&child, source);
                if name == "self" || name == "cls" {
                    continue;
                }
                params.push(Parameter::new(name));
                bindings.push((name.into(), Location::from_node(file, &child)));
            }
            "typed_parameter" => {
                let name_node = named_children(&child)
                    .into_iter()
                    .find(|c| c.kind() == "identifier");
                if let Some(name_node) = name_node {
                    let name = node_text(&name_node, source);
                    let mut p = Parameter::new(name);
                    p.type_annotation = child
                        .child_by_field_name("type")
                        .map(|t| node_text(&t, source).trim().into());
                    params.push(p);
                    bindings.push((name.into(), Location::from_node(file, &name_node)));
                }
            }
            "default_parameter" | "typed_default_parameter" => {
                if let Some(name_node) = child.child_by_field_name("name") {
                    let name = node_text(&name_node, source);
                    let mut p = Parameter::new(name);
                    p.is_optional = true;
                    p.type_annotation = child
                        .child_by_field_name("type")
                        .map(|t| node_text(&t, source).trim().into());
                    p.default_value = child
                        .child_by_field_name("value")
                        .map(|v| node_text(&v, source).into());
                    params.push(p);
                    bindings.push((name.into(), Location::from_node(file, &name_node)));
                }
            }
            "list_splat_pattern" | "dictionary_splat_pattern" => {
                for inner in named_children(&child) {
                    if inner.kind() == "identifier" {
                        let name = node_text(&inner, source);
                        let mut p = Parameter::new(name);
                        p.is_rest = true;
                        params.push(p);
                        bindings.push((name.into(), Location::from_node(file, &inner)));
                    }
                }
            }
            _ => {}
        }
    }
    (params, bindings)
}

fn parameter_definitions(
    ctx: &ExtractionContext,
    callable_node: &Node,
    bindings: &[(SymbolName, Location)],
) -> Vec<Definition> {
    let span = callable_scope_span(ctx.file_path, callable_node);
    let scope_id = ctx
        .scopes
        .scope_with_location(&span)
        .unwrap_or_else(|| ctx.scopes.root_id.clone());
    bindings
        .iter()
        .map(|(name, loc)| {
            Definition::new(DefinitionKind::Parameter, name, loc.clone(), scope_id.clone())
        })
        .collect()
}

fn extract_function(cap: &CaptureNode, source: &str, ctx: &ExtractionContext) -> Vec<Definition> {
    let node = cap.node;
    let Some(name_node) = node.child_by_field_name("name") else {
        return Vec::new();
    };
    let name = node_text(&name_node, source);

    let enclosing = enclosing_definition(&node);
    let in_class = enclosing.is_some_and(|e| e.kind() == "class_definition");
    let kind = if in_class && name == "__init__" {
        DefinitionKind::Constructor
    } else if in_class {
        DefinitionKind::Method
    } else {
        DefinitionKind::Function
    };
    let enclosing_type = enclosing
        .filter(|e| e.kind() == "class_definition")
        .and_then(|e| e.child_by_field_name("name"))
        .map(|n| node_text(&n, source).into());

    let is_static = has_decorator(&node, source, "staticmethod");

    let anchor = Location::from_node(ctx.file_path, &name_node);
    let scope_id = ctx.scopes.innermost_containing(&anchor);
    let (parameters, bindings) = extract_parameters(ctx.file_path, &node, source);

    let def = Definition::new(kind, name, cap.location.clone(), scope_id).with_details(
        DefinitionDetails::Callable(CallableDetails {
            parameters,
            return_type: node
                .child_by_field_name("return_type")
                .map(|t| node_text(&t, source).trim().into()),
            access: None,
            is_static,
            enclosing_type,
            callback_context: None,
        }),
    );

    let mut defs = vec![def];
    defs.extend(parameter_definitions(ctx, &node, &bindings));
    defs
}

fn has_decorator(node: &Node, source: &str, decorator: &str) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    if parent.kind() != "decorated_definition" {
        return false;
    }
    named_children(&parent)
        .iter()
        .filter(|c| c.kind() == "decorator")
        .any(|d| node_text(d, source).trim_start_matches('@').trim() == decorator)
}

fn extract_class(cap: &CaptureNode, source: &str, ctx: &ExtractionContext) -> Vec<Definition> {
    let node = cap.node;
    let Some(name_node) = node.child_by_field_name("name") else {
        return Vec::new();
    };
    let name = node_text(&name_node, source);
    let anchor = Location::from_node(ctx.file_path, &name_node);
    let scope_id = ctx.scopes.innermost_containing(&anchor);

    // Multiple inheritance: every superclass lands in `inherits`, in
    // declared order.
    let mut details = TypeDetails::default();
    if let Some(superclasses) = node.child_by_field_name("superclasses") {
        for arg in named_children(&superclasses) {
            if matches!(arg.kind(), "identifier" | "attribute") {
                details.inherits.push(base_type_name(node_text(&arg, source)));
            }
        }
    }

    vec![
        Definition::new(DefinitionKind::Class, name, cap.location.clone(), scope_id)
            .with_details(DefinitionDetails::Type(details)),
    ]
}

/// The constructed type of an assignment's right side: `Foo()` construes as
/// a constructor call when `Foo` later resolves to a class.
fn construction_type(right: &Node, source: &str) -> Option<SymbolName> {
    if right.kind() != "call" {
        return None;
    }
    let func = right.child_by_field_name("function")?;
    match func.kind() {
        "identifier" => Some(node_text(&func, source).into()),
        "attribute" => func
            .child_by_field_name("attribute")
            .map(|a| node_text(&a, source).into()),
        _ => None,
    }
}

fn extract_assignment(cap: &CaptureNode, source: &str, ctx: &ExtractionContext) -> Vec<Definition> {
    let node = cap.node;
    let Some(left) = node.child_by_field_name("left") else {
        return Vec::new();
    };
    let right = node.child_by_field_name("right");
    let mut defs = Vec::new();

    match left.kind() {
        "identifier" => {
            let name = node_text(&left, source);
            let anchor = Location::from_node(ctx.file_path, &left);
            let scope_id = ctx.scopes.innermost_containing(&anchor);
            let details = VariableDetails {
                type_annotation: node
                    .child_by_field_name("type")
                    .map(|t| node_text(&t, source).trim().into()),
                value_type: right.as_ref().and_then(|r| construction_type(r, source)),
                collection_members: right
                    .as_ref()
                    .map(|r| callable_dict_members(r, source))
                    .unwrap_or_default(),
            };
            defs.push(
                Definition::new(DefinitionKind::Variable, name, cap.location.clone(), scope_id)
                    .with_details(DefinitionDetails::Variable(details)),
            );
        }
        "pattern_list" | "tuple_pattern" => {
            for target in named_children(&left) {
                if target.kind() == "identifier" {
                    let name = node_text(&target, source);
                    let loc = Location::from_node(ctx.file_path, &target);
                    let scope_id = ctx.scopes.innermost_containing(&loc);
                    defs.push(Definition::new(
                        DefinitionKind::Variable,
                        name,
                        loc,
                        scope_id,
                    ));
                }
            }
        }
        // `self.x = ...` declares an instance attribute.
        "attribute" => {
            let is_self = left
                .child_by_field_name("object")
                .is_some_and(|o| node_text(&o, source) == "self");
            if is_self {
                if let Some(attr) = left.child_by_field_name("attribute") {
                    let name = node_text(&attr, source);
                    let loc = Location::from_node(ctx.file_path, &left);
                    let scope_id = ctx.scopes.innermost_containing(&loc);
                    defs.push(
                        Definition::new(DefinitionKind::Property, name, loc, scope_id)
                            .with_details(DefinitionDetails::Variable(VariableDetails {
                                value_type: right.as_ref().and_then(|r| construction_type(r, source)),
                                ..VariableDetails::default()
                            })),
                    );
                }
            }
        }
        _ => {}
    }
    defs
}

/// Callable members of a dict literal of lambdas or named functions.
fn callable_dict_members(right: &Node, source: &str) -> Vec<SymbolName> {
    if right.kind() != "dictionary" {
        return Vec::new();
    }
    let mut members = Vec::new();
    for pair in named_children(right) {
        if pair.kind() != "pair" {
            continue;
        }
        let value_is_callable = pair
            .child_by_field_name("value")
            .is_some_and(|v| matches!(v.kind(), "lambda" | "identifier"));
        if value_is_callable {
            if let Some(key) = pair.child_by_field_name("key") {
                members.push(strip_quotes(node_text(&key, source)).into());
            }
        }
    }
    members
}

fn extract_for_target(cap: &CaptureNode, source: &str, ctx: &ExtractionContext) -> Vec<Definition> {
    let node = cap.node;
    let Some(left) = node.child_by_field_name("left") else {
        return Vec::new();
    };
    let mut defs = Vec::new();
    let targets = if left.kind() == "identifier" {
        vec![left]
    } else {
        named_children(&left)
            .into_iter()
            .filter(|t| t.kind() == "identifier")
            .collect()
    };
    for target in targets {
        let name = node_text(&target, source);
        let loc = Location::from_node(ctx.file_path, &target);
        let scope_id = ctx.scopes.innermost_containing(&loc);
        defs.push(Definition::new(
            DefinitionKind::Variable,
            name,
            loc,
            scope_id,
        ));
    }
    defs
}

fn extract_import(
    cap: &CaptureNode,
    source: &str,
    ctx: &ExtractionContext,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Definition> {
    let node = cap.node;
    let root = ctx.scopes.root_id.clone();
    let mut defs = Vec::new();

    let import_def = |local: &str,
                      original: Option<&str>,
                      module: &str,
                      kind: ImportKind,
                      loc: Location| {
        Definition::new(DefinitionKind::Import, local, loc, root.clone()).with_details(
            DefinitionDetails::Import(ImportDetails {
                local_name: local.into(),
                original_name: original.map(Into::into),
                source_module_path: module.into(),
                import_kind: kind,
            }),
        )
    };

    match node.kind() {
        // `import a.b`, `import a.b as c`
        "import_statement" => {
            for child in named_children(&node) {
                match child.kind() {
                    "dotted_name" => {
                        let dotted = node_text(&child, source);
                        // `import a.b` binds `a`, referring to module `a`.
                        let first = dotted.split('.').next().unwrap_or(dotted);
                        defs.push(import_def(
                            first,
                            None,
                            first,
                            ImportKind::Namespace,
                            Location::from_node(ctx.file_path, &child),
                        ));
                    }
                    "aliased_import" => {
                        let Some(name_node) = child.child_by_field_name("name") else {
                            continue;
                        };
                        let Some(alias_node) = child.child_by_field_name("alias") else {
                            continue;
                        };
                        let dotted = node_text(&name_node, source);
                        defs.push(import_def(
                            node_text(&alias_node, source),
                            None,
                            dotted,
                            ImportKind::Namespace,
                            Location::from_node(ctx.file_path, &child),
                        ));
                    }
                    _ => {}
                }
            }
        }
        // `from m import a, b as c`, `from . import x`
        "import_from_statement" => {
            let Some(module_node) = node.child_by_field_name("module_name") else {
                diagnostics.push(Diagnostic::CaptureMalformed {
                    category: "import".to_string(),
                    location: cap.location.clone(),
                    reason: "from-import without module name".to_string(),
                });
                return defs;
            };
            let module = node_text(&module_node, source);

            let mut name_nodes = Vec::new();
            for child in named_children(&node) {
                if same_node(&child, &module_node) {
                    continue;
                }
                if matches!(child.kind(), "dotted_name" | "aliased_import") {
                    name_nodes.push(child);
                }
                if child.kind() == "wildcard_import" {
                    // `from m import *` binds nothing resolvable by name.
                    tracing::debug!("skipping wildcard import from '{module}'");
                }
            }

            for child in name_nodes {
                match child.kind() {
                    "dotted_name" => {
                        let name = node_text(&child, source);
                        defs.push(import_def(
                            name,
                            None,
                            module,
                            ImportKind::Named,
                            Location::from_node(ctx.file_path, &child),
                        ));
                    }
                    "aliased_import" => {
                        let Some(name_node) = child.child_by_field_name("name") else {
                            continue;
                        };
                        let Some(alias_node) = child.child_by_field_name("alias") else {
                            continue;
                        };
                        defs.push(import_def(
                            node_text(&alias_node, source),
                            Some(node_text(&name_node, source)),
                            module,
                            ImportKind::Named,
                            Location::from_node(ctx.file_path, &child),
                        ));
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }
    defs
}

fn describe_receiver(file: &FilePath, object: &Node, source: &str) -> Receiver {
    match object.kind() {
        "identifier" => {
            let text = node_text(object, source);
            if text == "self" || text == "cls" {
                Receiver::SelfInstance
            } else {
                Receiver::Named(text.into())
            }
        }
        "call" => {
            let callee = object
                .child_by_field_name("function")
                .map(|f| match f.kind() {
                    "attribute" => f
                        .child_by_field_name("attribute")
                        .map(|a| node_text(&a, source).into())
                        .unwrap_or_else(|| node_text(&f, source).into()),
                    _ => node_text(&f, source).into(),
                })
                .unwrap_or_else(|| "".into());
            Receiver::Call { callee }
        }
        _ => Receiver::Expression {
            text: node_text(object, source).into(),
            location: Location::from_node(file, object),
        },
    }
}

fn is_binding_occurrence(node: &Node, source: &str) -> bool {
    let Some(parent) = node.parent() else {
        return true;
    };
    let parent_kind = parent.kind();

    if is_field(&parent, "name", node)
        && matches!(parent_kind, "function_definition" | "class_definition")
    {
        return true;
    }
    // Parameter bindings; default values remain references.
    if parent_kind == "parameters" || parent_kind == "lambda_parameters" {
        return true;
    }
    if matches!(
        parent_kind,
        "typed_parameter" | "list_splat_pattern" | "dictionary_splat_pattern"
    ) && ancestor_of_kind(node, "parameters").is_some()
    {
        return true;
    }
    if matches!(parent_kind, "default_parameter" | "typed_default_parameter")
        && is_field(&parent, "name", node)
    {
        return true;
    }
    // Import clauses bind names.
    if ancestor_of_kind(node, "import_statement").is_some()
        || ancestor_of_kind(node, "import_from_statement").is_some()
    {
        return true;
    }
    if parent_kind == "keyword_argument" && is_field(&parent, "name", node) {
        return true;
    }
    // `self` and `cls` are handled through receiver descriptors.
    let text = node_text(node, source);
    if text == "self" || text == "cls" {
        return true;
    }
    false
}

fn classify_reference(
    cap: &CaptureNode,
    source: &str,
    ctx: &ExtractionContext,
) -> Option<Reference> {
    let node = cap.node;
    if node.kind() != "identifier" {
        return None;
    }
    if is_binding_occurrence(&node, source) {
        return None;
    }

    let name = node_text(&node, source);
    let scope_id = ctx.scopes.innermost_containing(&cap.location);
    let parent = node.parent()?;

    // Call callee: `f(...)`. Constructor shorthand (`Foo()`) stays a
    // function call; the resolver redirects when the name is a class.
    if parent.kind() == "call" && is_field(&parent, "function", &node) {
        return Some(
            Reference::new(name, cap.location.clone(), scope_id, ReferenceKind::Call)
                .with_call(CallType::Function, None),
        );
    }

    // Attribute position: `obj.attr`.
    if parent.kind() == "attribute" && is_field(&parent, "attribute", &node) {
        let object = parent.child_by_field_name("object")?;
        let receiver = describe_receiver(&cap.location.file_path, &object, source);

        if let Some(grand) = parent.parent() {
            if grand.kind() == "call" && is_field(&grand, "function", &parent) {
                return Some(
                    Reference::new(name, cap.location.clone(), scope_id, ReferenceKind::Call)
                        .with_call(CallType::Method, Some(receiver)),
                );
            }
            // Assigned attribute (`self.x = ...`) is a definition, handled
            // by the assignment extraction.
            if grand.kind() == "assignment" && is_field(&grand, "left", &parent) {
                return None;
            }
        }
        return Some(
            Reference::new(
                name,
                cap.location.clone(),
                scope_id,
                ReferenceKind::MemberAccess,
            )
            .with_receiver(receiver),
        );
    }

    // Assignment target: `x = ...` (also a write on rebinding).
    if parent.kind() == "assignment" && is_field(&parent, "left", &node) {
        let assigned_type = parent
            .child_by_field_name("right")
            .and_then(|r| construction_type(&r, source));
        return Some(
            Reference::new(name, cap.location.clone(), scope_id, ReferenceKind::Write)
                .with_assigned_type(assigned_type),
        );
    }
    if matches!(parent.kind(), "pattern_list" | "tuple_pattern")
        && parent
            .parent()
            .is_some_and(|g| g.kind() == "assignment" && is_field(&g, "left", &parent))
    {
        return Some(Reference::new(
            name,
            cap.location.clone(),
            scope_id,
            ReferenceKind::Write,
        ));
    }
    if parent.kind() == "augmented_assignment" && is_field(&parent, "left", &node) {
        return Some(Reference::new(
            name,
            cap.location.clone(),
            scope_id,
            ReferenceKind::Write,
        ));
    }
    // Loop targets rebind on every iteration.
    if parent.kind() == "for_statement" && is_field(&parent, "left", &node) {
        return Some(Reference::new(
            name,
            cap.location.clone(),
            scope_id,
            ReferenceKind::Write,
        ));
    }

    Some(Reference::new(
        name,
        cap.location.clone(),
        scope_id,
        ReferenceKind::Read,
    ))
}

/// `__all__ = ["a", "b"]` at module scope, when present.
fn dunder_all(tree: &Tree, source: &str) -> Option<HashSet<String>> {
    let root = tree.root_node();
    for stmt in named_children(&root) {
        if stmt.kind() != "expression_statement" {
            continue;
        }
        for expr in named_children(&stmt) {
            if expr.kind() != "assignment" {
                continue;
            }
            let left = expr.child_by_field_name("left");
            let is_all = left.is_some_and(|l| node_text(&l, source) == "__all__");
            if !is_all {
                continue;
            }
            let Some(right) = expr.child_by_field_name("right") else {
                continue;
            };
            if !matches!(right.kind(), "list" | "tuple") {
                continue;
            }
            let mut names = HashSet::new();
            for item in named_children(&right) {
                if item.kind() == "string" {
                    names.insert(strip_quotes(node_text(&item, source)).to_string());
                }
            }
            return Some(names);
        }
    }
    None
}

fn finalize_callbacks(tree: &Tree, source: &str, index: &mut SemanticIndex) {
    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        if node.kind() == "call" {
            record_callback_arguments(&node, source, index);
        }
        stack.extend(named_children(&node));
    }
}

fn record_callback_arguments(call: &Node, source: &str, index: &mut SemanticIndex) {
    let Some(func) = call.child_by_field_name("function") else {
        return;
    };
    let Some(args) = call.child_by_field_name("arguments") else {
        return;
    };
    let callee: SymbolName = match func.kind() {
        "identifier" => node_text(&func, source).into(),
        "attribute" => match func.child_by_field_name("attribute") {
            Some(a) => node_text(&a, source).into(),
            None => return,
        },
        _ => return,
    };
    let callee_is_local = index
        .definitions
        .iter()
        .any(|d| d.name == callee && d.kind != DefinitionKind::Parameter);

    let mut cursor = args.walk();
    for (idx, arg) in args.named_children(&mut cursor).enumerate() {
        if arg.kind() != "identifier" {
            continue;
        }
        let arg_name = node_text(&arg, source);
        for def in index.definitions.iter_mut() {
            if def.kind == DefinitionKind::Function && def.name.as_ref() == arg_name {
                if let Some(callable) = def.as_callable_mut() {
                    callable.callback_context = Some(CallbackContext {
                        is_callback: true,
                        callee_name: Some(callee.clone()),
                        argument_index: Some(idx as u32),
                        receiver_is_external: !callee_is_local,
                    });
                }
            }
        }
    }
}

impl LanguageAdapter for PythonAdapter {
    fn language(&self) -> Language {
        Language::Python
    }

    fn parse(&mut self, source: &str, old_tree: Option<&Tree>) -> Option<Tree> {
        self.parser.parse(source, old_tree)
    }

    fn capture_query(&self) -> &Query {
        &self.query
    }

    fn scope_boundary(&self, cap: &CaptureNode, source: &str) -> Option<ScopeBoundary> {
        let node = cap.node;
        let file = &cap.location.file_path;
        match node.kind() {
            "function_definition" => {
                let name_node = node.child_by_field_name("name");
                Some(ScopeBoundary {
                    kind: ScopeKind::Function,
                    symbol_location: name_node.map(|n| Location::from_node(file, &n)),
                    scope_location: callable_scope_span(file, &node),
                    name: name_node.map(|n| node_text(&n, source).into()),
                })
            }
            "class_definition" => {
                let name_node = node.child_by_field_name("name");
                Some(ScopeBoundary {
                    kind: ScopeKind::Class,
                    symbol_location: name_node.map(|n| Location::from_node(file, &n)),
                    scope_location: node
                        .child_by_field_name("body")
                        .map(|b| Location::from_node(file, &b))
                        .unwrap_or_else(|| cap.location.clone()),
                    name: name_node.map(|n| node_text(&n, source).into()),
                })
            }
            "lambda" => Some(ScopeBoundary {
                kind: ScopeKind::Arrow,
                symbol_location: None,
                scope_location: cap.location.clone(),
                name: None,
            }),
            "list_comprehension" | "set_comprehension" | "dictionary_comprehension"
            | "generator_expression" => Some(ScopeBoundary {
                kind: ScopeKind::Comprehension,
                symbol_location: None,
                scope_location: cap.location.clone(),
                name: None,
            }),
            _ => None,
        }
    }

    fn extract_definitions(
        &self,
        cap: &CaptureNode,
        source: &str,
        ctx: &ExtractionContext,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Definition> {
        match cap.node.kind() {
            "function_definition" => extract_function(cap, source, ctx),
            "class_definition" => extract_class(cap, source, ctx),
            "assignment" => extract_assignment(cap, source, ctx),
            "for_statement" => extract_for_target(cap, source, ctx),
            "import_statement" | "import_from_statement" => {
                extract_import(cap, source, ctx, diagnostics)
            }
            other => {
                tracing::warn!("unhandled definition capture kind '{other}'");
                Vec::new()
            }
        }
    }

    fn classify_reference(
        &self,
        cap: &CaptureNode,
        source: &str,
        ctx: &ExtractionContext,
    ) -> Option<Reference> {
        classify_reference(cap, source, ctx)
    }

    fn finalize_index(
        &self,
        tree: &Tree,
        source: &str,
        index: &mut SemanticIndex,
        settings: &Settings,
    ) {
        // Python rebinds rather than declares: keep only the first variable
        // definition per (scope, name); later assignments are writes.
        let mut seen: HashSet<(crate::types::ScopeId, SymbolName)> = HashSet::new();
        index.definitions.retain(|d| {
            if d.kind != DefinitionKind::Variable {
                return true;
            }
            seen.insert((d.defining_scope_id.clone(), d.name.clone()))
        });

        finalize_callbacks(tree, source, index);

        // Implicit exports: module-scope definitions are importable.
        // A literal __all__ restricts the export table when configured.
        let all = if settings.python.respect_dunder_all {
            dunder_all(tree, source)
        } else {
            None
        };
        let root = index.root_scope_id.clone();
        for def in index.definitions.iter_mut() {
            if def.defining_scope_id != root {
                continue;
            }
            let exportable_kind = matches!(
                def.kind,
                DefinitionKind::Function
                    | DefinitionKind::Class
                    | DefinitionKind::Variable
                    | DefinitionKind::Import
            );
            if !exportable_kind {
                continue;
            }
            let exported = match &all {
                Some(names) => names.contains(def.name.as_ref()),
                None => !def.name.starts_with('_'),
            };
            if exported {
                def.is_exported = true;
                if def.export.is_none() {
                    def.export = Some(ExportInfo::default());
                }
            }
        }
    }

    fn detect_test_file(&self, path: &FilePath) -> bool {
        let name = path.file_name();
        name.starts_with("test_")
            || name.ends_with("_test.py")
            || path.as_str().contains("tests/")
    }

    fn resolve_import_path(
        &self,
        source_file: &FilePath,
        import_path: &str,
        files: &FileSet,
    ) -> Option<FilePath> {
        let base = module_base_path(source_file, import_path)?;
        if base.is_empty() {
            return None;
        }
        files.first_present(vec![format!("{base}.py"), format!("{base}/__init__.py")])
    }

    fn resolve_submodule_import_path(
        &self,
        source_file: &FilePath,
        package_path: &str,
        name: &str,
        files: &FileSet,
    ) -> Option<FilePath> {
        let base = module_base_path(source_file, package_path)?;
        let dir = if base.is_empty() {
            name.to_string()
        } else {
            format!("{base}/{name}")
        };
        files.first_present(vec![format!("{dir}.py"), format!("{dir}/__init__.py")])
    }

    fn self_keyword(&self) -> &'static str {
        "self"
    }
}

/// Map a Python module specifier to a path prefix. Relative specifiers
/// (`.a`, `..b.c`) resolve against the importing file's package; one dot is
/// the current package.
fn module_base_path(source_file: &FilePath, import_path: &str) -> Option<String> {
    let dots = import_path.chars().take_while(|&c| c == '.').count();
    let rest = &import_path[dots..];
    let rest_path = rest.replace('.', "/");

    if dots == 0 {
        return Some(rest_path);
    }

    let mut dir = source_file.parent().to_string();
    for _ in 1..dots {
        match dir.rfind('/') {
            Some(idx) => dir.truncate(idx),
            None => {
                if dir.is_empty() {
                    return None;
                }
                dir.clear();
            }
        }
    }
    if rest_path.is_empty() {
        Some(dir)
    } else {
        join_and_normalize(&dir, &rest_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexing::FileIndexer;
    use crate::symbol::ReferenceKind;
    use std::collections::BTreeSet;

    fn index_source_at(path: &str, source: &str) -> SemanticIndex {
        let mut adapter = PythonAdapter::new().unwrap();
        let tree = adapter.parse(source, None).unwrap();
        let file = FilePath::new(path);
        let settings = Settings::default();
        let (index, _diags) = FileIndexer::index(&adapter, &tree, &file, source, &settings);
        index
    }

    fn index_source(source: &str) -> SemanticIndex {
        index_source_at("test.py", source)
    }

    #[test]
    fn test_function_and_method_kinds() {
        let index = index_source(
            "def helper():\n    pass\n\nclass Runner:\n    def __init__(self):\n        self.count = 0\n    def run(self):\n        helper()\n",
        );
        assert_eq!(
            index.definition_by_name("helper").unwrap().kind,
            DefinitionKind::Function
        );
        assert_eq!(
            index.definition_by_name("__init__").unwrap().kind,
            DefinitionKind::Constructor
        );
        let run = index.definition_by_name("run").unwrap();
        assert_eq!(run.kind, DefinitionKind::Method);
        assert_eq!(
            run.as_callable().unwrap().enclosing_type.as_deref(),
            Some("Runner")
        );
        // `self.count = 0` declares an instance attribute.
        assert_eq!(
            index.definition_by_name("count").unwrap().kind,
            DefinitionKind::Property
        );
    }

    #[test]
    fn test_implicit_exports_skip_underscored() {
        let index = index_source("def public():\n    pass\n\ndef _private():\n    pass\n");
        assert!(index.definition_by_name("public").unwrap().is_exported);
        assert!(!index.definition_by_name("_private").unwrap().is_exported);
    }

    #[test]
    fn test_dunder_all_filters_exports() {
        let index = index_source(
            "__all__ = [\"a\"]\n\ndef a():\n    pass\n\ndef b():\n    pass\n",
        );
        assert!(index.definition_by_name("a").unwrap().is_exported);
        assert!(!index.definition_by_name("b").unwrap().is_exported);
    }

    #[test]
    fn test_method_call_and_self() {
        let index = index_source(
            "class A:\n    def run(self):\n        self.helper()\n    def helper(self):\n        pass\n",
        );
        let call = index
            .references
            .iter()
            .find(|r| r.kind == ReferenceKind::Call && r.name.as_ref() == "helper")
            .unwrap();
        assert_eq!(call.call_type, Some(CallType::Method));
        assert_eq!(call.receiver, Some(Receiver::SelfInstance));
    }

    #[test]
    fn test_from_import_named() {
        let index = index_source("from training import pipeline\n\npipeline.train()\n");
        let (_, details) = index.imports().next().unwrap();
        assert_eq!(details.local_name.as_ref(), "pipeline");
        assert_eq!(details.source_module_path.as_ref(), "training");
        assert_eq!(details.import_kind, ImportKind::Named);

        let call = index
            .references
            .iter()
            .find(|r| r.kind == ReferenceKind::Call)
            .unwrap();
        assert_eq!(call.name.as_ref(), "train");
        assert_eq!(call.receiver, Some(Receiver::Named("pipeline".into())));
    }

    #[test]
    fn test_module_base_path_relative() {
        let file = FilePath::new("pkg/sub/mod.py");
        assert_eq!(module_base_path(&file, "other").as_deref(), Some("other"));
        assert_eq!(
            module_base_path(&file, ".sibling").as_deref(),
            Some("pkg/sub/sibling")
        );
        assert_eq!(
            module_base_path(&file, "..top").as_deref(),
            Some("pkg/top")
        );
        assert_eq!(module_base_path(&file, ".").as_deref(), Some("pkg/sub"));
    }

    #[test]
    fn test_submodule_resolution() {
        let adapter = PythonAdapter::new().unwrap();
        let mut files = BTreeSet::new();
        files.insert(FilePath::new("training/__init__.py"));
        files.insert(FilePath::new("training/pipeline.py"));
        files.insert(FilePath::new("run.py"));
        let set = FileSet::new(&files);

        let resolved = adapter.resolve_submodule_import_path(
            &FilePath::new("run.py"),
            "training",
            "pipeline",
            &set,
        );
        assert_eq!(resolved, Some(FilePath::new("training/pipeline.py")));

        let package = adapter.resolve_import_path(&FilePath::new("run.py"), "training", &set);
        assert_eq!(package, Some(FilePath::new("training/__init__.py")));
    }

    #[test]
    fn test_first_assignment_is_definition_rest_are_writes() {
        let index = index_source("x = Foo()\nx.foo()\nx = Bar()\nx.bar()\n");
        let var_defs: Vec<_> = index
            .definitions
            .iter()
            .filter(|d| d.kind == DefinitionKind::Variable && d.name.as_ref() == "x")
            .collect();
        assert_eq!(var_defs.len(), 1);
        assert_eq!(
            var_defs[0].as_variable().unwrap().value_type.as_deref(),
            Some("Foo")
        );

        let writes: Vec<_> = index
            .references
            .iter()
            .filter(|r| r.kind == ReferenceKind::Write && r.name.as_ref() == "x")
            .collect();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[1].assigned_type.as_deref(), Some("Bar"));
    }

    #[test]
    fn test_class_multiple_inheritance_order() {
        let index = index_source("class C(A, B):\n    pass\n");
        let c = index.definition_by_name("C").unwrap();
        assert_eq!(
            c.as_type().unwrap().inherits,
            vec![Box::<str>::from("A"), Box::<str>::from("B")]
        );
    }

    #[test]
    fn test_detect_test_file() {
        let adapter = PythonAdapter::new().unwrap();
        assert!(adapter.detect_test_file(&FilePath::new("test_app.py")));
        assert!(adapter.detect_test_file(&FilePath::new("pkg/app_test.py")));
        assert!(adapter.detect_test_file(&FilePath::new("tests/helpers.py")));
        assert!(!adapter.detect_test_file(&FilePath::new("pkg/app.py")));
    }
}
