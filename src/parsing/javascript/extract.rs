//! ECMAScript extraction shared by the JavaScript and TypeScript adapters.
//!
//! The TypeScript grammar is a superset of the JavaScript one, so a single
//! set of extraction routines serves both; TypeScript-only node kinds
//! simply never match when the JavaScript grammar produced the tree.
//!
//! All structural decisions here compare node kinds and spans, never node
//! identity, so behavior is stable across reparses.

use crate::error::Diagnostic;
use crate::indexing::SemanticIndex;
use crate::parsing::adapter::{
    ExportSpec, ExtractionContext, FileSet, ScopeBoundary, base_type_name, join_and_normalize,
    node_text, same_node,
};
use crate::parsing::query::CaptureNode;
use crate::symbol::{
    AccessModifier, CallType, CallableDetails, CallbackContext, Definition, DefinitionDetails,
    ExportInfo, ImportDetails, ImportKind, Parameter, Receiver, Reference, ReferenceKind,
    TypeDetails, VariableDetails,
};
use crate::types::{DefinitionKind, FilePath, Location, ScopeKind, SymbolName};
use tree_sitter::Node;

pub(crate) fn is_field(parent: &Node, field: &str, node: &Node) -> bool {
    parent
        .child_by_field_name(field)
        .is_some_and(|c| same_node(&c, node))
}

pub(crate) fn strip_quotes(s: &str) -> &str {
    s.trim_matches(|c| c == '"' || c == '\'' || c == '`')
}

fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn span_between(file: &FilePath, start: tree_sitter::Point, end: tree_sitter::Point) -> Location {
    Location::new(
        file.clone(),
        start.row as u32 + 1,
        start.column as u32 + 1,
        end.row as u32 + 1,
        end.column as u32 + 1,
    )
}

/// The scope a callable creates: parameters through body end, so parameter
/// bindings live inside it while the name stays in the parent scope.
pub(crate) fn callable_scope_span(file: &FilePath, node: &Node) -> Location {
    let start = node
        .child_by_field_name("parameters")
        .or_else(|| node.child_by_field_name("parameter"))
        .or_else(|| node.child_by_field_name("body"))
        .map(|n| n.start_position())
        .unwrap_or_else(|| node.start_position());
    span_between(file, start, node.end_position())
}

const CALLABLE_KINDS: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "function_expression",
    "method_definition",
];

const CLASS_LIKE_KINDS: &[&str] = &[
    "class_declaration",
    "abstract_class_declaration",
    "interface_declaration",
    "enum_declaration",
];

pub(crate) fn scope_boundary(cap: &CaptureNode, source: &str) -> Option<ScopeBoundary> {
    let node = cap.node;
    let file = &cap.location.file_path;
    let kind = node.kind();

    if CALLABLE_KINDS.contains(&kind) {
        let name_node = node.child_by_field_name("name");
        return Some(ScopeBoundary {
            kind: ScopeKind::Function,
            symbol_location: name_node.map(|n| Location::from_node(file, &n)),
            scope_location: callable_scope_span(file, &node),
            name: name_node.map(|n| node_text(&n, source).into()),
        });
    }
    if kind == "arrow_function" {
        return Some(ScopeBoundary {
            kind: ScopeKind::Arrow,
            symbol_location: None,
            scope_location: cap.location.clone(),
            name: None,
        });
    }
    if CLASS_LIKE_KINDS.contains(&kind) {
        let name_node = node.child_by_field_name("name");
        let body = node.child_by_field_name("body");
        return Some(ScopeBoundary {
            kind: ScopeKind::Class,
            symbol_location: name_node.map(|n| Location::from_node(file, &n)),
            scope_location: body
                .map(|b| Location::from_node(file, &b))
                .unwrap_or_else(|| cap.location.clone()),
            name: name_node.map(|n| node_text(&n, source).into()),
        });
    }
    match kind {
        "statement_block" => Some(ScopeBoundary {
            kind: ScopeKind::Block,
            symbol_location: None,
            scope_location: cap.location.clone(),
            name: None,
        }),
        "for_statement" | "for_in_statement" => Some(ScopeBoundary {
            kind: ScopeKind::Loop,
            symbol_location: None,
            scope_location: cap.location.clone(),
            name: None,
        }),
        _ => None,
    }
}

/// Whether this node sits directly under an `export` statement, and whether
/// that export is a default export.
fn export_wrapper(node: &Node) -> (bool, bool) {
    let Some(parent) = node.parent() else {
        return (false, false);
    };
    if parent.kind() != "export_statement" {
        return (false, false);
    }
    let mut cursor = parent.walk();
    let is_default = parent
        .children(&mut cursor)
        .any(|c| c.kind() == "default");
    (true, is_default)
}

/// Parameters of a callable node: the records for the signature plus the
/// bound-name locations used to emit parameter definitions.
fn extract_parameters(
    file: &FilePath,
    node: &Node,
    source: &str,
) -> (Vec<Parameter>, Vec<(SymbolName, Location)>) {
    let mut params = Vec::new();
    let mut bindings = Vec::new();

    // Arrow functions may use a single bare identifier parameter.
    if let Some(single) = node.child_by_field_name("parameter") {
        if single.kind() == "identifier" {
            let name = node_text(&single, source);
            params.push(Parameter::new(name));
            bindings.push((name.into(), Location::from_node(file, &single)));
        }
        return (params, bindings);
    }

    let Some(list) = node.child_by_field_name("parameters") else {
        return (params, bindings);
    };

    for child in named_children(&list) {
        collect_parameter(file, &child, source, false, &mut params, &mut bindings);
    }
    (params, bindings)
}

fn collect_parameter(
    file: &FilePath,
    node: &Node,
    source: &str,
    optional: bool,
    params: &mut Vec<Parameter>,
    bindings: &mut Vec<(SymbolName, Location)>,
) {
    match node.kind() {
        "identifier" => {
            let name = node_text(node, source);
            params.push(Parameter::new(name));
            bindings.push((name.into(), Location::from_node(file, node)));
        }
        "assignment_pattern" => {
            let left = node.child_by_field_name("left");
            let right = node.child_by_field_name("right");
            if let Some(left) = left {
                if left.kind() == "identifier" {
                    let name = node_text(&left, source);
                    let mut p = Parameter::new(name);
                    p.default_value = right.map(|r| node_text(&r, source).into());
                    p.is_optional = true;
                    params.push(p);
                    bindings.push((name.into(), Location::from_node(file, &left)));
                } else {
                    collect_parameter(file, &left, source, true, params, bindings);
                }
            }
        }
        "rest_pattern" => {
            for inner in named_children(node) {
                if inner.kind() == "identifier" {
                    let name = node_text(&inner, source);
                    let mut p = Parameter::new(name);
                    p.is_rest = true;
                    params.push(p);
                    bindings.push((name.into(), Location::from_node(file, &inner)));
                }
            }
        }
        // TypeScript parameter wrappers.
        "required_parameter" | "optional_parameter" => {
            let annotation = node
                .child_by_field_name("type")
                .map(|t| clean_annotation(node_text(&t, source)));
            let default = node
                .child_by_field_name("value")
                .map(|v| Box::<str>::from(node_text(&v, source)));
            if let Some(pattern) = node.child_by_field_name("pattern") {
                if pattern.kind() == "identifier" || pattern.kind() == "this" {
                    let name = node_text(&pattern, source);
                    if name == "this" {
                        return;
                    }
                    let mut p = Parameter::new(name);
                    p.type_annotation = annotation;
                    p.default_value = default;
                    p.is_optional = optional || node.kind() == "optional_parameter";
                    params.push(p);
                    bindings.push((name.into(), Location::from_node(file, &pattern)));
                } else {
                    collect_parameter(file, &pattern, source, optional, params, bindings);
                }
            }
        }
        "object_pattern" | "array_pattern" => {
            collect_pattern_bindings(file, node, source, params, bindings);
        }
        _ => {}
    }
}

fn collect_pattern_bindings(
    file: &FilePath,
    node: &Node,
    source: &str,
    params: &mut Vec<Parameter>,
    bindings: &mut Vec<(SymbolName, Location)>,
) {
    for child in named_children(node) {
        match child.kind() {
            "identifier" | "shorthand_property_identifier_pattern" => {
                let name = node_text(&child, source);
                params.push(Parameter::new(name));
                bindings.push((name.into(), Location::from_node(file, &child)));
            }
            "pair_pattern" => {
                if let Some(value) = child.child_by_field_name("value") {
                    if value.kind() == "identifier" {
                        let name = node_text(&value, source);
                        params.push(Parameter::new(name));
                        bindings.push((name.into(), Location::from_node(file, &value)));
                    } else {
                        collect_pattern_bindings(file, &value, source, params, bindings);
                    }
                }
            }
            "object_pattern" | "array_pattern" | "rest_pattern" | "assignment_pattern" => {
                collect_pattern_bindings(file, &child, source, params, bindings);
            }
            _ => {}
        }
    }
}

fn clean_annotation(text: &str) -> Box<str> {
    text.trim().trim_start_matches(':').trim().into()
}

fn return_type_of(node: &Node, source: &str) -> Option<Box<str>> {
    node.child_by_field_name("return_type")
        .map(|t| clean_annotation(node_text(&t, source)))
}

/// Name of the class-like declaration enclosing `node`, if any.
fn enclosing_class_name(node: &Node, source: &str) -> Option<SymbolName> {
    let mut current = node.parent();
    while let Some(n) = current {
        if CLASS_LIKE_KINDS.contains(&n.kind()) || n.kind() == "class" {
            return n
                .child_by_field_name("name")
                .map(|name| node_text(&name, source).into());
        }
        current = n.parent();
    }
    None
}

/// Emit parameter definitions into the scope the callable created.
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

pub(crate) fn extract_definitions(
    cap: &CaptureNode,
    source: &str,
    ctx: &ExtractionContext,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Definition> {
    let node = cap.node;
    match node.kind() {
        "function_declaration" | "generator_function_declaration" => {
            extract_function(cap, source, ctx)
        }
        "method_definition" => extract_method(cap, source, ctx),
        "class_declaration" | "abstract_class_declaration" => extract_class(cap, source, ctx),
        "interface_declaration" => extract_interface(cap, source, ctx),
        "type_alias_declaration" => extract_named(cap, source, ctx, DefinitionKind::TypeAlias),
        "enum_declaration" => extract_enum(cap, source, ctx),
        "public_field_definition" | "property_signature" => {
            extract_property(cap, source, ctx)
        }
        "method_signature" | "abstract_method_signature" => extract_method(cap, source, ctx),
        "variable_declarator" => extract_variable(cap, source, ctx),
        "import_statement" => extract_import(cap, source, ctx, diagnostics),
        other => {
            tracing::warn!("unhandled definition capture kind '{other}'");
            Vec::new()
        }
    }
}

fn extract_function(cap: &CaptureNode, source: &str, ctx: &ExtractionContext) -> Vec<Definition> {
    let node = cap.node;
    let (exported, is_default) = export_wrapper(&node);
    let name_node = node.child_by_field_name("name");
    let name = name_node
        .map(|n| node_text(&n, source).to_string())
        .unwrap_or_else(|| "default".to_string());

    let anchor = name_node
        .map(|n| Location::from_node(ctx.file_path, &n))
        .unwrap_or_else(|| cap.location.clone());
    let scope_id = ctx.scopes.innermost_containing(&anchor);

    let (parameters, bindings) = extract_parameters(ctx.file_path, &node, source);
    let mut def = Definition::new(DefinitionKind::Function, &name, cap.location.clone(), scope_id)
        .with_details(DefinitionDetails::Callable(CallableDetails {
            parameters,
            return_type: return_type_of(&node, source),
            ..CallableDetails::default()
        }));
    if exported {
        def = def.exported(ExportInfo {
            export_name: None,
            is_default,
            is_reexport: false,
        });
    }

    let mut defs = vec![def];
    defs.extend(parameter_definitions(ctx, &node, &bindings));
    defs
}

fn extract_method(cap: &CaptureNode, source: &str, ctx: &ExtractionContext) -> Vec<Definition> {
    let node = cap.node;
    let Some(name_node) = node.child_by_field_name("name") else {
        return Vec::new();
    };
    let name = node_text(&name_node, source);
    let kind = if name == "constructor" {
        DefinitionKind::Constructor
    } else {
        DefinitionKind::Method
    };

    let mut is_static = false;
    let mut access = None;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "static" => is_static = true,
            "accessibility_modifier" => {
                access = match node_text(&child, source) {
                    "private" => Some(AccessModifier::Private),
                    "protected" => Some(AccessModifier::Protected),
                    _ => Some(AccessModifier::Public),
                }
            }
            _ => {}
        }
    }

    let anchor = Location::from_node(ctx.file_path, &name_node);
    let scope_id = ctx.scopes.innermost_containing(&anchor);
    let (parameters, bindings) = extract_parameters(ctx.file_path, &node, source);

    let def = Definition::new(kind, name, cap.location.clone(), scope_id).with_details(
        DefinitionDetails::Callable(CallableDetails {
            parameters,
            return_type: return_type_of(&node, source),
            access,
            is_static,
            enclosing_type: enclosing_class_name(&node, source),
            callback_context: None,
        }),
    );

    let mut defs = vec![def];
    defs.extend(parameter_definitions(ctx, &node, &bindings));
    defs
}

/// Heritage of a class: `extends` expressions and `implements` types.
fn class_heritage(node: &Node, source: &str) -> TypeDetails {
    let mut details = TypeDetails::default();
    for child in named_children(node) {
        if child.kind() != "class_heritage" {
            continue;
        }
        for clause in named_children(&child) {
            match clause.kind() {
                "extends_clause" => {
                    for value in named_children(&clause) {
                        if matches!(value.kind(), "identifier" | "member_expression" | "type_identifier") {
                            details.inherits.push(base_type_name(node_text(&value, source)));
                        }
                    }
                }
                "implements_clause" => {
                    for value in named_children(&clause) {
                        details
                            .implements
                            .push(base_type_name(node_text(&value, source)));
                    }
                }
                // Plain JavaScript: `class A extends B` puts the expression
                // directly under class_heritage.
                "identifier" | "member_expression" => {
                    details.inherits.push(base_type_name(node_text(&clause, source)));
                }
                _ => {}
            }
        }
    }
    details
}

fn extract_class(cap: &CaptureNode, source: &str, ctx: &ExtractionContext) -> Vec<Definition> {
    let node = cap.node;
    let (exported, is_default) = export_wrapper(&node);
    let Some(name_node) = node.child_by_field_name("name") else {
        return Vec::new();
    };
    let name = node_text(&name_node, source);
    let anchor = Location::from_node(ctx.file_path, &name_node);
    let scope_id = ctx.scopes.innermost_containing(&anchor);

    let mut def = Definition::new(DefinitionKind::Class, name, cap.location.clone(), scope_id)
        .with_details(DefinitionDetails::Type(class_heritage(&node, source)));
    if exported {
        def = def.exported(ExportInfo {
            export_name: None,
            is_default,
            is_reexport: false,
        });
    }
    vec![def]
}

fn extract_interface(cap: &CaptureNode, source: &str, ctx: &ExtractionContext) -> Vec<Definition> {
    let node = cap.node;
    let (exported, is_default) = export_wrapper(&node);
    let Some(name_node) = node.child_by_field_name("name") else {
        return Vec::new();
    };
    let name = node_text(&name_node, source);
    let anchor = Location::from_node(ctx.file_path, &name_node);
    let scope_id = ctx.scopes.innermost_containing(&anchor);

    // Interface extension clause: collect extended type names defensively
    // across grammar variants.
    let mut details = TypeDetails::default();
    for child in named_children(&node) {
        if child.kind().contains("extends") {
            collect_type_identifiers(&child, source, &mut details.inherits);
        }
    }

    let mut def = Definition::new(DefinitionKind::Interface, name, cap.location.clone(), scope_id)
        .with_details(DefinitionDetails::Type(details));
    if exported {
        def = def.exported(ExportInfo {
            export_name: None,
            is_default,
            is_reexport: false,
        });
    }
    vec![def]
}

fn collect_type_identifiers(node: &Node, source: &str, out: &mut Vec<SymbolName>) {
    if node.kind() == "type_identifier" || node.kind() == "identifier" {
        out.push(node_text(node, source).into());
        return;
    }
    for child in named_children(node) {
        collect_type_identifiers(&child, source, out);
    }
}

fn extract_named(
    cap: &CaptureNode,
    source: &str,
    ctx: &ExtractionContext,
    kind: DefinitionKind,
) -> Vec<Definition> {
    let node = cap.node;
    let (exported, is_default) = export_wrapper(&node);
    let Some(name_node) = node.child_by_field_name("name") else {
        return Vec::new();
    };
    let name = node_text(&name_node, source);
    let anchor = Location::from_node(ctx.file_path, &name_node);
    let scope_id = ctx.scopes.innermost_containing(&anchor);
    let mut def = Definition::new(kind, name, cap.location.clone(), scope_id);
    if exported {
        def = def.exported(ExportInfo {
            export_name: None,
            is_default,
            is_reexport: false,
        });
    }
    vec![def]
}

fn extract_enum(cap: &CaptureNode, source: &str, ctx: &ExtractionContext) -> Vec<Definition> {
    let node = cap.node;
    let mut defs = extract_named(cap, source, ctx, DefinitionKind::Enum);
    if defs.is_empty() {
        return defs;
    }

    if let Some(body) = node.child_by_field_name("body") {
        for member in named_children(&body) {
            let name_node = match member.kind() {
                "enum_assignment" => member.child_by_field_name("name"),
                "property_identifier" => Some(member),
                _ => None,
            };
            if let Some(name_node) = name_node {
                let loc = Location::from_node(ctx.file_path, &name_node);
                let scope_id = ctx.scopes.innermost_containing(&loc);
                defs.push(Definition::new(
                    DefinitionKind::Property,
                    node_text(&name_node, source),
                    loc,
                    scope_id,
                ));
            }
        }
    }
    defs
}

fn extract_property(cap: &CaptureNode, source: &str, ctx: &ExtractionContext) -> Vec<Definition> {
    let node = cap.node;
    let Some(name_node) = node.child_by_field_name("name") else {
        return Vec::new();
    };
    let name = node_text(&name_node, source);
    let anchor = Location::from_node(ctx.file_path, &name_node);
    let scope_id = ctx.scopes.innermost_containing(&anchor);

    let mut details = VariableDetails {
        type_annotation: node
            .child_by_field_name("type")
            .map(|t| clean_annotation(node_text(&t, source))),
        ..VariableDetails::default()
    };
    if let Some(value) = node.child_by_field_name("value") {
        if value.kind() == "new_expression" {
            details.value_type = value
                .child_by_field_name("constructor")
                .map(|c| base_type_name(node_text(&c, source)));
        }
    }

    vec![
        Definition::new(DefinitionKind::Property, name, cap.location.clone(), scope_id)
            .with_details(DefinitionDetails::Variable(details)),
    ]
}

/// Callable members of an object literal, for collection dispatch.
fn collection_members(object: &Node, source: &str) -> Vec<SymbolName> {
    let mut members = Vec::new();
    for child in named_children(object) {
        match child.kind() {
            "pair" => {
                let value_is_callable = child
                    .child_by_field_name("value")
                    .is_some_and(|v| matches!(v.kind(), "arrow_function" | "function_expression"));
                if value_is_callable {
                    if let Some(key) = child.child_by_field_name("key") {
                        members.push(strip_quotes(node_text(&key, source)).into());
                    }
                }
            }
            "method_definition" => {
                if let Some(name) = child.child_by_field_name("name") {
                    members.push(node_text(&name, source).into());
                }
            }
            _ => {}
        }
    }
    members
}

fn extract_variable(cap: &CaptureNode, source: &str, ctx: &ExtractionContext) -> Vec<Definition> {
    let node = cap.node;
    let Some(name_node) = node.child_by_field_name("name") else {
        return Vec::new();
    };
    // A declarator's statement (`const x = ...`) may itself sit under an
    // export statement.
    let (exported, is_default) = node
        .parent()
        .and_then(|decl| decl.parent())
        .filter(|gp| gp.kind() == "export_statement")
        .map(|gp| (true, has_default_child(&gp)))
        .unwrap_or((false, false));

    // Destructuring binds several names; none carry value typing.
    if matches!(name_node.kind(), "object_pattern" | "array_pattern") {
        let mut params = Vec::new();
        let mut bindings = Vec::new();
        collect_pattern_bindings(ctx.file_path, &name_node, source, &mut params, &mut bindings);
        return bindings
            .into_iter()
            .map(|(name, loc)| {
                let scope_id = ctx.scopes.innermost_containing(&loc);
                Definition::new(DefinitionKind::Variable, &name, loc, scope_id)
            })
            .collect();
    }

    let name = node_text(&name_node, source);
    let anchor = Location::from_node(ctx.file_path, &name_node);
    let scope_id = ctx.scopes.innermost_containing(&anchor);
    let value = node.child_by_field_name("value");

    // One symbol per callable: a function-valued binding is a function
    // definition, not a variable plus a function.
    if let Some(value) = value {
        if matches!(value.kind(), "arrow_function" | "function_expression") {
            let (parameters, bindings) = extract_parameters(ctx.file_path, &value, source);
            let mut def =
                Definition::new(DefinitionKind::Function, name, cap.location.clone(), scope_id)
                    .with_details(DefinitionDetails::Callable(CallableDetails {
                        parameters,
                        return_type: return_type_of(&value, source),
                        ..CallableDetails::default()
                    }));
            if exported {
                def = def.exported(ExportInfo {
                    export_name: None,
                    is_default,
                    is_reexport: false,
                });
            }
            let mut defs = vec![def];
            defs.extend(parameter_definitions(ctx, &value, &bindings));
            return defs;
        }
    }

    let mut details = VariableDetails {
        type_annotation: node
            .child_by_field_name("type")
            .map(|t| clean_annotation(node_text(&t, source))),
        ..VariableDetails::default()
    };
    if let Some(value) = value {
        match value.kind() {
            "new_expression" => {
                details.value_type = value
                    .child_by_field_name("constructor")
                    .map(|c| base_type_name(node_text(&c, source)));
            }
            "object" => {
                details.collection_members = collection_members(&value, source);
            }
            _ => {}
        }
    }

    let mut def = Definition::new(DefinitionKind::Variable, name, cap.location.clone(), scope_id)
        .with_details(DefinitionDetails::Variable(details));
    if exported {
        def = def.exported(ExportInfo {
            export_name: None,
            is_default,
            is_reexport: false,
        });
    }
    vec![def]
}

fn has_default_child(node: &Node) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|c| c.kind() == "default")
}

fn extract_import(
    cap: &CaptureNode,
    source: &str,
    ctx: &ExtractionContext,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Definition> {
    let node = cap.node;
    let Some(source_node) = node.child_by_field_name("source") else {
        diagnostics.push(Diagnostic::CaptureMalformed {
            category: "import".to_string(),
            location: cap.location.clone(),
            reason: "import statement without source".to_string(),
        });
        return Vec::new();
    };
    let module_path = strip_quotes(node_text(&source_node, source));
    let root = ctx.scopes.root_id.clone();
    let mut defs = Vec::new();

    let import_def = |local: &str,
                      original: Option<&str>,
                      kind: ImportKind,
                      loc: Location,
                      root: &crate::types::ScopeId| {
        Definition::new(DefinitionKind::Import, local, loc, root.clone()).with_details(
            DefinitionDetails::Import(ImportDetails {
                local_name: local.into(),
                original_name: original.map(Into::into),
                source_module_path: module_path.into(),
                import_kind: kind,
            }),
        )
    };

    let clause = named_children(&node)
        .into_iter()
        .find(|c| c.kind() == "import_clause");
    let Some(clause) = clause else {
        // Side-effect import: the module specifier is the referable name.
        defs.push(import_def(
            module_path,
            None,
            ImportKind::SideEffect,
            cap.location.clone(),
            &root,
        ));
        return defs;
    };

    for child in named_children(&clause) {
        match child.kind() {
            "identifier" => {
                defs.push(import_def(
                    node_text(&child, source),
                    Some("default"),
                    ImportKind::Default,
                    Location::from_node(ctx.file_path, &child),
                    &root,
                ));
            }
            "namespace_import" => {
                for inner in named_children(&child) {
                    if inner.kind() == "identifier" {
                        defs.push(import_def(
                            node_text(&inner, source),
                            None,
                            ImportKind::Namespace,
                            Location::from_node(ctx.file_path, &inner),
                            &root,
                        ));
                    }
                }
            }
            "named_imports" => {
                for spec in named_children(&child) {
                    if spec.kind() != "import_specifier" {
                        continue;
                    }
                    let Some(name_node) = spec.child_by_field_name("name") else {
                        continue;
                    };
                    let original = node_text(&name_node, source);
                    let alias = spec
                        .child_by_field_name("alias")
                        .map(|a| node_text(&a, source));
                    let local = alias.unwrap_or(original);
                    defs.push(import_def(
                        local,
                        (local != original).then_some(original),
                        ImportKind::Named,
                        Location::from_node(ctx.file_path, &spec),
                        &root,
                    ));
                }
            }
            _ => {}
        }
    }
    defs
}

pub(crate) fn extract_exports(
    cap: &CaptureNode,
    source: &str,
    _ctx: &ExtractionContext,
) -> Vec<ExportSpec> {
    let node = cap.node;
    // Declarations carry their export flag at extraction time.
    if node.child_by_field_name("declaration").is_some() {
        return Vec::new();
    }

    let module_path = node
        .child_by_field_name("source")
        .map(|s| strip_quotes(node_text(&s, source)).to_string());
    let mut specs = Vec::new();

    // `export default <identifier>`
    if let Some(value) = node.child_by_field_name("value") {
        if value.kind() == "identifier" {
            specs.push(ExportSpec::Named {
                local_name: node_text(&value, source).into(),
                info: ExportInfo {
                    export_name: None,
                    is_default: true,
                    is_reexport: false,
                },
                location: cap.location.clone(),
            });
        }
        return specs;
    }

    for clause in named_children(&node) {
        if clause.kind() != "export_clause" {
            continue;
        }
        for spec in named_children(&clause) {
            if spec.kind() != "export_specifier" {
                continue;
            }
            let Some(name_node) = spec.child_by_field_name("name") else {
                continue;
            };
            let name = node_text(&name_node, source);
            let alias = spec
                .child_by_field_name("alias")
                .map(|a| node_text(&a, source));
            let location = Location::from_node(&cap.location.file_path, &spec);

            match &module_path {
                Some(module) => {
                    // `export { X as Y } from "./m"`: a forwarding import
                    // under the exported name.
                    let exported_as = alias.unwrap_or(name);
                    specs.push(ExportSpec::Reexport {
                        import: ImportDetails {
                            local_name: exported_as.into(),
                            original_name: (exported_as != name).then(|| name.into()),
                            source_module_path: module.as_str().into(),
                            import_kind: ImportKind::Named,
                        },
                        info: ExportInfo {
                            export_name: None,
                            is_default: false,
                            is_reexport: true,
                        },
                        location,
                    });
                }
                None => {
                    specs.push(ExportSpec::Named {
                        local_name: name.into(),
                        info: ExportInfo {
                            export_name: alias.map(Into::into),
                            is_default: false,
                            is_reexport: false,
                        },
                        location,
                    });
                }
            }
        }
    }
    specs
}

/// Symbolic receiver descriptor for a call or member access.
fn describe_receiver(file: &FilePath, object: &Node, source: &str) -> Receiver {
    match object.kind() {
        "identifier" => Receiver::Named(node_text(object, source).into()),
        "this" => Receiver::SelfInstance,
        "new_expression" => object
            .child_by_field_name("constructor")
            .map(|c| Receiver::Constructed(base_type_name(node_text(&c, source))))
            .unwrap_or_else(|| Receiver::Expression {
                text: node_text(object, source).into(),
                location: Location::from_node(file, object),
            }),
        "call_expression" => {
            let callee = object
                .child_by_field_name("function")
                .map(|f| match f.kind() {
                    "member_expression" => f
                        .child_by_field_name("property")
                        .map(|p| node_text(&p, source).into())
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

/// Whether this identifier is a binding occurrence (definition or import
/// name) rather than a reference.
fn is_binding_occurrence(node: &Node) -> bool {
    let Some(parent) = node.parent() else {
        return true;
    };
    let parent_kind = parent.kind();

    // Declaration name positions.
    if is_field(&parent, "name", node)
        && matches!(
            parent_kind,
            "function_declaration"
                | "generator_function_declaration"
                | "function_expression"
                | "class_declaration"
                | "abstract_class_declaration"
                | "class"
                | "method_definition"
                | "variable_declarator"
                | "interface_declaration"
                | "type_alias_declaration"
                | "enum_declaration"
                | "public_field_definition"
                | "property_signature"
                | "method_signature"
                | "abstract_method_signature"
        )
    {
        return true;
    }

    // Import and export clauses bind or rename, never reference.
    if matches!(
        parent_kind,
        "import_specifier" | "namespace_import" | "import_clause" | "export_specifier"
    ) {
        return true;
    }
    if crate::parsing::adapter::ancestor_of_kind(node, "import_statement").is_some() {
        return true;
    }

    // Parameter bindings (but not default-value expressions).
    if parent_kind == "formal_parameters" {
        return true;
    }
    if matches!(parent_kind, "required_parameter" | "optional_parameter")
        && is_field(&parent, "pattern", node)
    {
        return true;
    }
    if parent_kind == "arrow_function" && is_field(&parent, "parameter", node) {
        return true;
    }
    if parent_kind == "assignment_pattern" && is_field(&parent, "left", node) {
        // Parameter or destructuring default: binding either way.
        return true;
    }
    if parent_kind == "rest_pattern" || parent_kind == "array_pattern" {
        return crate::parsing::adapter::ancestor_of_kind(node, "variable_declarator").is_some()
            || crate::parsing::adapter::ancestor_of_kind(node, "formal_parameters").is_some();
    }
    if parent_kind == "pair_pattern" && is_field(&parent, "value", node) {
        return true;
    }
    // Object literal keys are names, not references.
    if parent_kind == "pair" && is_field(&parent, "key", node) {
        return true;
    }

    false
}

pub(crate) fn classify_reference(
    cap: &CaptureNode,
    source: &str,
    ctx: &ExtractionContext,
) -> Option<Reference> {
    let node = cap.node;
    match node.kind() {
        "identifier" => classify_identifier(cap, source, ctx, &node),
        "property_identifier" => classify_property(cap, source, ctx, &node),
        "type_identifier" => classify_type_identifier(cap, ctx, &node),
        _ => None,
    }
}

fn classify_identifier(
    cap: &CaptureNode,
    source: &str,
    ctx: &ExtractionContext,
    node: &Node,
) -> Option<Reference> {
    if is_binding_occurrence(node) {
        return None;
    }
    let name = node_text(node, source);
    let scope_id = ctx.scopes.innermost_containing(&cap.location);
    let parent = node.parent()?;

    // Call callee: `f(...)`.
    if parent.kind() == "call_expression" && is_field(&parent, "function", node) {
        return Some(
            Reference::new(name, cap.location.clone(), scope_id, ReferenceKind::Call)
                .with_call(CallType::Function, None),
        );
    }

    // Constructor callee: `new T(...)`.
    if parent.kind() == "new_expression" && is_field(&parent, "constructor", node) {
        return Some(
            Reference::new(name, cap.location.clone(), scope_id, ReferenceKind::Call)
                .with_call(CallType::Constructor, None),
        );
    }

    // Dynamic collection dispatch: `handlers[key](...)`.
    if parent.kind() == "subscript_expression" && is_field(&parent, "object", node) {
        if let Some(grand) = parent.parent() {
            if grand.kind() == "call_expression" && is_field(&grand, "function", &parent) {
                return Some(
                    Reference::new(name, cap.location.clone(), scope_id, ReferenceKind::Call)
                        .with_call(CallType::Method, Some(Receiver::Named(name.into()))),
                );
            }
        }
    }

    // Assignment target: `x = ...`.
    if matches!(
        parent.kind(),
        "assignment_expression" | "augmented_assignment_expression"
    ) && is_field(&parent, "left", node)
    {
        let assigned_type = parent.child_by_field_name("right").and_then(|right| {
            (right.kind() == "new_expression")
                .then(|| {
                    right
                        .child_by_field_name("constructor")
                        .map(|c| base_type_name(node_text(&c, source)))
                })
                .flatten()
        });
        return Some(
            Reference::new(name, cap.location.clone(), scope_id, ReferenceKind::Write)
                .with_assigned_type(assigned_type),
        );
    }

    Some(Reference::new(
        name,
        cap.location.clone(),
        scope_id,
        ReferenceKind::Read,
    ))
}

fn classify_property(
    cap: &CaptureNode,
    source: &str,
    ctx: &ExtractionContext,
    node: &Node,
) -> Option<Reference> {
    let parent = node.parent()?;
    let name = node_text(node, source);

    // Method or constructor name of a member callee: `recv.m(...)`,
    // `new ns.T(...)`.
    if parent.kind() == "member_expression" && is_field(&parent, "property", node) {
        let object = parent.child_by_field_name("object")?;
        let receiver = describe_receiver(&cap.location.file_path, &object, source);
        let scope_id = ctx.scopes.innermost_containing(&cap.location);

        if let Some(grand) = parent.parent() {
            if grand.kind() == "call_expression" && is_field(&grand, "function", &parent) {
                return Some(
                    Reference::new(name, cap.location.clone(), scope_id, ReferenceKind::Call)
                        .with_call(CallType::Method, Some(receiver)),
                );
            }
            if grand.kind() == "new_expression" && is_field(&grand, "constructor", &parent) {
                return Some(
                    Reference::new(name, cap.location.clone(), scope_id, ReferenceKind::Call)
                        .with_call(CallType::Constructor, Some(receiver)),
                );
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

    None
}

fn classify_type_identifier(
    cap: &CaptureNode,
    ctx: &ExtractionContext,
    node: &Node,
) -> Option<Reference> {
    let parent = node.parent()?;
    // Declaration names are bindings.
    if is_field(&parent, "name", node) {
        return None;
    }
    let scope_id = ctx.scopes.innermost_containing(&cap.location);
    Some(Reference::new(
        cap.text.as_ref(),
        cap.location.clone(),
        scope_id,
        ReferenceKind::Type,
    ))
}

/// Record callback contexts: named callables passed in argument position.
pub(crate) fn finalize_callbacks(tree: &tree_sitter::Tree, source: &str, index: &mut SemanticIndex) {
    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        if node.kind() == "call_expression" {
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
        "member_expression" => match func.child_by_field_name("property") {
            Some(p) => node_text(&p, source).into(),
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

const MODULE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs"];

/// Resolve a relative ECMAScript import specifier against the indexed file
/// set. Package imports are external and resolve to nothing.
pub(crate) fn resolve_import_path(
    source_file: &FilePath,
    import_path: &str,
    files: &FileSet,
) -> Option<FilePath> {
    if !import_path.starts_with('.') {
        return None;
    }
    let base = join_and_normalize(source_file.parent(), import_path)?;
    let mut candidates = vec![base.clone()];
    for ext in MODULE_EXTENSIONS {
        candidates.push(format!("{base}.{ext}"));
    }
    for ext in MODULE_EXTENSIONS {
        candidates.push(format!("{base}/index.{ext}"));
    }
    files.first_present(candidates)
}

pub(crate) fn detect_test_file(path: &FilePath) -> bool {
    let name = path.file_name();
    name.contains(".test.")
        || name.contains(".spec.")
        || path.as_str().contains("__tests__/")
}
