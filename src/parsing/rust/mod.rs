//! Rust language adapter.
//!
//! Rust-specific rules: `pub` visibility as the export signal, impl blocks
//! binding methods to types declared elsewhere, `use` trees flattened into
//! import definitions, and module-path import resolution against
//! `src/`-style layouts.

use crate::config::Settings;
use crate::error::{Diagnostic, ParseResult};
use crate::indexing::SemanticIndex;
use crate::parsing::adapter::{
    ExtractionContext, FileSet, LanguageAdapter, ScopeBoundary, ancestor_of_kind, base_type_name,
    compile_query, init_parser, node_text, same_node,
};
use crate::parsing::query::CaptureNode;
use crate::parsing::Language;
use crate::symbol::{
    CallType, CallableDetails, CallbackContext, Definition, DefinitionDetails, ExportInfo,
    ImportDetails, ImportKind, Parameter, Receiver, Reference, ReferenceKind, VariableDetails,
};
use crate::types::{DefinitionKind, FilePath, Location, ScopeKind, SymbolName};
use tree_sitter::{Node, Parser, Query, Tree};

/// The capture query set; part of the external contract.
pub const QUERY_SOURCE: &str = include_str!("queries.scm");

pub struct RustAdapter {
    parser: Parser,
    query: Query,
}

impl RustAdapter {
    pub fn new() -> ParseResult<Self> {
        let language: tree_sitter::Language = tree_sitter_rust::LANGUAGE.into();
        let parser = init_parser(&language, "Rust")?;
        let query = compile_query(&language, "Rust", QUERY_SOURCE)?;
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

fn is_pub(node: &Node) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .any(|c| c.kind() == "visibility_modifier")
}

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

/// The impl or trait block a function sits in, with the type name it binds
/// methods to.
fn enclosing_impl_type(node: &Node, source: &str) -> Option<(SymbolName, bool)> {
    if let Some(impl_block) = ancestor_of_kind(node, "impl_item") {
        let type_name = impl_block
            .child_by_field_name("type")
            .map(|t| base_type_name(node_text(&t, source)))?;
        return Some((type_name, true));
    }
    if let Some(trait_block) = ancestor_of_kind(node, "trait_item") {
        let name = trait_block
            .child_by_field_name("name")
            .map(|n| SymbolName::from(node_text(&n, source)))?;
        return Some((name, false));
    }
    None
}

fn collect_pattern_identifiers<'t>(pattern: &Node<'t>, out: &mut Vec<Node<'t>>) {
    if pattern.kind() == "identifier" {
        out.push(*pattern);
        return;
    }
    for child in named_children(pattern) {
        collect_pattern_identifiers(&child, out);
    }
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
        if child.kind() != "parameter" {
            continue;
        }
        let Some(pattern) = child.child_by_field_name("pattern") else {
            continue;
        };
        let annotation = child
            .child_by_field_name("type")
            .map(|t| Box::<str>::from(node_text(&t, source).trim()));
        let mut idents = Vec::new();
        collect_pattern_identifiers(&pattern, &mut idents);
        for ident in idents {
            let name = node_text(&ident, source);
            let mut p = Parameter::new(name);
            p.type_annotation = annotation.clone();
            params.push(p);
            bindings.push((name.into(), Location::from_node(file, &ident)));
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

fn return_type_of(node: &Node, source: &str) -> Option<Box<str>> {
    node.child_by_field_name("return_type")
        .map(|t| Box::<str>::from(node_text(&t, source).trim()))
}

fn extract_function(cap: &CaptureNode, source: &str, ctx: &ExtractionContext) -> Vec<Definition> {
    let node = cap.node;
    let Some(name_node) = node.child_by_field_name("name") else {
        return Vec::new();
    };
    let name = node_text(&name_node, source);

    let enclosing = enclosing_impl_type(&node, source);
    let kind = match &enclosing {
        Some((_, true)) if name == "new" => DefinitionKind::Constructor,
        Some(_) => DefinitionKind::Method,
        None => DefinitionKind::Function,
    };
    // Associated functions without a self receiver are static.
    let has_self = node
        .child_by_field_name("parameters")
        .map(|list| {
            named_children(&list)
                .iter()
                .any(|c| c.kind() == "self_parameter")
        })
        .unwrap_or(false);

    let anchor = Location::from_node(ctx.file_path, &name_node);
    let scope_id = ctx.scopes.innermost_containing(&anchor);
    let (parameters, bindings) = extract_parameters(ctx.file_path, &node, source);

    let mut def = Definition::new(kind, name, cap.location.clone(), scope_id).with_details(
        DefinitionDetails::Callable(CallableDetails {
            parameters,
            return_type: return_type_of(&node, source),
            access: None,
            is_static: enclosing.is_some() && !has_self,
            enclosing_type: enclosing.map(|(t, _)| t),
            callback_context: None,
        }),
    );
    if is_pub(&node) {
        def = def.exported(ExportInfo::default());
    }

    let mut defs = vec![def];
    defs.extend(parameter_definitions(ctx, &node, &bindings));
    defs
}

fn extract_type_item(
    cap: &CaptureNode,
    source: &str,
    ctx: &ExtractionContext,
    kind: DefinitionKind,
) -> Vec<Definition> {
    let node = cap.node;
    let Some(name_node) = node.child_by_field_name("name") else {
        return Vec::new();
    };
    let name = node_text(&name_node, source);
    let anchor = Location::from_node(ctx.file_path, &name_node);
    let scope_id = ctx.scopes.innermost_containing(&anchor);

    let mut def = Definition::new(kind, name, cap.location.clone(), scope_id);
    if kind.kind_class() == crate::types::KindClass::Type && kind != DefinitionKind::TypeAlias {
        // Trait implementations are attached in the finalize pass, once
        // every impl block has been seen.
        def = def.with_details(DefinitionDetails::Type(Default::default()));
    }
    if is_pub(&node) {
        def = def.exported(ExportInfo::default());
    }
    vec![def]
}

fn extract_variable(cap: &CaptureNode, source: &str, ctx: &ExtractionContext) -> Vec<Definition> {
    let node = cap.node;
    match node.kind() {
        "let_declaration" => {
            let Some(pattern) = node.child_by_field_name("pattern") else {
                return Vec::new();
            };
            let annotation = node
                .child_by_field_name("type")
                .map(|t| Box::<str>::from(node_text(&t, source).trim()));
            let value = node.child_by_field_name("value");
            let value_type = value.as_ref().and_then(|v| construction_type(v, source));

            let mut idents = Vec::new();
            collect_pattern_identifiers(&pattern, &mut idents);
            // Patterns may bind several names; each gets its own id keyed
            // to the bound identifier's span.
            idents
                .into_iter()
                .map(|ident| {
                    let name = node_text(&ident, source);
                    let loc = Location::from_node(ctx.file_path, &ident);
                    let scope_id = ctx.scopes.innermost_containing(&loc);
                    Definition::new(DefinitionKind::Variable, name, loc, scope_id).with_details(
                        DefinitionDetails::Variable(VariableDetails {
                            type_annotation: annotation.clone(),
                            value_type: value_type.clone(),
                            collection_members: Vec::new(),
                        }),
                    )
                })
                .collect()
        }
        "const_item" | "static_item" => {
            let Some(name_node) = node.child_by_field_name("name") else {
                return Vec::new();
            };
            let name = node_text(&name_node, source);
            let anchor = Location::from_node(ctx.file_path, &name_node);
            let scope_id = ctx.scopes.innermost_containing(&anchor);
            let mut def =
                Definition::new(DefinitionKind::Variable, name, cap.location.clone(), scope_id)
                    .with_details(DefinitionDetails::Variable(VariableDetails {
                        type_annotation: node
                            .child_by_field_name("type")
                            .map(|t| node_text(&t, source).trim().into()),
                        ..VariableDetails::default()
                    }));
            if is_pub(&node) {
                def = def.exported(ExportInfo::default());
            }
            vec![def]
        }
        _ => Vec::new(),
    }
}

/// The constructed type of an initializer: struct literals and
/// `Type::associated()` calls.
fn construction_type(value: &Node, source: &str) -> Option<SymbolName> {
    match value.kind() {
        "struct_expression" => value
            .child_by_field_name("name")
            .map(|n| base_type_name(node_text(&n, source))),
        "call_expression" => {
            let func = value.child_by_field_name("function")?;
            if func.kind() != "scoped_identifier" {
                return None;
            }
            func.child_by_field_name("path")
                .filter(|p| matches!(p.kind(), "identifier" | "type_identifier"))
                .map(|p| base_type_name(node_text(&p, source)))
        }
        _ => None,
    }
}

fn extract_field(cap: &CaptureNode, source: &str, ctx: &ExtractionContext) -> Vec<Definition> {
    let node = cap.node;
    let Some(name_node) = node.child_by_field_name("name") else {
        return Vec::new();
    };
    let name = node_text(&name_node, source);
    let anchor = Location::from_node(ctx.file_path, &name_node);
    let scope_id = ctx.scopes.innermost_containing(&anchor);
    let mut def = Definition::new(DefinitionKind::Property, name, cap.location.clone(), scope_id)
        .with_details(DefinitionDetails::Variable(VariableDetails {
            type_annotation: node
                .child_by_field_name("type")
                .map(|t| node_text(&t, source).trim().into()),
            ..VariableDetails::default()
        }));
    if is_pub(&node) {
        def = def.exported(ExportInfo::default());
    }
    vec![def]
}

fn extract_use(cap: &CaptureNode, source: &str, ctx: &ExtractionContext) -> Vec<Definition> {
    let node = cap.node;
    let Some(argument) = node.child_by_field_name("argument") else {
        return Vec::new();
    };
    let exported = is_pub(&node);
    let mut defs = Vec::new();
    walk_use_tree(&argument, "", source, ctx, exported, &mut defs);
    defs
}

fn push_import(
    ctx: &ExtractionContext,
    node: &Node,
    local: &str,
    original: Option<&str>,
    module: &str,
    kind: ImportKind,
    exported: bool,
    defs: &mut Vec<Definition>,
) {
    let loc = Location::from_node(ctx.file_path, node);
    let mut def = Definition::new(DefinitionKind::Import, local, loc, ctx.scopes.root_id.clone())
        .with_details(DefinitionDetails::Import(ImportDetails {
            local_name: local.into(),
            original_name: original.map(Into::into),
            source_module_path: module.into(),
            import_kind: kind,
        }));
    if exported {
        // `pub use` re-exports the name.
        def = def.exported(ExportInfo {
            export_name: None,
            is_default: false,
            is_reexport: true,
        });
    }
    defs.push(def);
}

fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}::{segment}")
    }
}

fn walk_use_tree(
    node: &Node,
    prefix: &str,
    source: &str,
    ctx: &ExtractionContext,
    exported: bool,
    defs: &mut Vec<Definition>,
) {
    match node.kind() {
        // `use path::to::item`
        "scoped_identifier" => {
            let path = node
                .child_by_field_name("path")
                .map(|p| node_text(&p, source))
                .unwrap_or_default();
            let Some(name_node) = node.child_by_field_name("name") else {
                return;
            };
            let name = node_text(&name_node, source);
            let module = join_path(prefix, path);
            push_import(ctx, node, name, None, &module, ImportKind::Named, exported, defs);
        }
        // A bare name: at the top level it binds a module handle
        // (`use serde;`); inside a list it names an item of the prefix
        // (`use crate::util::{helper}`).
        "identifier" | "crate" | "super" => {
            let name = node_text(node, source);
            if prefix.is_empty() {
                let module = join_path(prefix, name);
                push_import(ctx, node, name, None, &module, ImportKind::Namespace, exported, defs);
            } else {
                push_import(ctx, node, name, None, prefix, ImportKind::Named, exported, defs);
            }
        }
        // `use a::b::{self}` binds the module under its own last segment.
        "self" => {
            if let Some(name) = prefix.rsplit("::").next().filter(|s| !s.is_empty()) {
                push_import(ctx, node, name, None, prefix, ImportKind::Namespace, exported, defs);
            }
        }
        "use_as_clause" => {
            let Some(path) = node.child_by_field_name("path") else {
                return;
            };
            let Some(alias) = node.child_by_field_name("alias") else {
                return;
            };
            let alias_text = node_text(&alias, source);
            match path.kind() {
                "scoped_identifier" => {
                    let module = join_path(
                        prefix,
                        path.child_by_field_name("path")
                            .map(|p| node_text(&p, source))
                            .unwrap_or_default(),
                    );
                    let original = path
                        .child_by_field_name("name")
                        .map(|n| node_text(&n, source))
                        .unwrap_or_default();
                    push_import(
                        ctx,
                        node,
                        alias_text,
                        Some(original),
                        &module,
                        ImportKind::Named,
                        exported,
                        defs,
                    );
                }
                _ if !prefix.is_empty() => {
                    // `use crate::util::{io as disk}`.
                    push_import(
                        ctx,
                        node,
                        alias_text,
                        Some(node_text(&path, source)),
                        prefix,
                        ImportKind::Named,
                        exported,
                        defs,
                    );
                }
                _ => {
                    // `use serde_json as json`: an aliased module handle.
                    let module = join_path(prefix, node_text(&path, source));
                    push_import(
                        ctx,
                        node,
                        alias_text,
                        None,
                        &module,
                        ImportKind::Namespace,
                        exported,
                        defs,
                    );
                }
            }
        }
        "scoped_use_list" => {
            let path = node
                .child_by_field_name("path")
                .map(|p| node_text(&p, source))
                .unwrap_or_default();
            let nested = join_path(prefix, path);
            if let Some(list) = node.child_by_field_name("list") {
                for child in named_children(&list) {
                    walk_use_tree(&child, &nested, source, ctx, exported, defs);
                }
            }
        }
        "use_list" => {
            for child in named_children(node) {
                walk_use_tree(&child, prefix, source, ctx, exported, defs);
            }
        }
        "use_wildcard" => {
            tracing::debug!("skipping glob import at {}", cap_location(ctx, node));
        }
        _ => {}
    }
}

fn cap_location(ctx: &ExtractionContext, node: &Node) -> Location {
    Location::from_node(ctx.file_path, node)
}

fn describe_receiver(file: &FilePath, value: &Node, source: &str) -> Receiver {
    match value.kind() {
        "identifier" => Receiver::Named(node_text(value, source).into()),
        "self" => Receiver::SelfInstance,
        "struct_expression" => value
            .child_by_field_name("name")
            .map(|n| Receiver::Constructed(base_type_name(node_text(&n, source))))
            .unwrap_or_else(|| Receiver::Expression {
                text: node_text(value, source).into(),
                location: Location::from_node(file, value),
            }),
        "call_expression" => {
            let callee = value
                .child_by_field_name("function")
                .map(|f| match f.kind() {
                    "field_expression" => f
                        .child_by_field_name("field")
                        .map(|p| node_text(&p, source).into())
                        .unwrap_or_else(|| node_text(&f, source).into()),
                    "scoped_identifier" => f
                        .child_by_field_name("name")
                        .map(|n| node_text(&n, source).into())
                        .unwrap_or_else(|| node_text(&f, source).into()),
                    _ => node_text(&f, source).into(),
                })
                .unwrap_or_else(|| "".into());
            Receiver::Call { callee }
        }
        _ => Receiver::Expression {
            text: node_text(value, source).into(),
            location: Location::from_node(file, value),
        },
    }
}

fn is_binding_occurrence(node: &Node) -> bool {
    let Some(parent) = node.parent() else {
        return true;
    };
    let parent_kind = parent.kind();

    if is_field(&parent, "name", node)
        && matches!(
            parent_kind,
            "function_item"
                | "function_signature_item"
                | "mod_item"
                | "const_item"
                | "static_item"
                | "enum_variant"
        )
    {
        return true;
    }
    // let and parameter patterns bind.
    if ancestor_of_kind(node, "let_declaration")
        .is_some_and(|l| l.child_by_field_name("pattern").is_some_and(|p| contains(&p, node)))
    {
        return true;
    }
    if parent_kind == "parameter" && is_field(&parent, "pattern", node) {
        return true;
    }
    if ancestor_of_kind(node, "closure_parameters").is_some() {
        return true;
    }
    if ancestor_of_kind(node, "use_declaration").is_some() {
        return true;
    }
    // Field init shorthand keys and scoped paths handle themselves.
    if parent_kind == "field_initializer" && is_field(&parent, "field", node) {
        return true;
    }
    false
}

fn contains(haystack: &Node, needle: &Node) -> bool {
    haystack.start_byte() <= needle.start_byte() && needle.end_byte() <= haystack.end_byte()
}

fn classify_identifier(
    cap: &CaptureNode,
    source: &str,
    ctx: &ExtractionContext,
) -> Option<Reference> {
    let node = cap.node;
    if is_binding_occurrence(&node) {
        return None;
    }
    let name = node_text(&node, source);
    if name == "self" {
        return None;
    }
    let scope_id = ctx.scopes.innermost_containing(&cap.location);
    let parent = node.parent()?;

    // Plain call: `f(...)`.
    if parent.kind() == "call_expression" && is_field(&parent, "function", &node) {
        return Some(
            Reference::new(name, cap.location.clone(), scope_id, ReferenceKind::Call)
                .with_call(CallType::Function, None),
        );
    }

    // Path call: `Type::assoc(...)` / `module::f(...)`: classify on the
    // final path segment with the path head as receiver.
    if parent.kind() == "scoped_identifier" && is_field(&parent, "name", &node) {
        if let Some(grand) = parent.parent() {
            if grand.kind() == "call_expression" && is_field(&grand, "function", &parent) {
                let receiver = parent
                    .child_by_field_name("path")
                    .map(|p| match p.kind() {
                        "identifier" | "type_identifier" => {
                            Receiver::Named(node_text(&p, source).into())
                        }
                        _ => Receiver::Expression {
                            text: node_text(&p, source).into(),
                            location: Location::from_node(&cap.location.file_path, &p),
                        },
                    });
                return Some(
                    Reference::new(name, cap.location.clone(), scope_id, ReferenceKind::Call)
                        .with_call(CallType::Method, receiver),
                );
            }
        }
        // Non-call path mention: `module::CONST`.
        return Some(Reference::new(
            name,
            cap.location.clone(),
            scope_id,
            ReferenceKind::MemberAccess,
        ));
    }

    if parent.kind() == "assignment_expression" && is_field(&parent, "left", &node) {
        let assigned_type = parent
            .child_by_field_name("right")
            .and_then(|r| construction_type(&r, source));
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

fn classify_field_identifier(
    cap: &CaptureNode,
    source: &str,
    ctx: &ExtractionContext,
) -> Option<Reference> {
    let node = cap.node;
    let parent = node.parent()?;
    if parent.kind() != "field_expression" || !is_field(&parent, "field", &node) {
        return None;
    }
    let name = node_text(&node, source);
    let scope_id = ctx.scopes.innermost_containing(&cap.location);
    let value = parent.child_by_field_name("value")?;
    let receiver = describe_receiver(&cap.location.file_path, &value, source);

    if let Some(grand) = parent.parent() {
        if grand.kind() == "call_expression" && is_field(&grand, "function", &parent) {
            return Some(
                Reference::new(name, cap.location.clone(), scope_id, ReferenceKind::Call)
                    .with_call(CallType::Method, Some(receiver)),
            );
        }
    }
    Some(
        Reference::new(
            name,
            cap.location.clone(),
            scope_id,
            ReferenceKind::MemberAccess,
        )
        .with_receiver(receiver),
    )
}

fn classify_type_identifier(
    cap: &CaptureNode,
    ctx: &ExtractionContext,
) -> Option<Reference> {
    let node = cap.node;
    let parent = node.parent()?;
    if is_field(&parent, "name", &node)
        && matches!(
            parent.kind(),
            "struct_item" | "enum_item" | "trait_item" | "type_item" | "union_item"
        )
    {
        return None;
    }
    let scope_id = ctx.scopes.innermost_containing(&cap.location);

    // Struct literals construct: `Point { x, y }`.
    if parent.kind() == "struct_expression" && is_field(&parent, "name", &node) {
        return Some(
            Reference::new(
                cap.text.as_ref(),
                cap.location.clone(),
                scope_id,
                ReferenceKind::Call,
            )
            .with_call(CallType::Constructor, None),
        );
    }

    Some(Reference::new(
        cap.text.as_ref(),
        cap.location.clone(),
        scope_id,
        ReferenceKind::Type,
    ))
}

/// Attach trait implementations to type definitions and record callback
/// contexts, once the whole file has been extracted.
fn finalize(tree: &Tree, source: &str, index: &mut SemanticIndex) {
    let mut impls: Vec<(SymbolName, SymbolName)> = Vec::new();
    let mut stack = vec![tree.root_node()];
    while let Some(node) = stack.pop() {
        if node.kind() == "impl_item" {
            if let (Some(trait_node), Some(type_node)) = (
                node.child_by_field_name("trait"),
                node.child_by_field_name("type"),
            ) {
                impls.push((
                    base_type_name(node_text(&type_node, source)),
                    base_type_name(node_text(&trait_node, source)),
                ));
            }
        }
        if node.kind() == "call_expression" {
            record_callback_arguments(&node, source, index);
        }
        stack.extend(named_children(&node));
    }

    for (type_name, trait_name) in impls {
        for def in index.definitions.iter_mut() {
            if def.name != type_name
                || !matches!(def.kind, DefinitionKind::Class | DefinitionKind::Enum)
            {
                continue;
            }
            if let DefinitionDetails::Type(details) = &mut def.details {
                if !details.implements.contains(&trait_name) {
                    details.implements.push(trait_name.clone());
                }
            }
        }
        // Keep the descriptor in sync with the definition.
        for td in index.type_descriptors.iter_mut() {
            if td.name == type_name && !td.implements.contains(&trait_name) {
                td.implements.push(trait_name.clone());
            }
        }
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
        "field_expression" => match func.child_by_field_name("field") {
            Some(f) => node_text(&f, source).into(),
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

impl LanguageAdapter for RustAdapter {
    fn language(&self) -> Language {
        Language::Rust
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
            "function_item" => {
                let name_node = node.child_by_field_name("name");
                Some(ScopeBoundary {
                    kind: ScopeKind::Function,
                    symbol_location: name_node.map(|n| Location::from_node(file, &n)),
                    scope_location: callable_scope_span(file, &node),
                    name: name_node.map(|n| node_text(&n, source).into()),
                })
            }
            "closure_expression" => Some(ScopeBoundary {
                kind: ScopeKind::Arrow,
                symbol_location: None,
                scope_location: cap.location.clone(),
                name: None,
            }),
            "block" => Some(ScopeBoundary {
                kind: ScopeKind::Block,
                symbol_location: None,
                scope_location: cap.location.clone(),
                name: None,
            }),
            "impl_item" | "trait_item" | "struct_item" | "enum_item" => {
                let name_node = node
                    .child_by_field_name("name")
                    .or_else(|| node.child_by_field_name("type"));
                let body = node.child_by_field_name("body")?;
                Some(ScopeBoundary {
                    kind: ScopeKind::Class,
                    symbol_location: name_node.map(|n| Location::from_node(file, &n)),
                    scope_location: Location::from_node(file, &body),
                    name: name_node.map(|n| base_type_name(node_text(&n, source))),
                })
            }
            "mod_item" => {
                let name_node = node.child_by_field_name("name");
                let body = node.child_by_field_name("body")?;
                Some(ScopeBoundary {
                    kind: ScopeKind::Module,
                    symbol_location: name_node.map(|n| Location::from_node(file, &n)),
                    scope_location: Location::from_node(file, &body),
                    name: name_node.map(|n| node_text(&n, source).into()),
                })
            }
            _ => None,
        }
    }

    fn extract_definitions(
        &self,
        cap: &CaptureNode,
        source: &str,
        ctx: &ExtractionContext,
        _diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<Definition> {
        match cap.node.kind() {
            "function_item" | "function_signature_item" => extract_function(cap, source, ctx),
            "struct_item" => extract_type_item(cap, source, ctx, DefinitionKind::Class),
            "enum_item" => extract_type_item(cap, source, ctx, DefinitionKind::Enum),
            "trait_item" => extract_type_item(cap, source, ctx, DefinitionKind::Interface),
            "type_item" => extract_type_item(cap, source, ctx, DefinitionKind::TypeAlias),
            "let_declaration" | "const_item" | "static_item" => {
                extract_variable(cap, source, ctx)
            }
            "field_declaration" | "enum_variant" => extract_field(cap, source, ctx),
            "use_declaration" => extract_use(cap, source, ctx),
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
        match cap.node.kind() {
            "identifier" => classify_identifier(cap, source, ctx),
            "field_identifier" => classify_field_identifier(cap, source, ctx),
            "type_identifier" => classify_type_identifier(cap, ctx),
            _ => None,
        }
    }

    fn finalize_index(
        &self,
        tree: &Tree,
        source: &str,
        index: &mut SemanticIndex,
        _settings: &Settings,
    ) {
        finalize(tree, source, index);
    }

    fn detect_test_file(&self, path: &FilePath) -> bool {
        let name = path.file_name();
        path.as_str().contains("tests/") || name.ends_with("_test.rs") || name == "tests.rs"
    }

    fn resolve_import_path(
        &self,
        source_file: &FilePath,
        import_path: &str,
        files: &FileSet,
    ) -> Option<FilePath> {
        resolve_module_path(source_file, import_path, files)
    }

    fn resolve_submodule_import_path(
        &self,
        source_file: &FilePath,
        package_path: &str,
        name: &str,
        files: &FileSet,
    ) -> Option<FilePath> {
        resolve_module_path(source_file, &format!("{package_path}::{name}"), files)
    }

    fn self_keyword(&self) -> &'static str {
        "self"
    }
}

/// Resolve a `use` path like `crate::foo::bar` or `super::util` to a module
/// file within the indexed set.
fn resolve_module_path(
    source_file: &FilePath,
    import_path: &str,
    files: &FileSet,
) -> Option<FilePath> {
    let segments: Vec<&str> = import_path.split("::").filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return None;
    }

    let mut candidates = Vec::new();
    match segments[0] {
        "crate" => {
            let rest = segments[1..].join("/");
            if rest.is_empty() {
                candidates.extend(["src/lib.rs".to_string(), "lib.rs".to_string()]);
            } else {
                candidates.push(format!("src/{rest}.rs"));
                candidates.push(format!("src/{rest}/mod.rs"));
                candidates.push(format!("{rest}.rs"));
                candidates.push(format!("{rest}/mod.rs"));
            }
        }
        "self" => {
            let rest = segments[1..].join("/");
            let dir = module_dir(source_file);
            let base = if dir.is_empty() { rest } else { format!("{dir}/{rest}") };
            candidates.push(format!("{base}.rs"));
            candidates.push(format!("{base}/mod.rs"));
        }
        "super" => {
            let ups = segments.iter().take_while(|s| **s == "super").count();
            let rest = segments[ups..].join("/");
            // Each `super` climbs one module: from this file's module dir
            // to its parent's.
            let mut dir = module_dir(source_file);
            for _ in 0..ups {
                dir = match dir.rfind('/') {
                    Some(idx) => dir[..idx].to_string(),
                    None => String::new(),
                };
            }
            let base = if dir.is_empty() {
                rest
            } else if rest.is_empty() {
                dir.clone()
            } else {
                format!("{dir}/{rest}")
            };
            candidates.push(format!("{base}.rs"));
            candidates.push(format!("{base}/mod.rs"));
        }
        _ => {
            // Bare paths: sibling module or src-rooted layout.
            let rest = segments.join("/");
            let dir = module_dir(source_file);
            if !dir.is_empty() {
                candidates.push(format!("{dir}/{rest}.rs"));
                candidates.push(format!("{dir}/{rest}/mod.rs"));
            }
            candidates.push(format!("src/{rest}.rs"));
            candidates.push(format!("src/{rest}/mod.rs"));
            candidates.push(format!("{rest}.rs"));
            candidates.push(format!("{rest}/mod.rs"));
        }
    }

    files.first_present(candidates)
}

/// The directory whose children are this file's submodules: `src/foo/mod.rs`
/// and `src/lib.rs` own their directory, `src/foo.rs` owns `src/foo/`.
fn module_dir(file: &FilePath) -> String {
    let name = file.file_name();
    if name == "mod.rs" || name == "lib.rs" || name == "main.rs" {
        file.parent().to_string()
    } else {
        let parent = file.parent();
        let stem = file.file_stem();
        if parent.is_empty() {
            stem.to_string()
        } else {
            format!("{parent}/{stem}")
        }
    }
}
