//! Capture query execution.
//!
//! Every language ships one `.scm` query set whose capture names follow the
//! `@category.entity[.qualifier]` convention. The executor runs the compiled
//! query over a syntax tree and yields [`CaptureNode`]s in stable source
//! order, so downstream passes see captures exactly as the source reads.

use crate::types::{FilePath, Location};
use tree_sitter::{Node, Query, QueryCursor, StreamingIterator};

/// Capture categories of the language-agnostic schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureCategory {
    Scope,
    Definition,
    Reference,
    Import,
    Export,
}

impl CaptureCategory {
    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "scope" => Self::Scope,
            "definition" => Self::Definition,
            "reference" => Self::Reference,
            "import" => Self::Import,
            "export" => Self::Export,
            _ => return None,
        })
    }
}

/// One capture yielded by the executor.
#[derive(Debug, Clone)]
pub struct CaptureNode<'t> {
    pub category: CaptureCategory,
    pub entity: Box<str>,
    pub qualifier: Option<Box<str>>,
    /// Full capture name as written in the query file.
    pub name: Box<str>,
    pub text: Box<str>,
    pub location: Location,
    pub node: Node<'t>,
}

/// Split a capture name into `(category, entity, qualifier)`.
///
/// Returns `None` for names outside the schema; those captures are dropped
/// with a warning rather than failing the file.
fn parse_capture_name(name: &str) -> Option<(CaptureCategory, &str, Option<&str>)> {
    let mut parts = name.splitn(3, '.');
    let category = CaptureCategory::from_str(parts.next()?)?;
    let entity = parts.next()?;
    let qualifier = parts.next();
    Some((category, entity, qualifier))
}

/// Run a compiled capture query over a tree and return all captures in
/// source order (outer nodes before the nodes they contain).
pub fn run_capture_query<'t>(
    query: &Query,
    root: Node<'t>,
    source: &str,
    file_path: &FilePath,
) -> Vec<CaptureNode<'t>> {
    let capture_names = query.capture_names();
    let mut captures: Vec<CaptureNode<'t>> = Vec::new();

    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, root, source.as_bytes());
    while let Some(m) = matches.next() {
        for cap in m.captures {
            let name = capture_names[cap.index as usize];
            let Some((category, entity, qualifier)) = parse_capture_name(name) else {
                tracing::warn!("skipping capture with unrecognized name '{name}'");
                continue;
            };
            let node = cap.node;
            let text = node.utf8_text(source.as_bytes()).unwrap_or_default();
            captures.push(CaptureNode {
                category,
                entity: entity.into(),
                qualifier: qualifier.map(Into::into),
                name: name.into(),
                text: text.into(),
                location: Location::from_node(file_path, &node),
                node,
            });
        }
    }

    // QueryCursor yields matches per pattern; re-establish source order.
    // Outer-before-inner keeps scope construction by containment simple.
    captures.sort_by_key(|c| (c.node.start_byte(), std::cmp::Reverse(c.node.end_byte())));
    captures.dedup_by(|a, b| {
        a.name == b.name && a.node.start_byte() == b.node.start_byte() && a.node.end_byte() == b.node.end_byte()
    });
    captures
}
