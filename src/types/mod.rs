//! Core value types shared across the engine.
//!
//! Everything here is comparable, hashable, and serializable. Definitions,
//! scopes, and types are addressed by string-keyed ids derived from source
//! positions, never by object references, so registries stay stable across
//! re-indexing and support per-file removal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbol and namespace names are opaque interned strings.
pub type SymbolName = Box<str>;

pub fn symbol_name(s: &str) -> SymbolName {
    s.into()
}

/// A 0-based position as reported by tree-sitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub row: u32,
    pub column: u32,
}

impl Point {
    pub fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

impl From<tree_sitter::Point> for Point {
    fn from(p: tree_sitter::Point) -> Self {
        Self {
            row: p.row as u32,
            column: p.column as u32,
        }
    }
}

impl From<Point> for tree_sitter::Point {
    fn from(p: Point) -> Self {
        tree_sitter::Point {
            row: p.row as usize,
            column: p.column as usize,
        }
    }
}

/// A project-root-relative file path with `/` separators on every host OS.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilePath(Box<str>);

impl FilePath {
    /// Normalize separators and strip any leading `./`.
    pub fn new(path: &str) -> Self {
        let normalized = path.replace('\\', "/");
        let trimmed = normalized.strip_prefix("./").unwrap_or(&normalized);
        Self(trimmed.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The directory portion, without a trailing slash. Empty for root files.
    pub fn parent(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    /// File name including extension.
    pub fn file_name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }

    /// File name with the final extension removed.
    pub fn file_stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(idx) if idx > 0 => &name[..idx],
            _ => name,
        }
    }

    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(idx) if idx > 0 => Some(&name[idx + 1..]),
            _ => None,
        }
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FilePath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A half-open source span: 1-based lines and columns, end-exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file_path: FilePath,
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Location {
    pub fn new(
        file_path: FilePath,
        start_line: u32,
        start_column: u32,
        end_line: u32,
        end_column: u32,
    ) -> Self {
        Self {
            file_path,
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Build from a tree-sitter node, shifting 0-based points to 1-based.
    pub fn from_node(file_path: &FilePath, node: &tree_sitter::Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            file_path: file_path.clone(),
            start_line: start.row as u32 + 1,
            start_column: start.column as u32 + 1,
            end_line: end.row as u32 + 1,
            end_column: end.column as u32 + 1,
        }
    }

    /// Whether `other` lies entirely within this span. A span contains itself.
    pub fn contains(&self, other: &Location) -> bool {
        if self.file_path != other.file_path {
            return false;
        }
        let starts_before =
            (self.start_line, self.start_column) <= (other.start_line, other.start_column);
        let ends_after = (self.end_line, self.end_column) >= (other.end_line, other.end_column);
        starts_before && ends_after
    }

    /// Whether a 1-based position falls inside the span (end-exclusive).
    pub fn contains_position(&self, line: u32, column: u32) -> bool {
        if (line, column) < (self.start_line, self.start_column) {
            return false;
        }
        (line, column) < (self.end_line, self.end_column)
    }

    /// Whether a 0-based point falls inside the span.
    pub fn contains_point(&self, point: Point) -> bool {
        self.contains_position(point.row + 1, point.column + 1)
    }

    /// Strict ordering key for deterministic output.
    pub fn sort_key(&self) -> (&str, u32, u32) {
        (self.file_path.as_str(), self.start_line, self.start_column)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}-{}:{}",
            self.file_path, self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}

/// Definition kinds, matching the capture schema's `definition.*` entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionKind {
    Function,
    Method,
    Constructor,
    Class,
    Interface,
    Variable,
    Parameter,
    Import,
    Property,
    Enum,
    TypeAlias,
}

impl DefinitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Method => "method",
            Self::Constructor => "constructor",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Variable => "variable",
            Self::Parameter => "parameter",
            Self::Import => "import",
            Self::Property => "property",
            Self::Enum => "enum",
            Self::TypeAlias => "type_alias",
        }
    }

    pub fn from_entity(entity: &str) -> Option<Self> {
        Some(match entity {
            "function" => Self::Function,
            "method" => Self::Method,
            "constructor" => Self::Constructor,
            "class" => Self::Class,
            "interface" => Self::Interface,
            "variable" => Self::Variable,
            "parameter" => Self::Parameter,
            "import" => Self::Import,
            "property" => Self::Property,
            "enum" => Self::Enum,
            "type_alias" => Self::TypeAlias,
            _ => return None,
        })
    }

    pub fn kind_class(&self) -> KindClass {
        match self {
            Self::Function | Self::Method | Self::Constructor => KindClass::Callable,
            Self::Class | Self::Interface | Self::Enum | Self::TypeAlias => KindClass::Type,
            Self::Variable | Self::Parameter | Self::Property => KindClass::Value,
            Self::Import => KindClass::Import,
        }
    }

    pub fn is_callable(&self) -> bool {
        self.kind_class() == KindClass::Callable
    }
}

/// Coarse grouping used by registry lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindClass {
    Callable,
    Type,
    Value,
    Import,
}

/// Scope kinds for the lexical scope tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Module,
    Function,
    Class,
    Block,
    Comprehension,
    Loop,
    Arrow,
}

impl ScopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Function => "function",
            Self::Class => "class",
            Self::Block => "block",
            Self::Comprehension => "comprehension",
            Self::Loop => "loop",
            Self::Arrow => "arrow",
        }
    }
}

/// Canonical key for a definition: `kind:file:start_line:start_col:name`.
///
/// Derived from the full definition node's span, so the key survives
/// reparses of identical source and never depends on AST node identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(Box<str>);

impl SymbolId {
    pub fn derive(kind: DefinitionKind, location: &Location, name: &str) -> Self {
        Self(
            format!(
                "{}:{}:{}:{}:{}",
                kind.as_str(),
                location.file_path,
                location.start_line,
                location.start_column,
                name
            )
            .into(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key for a lexical scope: `kind:file:start_line:start_col:end_line:end_col`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(Box<str>);

impl ScopeId {
    pub fn derive(kind: ScopeKind, location: &Location) -> Self {
        Self(
            format!(
                "{}:{}:{}:{}:{}:{}",
                kind.as_str(),
                location.file_path,
                location.start_line,
                location.start_column,
                location.end_line,
                location.end_column
            )
            .into(),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key for a declared type: `type:name:file`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(Box<str>);

impl TypeId {
    pub fn derive(name: &str, file_path: &FilePath) -> Self {
        Self(format!("type:{name}:{file_path}").into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(file: &str, sl: u32, sc: u32, el: u32, ec: u32) -> Location {
        Location::new(FilePath::new(file), sl, sc, el, ec)
    }

    #[test]
    fn test_file_path_normalization() {
        assert_eq!(FilePath::new("src\\lib.rs").as_str(), "src/lib.rs");
        assert_eq!(FilePath::new("./a/b.ts").as_str(), "a/b.ts");
        assert_eq!(FilePath::new("a/b.ts").parent(), "a");
        assert_eq!(FilePath::new("b.ts").parent(), "");
        assert_eq!(FilePath::new("a/b.test.ts").file_stem(), "b.test");
        assert_eq!(FilePath::new("a/b.ts").extension(), Some("ts"));
        assert_eq!(FilePath::new("Makefile").extension(), None);
    }

    #[test]
    fn test_location_containment() {
        let outer = loc("a.ts", 1, 1, 10, 1);
        let inner = loc("a.ts", 2, 5, 3, 8);
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.contains(&outer));

        let other_file = loc("b.ts", 2, 5, 3, 8);
        assert!(!outer.contains(&other_file));
    }

    #[test]
    fn test_location_position_end_exclusive() {
        let span = loc("a.ts", 2, 3, 2, 10);
        assert!(span.contains_position(2, 3));
        assert!(span.contains_position(2, 9));
        assert!(!span.contains_position(2, 10));
        assert!(!span.contains_position(1, 5));
    }

    #[test]
    fn test_symbol_id_stability() {
        let l = loc("src/a.ts", 3, 1, 5, 2);
        let a = SymbolId::derive(DefinitionKind::Function, &l, "helper");
        let b = SymbolId::derive(DefinitionKind::Function, &l, "helper");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "function:src/a.ts:3:1:helper");

        let c = SymbolId::derive(DefinitionKind::Method, &l, "helper");
        assert_ne!(a, c);
    }

    #[test]
    fn test_scope_id_format() {
        let l = loc("a.py", 1, 1, 20, 1);
        let id = ScopeId::derive(ScopeKind::Module, &l);
        assert_eq!(id.as_str(), "module:a.py:1:1:20:1");
    }

    #[test]
    fn test_kind_classes() {
        assert_eq!(DefinitionKind::Function.kind_class(), KindClass::Callable);
        assert_eq!(DefinitionKind::Constructor.kind_class(), KindClass::Callable);
        assert_eq!(DefinitionKind::Interface.kind_class(), KindClass::Type);
        assert_eq!(DefinitionKind::Parameter.kind_class(), KindClass::Value);
        assert_eq!(DefinitionKind::Import.kind_class(), KindClass::Import);
        assert!(DefinitionKind::Method.is_callable());
        assert!(!DefinitionKind::Variable.is_callable());
    }

    #[test]
    fn test_ids_as_json_keys() {
        let l = loc("a.ts", 1, 1, 2, 1);
        let id = SymbolId::derive(DefinitionKind::Class, &l, "Foo");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"class:a.ts:1:1:Foo\"");
        let back: SymbolId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
