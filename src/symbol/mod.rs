//! Typed definitions, references, scopes, and type descriptors.
//!
//! These are the records produced by the per-file indexing passes and stored
//! in the project registries. All cross-references between them go through
//! value-typed ids from [`crate::types`].

use crate::types::{
    DefinitionKind, FilePath, Location, ScopeId, ScopeKind, SymbolId, SymbolName, TypeId,
};
use serde::{Deserialize, Serialize};

/// A node in a file's lexical scope tree.
///
/// Scopes form a tree rooted at the file's module scope; every child's
/// location is contained in its parent's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexicalScope {
    pub id: ScopeId,
    pub parent_id: Option<ScopeId>,
    pub name: Option<SymbolName>,
    pub kind: ScopeKind,
    pub location: Location,
    pub children: Vec<ScopeId>,
}

impl LexicalScope {
    pub fn new(kind: ScopeKind, location: Location, name: Option<SymbolName>) -> Self {
        Self {
            id: ScopeId::derive(kind, &location),
            parent_id: None,
            name,
            kind,
            location,
            children: Vec::new(),
        }
    }
}

/// A declared parameter of a callable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: SymbolName,
    pub type_annotation: Option<Box<str>>,
    pub is_optional: bool,
    pub is_rest: bool,
    pub default_value: Option<Box<str>>,
}

impl Parameter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            type_annotation: None,
            is_optional: false,
            is_rest: false,
            default_value: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessModifier {
    Public,
    Private,
    Protected,
}

/// Records that a callable value flows into another function's argument
/// position. Such callables do not create direct call edges until the
/// receiving function invokes them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CallbackContext {
    pub is_callback: bool,
    /// Name of the function the callback is passed to, when resolvable.
    pub callee_name: Option<SymbolName>,
    /// Zero-based position of the callback among the call's arguments.
    pub argument_index: Option<u32>,
    /// True when the receiving callee could not be resolved in-project.
    pub receiver_is_external: bool,
}

/// Kind-specific fields for functions, methods, and constructors.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CallableDetails {
    pub parameters: Vec<Parameter>,
    pub return_type: Option<Box<str>>,
    pub access: Option<AccessModifier>,
    pub is_static: bool,
    /// Enclosing class/interface recorded by name; resolved to a TypeId by
    /// the type preprocessor, never by AST node identity.
    pub enclosing_type: Option<SymbolName>,
    pub callback_context: Option<CallbackContext>,
}

/// Kind-specific fields for classes, interfaces, enums, and type aliases.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypeDetails {
    pub inherits: Vec<SymbolName>,
    pub implements: Vec<SymbolName>,
}

/// Kind-specific fields for variables, parameters, and properties.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VariableDetails {
    pub type_annotation: Option<Box<str>>,
    /// Type constructed by the initializer (`let x = new Foo()`), when
    /// recognizable. Seeds data-flow receiver typing.
    pub value_type: Option<SymbolName>,
    /// Callable members when the initializer is an object/map literal of
    /// functions. Enables collection dispatch.
    pub collection_members: Vec<SymbolName>,
}

/// How an imported name binds locally.
///
/// Python's `from P import m` where `m` is a submodule file is still a
/// `Named` import here; the module-as-named distinction is carried by the
/// ImportGraph's precomputed submodule paths, since it depends on which
/// files the project has indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// `import { x } from "m"` / `from m import x`.
    Named,
    /// `import * as ns from "m"` / `import m`.
    Namespace,
    /// `import x from "m"`.
    Default,
    /// `import "m"`.
    SideEffect,
}

/// Kind-specific fields for import definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDetails {
    pub local_name: SymbolName,
    /// Name in the source module when aliased (`import { a as b }`).
    pub original_name: Option<SymbolName>,
    /// The module specifier exactly as written in the source.
    pub source_module_path: Box<str>,
    pub import_kind: ImportKind,
}

/// Export metadata attached to an exported definition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExportInfo {
    /// Exported-as name when it differs from the local name.
    pub export_name: Option<SymbolName>,
    pub is_default: bool,
    pub is_reexport: bool,
}

/// Kind-specific payload of a definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionDetails {
    Callable(CallableDetails),
    Type(TypeDetails),
    Variable(VariableDetails),
    Import(ImportDetails),
    None,
}

/// A definition of any kind, as stored in the DefinitionRegistry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub symbol_id: SymbolId,
    pub name: SymbolName,
    pub kind: DefinitionKind,
    pub location: Location,
    pub defining_scope_id: ScopeId,
    pub is_exported: bool,
    pub export: Option<ExportInfo>,
    pub details: DefinitionDetails,
}

impl Definition {
    /// The symbol id is derived from the full definition node's location,
    /// never the name node's.
    pub fn new(
        kind: DefinitionKind,
        name: &str,
        location: Location,
        defining_scope_id: ScopeId,
    ) -> Self {
        Self {
            symbol_id: SymbolId::derive(kind, &location, name),
            name: name.into(),
            kind,
            location,
            defining_scope_id,
            is_exported: false,
            export: None,
            details: DefinitionDetails::None,
        }
    }

    pub fn with_details(mut self, details: DefinitionDetails) -> Self {
        self.details = details;
        self
    }

    pub fn exported(mut self, info: ExportInfo) -> Self {
        self.is_exported = true;
        self.export = Some(info);
        self
    }

    /// The name this definition is visible under from outside the file.
    pub fn exported_name(&self) -> &str {
        self.export
            .as_ref()
            .and_then(|e| e.export_name.as_deref())
            .unwrap_or(&self.name)
    }

    pub fn as_callable(&self) -> Option<&CallableDetails> {
        match &self.details {
            DefinitionDetails::Callable(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_callable_mut(&mut self) -> Option<&mut CallableDetails> {
        match &mut self.details {
            DefinitionDetails::Callable(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&TypeDetails> {
        match &self.details {
            DefinitionDetails::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&VariableDetails> {
        match &self.details {
            DefinitionDetails::Variable(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_import(&self) -> Option<&ImportDetails> {
        match &self.details {
            DefinitionDetails::Import(i) => Some(i),
            _ => None,
        }
    }
}

/// Reference kinds, matching the capture schema's `reference.*` entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Read,
    Write,
    Call,
    Type,
    Import,
    MemberAccess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    Function,
    Method,
    Constructor,
}

/// Receiver descriptor captured at parse time for method calls and member
/// accesses. Symbolic where possible; a raw expression span otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Receiver {
    /// An identifier receiver: `calc.add()`.
    Named(SymbolName),
    /// `this.m()` / `self.m()`.
    SelfInstance,
    /// A construction expression receiver: `new Foo().m()` / `Foo().m()`.
    Constructed(SymbolName),
    /// A call-expression receiver: `make().m()`, typed from the callee's
    /// return annotation when present.
    Call { callee: SymbolName },
    /// Anything else, kept as a raw span for diagnostics.
    Expression { text: Box<str>, location: Location },
}

/// A single reference occurrence inside a file, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub name: SymbolName,
    pub location: Location,
    pub scope_id: ScopeId,
    pub kind: ReferenceKind,
    /// Present iff `kind == Call`.
    pub call_type: Option<CallType>,
    /// Receiver descriptor for calls and member accesses.
    pub receiver: Option<Receiver>,
    /// For writes: the type constructed by the right-hand side, when
    /// recognizable. Drives reassignment-aware receiver typing.
    pub assigned_type: Option<SymbolName>,
}

impl Reference {
    pub fn new(name: &str, location: Location, scope_id: ScopeId, kind: ReferenceKind) -> Self {
        Self {
            name: name.into(),
            location,
            scope_id,
            kind,
            call_type: None,
            receiver: None,
            assigned_type: None,
        }
    }

    pub fn with_call(mut self, call_type: CallType, receiver: Option<Receiver>) -> Self {
        self.kind = ReferenceKind::Call;
        self.call_type = Some(call_type);
        self.receiver = receiver;
        self
    }

    pub fn with_receiver(mut self, receiver: Receiver) -> Self {
        self.receiver = Some(receiver);
        self
    }

    pub fn with_assigned_type(mut self, assigned_type: Option<SymbolName>) -> Self {
        self.assigned_type = assigned_type;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Method,
    Constructor,
    Property,
    Field,
    Getter,
    Setter,
}

/// One member of a declared type's member table, in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    pub name: SymbolName,
    pub kind: MemberKind,
    pub symbol_id: Option<SymbolId>,
    pub is_static: bool,
    pub parameters: Option<Vec<Parameter>>,
    pub type_annotation: Option<Box<str>>,
}

/// Per-type metadata built by the type preprocessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub type_id: TypeId,
    pub name: SymbolName,
    pub file_path: FilePath,
    pub symbol_id: SymbolId,
    pub kind: DefinitionKind,
    pub members: Vec<MemberInfo>,
    pub parents: Vec<SymbolName>,
    pub implements: Vec<SymbolName>,
}

impl TypeDescriptor {
    /// Look up a member by name, instance members before static.
    pub fn member(&self, name: &str) -> Option<&MemberInfo> {
        self.members
            .iter()
            .find(|m| m.name.as_ref() == name && !m.is_static)
            .or_else(|| self.members.iter().find(|m| m.name.as_ref() == name))
    }

    pub fn constructor(&self) -> Option<&MemberInfo> {
        self.members.iter().find(|m| m.kind == MemberKind::Constructor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FilePath;

    fn loc(sl: u32, sc: u32, el: u32, ec: u32) -> Location {
        Location::new(FilePath::new("a.ts"), sl, sc, el, ec)
    }

    fn module_scope() -> ScopeId {
        ScopeId::derive(ScopeKind::Module, &loc(1, 1, 50, 1))
    }

    #[test]
    fn test_definition_symbol_id_uses_full_node_location() {
        let def = Definition::new(DefinitionKind::Function, "helper", loc(3, 1, 5, 2), module_scope());
        assert_eq!(def.symbol_id.as_str(), "function:a.ts:3:1:helper");
    }

    #[test]
    fn test_exported_name_prefers_alias() {
        let def = Definition::new(DefinitionKind::Class, "Impl", loc(1, 1, 4, 2), module_scope())
            .exported(ExportInfo {
                export_name: Some("PublicName".into()),
                is_default: false,
                is_reexport: false,
            });
        assert!(def.is_exported);
        assert_eq!(def.exported_name(), "PublicName");

        let plain = Definition::new(DefinitionKind::Class, "Impl", loc(1, 1, 4, 2), module_scope());
        assert_eq!(plain.exported_name(), "Impl");
    }

    #[test]
    fn test_reference_call_builder() {
        let r = Reference::new("add", loc(7, 5, 7, 8), module_scope(), ReferenceKind::Read)
            .with_call(CallType::Method, Some(Receiver::Named("calc".into())));
        assert_eq!(r.kind, ReferenceKind::Call);
        assert_eq!(r.call_type, Some(CallType::Method));
        assert_eq!(r.receiver, Some(Receiver::Named("calc".into())));
    }

    #[test]
    fn test_type_descriptor_member_lookup_prefers_instance() {
        let td = TypeDescriptor {
            type_id: TypeId::derive("Foo", &FilePath::new("a.ts")),
            name: "Foo".into(),
            file_path: FilePath::new("a.ts"),
            symbol_id: SymbolId::derive(DefinitionKind::Class, &loc(1, 1, 9, 2), "Foo"),
            kind: DefinitionKind::Class,
            members: vec![
                MemberInfo {
                    name: "make".into(),
                    kind: MemberKind::Method,
                    symbol_id: None,
                    is_static: true,
                    parameters: None,
                    type_annotation: None,
                },
                MemberInfo {
                    name: "make".into(),
                    kind: MemberKind::Method,
                    symbol_id: None,
                    is_static: false,
                    parameters: None,
                    type_annotation: None,
                },
            ],
            parents: vec![],
            implements: vec![],
        };
        assert!(!td.member("make").unwrap().is_static);
        assert!(td.member("absent").is_none());
        assert!(td.constructor().is_none());
    }
}
