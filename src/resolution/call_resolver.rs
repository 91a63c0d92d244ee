//! Phase 2: type-aware call resolution.
//!
//! Dispatches every call reference by its call type: direct calls resolve
//! lexically (with constructor shorthand for class names), method calls
//! infer the receiver's type and walk member tables and inheritance chains
//! (fanning out over implementers for interface receivers), constructor
//! calls prefer an explicit constructor member and fall back to the class
//! symbol. Callback invocations through function-typed parameters and
//! collection dispatch feed the indirect reachability set.
//!
//! Output is deterministic for a registry snapshot: equal-confidence
//! targets are ordered by the target definition's position.

use crate::resolution::name_resolver::NameResolver;
use crate::resolution::state::{CallReference, Confidence, Resolution, ResolutionReason};
use crate::storage::{
    DefinitionRegistry, ExportRegistry, ImportGraph, ReferenceRegistry, ScopeRegistry,
    TypeRegistry,
};
use crate::symbol::{CallType, Definition, Receiver, Reference, ReferenceKind};
use crate::types::{
    DefinitionKind, FilePath, KindClass, Location, ScopeId, ScopeKind, SymbolId, SymbolName,
    TypeId,
};
use std::collections::BTreeSet;

/// What a method-call receiver turned out to be.
enum ReceiverTarget {
    /// A declared type: dispatch through its member table.
    Type(TypeId),
    /// A module handle: dispatch through the module's exports.
    Module(FilePath),
    /// A collection of callables: collection dispatch.
    Collection(SymbolId, Location),
}

pub struct FileCallResolution {
    pub calls: Vec<CallReference>,
    pub indirect: BTreeSet<SymbolId>,
}

pub struct CallResolver<'a> {
    definitions: &'a DefinitionRegistry,
    scopes: &'a ScopeRegistry,
    exports: &'a ExportRegistry,
    imports: &'a ImportGraph,
    types: &'a TypeRegistry,
    references: &'a ReferenceRegistry,
    names: &'a NameResolver<'a>,
    max_inheritance_depth: u32,
}

impl<'a> CallResolver<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        definitions: &'a DefinitionRegistry,
        scopes: &'a ScopeRegistry,
        exports: &'a ExportRegistry,
        imports: &'a ImportGraph,
        types: &'a TypeRegistry,
        references: &'a ReferenceRegistry,
        names: &'a NameResolver<'a>,
        max_inheritance_depth: u32,
    ) -> Self {
        Self {
            definitions,
            scopes,
            exports,
            imports,
            types,
            references,
            names,
            max_inheritance_depth,
        }
    }

    /// Resolve every call reference of one file, in source order.
    pub fn resolve_file(&self, file: &FilePath) -> FileCallResolution {
        let mut calls = Vec::new();
        let mut indirect = BTreeSet::new();

        for reference in self.references.in_file(file) {
            if reference.kind != ReferenceKind::Call {
                continue;
            }
            let call_type = reference.call_type.unwrap_or(CallType::Function);
            let (mut resolutions, is_callback) = match call_type {
                CallType::Function => self.resolve_function_call(reference, &mut indirect),
                CallType::Method => (self.resolve_method_call(reference, &mut indirect), false),
                CallType::Constructor => (self.resolve_constructor_call(reference), false),
            };
            self.order_resolutions(&mut resolutions);
            calls.push(CallReference {
                location: reference.location.clone(),
                name: reference.name.clone(),
                call_type,
                caller_scope_id: reference.scope_id.clone(),
                resolutions,
                is_callback_invocation: is_callback,
            });
        }

        FileCallResolution { calls, indirect }
    }

    /// Equal-confidence targets are ordered by the target definition's
    /// `(file, line, column)`.
    fn order_resolutions(&self, resolutions: &mut [Resolution]) {
        resolutions.sort_by(|a, b| {
            let key = |r: &Resolution| {
                let loc = self.definitions.get(&r.symbol_id).map(|d| &d.location);
                (
                    r.confidence,
                    loc.map(|l| l.file_path.clone()),
                    loc.map(|l| (l.start_line, l.start_column)),
                )
            };
            key(a).cmp(&key(b))
        });
    }

    // ----- (a) direct function calls -------------------------------------

    fn resolve_function_call(
        &self,
        reference: &Reference,
        indirect: &mut BTreeSet<SymbolId>,
    ) -> (Vec<Resolution>, bool) {
        let Some(symbol) = self.names.resolve(&reference.scope_id, &reference.name) else {
            tracing::debug!("[phase2] '{}' unresolved at {}", reference.name, reference.location);
            return (Vec::new(), false);
        };
        let Some(def) = self.definitions.get(&symbol) else {
            return (Vec::new(), false);
        };

        match def.kind.kind_class() {
            KindClass::Callable => (vec![direct(symbol)], false),
            KindClass::Type => {
                // Constructor shorthand: calling a class name constructs it.
                (self.constructor_resolutions(def), false)
            }
            KindClass::Value if def.kind == DefinitionKind::Parameter => {
                let resolutions = self.resolve_callback_invocation(reference, def, indirect);
                (resolutions, true)
            }
            _ => (Vec::new(), false),
        }
    }

    /// A call through a function-typed parameter. Targets are the concrete
    /// functions recorded as callback arguments to the enclosing callable.
    fn resolve_callback_invocation(
        &self,
        reference: &Reference,
        parameter: &Definition,
        indirect: &mut BTreeSet<SymbolId>,
    ) -> Vec<Resolution> {
        let file = &parameter.location.file_path;
        let Some(owner) = self.enclosing_callable(file, &parameter.location) else {
            return Vec::new();
        };
        let argument_index = owner.as_callable().and_then(|c| {
            c.parameters
                .iter()
                .position(|p| p.name == parameter.name)
                .map(|i| i as u32)
        });

        let mut resolutions = Vec::new();
        for candidate in self.definitions.of_kind_class(KindClass::Callable) {
            let Some(context) = candidate
                .as_callable()
                .and_then(|c| c.callback_context.as_ref())
            else {
                continue;
            };
            if !context.is_callback {
                continue;
            }
            let callee_matches = context.callee_name.as_deref() == Some(owner.name.as_ref());
            let index_matches = match (argument_index, context.argument_index) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            };
            if callee_matches && index_matches {
                indirect.insert(candidate.symbol_id.clone());
                resolutions.push(Resolution {
                    symbol_id: candidate.symbol_id.clone(),
                    confidence: Confidence::Probable,
                    reason: ResolutionReason::CollectionMember {
                        collection_id: parameter.symbol_id.clone(),
                        access_pattern: "callback".into(),
                    },
                });
            }
        }
        if resolutions.is_empty() {
            tracing::debug!(
                "[phase2] callback parameter '{}' has no recorded call sites",
                parameter.name
            );
        }
        resolutions
    }

    /// The innermost callable definition containing a location.
    fn enclosing_callable(&self, file: &FilePath, location: &Location) -> Option<&Definition> {
        self.definitions
            .in_file(file)
            .filter(|d| d.kind.is_callable() && d.location.contains(location))
            .min_by_key(|d| {
                (
                    d.location.end_line - d.location.start_line,
                    d.location.end_column,
                )
            })
    }

    // ----- (b) method calls ----------------------------------------------

    fn resolve_method_call(
        &self,
        reference: &Reference,
        indirect: &mut BTreeSet<SymbolId>,
    ) -> Vec<Resolution> {
        let Some(target) = self.infer_receiver(reference) else {
            tracing::debug!(
                "[phase2] receiver of '{}' at {} did not resolve",
                reference.name,
                reference.location
            );
            return Vec::new();
        };

        match target {
            ReceiverTarget::Type(type_id) => self.dispatch_on_type(&type_id, reference),
            ReceiverTarget::Module(file) => self
                .exports
                .resolve_export_chain(&file, &reference.name, self.imports)
                .map(|symbol| {
                    // A module member may itself be a class: calling it is
                    // constructor shorthand, as with direct calls.
                    match self.definitions.get(&symbol) {
                        Some(def) if def.kind.kind_class() == KindClass::Type => {
                            self.constructor_resolutions(def)
                        }
                        _ => vec![direct(symbol)],
                    }
                })
                .unwrap_or_default(),
            ReceiverTarget::Collection(collection_id, span) => {
                self.dispatch_on_collection(collection_id, span, reference, indirect)
            }
        }
    }

    /// Receiver type inference.
    fn infer_receiver(&self, reference: &Reference) -> Option<ReceiverTarget> {
        match reference.receiver.as_ref()? {
            Receiver::SelfInstance => self
                .enclosing_type_of_scope(&reference.scope_id)
                .map(ReceiverTarget::Type),
            Receiver::Named(name) => self.infer_named_receiver(name, reference),
            Receiver::Constructed(type_name) => self
                .resolve_type_name(&reference.scope_id, type_name)
                .map(ReceiverTarget::Type),
            Receiver::Call { callee } => {
                let symbol = self.names.resolve(&reference.scope_id, callee)?;
                let def = self.definitions.get(&symbol)?;
                let annotation = def.as_callable()?.return_type.as_deref()?;
                let base = crate::parsing::adapter::base_type_name(annotation);
                self.resolve_type_name(&reference.scope_id, &base)
                    .map(ReceiverTarget::Type)
            }
            Receiver::Expression { .. } => None,
        }
    }

    fn infer_named_receiver(
        &self,
        name: &str,
        reference: &Reference,
    ) -> Option<ReceiverTarget> {
        let symbol = self.names.resolve(&reference.scope_id, name)?;
        let def = self.definitions.get(&symbol)?;

        match def.kind {
            // Static dispatch on the type itself.
            DefinitionKind::Class | DefinitionKind::Interface | DefinitionKind::Enum => Some(
                ReceiverTarget::Type(TypeId::derive(&def.name, &def.location.file_path)),
            ),
            // Namespace / module-as-named imports dispatch through exports.
            DefinitionKind::Import => {
                let import = self
                    .imports
                    .import_named(&def.location.file_path, &def.name)?;
                import
                    .effective_target()
                    .cloned()
                    .map(ReceiverTarget::Module)
            }
            DefinitionKind::Variable | DefinitionKind::Property => {
                if let Some(type_name) = self.tracked_type_at(def, reference) {
                    if let Some(type_id) =
                        self.resolve_type_name(&reference.scope_id, &type_name)
                    {
                        return Some(ReceiverTarget::Type(type_id));
                    }
                }
                let has_members = def
                    .as_variable()
                    .is_some_and(|v| !v.collection_members.is_empty());
                if has_members {
                    return Some(ReceiverTarget::Collection(
                        def.symbol_id.clone(),
                        def.location.clone(),
                    ));
                }
                None
            }
            DefinitionKind::Parameter => {
                // Parameter definitions carry no payload; the annotation
                // lives on the owning callable's signature.
                let annotation = self
                    .enclosing_callable(&def.location.file_path, &def.location)
                    .and_then(|owner| owner.as_callable())
                    .and_then(|c| {
                        c.parameters
                            .iter()
                            .find(|p| p.name == def.name)
                            .and_then(|p| p.type_annotation.as_deref())
                    })?;
                let base = crate::parsing::adapter::base_type_name(annotation);
                self.resolve_type_name(&reference.scope_id, &base)
                    .map(ReceiverTarget::Type)
            }
            _ => None,
        }
    }

    /// The variable's type at the call location: the last preceding write
    /// in data-flow order, falling back to the initializer's constructed
    /// type and then the declared annotation.
    fn tracked_type_at(&self, variable: &Definition, call: &Reference) -> Option<SymbolName> {
        let file = &variable.location.file_path;
        let call_pos = (call.location.start_line, call.location.start_column);
        let mut best: Option<((u32, u32), SymbolName)> = None;

        let details = variable.as_variable();
        if let Some(value_type) = details.and_then(|v| v.value_type.clone()) {
            let def_pos = (variable.location.start_line, variable.location.start_column);
            if def_pos <= call_pos {
                best = Some((def_pos, value_type));
            }
        }

        for write in self.references.in_file(file) {
            if write.kind != ReferenceKind::Write || write.name != variable.name {
                continue;
            }
            let Some(assigned) = &write.assigned_type else {
                continue;
            };
            // The write must bind to the same variable, not a shadow.
            if self.names.resolve(&write.scope_id, &write.name) != Some(variable.symbol_id.clone())
            {
                continue;
            }
            let write_pos = (write.location.start_line, write.location.start_column);
            if write_pos <= call_pos && best.as_ref().is_none_or(|(pos, _)| *pos <= write_pos) {
                best = Some((write_pos, assigned.clone()));
            }
        }

        best.map(|(_, t)| t)
            .or_else(|| {
                details
                    .and_then(|v| v.type_annotation.as_deref())
                    .map(crate::parsing::adapter::base_type_name)
            })
    }

    /// Resolve a type name in scope to a declared type.
    fn resolve_type_name(&self, scope_id: &ScopeId, name: &str) -> Option<TypeId> {
        let symbol = self.names.resolve(scope_id, name)?;
        let def = self.definitions.get(&symbol)?;
        if def.kind.kind_class() != KindClass::Type {
            return None;
        }
        Some(TypeId::derive(&def.name, &def.location.file_path))
    }

    /// The type owning the nearest enclosing class scope: `this`/`self`.
    fn enclosing_type_of_scope(&self, scope_id: &ScopeId) -> Option<TypeId> {
        let class_scope = self.scopes.nearest_of_kind(scope_id, ScopeKind::Class)?;
        let file = &class_scope.location.file_path;

        // Innermost type definition whose span covers the class scope.
        let by_span = self
            .types
            .in_file(file)
            .filter_map(|td| {
                self.definitions
                    .get(&td.symbol_id)
                    .map(|d| (td.type_id.clone(), d))
            })
            .filter(|(_, d)| d.location.contains(&class_scope.location))
            .min_by_key(|(_, d)| {
                (
                    d.location.end_line - d.location.start_line,
                    d.location.end_column,
                )
            })
            .map(|(tid, _)| tid);
        if by_span.is_some() {
            return by_span;
        }

        // Impl blocks carry the type's name on the scope instead (the type
        // is declared elsewhere in the file).
        let name = class_scope.name.clone()?;
        self.types
            .in_file(file)
            .find(|td| td.name == name)
            .map(|td| td.type_id.clone())
            .or_else(|| self.resolve_type_name(scope_id, &name))
    }

    /// Member lookup with inheritance walking and
    /// interface fan-out.
    fn dispatch_on_type(&self, type_id: &TypeId, reference: &Reference) -> Vec<Resolution> {
        let Some(descriptor) = self.types.descriptor(type_id) else {
            return Vec::new();
        };

        if descriptor.kind == DefinitionKind::Interface {
            let implementers = self.types.implementers_of(type_id);
            if !implementers.is_empty() {
                let mut resolutions = Vec::new();
                for implementer in implementers {
                    for (_, member) in
                        self.types
                            .lookup_member(&implementer, &reference.name, self.max_inheritance_depth)
                    {
                        if let Some(symbol) = member.symbol_id {
                            resolutions.push(Resolution {
                                symbol_id: symbol,
                                confidence: Confidence::Probable,
                                reason: ResolutionReason::InterfaceImplementation {
                                    interface_id: type_id.clone(),
                                },
                            });
                        }
                    }
                }
                return resolutions;
            }
            // No implementers known: the interface's own signature is the
            // best available target.
            return self
                .types
                .lookup_member(type_id, &reference.name, self.max_inheritance_depth)
                .into_iter()
                .filter_map(|(_, member)| member.symbol_id)
                .map(|symbol| Resolution {
                    symbol_id: symbol,
                    confidence: Confidence::Possible,
                    reason: ResolutionReason::Direct,
                })
                .collect();
        }

        self.types
            .lookup_member(type_id, &reference.name, self.max_inheritance_depth)
            .into_iter()
            .filter_map(|(_, member)| member.symbol_id)
            .map(direct)
            .collect()
    }

    /// Collection dispatch.
    fn dispatch_on_collection(
        &self,
        collection_id: SymbolId,
        collection_span: Location,
        reference: &Reference,
        indirect: &mut BTreeSet<SymbolId>,
    ) -> Vec<Resolution> {
        // A subscript access was recorded with the collection's own name;
        // a member access names the member.
        let subscript = reference
            .receiver
            .as_ref()
            .is_some_and(|r| matches!(r, Receiver::Named(n) if *n == reference.name));
        let access_pattern: Box<str> = if subscript { "subscript".into() } else { "member".into() };

        let file = &collection_span.file_path;
        let mut resolutions = Vec::new();
        for def in self.definitions.in_file(file) {
            if !def.kind.is_callable() || !collection_span.contains(&def.location) {
                continue;
            }
            if !subscript && def.name != reference.name {
                continue;
            }
            indirect.insert(def.symbol_id.clone());
            resolutions.push(Resolution {
                symbol_id: def.symbol_id.clone(),
                confidence: Confidence::Probable,
                reason: ResolutionReason::CollectionMember {
                    collection_id: collection_id.clone(),
                    access_pattern: access_pattern.clone(),
                },
            });
        }
        resolutions
    }

    // ----- (c) constructor calls -----------------------------------------

    fn resolve_constructor_call(&self, reference: &Reference) -> Vec<Resolution> {
        let class_symbol = match reference.receiver.as_ref() {
            // `new ns.T(...)`: the class comes from a module handle.
            Some(Receiver::Named(ns)) => {
                let symbol = self.names.resolve(&reference.scope_id, ns);
                let import_file = symbol
                    .as_ref()
                    .and_then(|s| self.definitions.get(s))
                    .filter(|d| d.kind == DefinitionKind::Import)
                    .and_then(|d| {
                        self.imports
                            .import_named(&d.location.file_path, &d.name)
                            .and_then(|i| i.effective_target().cloned())
                    });
                match import_file {
                    Some(file) => {
                        self.exports
                            .resolve_export_chain(&file, &reference.name, self.imports)
                    }
                    None => self.names.resolve(&reference.scope_id, &reference.name),
                }
            }
            _ => self.names.resolve(&reference.scope_id, &reference.name),
        };
        let Some(class_symbol) = class_symbol else {
            return Vec::new();
        };
        let Some(def) = self.definitions.get(&class_symbol) else {
            return Vec::new();
        };

        match def.kind.kind_class() {
            KindClass::Type => self.constructor_resolutions(def),
            // `new` applied to an imported factory function still targets
            // the callable.
            KindClass::Callable => vec![direct(class_symbol)],
            _ => Vec::new(),
        }
    }

    /// A class's constructor member when declared, else the class symbol
    /// itself (implicit default constructor), uniformly across languages.
    fn constructor_resolutions(&self, class_def: &Definition) -> Vec<Resolution> {
        let type_id = TypeId::derive(&class_def.name, &class_def.location.file_path);
        let constructor = self
            .types
            .descriptor(&type_id)
            .and_then(|td| td.constructor())
            .and_then(|m| m.symbol_id.clone());
        match constructor {
            Some(symbol) => vec![direct(symbol)],
            None => vec![direct(class_def.symbol_id.clone())],
        }
    }
}

fn direct(symbol_id: SymbolId) -> Resolution {
    Resolution {
        symbol_id,
        confidence: Confidence::Certain,
        reason: ResolutionReason::Direct,
    }
}
