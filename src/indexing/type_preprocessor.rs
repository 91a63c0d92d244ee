//! Type metadata extraction (pass 4).
//!
//! Builds a `TypeDescriptor` for every class, interface, and enum in the
//! file: an ordered member table plus the declared parent and interface
//! name lists. Names are resolved to `TypeId`s later, at registry write
//! time, so unresolved parents can be retried when imports land.

use crate::indexing::ScopeTree;
use crate::symbol::{Definition, MemberInfo, MemberKind, TypeDescriptor};
use crate::types::{DefinitionKind, FilePath, ScopeKind, SymbolId, TypeId};
use std::collections::HashMap;

pub struct TypePreprocessor;

impl TypePreprocessor {
    pub fn build(
        file_path: &FilePath,
        definitions: &[Definition],
        scopes: &ScopeTree,
    ) -> Vec<TypeDescriptor> {
        let type_defs: Vec<&Definition> = definitions
            .iter()
            .filter(|d| {
                matches!(
                    d.kind,
                    DefinitionKind::Class | DefinitionKind::Interface | DefinitionKind::Enum
                )
            })
            .collect();
        if type_defs.is_empty() {
            return Vec::new();
        }

        let mut members: HashMap<SymbolId, Vec<(&Definition, MemberKind)>> = HashMap::new();
        for def in definitions {
            let member_kind = match def.kind {
                DefinitionKind::Method => MemberKind::Method,
                DefinitionKind::Constructor => MemberKind::Constructor,
                DefinitionKind::Property => MemberKind::Property,
                _ => continue,
            };
            if let Some(owner) = Self::owning_type(def, &type_defs, scopes) {
                members
                    .entry(owner.symbol_id.clone())
                    .or_default()
                    .push((def, member_kind));
            }
        }

        type_defs
            .iter()
            .map(|type_def| {
                let mut member_defs = members.remove(&type_def.symbol_id).unwrap_or_default();
                member_defs.sort_by_key(|(d, _)| {
                    (d.location.start_line, d.location.start_column)
                });
                let details = type_def.as_type();
                TypeDescriptor {
                    type_id: TypeId::derive(&type_def.name, file_path),
                    name: type_def.name.clone(),
                    file_path: file_path.clone(),
                    symbol_id: type_def.symbol_id.clone(),
                    kind: type_def.kind,
                    members: member_defs
                        .into_iter()
                        .map(|(d, k)| Self::member_info(d, k))
                        .collect(),
                    parents: details.map(|t| t.inherits.clone()).unwrap_or_default(),
                    implements: details.map(|t| t.implements.clone()).unwrap_or_default(),
                }
            })
            .collect()
    }

    /// The class a member belongs to: the recorded enclosing type name when
    /// the adapter provided one (required for Rust impl blocks, whose type
    /// is declared elsewhere), otherwise the innermost class scope
    /// containing the member.
    fn owning_type<'a>(
        member: &Definition,
        type_defs: &[&'a Definition],
        scopes: &ScopeTree,
    ) -> Option<&'a Definition> {
        if let Some(enclosing) = member
            .as_callable()
            .and_then(|c| c.enclosing_type.as_ref())
        {
            if let Some(owner) = type_defs.iter().find(|t| t.name == *enclosing) {
                return Some(owner);
            }
        }

        let class_scope_id = scopes.nearest_of_kind(&member.defining_scope_id, ScopeKind::Class)?;
        let class_scope = scopes.scope(&class_scope_id)?;
        // Innermost type definition whose span covers the class scope.
        type_defs
            .iter()
            .filter(|t| t.location.contains(&class_scope.location))
            .min_by_key(|t| {
                (
                    t.location.end_line - t.location.start_line,
                    t.location.end_column,
                )
            })
            .copied()
    }

    fn member_info(def: &Definition, kind: MemberKind) -> MemberInfo {
        let callable = def.as_callable();
        MemberInfo {
            name: def.name.clone(),
            kind,
            symbol_id: Some(def.symbol_id.clone()),
            is_static: callable.map(|c| c.is_static).unwrap_or(false),
            parameters: callable.map(|c| c.parameters.clone()),
            type_annotation: def
                .as_variable()
                .and_then(|v| v.type_annotation.clone())
                .or_else(|| callable.and_then(|c| c.return_type.clone())),
        }
    }
}
