//! Resolution output types and the immutable resolution snapshot.

use crate::symbol::CallType;
use crate::types::{FilePath, Location, ScopeId, SymbolId, SymbolName, TypeId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// How sure the resolver is about one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Certain,
    Probable,
    Possible,
}

/// Why a call resolved to a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ResolutionReason {
    Direct,
    InterfaceImplementation {
        interface_id: TypeId,
    },
    CollectionMember {
        collection_id: SymbolId,
        access_pattern: Box<str>,
    },
    HeuristicMatch {
        score: u32,
    },
}

/// One resolved target of a call. A call carries zero, one, or many;
/// several targets express polymorphic dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub symbol_id: SymbolId,
    pub confidence: Confidence,
    pub reason: ResolutionReason,
}

/// A call reference with its resolved targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallReference {
    pub location: Location,
    pub name: SymbolName,
    pub call_type: CallType,
    pub caller_scope_id: ScopeId,
    pub resolutions: Vec<Resolution>,
    pub is_callback_invocation: bool,
}

/// Phase 1 and Phase 2 output for the whole project. Immutable once built;
/// the orchestrator swaps in a fresh snapshot after each update.
#[derive(Debug, Clone, Default)]
pub struct ResolutionState {
    /// Phase 1: per-scope lexical name resolutions.
    pub resolutions_by_scope: HashMap<ScopeId, HashMap<SymbolName, SymbolId>>,
    /// Phase 2: resolved calls, per file, in source order.
    pub resolved_calls_by_file: BTreeMap<FilePath, Vec<CallReference>>,
    /// Derived index: calls grouped by the scope making them.
    pub calls_by_caller_scope: HashMap<ScopeId, Vec<CallReference>>,
    /// Callables reachable through callback or collection dispatch, keyed
    /// by the file whose calls discovered them so eviction stays
    /// file-scoped.
    pub indirect_by_file: BTreeMap<FilePath, BTreeSet<SymbolId>>,
}

impl ResolutionState {
    /// Drop every entry derived from the given files; used when rebuilding
    /// the affected subset after an update.
    pub fn evict_files(&mut self, files: &BTreeSet<FilePath>) {
        self.resolutions_by_scope
            .retain(|scope, _| !files.iter().any(|f| scope_belongs_to(scope, f)));
        for file in files {
            self.resolved_calls_by_file.remove(file);
            self.indirect_by_file.remove(file);
        }
        self.calls_by_caller_scope
            .retain(|scope, _| !files.iter().any(|f| scope_belongs_to(scope, f)));
    }

    pub fn insert_file_calls(
        &mut self,
        file: FilePath,
        calls: Vec<CallReference>,
        indirect: BTreeSet<SymbolId>,
    ) {
        for call in &calls {
            self.calls_by_caller_scope
                .entry(call.caller_scope_id.clone())
                .or_default()
                .push(call.clone());
        }
        if !indirect.is_empty() {
            self.indirect_by_file.insert(file.clone(), indirect);
        }
        self.resolved_calls_by_file.insert(file, calls);
    }

    pub fn calls_in_file(&self, file: &FilePath) -> &[CallReference] {
        self.resolved_calls_by_file
            .get(file)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The union of every file's callback/collection dispatch targets.
    pub fn indirect_reachability(&self) -> BTreeSet<SymbolId> {
        self.indirect_by_file
            .values()
            .flat_map(|s| s.iter().cloned())
            .collect()
    }
}

/// Scope ids embed their file path; membership checks parse it back out.
fn scope_belongs_to(scope: &ScopeId, file: &FilePath) -> bool {
    let s = scope.as_str();
    // Format: kind:file:start_line:start_col:end_line:end_col
    s.split(':')
        .nth(1)
        .is_some_and(|embedded| embedded == file.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Location, ScopeKind};

    #[test]
    fn test_scope_belongs_to() {
        let file = FilePath::new("src/a.ts");
        let scope = ScopeId::derive(
            ScopeKind::Module,
            &Location::new(file.clone(), 1, 1, 10, 1),
        );
        assert!(scope_belongs_to(&scope, &file));
        assert!(!scope_belongs_to(&scope, &FilePath::new("src/b.ts")));
    }

    #[test]
    fn test_confidence_ordering() {
        assert!(Confidence::Certain < Confidence::Probable);
        assert!(Confidence::Probable < Confidence::Possible);
    }
}
