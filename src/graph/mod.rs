//! Call graph construction and entry-point detection.
//!
//! Nodes are callable definitions; every resolution of every call becomes
//! an edge, so polymorphic dispatch yields one edge per candidate with its
//! reason preserved. An entry point is a callable no non-callback call
//! edge targets.

use crate::resolution::{CallReference, ResolutionState};
use crate::storage::DefinitionRegistry;
use crate::types::{DefinitionKind, FilePath, KindClass, Location, SymbolId, SymbolName};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallGraphNode {
    pub symbol_id: SymbolId,
    pub name: SymbolName,
    pub kind: DefinitionKind,
    pub location: Location,
    pub is_test: bool,
    /// Unique callables transitively reachable from this node.
    pub tree_size: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallGraph {
    pub nodes: BTreeMap<SymbolId, CallGraphNode>,
    /// Caller symbol to the calls it makes. Module-level calls appear
    /// under no caller but still count against entry points.
    pub edges: BTreeMap<SymbolId, Vec<CallReference>>,
    pub entry_points: Vec<SymbolId>,
    pub indirect_reachability: BTreeSet<SymbolId>,
}

pub struct CallGraphBuilder;

impl CallGraphBuilder {
    pub fn build(
        definitions: &DefinitionRegistry,
        state: &ResolutionState,
        is_test_file: impl Fn(&FilePath) -> bool,
    ) -> CallGraph {
        let mut nodes: BTreeMap<SymbolId, CallGraphNode> = BTreeMap::new();
        for def in definitions.of_kind_class(KindClass::Callable) {
            nodes.insert(
                def.symbol_id.clone(),
                CallGraphNode {
                    symbol_id: def.symbol_id.clone(),
                    name: def.name.clone(),
                    kind: def.kind,
                    location: def.location.clone(),
                    is_test: is_test_file(&def.location.file_path),
                    tree_size: 0,
                },
            );
        }

        let mut edges: BTreeMap<SymbolId, Vec<CallReference>> = BTreeMap::new();
        let mut called: HashSet<SymbolId> = HashSet::new();
        let mut adjacency: HashMap<SymbolId, BTreeSet<SymbolId>> = HashMap::new();

        for (file, calls) in &state.resolved_calls_by_file {
            for call in calls {
                let caller = Self::enclosing_callable(definitions, file, &call.location);
                for resolution in &call.resolutions {
                    if !call.is_callback_invocation {
                        called.insert(resolution.symbol_id.clone());
                    }
                    if let Some(caller) = &caller {
                        adjacency
                            .entry(caller.clone())
                            .or_default()
                            .insert(resolution.symbol_id.clone());
                    }
                }
                if let Some(caller) = &caller {
                    edges.entry(caller.clone()).or_default().push(call.clone());
                }
            }
        }

        // A callable is an entry point iff no non-callback call edge
        // targets it.
        let entry_points: Vec<SymbolId> = nodes
            .keys()
            .filter(|id| !called.contains(*id))
            .cloned()
            .collect();

        let ids: Vec<SymbolId> = nodes.keys().cloned().collect();
        for id in ids {
            let size = Self::tree_size(&id, &adjacency);
            if let Some(node) = nodes.get_mut(&id) {
                node.tree_size = size;
            }
        }

        CallGraph {
            nodes,
            edges,
            entry_points,
            indirect_reachability: state.indirect_reachability(),
        }
    }

    /// Depth-first reachability with a visited set; counts unique callables
    /// reachable from (and excluding) the start node.
    fn tree_size(start: &SymbolId, adjacency: &HashMap<SymbolId, BTreeSet<SymbolId>>) -> u32 {
        let mut visited: HashSet<&SymbolId> = HashSet::new();
        let mut stack: Vec<&SymbolId> = adjacency
            .get(start)
            .map(|targets| targets.iter().collect())
            .unwrap_or_default();
        while let Some(current) = stack.pop() {
            if current == start || !visited.insert(current) {
                continue;
            }
            if let Some(next) = adjacency.get(current) {
                stack.extend(next.iter());
            }
        }
        visited.len() as u32
    }

    /// The innermost callable definition whose span contains the call.
    fn enclosing_callable(
        definitions: &DefinitionRegistry,
        file: &FilePath,
        location: &Location,
    ) -> Option<SymbolId> {
        definitions
            .in_file(file)
            .filter(|d| d.kind.is_callable() && d.location.contains(location))
            .min_by_key(|d| {
                (
                    d.location.end_line - d.location.start_line,
                    d.location.end_column,
                )
            })
            .map(|d| d.symbol_id.clone())
    }
}
