//! The type registry: descriptors, inheritance edges, and member lookup.
//!
//! Parent and interface *names* recorded by the type preprocessor are
//! resolved to `TypeId`s at write time against currently-known definitions.
//! Names that do not resolve yet are kept and re-resolved on subsequent
//! file updates, so out-of-order indexing converges.

use crate::symbol::{MemberInfo, TypeDescriptor};
use crate::types::{FilePath, SymbolName, TypeId};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

#[derive(Debug, Default, Clone)]
struct PendingNames {
    parents: Vec<SymbolName>,
    implements: Vec<SymbolName>,
}

#[derive(Debug, Default)]
pub struct TypeRegistry {
    descriptors: HashMap<TypeId, TypeDescriptor>,
    by_file: HashMap<FilePath, Vec<TypeId>>,
    parents: HashMap<TypeId, Vec<TypeId>>,
    interfaces: HashMap<TypeId, Vec<TypeId>>,
    implementers: HashMap<TypeId, BTreeSet<TypeId>>,
    unresolved: HashMap<TypeId, PendingNames>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, file_path: &FilePath, descriptors: &[TypeDescriptor]) {
        self.remove(file_path);
        let mut ids = Vec::with_capacity(descriptors.len());
        for td in descriptors {
            ids.push(td.type_id.clone());
            self.descriptors.insert(td.type_id.clone(), td.clone());
        }
        self.by_file.insert(file_path.clone(), ids);
    }

    pub fn remove(&mut self, file_path: &FilePath) {
        let Some(ids) = self.by_file.remove(file_path) else {
            return;
        };
        let removed: HashSet<TypeId> = ids.iter().cloned().collect();
        for id in &ids {
            self.descriptors.remove(id);
            self.parents.remove(id);
            self.interfaces.remove(id);
            self.implementers.remove(id);
            self.unresolved.remove(id);
        }
        // Edges into the removed file become unresolved again; the next
        // rebuild recomputes them from the retained name lists.
        for edges in self.parents.values_mut() {
            edges.retain(|t| !removed.contains(t));
        }
        for edges in self.interfaces.values_mut() {
            edges.retain(|t| !removed.contains(t));
        }
        for set in self.implementers.values_mut() {
            set.retain(|t| !removed.contains(t));
        }
    }

    /// Re-resolve every descriptor's parent and interface names. Called by
    /// the orchestrator after registry writes; `resolve` maps a name seen
    /// in a file to a `TypeId` using the file's definitions and imports.
    pub fn rebuild_edges<F>(&mut self, resolve: F)
    where
        F: Fn(&FilePath, &str) -> Option<TypeId>,
    {
        self.parents.clear();
        self.interfaces.clear();
        self.implementers.clear();
        self.unresolved.clear();

        for td in self.descriptors.values() {
            let mut pending = PendingNames::default();
            let mut parent_ids = Vec::new();
            for name in &td.parents {
                match resolve(&td.file_path, name) {
                    Some(id) => parent_ids.push(id),
                    None => pending.parents.push(name.clone()),
                }
            }
            let mut interface_ids = Vec::new();
            for name in &td.implements {
                match resolve(&td.file_path, name) {
                    Some(id) => interface_ids.push(id),
                    None => pending.implements.push(name.clone()),
                }
            }

            for interface in &interface_ids {
                self.implementers
                    .entry(interface.clone())
                    .or_default()
                    .insert(td.type_id.clone());
            }
            if !parent_ids.is_empty() {
                self.parents.insert(td.type_id.clone(), parent_ids);
            }
            if !interface_ids.is_empty() {
                self.interfaces.insert(td.type_id.clone(), interface_ids);
            }
            if !pending.parents.is_empty() || !pending.implements.is_empty() {
                self.unresolved.insert(td.type_id.clone(), pending);
            }
        }
    }

    pub fn descriptor(&self, id: &TypeId) -> Option<&TypeDescriptor> {
        self.descriptors.get(id)
    }

    pub fn parents_of(&self, id: &TypeId) -> &[TypeId] {
        self.parents.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn interfaces_of(&self, id: &TypeId) -> &[TypeId] {
        self.interfaces
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Known implementers of an interface, in deterministic order.
    pub fn implementers_of(&self, interface: &TypeId) -> Vec<TypeId> {
        self.implementers
            .get(interface)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Parent chain in breadth-first declared order, excluding the start,
    /// bounded by `max_depth` to break cycles among unresolved parents.
    pub fn inheritance_chain(&self, start: &TypeId, max_depth: u32) -> Vec<TypeId> {
        let mut chain = Vec::new();
        let mut visited: HashSet<TypeId> = HashSet::new();
        visited.insert(start.clone());
        let mut frontier: VecDeque<(TypeId, u32)> = VecDeque::new();
        frontier.push_back((start.clone(), 0));

        while let Some((current, depth)) = frontier.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for parent in self.parents_of(&current) {
                if visited.insert(parent.clone()) {
                    chain.push(parent.clone());
                    frontier.push_back((parent.clone(), depth + 1));
                }
            }
        }
        chain
    }

    /// All types whose inheritance chain reaches `ancestor`.
    pub fn subclasses_of(&self, ancestor: &TypeId, max_depth: u32) -> Vec<TypeId> {
        let mut out: Vec<TypeId> = self
            .descriptors
            .keys()
            .filter(|id| {
                *id != ancestor && self.inheritance_chain(id, max_depth).contains(ancestor)
            })
            .cloned()
            .collect();
        out.sort();
        out
    }

    /// Method lookup walking the inheritance chain: the member table of the
    /// receiver first, then parents level by level, stopping at the first
    /// level with matches. A multiple-inheritance level contributes every
    /// match at that depth, in declared order.
    pub fn lookup_member(
        &self,
        receiver: &TypeId,
        name: &str,
        max_depth: u32,
    ) -> Vec<(TypeId, MemberInfo)> {
        let mut level: Vec<TypeId> = vec![receiver.clone()];
        let mut visited: HashSet<TypeId> = HashSet::new();

        for _ in 0..=max_depth {
            let mut matches = Vec::new();
            let mut next_level = Vec::new();
            for type_id in &level {
                if !visited.insert(type_id.clone()) {
                    continue;
                }
                if let Some(td) = self.descriptors.get(type_id) {
                    if let Some(member) = td.member(name) {
                        matches.push((type_id.clone(), member.clone()));
                    }
                    next_level.extend(self.parents_of(type_id).iter().cloned());
                }
            }
            if !matches.is_empty() {
                return matches;
            }
            if next_level.is_empty() {
                return Vec::new();
            }
            level = next_level;
        }
        Vec::new()
    }

    pub fn in_file(&self, file_path: &FilePath) -> impl Iterator<Item = &TypeDescriptor> {
        self.by_file
            .get(file_path)
            .into_iter()
            .flatten()
            .filter_map(|id| self.descriptors.get(id))
    }

    pub fn has_unresolved(&self) -> bool {
        !self.unresolved.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::MemberKind;
    use crate::types::{DefinitionKind, Location, SymbolId};

    fn descriptor(file: &str, name: &str, parents: &[&str], methods: &[&str]) -> TypeDescriptor {
        let path = FilePath::new(file);
        let loc = Location::new(path.clone(), 1, 1, 10, 1);
        TypeDescriptor {
            type_id: TypeId::derive(name, &path),
            name: name.into(),
            file_path: path.clone(),
            symbol_id: SymbolId::derive(DefinitionKind::Class, &loc, name),
            kind: DefinitionKind::Class,
            members: methods
                .iter()
                .map(|m| MemberInfo {
                    name: (*m).into(),
                    kind: MemberKind::Method,
                    symbol_id: Some(SymbolId::derive(DefinitionKind::Method, &loc, m)),
                    is_static: false,
                    parameters: None,
                    type_annotation: None,
                })
                .collect(),
            parents: parents.iter().map(|p| (*p).into()).collect(),
            implements: Vec::new(),
        }
    }

    fn same_file_resolver(file: &str) -> impl Fn(&FilePath, &str) -> Option<TypeId> {
        let file = FilePath::new(file);
        move |_, name| Some(TypeId::derive(name, &file))
    }

    #[test]
    fn test_member_lookup_walks_chain() {
        let mut reg = TypeRegistry::new();
        let file = FilePath::new("a.ts");
        reg.update(
            &file,
            &[
                descriptor("a.ts", "Base", &[], &["handle"]),
                descriptor("a.ts", "Derived", &["Base"], &["run"]),
            ],
        );
        reg.rebuild_edges(same_file_resolver("a.ts"));

        let derived = TypeId::derive("Derived", &file);
        let base = TypeId::derive("Base", &file);

        // Own member first.
        let own = reg.lookup_member(&derived, "run", 32);
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].0, derived);

        // Inherited member found in Base.
        let inherited = reg.lookup_member(&derived, "handle", 32);
        assert_eq!(inherited.len(), 1);
        assert_eq!(inherited[0].0, base);

        assert!(reg.lookup_member(&derived, "absent", 32).is_empty());
    }

    #[test]
    fn test_inheritance_chain_order_and_cycles() {
        let mut reg = TypeRegistry::new();
        let file = FilePath::new("a.py");
        reg.update(
            &file,
            &[
                descriptor("a.py", "A", &["B", "C"], &[]),
                descriptor("a.py", "B", &["D"], &[]),
                descriptor("a.py", "C", &[], &[]),
                descriptor("a.py", "D", &["A"], &[]), // cycle back to A
            ],
        );
        reg.rebuild_edges(same_file_resolver("a.py"));

        let a = TypeId::derive("A", &file);
        let chain = reg.inheritance_chain(&a, 32);
        // Declared order, breadth-first, cycle broken by the visited set.
        assert_eq!(
            chain,
            vec![
                TypeId::derive("B", &file),
                TypeId::derive("C", &file),
                TypeId::derive("D", &file),
            ]
        );
    }

    #[test]
    fn test_unresolved_parents_retry() {
        let mut reg = TypeRegistry::new();
        let file = FilePath::new("a.ts");
        reg.update(&file, &[descriptor("a.ts", "Derived", &["Base"], &[])]);

        // Base is not known yet.
        reg.rebuild_edges(|_, _| None);
        assert!(reg.has_unresolved());
        assert!(reg.parents_of(&TypeId::derive("Derived", &file)).is_empty());

        // Base lands; the next rebuild resolves the edge.
        reg.rebuild_edges(same_file_resolver("a.ts"));
        assert!(!reg.has_unresolved());
        assert_eq!(
            reg.parents_of(&TypeId::derive("Derived", &file)),
            &[TypeId::derive("Base", &file)]
        );
    }

    #[test]
    fn test_subclasses_transitive() {
        let mut reg = TypeRegistry::new();
        let file = FilePath::new("a.ts");
        reg.update(
            &file,
            &[
                descriptor("a.ts", "Base", &[], &[]),
                descriptor("a.ts", "Mid", &["Base"], &[]),
                descriptor("a.ts", "Leaf", &["Mid"], &[]),
            ],
        );
        reg.rebuild_edges(same_file_resolver("a.ts"));

        let subs = reg.subclasses_of(&TypeId::derive("Base", &file), 32);
        assert_eq!(subs.len(), 2);
    }

    #[test]
    fn test_multiple_inheritance_equal_depth_matches() {
        let mut reg = TypeRegistry::new();
        let file = FilePath::new("a.py");
        reg.update(
            &file,
            &[
                descriptor("a.py", "Left", &[], &["go"]),
                descriptor("a.py", "Right", &[], &["go"]),
                descriptor("a.py", "Child", &["Left", "Right"], &[]),
            ],
        );
        reg.rebuild_edges(same_file_resolver("a.py"));

        let matches = reg.lookup_member(&TypeId::derive("Child", &file), "go", 32);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].0, TypeId::derive("Left", &file));
        assert_eq!(matches[1].0, TypeId::derive("Right", &file));
    }
}
