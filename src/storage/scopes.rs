//! The merged scope registry.
//!
//! Every file's scope tree, merged into one table. Scopes stay file-local;
//! no scope has a parent in another file.

use crate::symbol::LexicalScope;
use crate::types::{FilePath, Location, ScopeId, ScopeKind};
use indexmap::IndexMap;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct ScopeRegistry {
    scopes: HashMap<ScopeId, LexicalScope>,
    by_file: HashMap<FilePath, Vec<ScopeId>>,
    roots: HashMap<FilePath, ScopeId>,
}

impl ScopeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(
        &mut self,
        file_path: &FilePath,
        root_id: &ScopeId,
        scopes: &IndexMap<ScopeId, LexicalScope>,
    ) {
        self.remove(file_path);
        let mut ids = Vec::with_capacity(scopes.len());
        for (id, scope) in scopes {
            ids.push(id.clone());
            self.scopes.insert(id.clone(), scope.clone());
        }
        self.by_file.insert(file_path.clone(), ids);
        self.roots.insert(file_path.clone(), root_id.clone());
    }

    pub fn remove(&mut self, file_path: &FilePath) {
        if let Some(ids) = self.by_file.remove(file_path) {
            for id in ids {
                self.scopes.remove(&id);
            }
        }
        self.roots.remove(file_path);
    }

    pub fn get(&self, id: &ScopeId) -> Option<&LexicalScope> {
        self.scopes.get(id)
    }

    pub fn root_of(&self, file_path: &FilePath) -> Option<&ScopeId> {
        self.roots.get(file_path)
    }

    pub fn parent_of(&self, id: &ScopeId) -> Option<&ScopeId> {
        self.scopes.get(id).and_then(|s| s.parent_id.as_ref())
    }

    /// Walk from a scope to its file's root, inclusive.
    pub fn ancestors<'a>(&'a self, from: &ScopeId) -> impl Iterator<Item = &'a LexicalScope> {
        let mut current = self.scopes.get(from);
        std::iter::from_fn(move || {
            let scope = current.take()?;
            current = scope.parent_id.as_ref().and_then(|p| self.scopes.get(p));
            Some(scope)
        })
    }

    /// Nearest enclosing scope of `kind`, starting at `from` itself.
    pub fn nearest_of_kind(&self, from: &ScopeId, kind: ScopeKind) -> Option<&LexicalScope> {
        self.ancestors(from).find(|s| s.kind == kind)
    }

    /// The innermost scope of a file containing a 1-based position.
    pub fn innermost_at(&self, file_path: &FilePath, line: u32, column: u32) -> Option<ScopeId> {
        let mut current = self.roots.get(file_path)?.clone();
        loop {
            let scope = self.scopes.get(&current)?;
            let next = scope.children.iter().find(|child| {
                self.scopes
                    .get(child)
                    .is_some_and(|c| c.location.contains_position(line, column))
            });
            match next {
                Some(child) => current = child.clone(),
                None => return Some(current),
            }
        }
    }

    pub fn in_file(&self, file_path: &FilePath) -> impl Iterator<Item = &LexicalScope> {
        self.by_file
            .get(file_path)
            .into_iter()
            .flatten()
            .filter_map(|id| self.scopes.get(id))
    }

    /// Whether the scope's span (and file) matches `location` exactly.
    pub fn scope_with_location(&self, location: &Location) -> Option<&LexicalScope> {
        self.in_file(&location.file_path)
            .find(|s| s.location == *location)
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_for(file: &str) -> (ScopeId, IndexMap<ScopeId, LexicalScope>) {
        let path = FilePath::new(file);
        let module_span = Location::new(path.clone(), 1, 1, 100, 1);
        let fn_span = Location::new(path.clone(), 2, 10, 10, 2);

        let mut root = LexicalScope::new(ScopeKind::Module, module_span, None);
        let mut func = LexicalScope::new(ScopeKind::Function, fn_span, Some("f".into()));
        func.parent_id = Some(root.id.clone());
        root.children.push(func.id.clone());

        let root_id = root.id.clone();
        let mut scopes = IndexMap::new();
        scopes.insert(root.id.clone(), root);
        scopes.insert(func.id.clone(), func);
        (root_id, scopes)
    }

    #[test]
    fn test_merge_and_navigate() {
        let mut reg = ScopeRegistry::new();
        let a = FilePath::new("a.ts");
        let b = FilePath::new("b.ts");
        let (root_a, scopes_a) = tree_for("a.ts");
        let (root_b, scopes_b) = tree_for("b.ts");
        reg.update(&a, &root_a, &scopes_a);
        reg.update(&b, &root_b, &scopes_b);

        assert_eq!(reg.len(), 4);
        assert_eq!(reg.root_of(&a), Some(&root_a));

        // Position lookup stays file-local.
        let inner = reg.innermost_at(&a, 5, 1).unwrap();
        assert_eq!(reg.get(&inner).unwrap().kind, ScopeKind::Function);
        assert_eq!(reg.ancestors(&inner).count(), 2);
        assert!(
            reg.nearest_of_kind(&inner, ScopeKind::Module).is_some()
        );

        reg.remove(&a);
        assert_eq!(reg.len(), 2);
        assert!(reg.root_of(&a).is_none());
        assert!(reg.innermost_at(&a, 5, 1).is_none());
        // The other file is untouched.
        assert!(reg.root_of(&b).is_some());
    }
}
