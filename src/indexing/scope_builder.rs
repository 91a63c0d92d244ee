//! Scope tree construction (pass 1).
//!
//! Consumes scope boundaries from the language adapter and builds the
//! file's lexical scope tree by strict containment. Any two scopes are
//! either disjoint or one contains the other; violations are recovered by
//! detaching the scope to the root and reporting.

use crate::error::Diagnostic;
use crate::parsing::ScopeBoundary;
use crate::symbol::LexicalScope;
use crate::types::{FilePath, Location, ScopeId, ScopeKind};
use indexmap::IndexMap;

/// A file's completed scope tree with position lookup.
#[derive(Debug, Clone)]
pub struct ScopeTree {
    pub root_id: ScopeId,
    pub scopes: IndexMap<ScopeId, LexicalScope>,
}

impl ScopeTree {
    pub fn scope(&self, id: &ScopeId) -> Option<&LexicalScope> {
        self.scopes.get(id)
    }

    /// The innermost scope containing a 1-based position. Falls back to the
    /// root when the position is outside every child.
    pub fn innermost_at(&self, line: u32, column: u32) -> ScopeId {
        let mut current = self.root_id.clone();
        loop {
            let scope = &self.scopes[&current];
            let next = scope.children.iter().find(|child_id| {
                self.scopes[*child_id]
                    .location
                    .contains_position(line, column)
            });
            match next {
                Some(child_id) => current = child_id.clone(),
                None => return current,
            }
        }
    }

    /// The innermost scope containing a location's start position.
    pub fn innermost_containing(&self, location: &Location) -> ScopeId {
        self.innermost_at(location.start_line, location.start_column)
    }

    /// The scope whose span equals `location` exactly, regardless of kind.
    /// Used to bind parameters into the scope their callable created.
    pub fn scope_with_location(&self, location: &Location) -> Option<ScopeId> {
        self.scopes
            .values()
            .find(|s| s.location == *location)
            .map(|s| s.id.clone())
    }

    /// Walk from a scope to the root, yielding each scope id in order.
    pub fn ancestors<'a>(&'a self, from: &ScopeId) -> impl Iterator<Item = ScopeId> + 'a {
        let mut current = Some(from.clone());
        std::iter::from_fn(move || {
            let id = current.take()?;
            current = self
                .scopes
                .get(&id)
                .and_then(|s| s.parent_id.clone());
            Some(id)
        })
    }

    /// Nearest enclosing scope of the given kind, starting at `from` itself.
    pub fn nearest_of_kind(&self, from: &ScopeId, kind: ScopeKind) -> Option<ScopeId> {
        self.ancestors(from)
            .find(|id| self.scopes.get(id).is_some_and(|s| s.kind == kind))
    }
}

/// Builds the scope tree from adapter-provided boundaries.
pub struct ScopeBuilder;

impl ScopeBuilder {
    /// `file_span` is the whole-file location used for the module root.
    pub fn build(
        file_path: &FilePath,
        file_span: Location,
        mut boundaries: Vec<ScopeBoundary>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> ScopeTree {
        let root = LexicalScope::new(ScopeKind::Module, file_span, None);
        let root_id = root.id.clone();
        let mut scopes = IndexMap::new();
        scopes.insert(root_id.clone(), root);
        let mut tree = ScopeTree {
            root_id: root_id.clone(),
            scopes,
        };

        // Outer scopes first, so every scope's ancestors exist when it is
        // inserted.
        boundaries.sort_by_key(|b| {
            (
                b.scope_location.start_line,
                b.scope_location.start_column,
                std::cmp::Reverse((b.scope_location.end_line, b.scope_location.end_column)),
            )
        });

        for boundary in boundaries {
            let id = ScopeId::derive(boundary.kind, &boundary.scope_location);
            if tree.scopes.contains_key(&id) {
                continue;
            }

            // Attach at the innermost scope containing the symbol location
            // (the name belongs to the parent scope); anonymous scopes
            // anchor at their own start.
            let anchor = boundary
                .symbol_location
                .as_ref()
                .unwrap_or(&boundary.scope_location);
            let mut parent_id = tree.innermost_at(anchor.start_line, anchor.start_column);

            // The parent must contain the whole scope span; walk out until
            // one does, detaching to root if the tree is inconsistent.
            while parent_id != tree.root_id {
                let parent = &tree.scopes[&parent_id];
                if parent.location.contains(&boundary.scope_location) {
                    break;
                }
                let next = parent.parent_id.clone();
                match next {
                    Some(p) => parent_id = p,
                    None => break,
                }
            }
            if parent_id == tree.root_id
                && !tree.scopes[&tree.root_id]
                    .location
                    .contains(&boundary.scope_location)
            {
                tracing::warn!(
                    "scope at {} falls outside the module span of {file_path}; detaching to root",
                    boundary.scope_location
                );
                diagnostics.push(Diagnostic::InvariantViolation {
                    detail: format!("scope at {} not contained in module span", boundary.scope_location),
                    scope_id: Some(id.clone()),
                });
            }

            let mut scope = LexicalScope::new(boundary.kind, boundary.scope_location, boundary.name);
            scope.parent_id = Some(parent_id.clone());
            tree.scopes[&parent_id].children.push(id.clone());
            tree.scopes.insert(id, scope);
        }

        tree
    }
}
