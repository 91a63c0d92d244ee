//! Universal invariants: idempotence, file isolation, scope containment,
//! determinism, export chain termination, entry-point correctness.

use ariadne::{DefinitionKind, Project};
use std::collections::HashMap;

fn project_with(files: &[(&str, &str)]) -> Project {
    let mut project = Project::new();
    for (path, source) in files {
        project.update_file(path, source).unwrap();
    }
    project
}

const BARREL_FILES: &[(&str, &str)] = &[
    ("original.ts", "export function helper() {}\n"),
    ("index.ts", "export { helper } from \"./original\";\n"),
    (
        "consumer.ts",
        "import { helper } from \"./index\";\nhelper();\n",
    ),
];

#[test]
fn repeated_update_is_idempotent() {
    let once = project_with(BARREL_FILES);

    let mut twice = project_with(BARREL_FILES);
    for (path, source) in BARREL_FILES {
        twice.update_file(path, source).unwrap();
    }

    for (path, _) in BARREL_FILES {
        assert_eq!(once.get_definitions(path), twice.get_definitions(path));
        assert_eq!(once.resolved_calls(path), twice.resolved_calls(path));
    }
    assert_eq!(
        once.get_call_graph().entry_points,
        twice.get_call_graph().entry_points
    );
    assert_eq!(once.indexed_files(), twice.indexed_files());
}

#[test]
fn removal_erases_every_trace() {
    let mut project = project_with(BARREL_FILES);
    let helper_id = project
        .get_definitions("original.ts")
        .into_iter()
        .find(|d| d.name.as_ref() == "helper")
        .unwrap()
        .symbol_id;

    project.remove_file("original.ts").unwrap();

    assert!(project.get_definition(&helper_id).is_none());
    assert!(!project
        .indexed_files()
        .contains(&ariadne::FilePath::new("original.ts")));
    assert!(project.find_references(&helper_id).is_empty());

    // The consumer's call no longer resolves to the removed symbol.
    for (path, _) in BARREL_FILES {
        for call in project.resolved_calls(path) {
            assert!(
                call.resolutions.iter().all(|r| r.symbol_id != helper_id),
                "stale resolution to removed file in {path}"
            );
        }
    }

    // The call graph carries no node for the removed symbol.
    let graph = project.get_call_graph();
    assert!(!graph.nodes.contains_key(&helper_id));
}

#[test]
fn readding_restores_resolution() {
    let mut project = project_with(BARREL_FILES);
    project.remove_file("original.ts").unwrap();
    project
        .update_file("original.ts", "export function helper() {}\n")
        .unwrap();

    let helper_id = project
        .get_definitions("original.ts")
        .into_iter()
        .find(|d| d.name.as_ref() == "helper")
        .unwrap()
        .symbol_id;
    let calls = project.resolved_calls("consumer.ts");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].resolutions.len(), 1);
    assert_eq!(calls[0].resolutions[0].symbol_id, helper_id);
}

#[test]
fn scopes_form_a_containment_tree() {
    let project = project_with(&[(
        "app.py",
        "def outer():\n    def inner():\n        pass\n    class Local:\n        def method(self):\n            pass\n    return inner\n",
    )]);

    let scopes = project.get_scope_tree("app.py");
    assert!(scopes.len() >= 4);

    let by_id: HashMap<_, _> = scopes.iter().map(|s| (s.id.clone(), s)).collect();
    let mut roots = 0;
    for scope in &scopes {
        match &scope.parent_id {
            Some(parent_id) => {
                let parent = by_id.get(parent_id).expect("parent scope exists");
                assert!(
                    parent.location.contains(&scope.location),
                    "scope {} not contained in its parent",
                    scope.id
                );
                assert!(parent.children.contains(&scope.id));
            }
            None => roots += 1,
        }
    }
    assert_eq!(roots, 1);
}

#[test]
fn resolution_is_deterministic_across_instances() {
    let a = project_with(&[(
        "a.ts",
        "interface H { go(): void }\nclass X implements H { go() {} }\nclass Y implements H { go() {} }\nfunction run(h: H) { h.go(); }\n",
    )]);
    let b = project_with(&[(
        "a.ts",
        "interface H { go(): void }\nclass X implements H { go() {} }\nclass Y implements H { go() {} }\nfunction run(h: H) { h.go(); }\n",
    )]);

    assert_eq!(a.resolved_calls("a.ts"), b.resolved_calls("a.ts"));
    let ga = a.get_call_graph();
    let gb = b.get_call_graph();
    assert_eq!(ga.entry_points, gb.entry_points);
    assert_eq!(
        ga.nodes.keys().collect::<Vec<_>>(),
        gb.nodes.keys().collect::<Vec<_>>()
    );
}

#[test]
fn export_cycle_terminates_with_no_resolution() {
    let project = project_with(&[
        ("a.ts", "export { x } from \"./b\";\n"),
        ("b.ts", "export { x } from \"./a\";\n"),
        ("c.ts", "import { x } from \"./a\";\nx();\n"),
    ]);

    let calls = project.resolved_calls("c.ts");
    assert_eq!(calls.len(), 1);
    assert!(calls[0].resolutions.is_empty());
}

#[test]
fn exported_class_round_trip() {
    let project = project_with(&[(
        "f.ts",
        "export class C {\n  constructor() {}\n}\n",
    )]);

    let class_def = project
        .get_definitions("f.ts")
        .into_iter()
        .find(|d| d.name.as_ref() == "C")
        .unwrap();
    let exports = project.get_exports("f.ts");
    let entry = exports.iter().find(|e| e.name.as_ref() == "C").unwrap();
    assert_eq!(
        entry.definition.as_ref().map(|d| &d.symbol_id),
        Some(&class_def.symbol_id)
    );
}

#[test]
fn entry_point_iff_no_incoming_call_edge() {
    let project = project_with(&[(
        "a.ts",
        "function a() { b(); }\nfunction b() { c(); }\nfunction c() {}\nfunction orphan() {}\n",
    )]);

    let graph = project.get_call_graph();
    let id_of = |name: &str| {
        project
            .get_definitions("a.ts")
            .into_iter()
            .find(|d| d.name.as_ref() == name)
            .unwrap()
            .symbol_id
    };

    assert!(graph.entry_points.contains(&id_of("a")));
    assert!(graph.entry_points.contains(&id_of("orphan")));
    assert!(!graph.entry_points.contains(&id_of("b")));
    assert!(!graph.entry_points.contains(&id_of("c")));

    // Tree sizes: a reaches b and c; b reaches c; leaves reach nothing.
    assert_eq!(graph.nodes[&id_of("a")].tree_size, 2);
    assert_eq!(graph.nodes[&id_of("b")].tree_size, 1);
    assert_eq!(graph.nodes[&id_of("c")].tree_size, 0);
    assert_eq!(graph.nodes[&id_of("orphan")].tree_size, 0);
}

#[test]
fn find_references_covers_calls_and_reads() {
    let project = project_with(&[(
        "a.ts",
        "function helper() {}\nfunction main() {\n  helper();\n  const alias = helper;\n}\n",
    )]);

    let helper_id = project
        .get_definitions("a.ts")
        .into_iter()
        .find(|d| d.name.as_ref() == "helper" && d.kind == DefinitionKind::Function)
        .unwrap()
        .symbol_id;

    let references = project.find_references(&helper_id);
    assert_eq!(references.len(), 2);
    assert_eq!(references[0].start_line, 3);
    assert_eq!(references[1].start_line, 4);
}

#[test]
fn go_to_definition_from_call_site() {
    let project = project_with(&[(
        "a.ts",
        "function helper() {}\nfunction main() { helper(); }\n",
    )]);

    // 0-based point on the `helper` identifier inside main.
    let def = project
        .go_to_definition("a.ts", ariadne::Point::new(1, 19))
        .unwrap();
    assert_eq!(def.name.as_ref(), "helper");
    assert_eq!(def.kind, DefinitionKind::Function);
    assert_eq!(def.location.start_line, 1);
}
