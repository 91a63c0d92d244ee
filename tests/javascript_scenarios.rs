//! JavaScript scenarios: hoisting, import forms, callbacks, and
//! collection dispatch.

use ariadne::{Definition, DefinitionKind, Project, ResolutionReason};

fn project_with(files: &[(&str, &str)]) -> Project {
    let mut project = Project::new();
    for (path, source) in files {
        project.update_file(path, source).unwrap();
    }
    project
}

fn find_def(project: &Project, path: &str, name: &str) -> Definition {
    project
        .get_definitions(path)
        .into_iter()
        .find(|d| d.name.as_ref() == name)
        .unwrap_or_else(|| panic!("no definition named '{name}' in {path}"))
}

#[test]
fn function_declarations_are_hoisted() {
    // The call precedes the declaration in source order; function
    // declarations resolve file-wide within their scope.
    let project = project_with(&[(
        "a.js",
        "function main() { helper(); }\nfunction helper() {}\n",
    )]);

    let helper = find_def(&project, "a.js", "helper");
    let call = project
        .resolved_calls("a.js")
        .iter()
        .find(|c| c.name.as_ref() == "helper")
        .cloned()
        .unwrap();
    assert_eq!(call.resolutions.len(), 1);
    assert_eq!(call.resolutions[0].symbol_id, helper.symbol_id);
}

#[test]
fn default_import_resolves_default_export() {
    let project = project_with(&[
        ("lib.js", "export default function setup() {}\n"),
        ("app.js", "import boot from \"./lib\";\nboot();\n"),
    ]);

    let setup = find_def(&project, "lib.js", "setup");
    let call = project
        .resolved_calls("app.js")
        .iter()
        .find(|c| c.name.as_ref() == "boot")
        .cloned()
        .unwrap();
    assert_eq!(call.resolutions.len(), 1);
    assert_eq!(call.resolutions[0].symbol_id, setup.symbol_id);
}

#[test]
fn namespace_import_member_call() {
    let project = project_with(&[
        ("util.js", "export function format(s) { return s; }\n"),
        ("app.js", "import * as util from \"./util\";\nutil.format(\"x\");\n"),
    ]);

    let format = find_def(&project, "util.js", "format");
    let call = project
        .resolved_calls("app.js")
        .iter()
        .find(|c| c.name.as_ref() == "format")
        .cloned()
        .unwrap();
    assert_eq!(call.resolutions.len(), 1);
    assert_eq!(call.resolutions[0].symbol_id, format.symbol_id);
}

#[test]
fn aliased_named_import() {
    let project = project_with(&[
        ("lib.js", "export function helper() {}\n"),
        ("app.js", "import { helper as h } from \"./lib\";\nh();\n"),
    ]);

    let helper = find_def(&project, "lib.js", "helper");
    let call = project
        .resolved_calls("app.js")
        .iter()
        .find(|c| c.name.as_ref() == "h")
        .cloned()
        .unwrap();
    assert_eq!(call.resolutions.len(), 1);
    assert_eq!(call.resolutions[0].symbol_id, helper.symbol_id);
}

#[test]
fn callback_invocation_records_indirect_targets() {
    let project = project_with(&[(
        "a.js",
        "const logIt = (x) => x;\nfunction each(items, cb) { cb(items); }\nfunction run(items) { each(items, logIt); }\n",
    )]);

    let log_it = find_def(&project, "a.js", "logIt");
    let each = find_def(&project, "a.js", "each");
    let run = find_def(&project, "a.js", "run");

    let cb_call = project
        .resolved_calls("a.js")
        .iter()
        .find(|c| c.name.as_ref() == "cb")
        .cloned()
        .unwrap();
    assert!(cb_call.is_callback_invocation);
    assert_eq!(cb_call.resolutions.len(), 1);
    assert_eq!(cb_call.resolutions[0].symbol_id, log_it.symbol_id);

    let graph = project.get_call_graph();
    assert!(graph.indirect_reachability.contains(&log_it.symbol_id));
    // Callback edges do not count against entry points: logIt has no
    // non-callback caller, so it stays an entry point; each is called
    // directly by run.
    assert!(graph.entry_points.contains(&log_it.symbol_id));
    assert!(graph.entry_points.contains(&run.symbol_id));
    assert!(!graph.entry_points.contains(&each.symbol_id));
}

#[test]
fn collection_member_dispatch() {
    let project = project_with(&[(
        "a.js",
        "const handlers = {\n  start() { return 1; },\n  stop() { return 2; },\n};\nfunction main() { handlers.start(); }\n",
    )]);

    let handlers = find_def(&project, "a.js", "handlers");
    let members = &handlers.as_variable().unwrap().collection_members;
    assert_eq!(members.len(), 2);

    let start = find_def(&project, "a.js", "start");
    let call = project
        .resolved_calls("a.js")
        .iter()
        .find(|c| c.name.as_ref() == "start")
        .cloned()
        .unwrap();
    assert_eq!(call.resolutions.len(), 1);
    assert_eq!(call.resolutions[0].symbol_id, start.symbol_id);
    match &call.resolutions[0].reason {
        ResolutionReason::CollectionMember {
            collection_id,
            access_pattern,
        } => {
            assert_eq!(*collection_id, handlers.symbol_id);
            assert_eq!(access_pattern.as_ref(), "member");
        }
        other => panic!("expected collection member, got {other:?}"),
    }

    let graph = project.get_call_graph();
    assert!(graph.indirect_reachability.contains(&start.symbol_id));
}

#[test]
fn unresolved_call_is_entry_point_candidate() {
    let project = project_with(&[(
        "a.js",
        "function lonely() { missing(); }\n",
    )]);

    let call = project
        .resolved_calls("a.js")
        .iter()
        .find(|c| c.name.as_ref() == "missing")
        .cloned()
        .unwrap();
    assert!(call.resolutions.is_empty());

    let lonely = find_def(&project, "a.js", "lonely");
    let graph = project.get_call_graph();
    assert!(graph.entry_points.contains(&lonely.symbol_id));
}

#[test]
fn block_scoped_shadowing() {
    let project = project_with(&[(
        "a.js",
        "const x = outerValue();\nfunction outerValue() { return 1; }\nfunction f() {\n  const x = innerValue();\n  return x;\n}\nfunction innerValue() { return 2; }\n",
    )]);

    // Two distinct variable definitions named x exist, in different scopes.
    let xs: Vec<_> = project
        .get_definitions("a.js")
        .into_iter()
        .filter(|d| d.kind == DefinitionKind::Variable && d.name.as_ref() == "x")
        .collect();
    assert_eq!(xs.len(), 2);
    assert_ne!(xs[0].defining_scope_id, xs[1].defining_scope_id);
}

#[test]
fn test_file_detection() {
    let mut project = Project::new();
    project.update_file("src/app.test.js", "function t() {}\n").unwrap();
    project.update_file("src/app.js", "function a() {}\n").unwrap();
    assert!(project.is_test_file("src/app.test.js"));
    assert!(!project.is_test_file("src/app.js"));

    let graph = project.get_call_graph();
    let test_nodes: Vec<_> = graph.nodes.values().filter(|n| n.is_test).collect();
    assert_eq!(test_nodes.len(), 1);
    assert_eq!(test_nodes[0].name.as_ref(), "t");
}
