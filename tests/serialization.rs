//! Ids and query outputs are serializable: stable string keys usable as
//! JSON values, and a call graph that round-trips.

use ariadne::{CallGraph, Project};

fn project_with(files: &[(&str, &str)]) -> Project {
    let mut project = Project::new();
    for (path, source) in files {
        project.update_file(path, source).unwrap();
    }
    project
}

#[test]
fn symbol_ids_are_stable_json_strings() {
    let project = project_with(&[(
        "a.ts",
        "function helper() {}\nexport function main() { helper(); }\n",
    )]);

    let helper = project
        .get_definitions("a.ts")
        .into_iter()
        .find(|d| d.name.as_ref() == "helper")
        .unwrap();
    let json = serde_json::to_value(&helper.symbol_id).unwrap();
    assert_eq!(json, serde_json::json!("function:a.ts:1:1:helper"));
}

#[test]
fn call_graph_round_trips_through_json() {
    let project = project_with(&[(
        "a.ts",
        "function helper() {}\nexport function main() { helper(); }\n",
    )]);

    let graph = project.get_call_graph();
    let json = serde_json::to_string(&graph).unwrap();
    let back: CallGraph = serde_json::from_str(&json).unwrap();

    assert_eq!(back.nodes.len(), graph.nodes.len());
    assert_eq!(back.entry_points, graph.entry_points);
    let edges: usize = back.edges.values().map(Vec::len).sum();
    assert_eq!(edges, 1);
}

#[test]
fn definitions_serialize_with_kind_tags() {
    let project = project_with(&[("a.py", "def run():\n    pass\n")]);
    let run = project
        .get_definitions("a.py")
        .into_iter()
        .find(|d| d.name.as_ref() == "run")
        .unwrap();
    let json = serde_json::to_value(&run).unwrap();
    assert_eq!(json["kind"], "function");
    assert_eq!(json["is_exported"], true);
}
