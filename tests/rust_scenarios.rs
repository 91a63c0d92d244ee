//! Rust scenarios: impl methods, use imports, trait dispatch, and module
//! path resolution.

use ariadne::{CallType, Definition, DefinitionKind, Project, ResolutionReason};

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
fn associated_function_and_method_calls() {
    let project = project_with(&[(
        "src/lib.rs",
        "pub struct Engine {\n    count: u32,\n}\n\nimpl Engine {\n    pub fn new() -> Self {\n        Self { count: 0 }\n    }\n\n    pub fn step(&mut self) {\n        self.count += 1;\n    }\n}\n\npub fn run() {\n    let mut e = Engine::new();\n    e.step();\n}\n",
    )]);

    let new = find_def(&project, "src/lib.rs", "new");
    assert_eq!(new.kind, DefinitionKind::Constructor);
    let step = find_def(&project, "src/lib.rs", "step");

    let calls = project.resolved_calls("src/lib.rs");
    let new_call = calls.iter().find(|c| c.name.as_ref() == "new").unwrap();
    assert_eq!(new_call.call_type, CallType::Method);
    assert_eq!(new_call.resolutions.len(), 1);
    assert_eq!(new_call.resolutions[0].symbol_id, new.symbol_id);

    let step_call = calls.iter().find(|c| c.name.as_ref() == "step").unwrap();
    assert_eq!(step_call.resolutions.len(), 1);
    assert_eq!(step_call.resolutions[0].symbol_id, step.symbol_id);

    let graph = project.get_call_graph();
    let run = find_def(&project, "src/lib.rs", "run");
    assert!(graph.entry_points.contains(&run.symbol_id));
    assert!(!graph.entry_points.contains(&new.symbol_id));
    assert!(!graph.entry_points.contains(&step.symbol_id));
}

#[test]
fn cross_module_use_import() {
    let project = project_with(&[
        (
            "src/engine.rs",
            "pub struct Engine;\n\nimpl Engine {\n    pub fn start(&self) {}\n}\n\npub fn build() -> Engine {\n    Engine\n}\n",
        ),
        (
            "src/lib.rs",
            "use crate::engine::build;\n\npub fn main_loop() {\n    build();\n}\n",
        ),
    ]);

    let build = find_def(&project, "src/engine.rs", "build");
    let call = project
        .resolved_calls("src/lib.rs")
        .iter()
        .find(|c| c.name.as_ref() == "build")
        .cloned()
        .unwrap();
    assert_eq!(call.resolutions.len(), 1);
    assert_eq!(call.resolutions[0].symbol_id, build.symbol_id);
}

#[test]
fn module_handle_path_call() {
    let project = project_with(&[
        ("src/util.rs", "pub fn helper() {}\n"),
        (
            "src/lib.rs",
            "use crate::util;\n\npub fn run() {\n    util::helper();\n}\n",
        ),
    ]);

    let helper = find_def(&project, "src/util.rs", "helper");
    let call = project
        .resolved_calls("src/lib.rs")
        .iter()
        .find(|c| c.name.as_ref() == "helper")
        .cloned()
        .unwrap();
    assert_eq!(call.resolutions.len(), 1);
    assert_eq!(call.resolutions[0].symbol_id, helper.symbol_id);
}

#[test]
fn trait_object_dispatch_fans_out() {
    let project = project_with(&[(
        "src/lib.rs",
        "trait Handler {\n    fn handle(&self);\n}\n\nstruct A;\nstruct B;\n\nimpl Handler for A {\n    fn handle(&self) {}\n}\n\nimpl Handler for B {\n    fn handle(&self) {}\n}\n\nfn dispatch(h: &dyn Handler) {\n    h.handle();\n}\n",
    )]);

    let call = project
        .resolved_calls("src/lib.rs")
        .iter()
        .find(|c| c.name.as_ref() == "handle")
        .cloned()
        .unwrap();
    assert_eq!(call.resolutions.len(), 2);

    let handler_id = project.type_id("Handler", "src/lib.rs");
    for resolution in &call.resolutions {
        assert!(matches!(
            &resolution.reason,
            ResolutionReason::InterfaceImplementation { interface_id } if *interface_id == handler_id
        ));
    }
}

#[test]
fn struct_literal_resolves_to_type() {
    let project = project_with(&[(
        "src/lib.rs",
        "pub struct Point {\n    pub x: i32,\n}\n\npub fn origin() -> Point {\n    Point { x: 0 }\n}\n",
    )]);

    let point = find_def(&project, "src/lib.rs", "Point");
    let call = project
        .resolved_calls("src/lib.rs")
        .iter()
        .find(|c| c.call_type == CallType::Constructor)
        .cloned()
        .unwrap();
    assert_eq!(call.resolutions.len(), 1);
    assert_eq!(call.resolutions[0].symbol_id, point.symbol_id);
}

#[test]
fn pub_use_reexport_chain() {
    let project = project_with(&[
        ("src/inner.rs", "pub fn deep() {}\n"),
        ("src/facade.rs", "pub use crate::inner::deep;\n"),
        (
            "src/lib.rs",
            "use crate::facade::deep;\n\npub fn run() {\n    deep();\n}\n",
        ),
    ]);

    let deep = find_def(&project, "src/inner.rs", "deep");
    let call = project
        .resolved_calls("src/lib.rs")
        .iter()
        .find(|c| c.name.as_ref() == "deep")
        .cloned()
        .unwrap();
    assert_eq!(call.resolutions.len(), 1);
    assert_eq!(call.resolutions[0].symbol_id, deep.symbol_id);
}

#[test]
fn variable_annotation_drives_method_dispatch() {
    let project = project_with(&[(
        "src/lib.rs",
        "pub struct Cache;\n\nimpl Cache {\n    pub fn get(&self) {}\n}\n\npub fn lookup(cache: &Cache) {\n    cache.get();\n}\n",
    )]);

    let get = find_def(&project, "src/lib.rs", "get");
    let call = project
        .resolved_calls("src/lib.rs")
        .iter()
        .find(|c| c.name.as_ref() == "get")
        .cloned()
        .unwrap();
    assert_eq!(call.resolutions.len(), 1);
    assert_eq!(call.resolutions[0].symbol_id, get.symbol_id);
}
