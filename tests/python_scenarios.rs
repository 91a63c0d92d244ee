//! Python scenarios: module-as-named imports, implicit exports with
//! `__all__`, inheritance, and constructor resolution.

use ariadne::{CallType, Definition, DefinitionKind, Project, Settings};

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
fn module_as_named_import_resolves_submodule_calls() {
    let project = project_with(&[
        ("training/pipeline.py", "def train():\n    pass\n"),
        ("training/__init__.py", ""),
        (
            "run.py",
            "from training import pipeline\n\npipeline.train()\n",
        ),
    ]);

    let train = find_def(&project, "training/pipeline.py", "train");
    let call = project
        .resolved_calls("run.py")
        .iter()
        .find(|c| c.name.as_ref() == "train")
        .cloned()
        .unwrap();
    assert_eq!(call.call_type, CallType::Method);
    assert_eq!(call.resolutions.len(), 1);
    assert_eq!(call.resolutions[0].symbol_id, train.symbol_id);

    // Without the submodule-path logic this call would stay unresolved and
    // train would be a false-positive entry point.
    let graph = project.get_call_graph();
    assert!(!graph.entry_points.contains(&train.symbol_id));
}

#[test]
fn package_barrel_reexport() {
    let project = project_with(&[
        ("pkg/core.py", "def compute():\n    return 1\n"),
        ("pkg/__init__.py", "from .core import compute\n"),
        ("app.py", "from pkg import compute\n\ncompute()\n"),
    ]);

    let compute = find_def(&project, "pkg/core.py", "compute");
    let call = project
        .resolved_calls("app.py")
        .iter()
        .find(|c| c.name.as_ref() == "compute")
        .cloned()
        .unwrap();
    assert_eq!(call.resolutions.len(), 1);
    assert_eq!(call.resolutions[0].symbol_id, compute.symbol_id);
}

#[test]
fn dunder_all_restricts_exports() {
    let project = project_with(&[
        (
            "lib.py",
            "__all__ = [\"visible\"]\n\ndef visible():\n    pass\n\ndef hidden():\n    pass\n",
        ),
        (
            "app.py",
            "from lib import visible, hidden\n\nvisible()\nhidden()\n",
        ),
    ]);

    let visible = find_def(&project, "lib.py", "visible");
    let calls = project.resolved_calls("app.py");

    let visible_call = calls.iter().find(|c| c.name.as_ref() == "visible").unwrap();
    assert_eq!(visible_call.resolutions.len(), 1);
    assert_eq!(visible_call.resolutions[0].symbol_id, visible.symbol_id);

    // hidden is not exported under __all__, so the import never lands.
    let hidden_call = calls.iter().find(|c| c.name.as_ref() == "hidden").unwrap();
    assert!(hidden_call.resolutions.is_empty());
}

#[test]
fn dunder_all_can_be_disabled() {
    let mut settings = Settings::default();
    settings.python.respect_dunder_all = false;
    let mut project = Project::with_settings(settings);
    project
        .update_file(
            "lib.py",
            "__all__ = [\"visible\"]\n\ndef visible():\n    pass\n\ndef hidden():\n    pass\n",
        )
        .unwrap();
    project
        .update_file("app.py", "from lib import hidden\n\nhidden()\n")
        .unwrap();

    let hidden = find_def(&project, "lib.py", "hidden");
    let call = project
        .resolved_calls("app.py")
        .iter()
        .find(|c| c.name.as_ref() == "hidden")
        .cloned()
        .unwrap();
    assert_eq!(call.resolutions.len(), 1);
    assert_eq!(call.resolutions[0].symbol_id, hidden.symbol_id);
}

#[test]
fn self_method_resolves_through_base_class() {
    let project = project_with(&[(
        "app.py",
        "class Base:\n    def handle(self):\n        pass\n\nclass Derived(Base):\n    def run(self):\n        self.handle()\n",
    )]);

    let handle = find_def(&project, "app.py", "handle");
    let call = project
        .resolved_calls("app.py")
        .iter()
        .find(|c| c.name.as_ref() == "handle")
        .cloned()
        .unwrap();
    assert_eq!(call.resolutions.len(), 1);
    assert_eq!(call.resolutions[0].symbol_id, handle.symbol_id);
}

#[test]
fn multiple_inheritance_collects_equal_depth_matches() {
    let project = project_with(&[(
        "app.py",
        "class Left:\n    def go(self):\n        pass\n\nclass Right:\n    def go(self):\n        pass\n\nclass Child(Left, Right):\n    pass\n\nchild = Child()\nchild.go()\n",
    )]);

    let call = project
        .resolved_calls("app.py")
        .iter()
        .find(|c| c.name.as_ref() == "go")
        .cloned()
        .unwrap();
    assert_eq!(call.resolutions.len(), 2);
    // Declared order: Left's method first.
    let first = project
        .get_definition(&call.resolutions[0].symbol_id)
        .unwrap();
    let second = project
        .get_definition(&call.resolutions[1].symbol_id)
        .unwrap();
    assert!(first.location.start_line < second.location.start_line);
}

#[test]
fn constructor_call_resolves_to_dunder_init() {
    let project = project_with(&[(
        "app.py",
        "class Runner:\n    def __init__(self):\n        self.count = 0\n\nrunner = Runner()\n",
    )]);

    let init = find_def(&project, "app.py", "__init__");
    assert_eq!(init.kind, DefinitionKind::Constructor);
    let call = project
        .resolved_calls("app.py")
        .iter()
        .find(|c| c.name.as_ref() == "Runner")
        .cloned()
        .unwrap();
    assert_eq!(call.resolutions.len(), 1);
    assert_eq!(call.resolutions[0].symbol_id, init.symbol_id);
}

#[test]
fn class_without_init_resolves_to_class_symbol() {
    let project = project_with(&[(
        "app.py",
        "class Plain:\n    pass\n\np = Plain()\n",
    )]);

    let class_def = find_def(&project, "app.py", "Plain");
    let call = project
        .resolved_calls("app.py")
        .iter()
        .find(|c| c.name.as_ref() == "Plain")
        .cloned()
        .unwrap();
    assert_eq!(call.resolutions.len(), 1);
    assert_eq!(call.resolutions[0].symbol_id, class_def.symbol_id);
}

#[test]
fn relative_import_between_siblings() {
    let project = project_with(&[
        ("pkg/util.py", "def helper():\n    pass\n"),
        ("pkg/__init__.py", ""),
        (
            "pkg/app.py",
            "from .util import helper\n\ndef main():\n    helper()\n",
        ),
    ]);

    let helper = find_def(&project, "pkg/util.py", "helper");
    let call = project
        .resolved_calls("pkg/app.py")
        .iter()
        .find(|c| c.name.as_ref() == "helper")
        .cloned()
        .unwrap();
    assert_eq!(call.resolutions.len(), 1);
    assert_eq!(call.resolutions[0].symbol_id, helper.symbol_id);
}
