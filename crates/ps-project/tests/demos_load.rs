use std::path::Path;

#[test]
fn demos_load_and_validate() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/projects");
    let demos = ["cartpole_pid.yaml", "cartpole_step.yaml"];

    for name in demos {
        let path = root.join(name);
        let project =
            ps_project::load(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", name, e));
        ps_project::validate_project(&project)
            .unwrap_or_else(|e| panic!("Failed to validate {}: {}", name, e));
    }
}

#[test]
fn stock_demo_matches_builtin() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/projects/cartpole_pid.yaml");
    let project = ps_project::load_yaml(&path).unwrap();
    assert_eq!(project, ps_project::demo_project());
}

#[test]
fn step_demo_overrides_control_key() {
    let path =
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/projects/cartpole_step.yaml");
    let project = ps_project::load_yaml(&path).unwrap();
    assert_eq!(project.control_key(), "Cart_force");
    assert_eq!(project.history_capacity, 1000);
    assert_eq!(project.pacing_period_s(), 0.0);
    assert_eq!(project.controller.integral_limit, Some(0.5));
}
