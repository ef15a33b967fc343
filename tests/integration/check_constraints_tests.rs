use struktur_cli::orchestrator;
use struktur_cli::test_utils::TestEnvironment;

#[test]
fn check_constraints_is_clean_for_a_simple_lineage() {
    let env = TestEnvironment::new().unwrap();
    std::fs::write(
        env.classes_dir.join("base.class.json"),
        r#"{ "$class": "base", "$schema": { "type": "object", "properties": { "port": { "type": "integer", "minimum": 1 } } } }"#,
    )
    .unwrap();

    let config = env.load_config().unwrap();
    let conflicts = orchestrator::check_constraints(&config).unwrap();
    assert!(conflicts.is_empty());
}

#[test]
fn check_constraints_reports_an_impossible_range_across_a_lineage() {
    let env = TestEnvironment::new().unwrap();
    std::fs::write(
        env.classes_dir.join("base.class.json"),
        r#"{ "$class": "base", "$schema": { "type": "object", "properties": { "port": { "type": "integer", "minimum": 100 } } } }"#,
    )
    .unwrap();
    std::fs::write(
        env.classes_dir.join("service.class.json"),
        r#"{ "$class": "service", "$parent": "base", "$schema": { "type": "object", "properties": { "port": { "type": "integer", "maximum": 50 } } } }"#,
    )
    .unwrap();

    let config = env.load_config().unwrap();
    let conflicts = orchestrator::check_constraints(&config).unwrap();
    assert_eq!(conflicts.len(), 1);
    assert!(conflicts[0].contains("port"));
}

#[test]
fn check_constraints_never_aborts_even_when_fail_on_conflicts_is_set() {
    let env = TestEnvironment::new().unwrap();
    std::fs::write(
        env.classes_dir.join("base.class.json"),
        r#"{ "$class": "base", "$schema": { "type": "object", "properties": { "port": { "type": "integer", "minimum": 100 } } } }"#,
    )
    .unwrap();
    std::fs::write(
        env.classes_dir.join("service.class.json"),
        r#"{ "$class": "service", "$parent": "base", "$schema": { "type": "object", "properties": { "port": { "type": "integer", "maximum": 50 } } } }"#,
    )
    .unwrap();

    let mut config = env.load_config().unwrap();
    config.fail_on_constraint_conflicts = true;

    let conflicts = orchestrator::check_constraints(&config).unwrap();
    assert_eq!(conflicts.len(), 1);
}
