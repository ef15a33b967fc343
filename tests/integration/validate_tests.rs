use struktur_cli::orchestrator;
use struktur_cli::test_utils::{ClassFixture, InstanceFixture, TestEnvironment};

#[test]
fn validate_reports_invalid_instances_without_aborting() {
    let env = TestEnvironment::new().unwrap();
    ClassFixture::root("page").write_to(&env.classes_dir).unwrap();
    std::fs::write(
        env.instances_dir.join("broken.json"),
        r#"{ "$id": "broken", "$class": "page" }"#,
    )
    .unwrap();

    let config = env.load_config().unwrap();
    let report = orchestrator::validate(&config).unwrap();

    assert_eq!(report.instance_count, 1);
    assert_eq!(report.validation.invalid, 1);
    assert!(!report.validation.errors.is_empty());
    assert!(!env.build_file_exists("canonical.json"));
}

#[test]
fn validate_passes_for_a_well_formed_project() {
    let env = TestEnvironment::new().unwrap();
    ClassFixture::root("page").write_to(&env.classes_dir).unwrap();
    InstanceFixture::basic("home", "page").write_to(&env.instances_dir).unwrap();

    let config = env.load_config().unwrap();
    let report = orchestrator::validate(&config).unwrap();

    assert_eq!(report.validation.invalid, 0);
    assert_eq!(report.validation.valid, 1);
}

#[test]
fn validate_fails_fast_on_an_unknown_parent() {
    let env = TestEnvironment::new().unwrap();
    ClassFixture::with_parent("service", "missing-base", &[]).write_to(&env.classes_dir).unwrap();

    let config = env.load_config().unwrap();
    let err = orchestrator::validate(&config).unwrap_err();
    assert!(matches!(err, struktur_cli::core::StrukturError::UnknownParent { .. }));
}
