use struktur_cli::orchestrator;
use struktur_cli::test_utils::{ClassFixture, InstanceFixture, TemplateFixture, TestEnvironment};

#[test]
fn runs_a_full_build_and_writes_canonical_and_rendered_output() {
    let env = TestEnvironment::new().unwrap();
    ClassFixture::root("page").write_to(&env.classes_dir).unwrap();
    InstanceFixture::with_render("home", "page", "page.txt", "pages/home.txt")
        .write_to(&env.instances_dir)
        .unwrap();
    TemplateFixture::instance_name("page.txt", "home").write_to(&env.templates_dir).unwrap();

    let config = env.load_config().unwrap();
    let report = orchestrator::run(&config).unwrap();

    assert_eq!(report.class_count, 1);
    assert_eq!(report.instance_count, 1);
    assert_eq!(report.validation.invalid, 0);
    assert_eq!(report.render_summary.files_written.len(), 1);
    assert!(env.build_file_exists("canonical.json"));
    assert!(env.build_file_exists("meta/classes/page.json"));
    assert!(env.build_file_exists("meta/validation.json"));
    assert!(env.build_file_exists("pages/home.txt"));

    let rendered = std::fs::read_to_string(env.build_dir.join("pages/home.txt")).unwrap();
    assert_eq!(rendered.trim(), "home");
}

#[test]
fn aborts_the_build_when_an_instance_fails_schema_validation() {
    let env = TestEnvironment::new().unwrap();
    ClassFixture::root("page").write_to(&env.classes_dir).unwrap();
    // "name" is required by ClassFixture::root's schema; omit it.
    std::fs::write(
        env.instances_dir.join("broken.json"),
        r#"{ "$id": "broken", "$class": "page" }"#,
    )
    .unwrap();

    let config = env.load_config().unwrap();
    let err = orchestrator::run(&config).unwrap_err();
    assert!(err.to_string().contains("failed validation"));
    assert!(!env.build_file_exists("canonical.json"));
}

#[test]
fn writes_meta_files_for_every_class_and_aspect() {
    let env = TestEnvironment::new().unwrap();
    ClassFixture::root("page").write_to(&env.classes_dir).unwrap();
    struktur_cli::test_utils::AspectFixture::basic("seo").write_to(&env.aspects_dir).unwrap();
    InstanceFixture::basic("home", "page").write_to(&env.instances_dir).unwrap();

    let config = env.load_config().unwrap();
    let report = orchestrator::run(&config).unwrap();

    assert_eq!(report.aspect_count, 1);
    assert!(env.build_file_exists("meta/classes/page.json"));
    assert!(env.build_file_exists("meta/aspects/seo.json"));
}
