use std::path::PathBuf;
use struktur_cli::manifest::{compute_hash, resolve_build_dir, BuildInputs};

fn inputs(class_dirs: &[&str]) -> BuildInputs {
    BuildInputs {
        class_dirs: class_dirs.iter().map(PathBuf::from).collect(),
        aspect_dirs: vec![PathBuf::from("aspects")],
        instance_dirs: vec![PathBuf::from("instances")],
        template_dirs: vec![PathBuf::from("templates")],
    }
}

#[test]
fn compute_hash_is_stable_for_the_same_inputs() {
    let a = compute_hash(&inputs(&["classes"]));
    let b = compute_hash(&inputs(&["classes"]));
    assert_eq!(a, b);
    assert_eq!(a.len(), 8);
}

#[test]
fn compute_hash_ignores_directory_order() {
    let a = compute_hash(&inputs(&["classes", "vendor/classes"]));
    let b = compute_hash(&inputs(&["vendor/classes", "classes"]));
    assert_eq!(a, b);
}

#[test]
fn compute_hash_differs_for_different_inputs() {
    let a = compute_hash(&inputs(&["classes"]));
    let b = compute_hash(&inputs(&["other-classes"]));
    assert_ne!(a, b);
}

#[test]
fn resolve_build_dir_appends_hash_when_deterministic() {
    let inputs = inputs(&["classes"]);
    let hash = compute_hash(&inputs);
    let (dir, resolved_hash) = resolve_build_dir(&PathBuf::from("build"), &inputs, true);
    assert_eq!(resolved_hash, hash);
    assert_eq!(dir, PathBuf::from("build").join(format!("build-{hash}")));
}

#[test]
fn resolve_build_dir_uses_build_dir_directly_when_not_deterministic() {
    let inputs = inputs(&["classes"]);
    let (dir, _hash) = resolve_build_dir(&PathBuf::from("build"), &inputs, false);
    assert_eq!(dir, PathBuf::from("build"));
}
