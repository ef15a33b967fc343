use std::path::Path;
use struktur_cli::core::StrukturError;
use struktur_cli::path_safety::{resolve_output_path, CollisionTracker};

#[test]
fn resolve_output_path_accepts_a_nested_relative_path() {
    let root = Path::new("/build/out");
    let resolved = resolve_output_path(root, "pages/index.html").unwrap();
    assert_eq!(resolved, Path::new("/build/out/pages/index.html"));
}

#[test]
fn resolve_output_path_rejects_traversal() {
    let root = Path::new("/build/out");
    let err = resolve_output_path(root, "../../etc/passwd").unwrap_err();
    assert!(matches!(err, StrukturError::UnsafePath { .. }));
}

#[test]
fn resolve_output_path_rejects_absolute_paths() {
    let root = Path::new("/build/out");
    let err = resolve_output_path(root, "/etc/passwd").unwrap_err();
    assert!(matches!(err, StrukturError::UnsafePath { .. }));
}

#[test]
fn resolve_output_path_rejects_empty_output() {
    let root = Path::new("/build/out");
    assert!(resolve_output_path(root, "").is_err());
}

#[test]
fn collision_tracker_flags_a_second_writer() {
    let mut tracker = CollisionTracker::new();
    let path = Path::new("/build/out/index.html").to_path_buf();
    tracker.register(path.clone(), "task-a").unwrap();
    let err = tracker.register(path, "task-b").unwrap_err();
    assert!(matches!(err, StrukturError::OutputCollision { .. }));
}
