use std::fs;
use tempfile::tempdir;

#[test]
fn writes_log_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ink.log");

    let subscriber = tablet_ink::logging::subscriber(true, Some(&path));
    tracing::subscriber::with_default(subscriber, || tracing::info!("stroke committed"));

    assert!(path.exists(), "log file was not created");
    let contents = fs::read_to_string(path).unwrap();
    assert!(contents.contains("stroke committed"));
}

#[test]
fn info_filter_hides_debug_events() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ink.log");

    let subscriber = tablet_ink::logging::subscriber(false, Some(&path));
    tracing::subscriber::with_default(subscriber, || {
        tracing::debug!("hidden detail");
        tracing::info!("visible");
    });

    let contents = fs::read_to_string(path).unwrap();
    assert!(contents.contains("visible"));
    assert!(!contents.contains("hidden detail"));
}
