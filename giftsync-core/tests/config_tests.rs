//! Config loading and validation tests for `giftsync-core`.
//!
//! Each `#[case]` gets an isolated `TempDir`.

use std::fs;
use std::path::PathBuf;

use giftsync_core::config::{load_at, parse};
use giftsync_core::{CollectionSpec, ConfigError};
use rstest::rstest;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("giftsync.yaml");
    fs::write(&path, contents).expect("write config fixture");
    path
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

#[test]
fn full_config_loads() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(
        &dir,
        r#"
collections:
  - name: PlushPepe
    start_id: 1
    end_id: 3
  - { name: DurovsCap, start_id: 10, end_id: 12 }
poll_interval_secs: 30
concurrency: 16
sources:
  primary_base: http://127.0.0.1:9000
  secondary_base: http://127.0.0.1:9001
  timeout_secs: 5
output:
  state_file: /var/lib/giftsync/state.json
  publish_root: /srv/public
  templates_dir: /etc/giftsync/templates
"#,
    );

    let config = load_at(&path).expect("load");
    assert_eq!(
        config.collections,
        vec![
            CollectionSpec::new("PlushPepe", 1, 3),
            CollectionSpec::new("DurovsCap", 10, 12),
        ]
    );
    assert_eq!(config.poll_interval_secs, 30);
    assert_eq!(config.concurrency, 16);
    assert_eq!(config.sources.secondary_base, "http://127.0.0.1:9001");
    assert_eq!(config.timeout().as_secs(), 5);
    assert_eq!(config.output.publish_root, PathBuf::from("/srv/public"));
    assert_eq!(
        config.output.templates_dir,
        Some(PathBuf::from("/etc/giftsync/templates"))
    );
    assert_eq!(config.collection("DurovsCap").map(|c| c.start_id), Some(10));
}

#[test]
fn missing_file_is_config_not_found() {
    let dir = TempDir::new().expect("tempdir");
    let err = load_at(&dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::ConfigNotFound { .. }));
}

#[test]
fn malformed_yaml_reports_path() {
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(&dir, "collections: [ {name: ");
    let err = load_at(&path).unwrap_err();
    match err {
        ConfigError::Parse { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected parse error, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[rstest]
#[case::no_collections("collections: []\n")]
#[case::inverted_range("collections:\n  - { name: A, start_id: 5, end_id: 1 }\n")]
#[case::empty_name("collections:\n  - { name: '  ', start_id: 1, end_id: 1 }\n")]
#[case::path_separator("collections:\n  - { name: 'a/b', start_id: 1, end_id: 1 }\n")]
#[case::zero_concurrency(
    "collections:\n  - { name: A, start_id: 1, end_id: 1 }\nconcurrency: 0\n"
)]
#[case::zero_timeout(
    "collections:\n  - { name: A, start_id: 1, end_id: 1 }\nsources:\n  timeout_secs: 0\n"
)]
fn invalid_configs_are_rejected(#[case] yaml: &str) {
    let config = parse(std::path::Path::new("giftsync.yaml"), yaml).expect("parse");
    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "got {err:?}");
}
