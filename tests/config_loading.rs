use std::path::PathBuf;

use retrace_cli::cli::runtime::load_config;
use retrace_cli::config::{ENV_OUTPUT_DIR, ENV_SEED, ENV_SPEED, ENV_STORE_PATH};
use serial_test::serial;

fn clear_env() {
    for key in [ENV_STORE_PATH, ENV_OUTPUT_DIR, ENV_SPEED, ENV_SEED] {
        std::env::remove_var(key);
    }
}

#[tokio::test]
#[serial]
async fn missing_file_falls_back_to_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yaml");

    let loaded = load_config(Some(&path)).await.unwrap();

    assert_eq!(loaded.path, path);
    assert_eq!(loaded.config.tempo.speed, 1.0);
    assert!(loaded.config.storage.path.ends_with("workflows.json"));
}

#[tokio::test]
#[serial]
async fn file_values_then_env_overrides() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("retrace.yaml");
    std::fs::write(
        &path,
        "storage:\n  path: /srv/retrace/wf.json\ntempo:\n  speed: 0.25\n  seed: 5\nreplay:\n  run_timeout_ms: 60000\n",
    )
    .unwrap();

    let loaded = load_config(Some(&path)).await.unwrap();
    assert_eq!(loaded.config.storage.path, PathBuf::from("/srv/retrace/wf.json"));
    assert_eq!(loaded.config.tempo.speed, 0.25);
    assert_eq!(loaded.config.tempo.seed, Some(5));
    assert_eq!(loaded.config.replay.run_timeout_ms, Some(60_000));

    std::env::set_var(ENV_SPEED, "2");
    std::env::set_var(ENV_STORE_PATH, "/tmp/override.json");
    let loaded = load_config(Some(&path)).await;
    clear_env();
    let loaded = loaded.unwrap();
    assert_eq!(loaded.config.tempo.speed, 2.0);
    assert_eq!(loaded.config.storage.path, PathBuf::from("/tmp/override.json"));
}

#[tokio::test]
#[serial]
async fn malformed_file_is_an_error() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "tempo: [not, a, map]\n").unwrap();

    let err = load_config(Some(&path)).await.unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse config file"));
}
