//! Configuration layering through the public loader and run context

use fieldpipe::cli::{Commands, RunContext};
use fieldpipe::config::{ConfigLoader, StorageBackend};
use fieldpipe::ApiError;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_workspace_config(root: &Path, name: &str, body: &str) {
    let dir = root.join("config");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), body).unwrap();
}

#[test]
fn test_environment_file_overrides_base_file() {
    let temp_dir = TempDir::new().unwrap();
    write_workspace_config(
        temp_dir.path(),
        "config.toml",
        "[storage]\nbackend = \"memory\"\n\n[moderation]\nbanned_terms = [\"spam\"]\n",
    );
    // FIELDPIPE_ENV is unset in the test environment, so development.toml applies.
    write_workspace_config(
        temp_dir.path(),
        "development.toml",
        "[moderation]\nbanned_terms = [\"spam\", \"scam\"]\n",
    );

    let config = ConfigLoader::new(temp_dir.path())
        .without_global_file()
        .load()
        .unwrap();
    assert_eq!(config.storage.backend, StorageBackend::Memory);
    assert_eq!(config.moderation.banned_terms, vec!["spam", "scam"]);
}

#[test]
fn test_explicit_file_wins_over_workspace_files() {
    let temp_dir = TempDir::new().unwrap();
    write_workspace_config(
        temp_dir.path(),
        "config.toml",
        "[logging]\nlevel = \"warn\"\nformat = \"json\"\n",
    );
    let explicit = temp_dir.path().join("override.toml");
    fs::write(&explicit, "[logging]\nlevel = \"trace\"\n").unwrap();

    let config = ConfigLoader::new(temp_dir.path())
        .without_global_file()
        .with_file(&explicit)
        .load()
        .unwrap();
    assert_eq!(config.logging.level, "trace");
    assert_eq!(config.logging.format, "json");
}

#[test]
fn test_run_context_rejects_invalid_configuration() {
    let temp_dir = TempDir::new().unwrap();
    let explicit = temp_dir.path().join("bad.toml");
    fs::write(
        &explicit,
        "[moderation]\nbanned_terms = [\"\"]\n\n[logging]\nlevel = \"fieldpipe=loud\"\n",
    )
    .unwrap();

    let err = match RunContext::new(temp_dir.path().to_path_buf(), Some(explicit)) {
        Ok(_) => panic!("invalid configuration was accepted"),
        Err(err) => err,
    };
    match err {
        ApiError::ConfigError(message) => {
            assert!(message.contains("Moderation: banned_terms[0] is blank"));
            assert!(message.contains("Logging:"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_memory_backend_from_config_serves_invocations() {
    let temp_dir = TempDir::new().unwrap();
    let explicit = temp_dir.path().join("memory.toml");
    fs::write(&explicit, "[storage]\nbackend = \"memory\"\n").unwrap();

    let context = RunContext::new(temp_dir.path().to_path_buf(), Some(explicit)).unwrap();
    assert_eq!(context.config().storage.backend, StorageBackend::Memory);

    let out = context
        .execute(&Commands::Invoke {
            type_name: "Query".to_string(),
            field_name: "article".to_string(),
            args: Some(r#"{"id":"nope"}"#.to_string()),
            source: None,
        })
        .unwrap();
    let out: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert!(out["value"].is_null());
    assert!(!temp_dir.path().join("store").exists());
}
