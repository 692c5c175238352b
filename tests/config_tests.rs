use chicken_road_admin::config::{Config, DEFAULT_API_PREFIX};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_minimal_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[console]
base_url = "https://admin.example.com"
"#,
    );

    let config = Config::from_path(&path).unwrap();

    assert_eq!(config.console.base_url, "https://admin.example.com");
    assert_eq!(config.console.api_prefix, DEFAULT_API_PREFIX);
    assert_eq!(config.console.default_limit, 20);
    assert_eq!(config.console.timeout_secs, 30);
    assert_eq!(config.console.max_retries, 3);
    assert_eq!(config.console.username, None);
}

#[test]
fn test_full_file() {
    let config = Config::from_toml_str(
        r#"
[console]
base_url = "http://localhost:3000"
api_prefix = "/api"
username = "ops"
password = "s3cret"
timeout_secs = 5
default_limit = 50
max_retries = 1
"#,
    )
    .unwrap();

    assert_eq!(config.console.api_root(), "http://localhost:3000/api");
    assert_eq!(config.console.username.as_deref(), Some("ops"));
    assert_eq!(config.console.default_limit, 50);
    assert_eq!(config.console.max_retries, 1);
}

#[test]
fn test_environment_overrides_file_values() {
    let mut config = Config::from_toml_str(
        r#"
[console]
base_url = "http://localhost:3000"
username = "ops"
"#,
    )
    .unwrap();
    let env: HashMap<&str, &str> = HashMap::from([
        ("CRC_BASE_URL", "https://staging.example.com"),
        ("CRC_USERNAME", "   "),
        ("CRC_PASSWORD", "from-env"),
    ]);

    config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

    assert_eq!(config.console.base_url, "https://staging.example.com");
    // blank values do not clear what the file set
    assert_eq!(config.console.username.as_deref(), Some("ops"));
    assert_eq!(config.console.password.as_deref(), Some("from-env"));
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = Config::from_path(dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_invalid_values_are_rejected() {
    assert!(Config::from_toml_str("[console]\nbase_url = \"  \"\n").is_err());
    assert!(
        Config::from_toml_str("[console]\nbase_url = \"http://x\"\ndefault_limit = 0\n").is_err()
    );
    assert!(Config::from_toml_str("[console]\n").is_err());
}
