use recurrist::config::Config;
use recurrist::entities::SortKey;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.commit.name_ms, 300);
    assert_eq!(config.commit.description_ms, 400);
    assert_eq!(config.commit.allocated_hours_ms, 1000);
    assert_eq!(config.listing.default_sort, SortKey::StartDate);
    assert!(!config.logging.enabled);
}

#[test]
fn test_config_validation() {
    let mut config = Config::default();

    // Valid config should pass
    assert!(config.validate().is_ok());

    // A debounce delay past the cap should fail
    config.commit.name_ms = 60_000;
    assert!(config.validate().is_err());

    // Reset and test an empty log file path
    config.commit.name_ms = 300;
    config.logging.file = Some(std::path::PathBuf::new());
    assert!(config.validate().is_err());
}

#[test]
fn test_config_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string_pretty(&config).unwrap();
    assert!(toml_str.contains("name_ms = 300"));
    assert!(toml_str.contains("default_sort = \"start_date\""));
}

#[test]
fn test_partial_config_deserialization() {
    // Partial TOML configs merge with defaults
    let partial_toml = r#"
[commit]
name_ms = 250

[logging]
enabled = true
"#;

    let config: Config = toml::from_str(partial_toml).unwrap();

    // Check that specified values are used
    assert_eq!(config.commit.name_ms, 250);
    assert!(config.logging.enabled);

    // Check that unspecified values use defaults
    assert_eq!(config.commit.description_ms, 400); // default value
    assert_eq!(config.commit.allocated_hours_ms, 1000); // default value
    assert_eq!(config.listing.default_sort, SortKey::StartDate); // default value
}

#[test]
fn test_empty_config_deserialization() {
    // Empty TOML uses all defaults
    let config: Config = toml::from_str("").unwrap();
    let default_config = Config::default();

    assert_eq!(config.commit.name_ms, default_config.commit.name_ms);
    assert_eq!(config.listing.default_sort, default_config.listing.default_sort);
    assert_eq!(config.logging.enabled, default_config.logging.enabled);
}

#[test]
fn test_load_from_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recurrist.toml");
    std::fs::write(&path, "[commit]\ndescription_ms = 150\n").unwrap();

    let config = Config::load_from_file(&path).unwrap();
    assert_eq!(config.commit.description_ms, 150);
    assert_eq!(config.commit.name_ms, 300);
}

#[test]
fn test_load_from_file_rejects_invalid_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recurrist.toml");
    std::fs::write(&path, "[commit]\nname_ms = 999999\n").unwrap();

    assert!(Config::load_from_file(&path).is_err());
}

#[test]
fn test_generate_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    Config::generate_default_config(&path).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.starts_with("# Recurrist Configuration File"));
    let reloaded = Config::load_from_file(&path).unwrap();
    assert_eq!(reloaded.commit.name_ms, 300);
}
