use circuitsim_mcp_server::ServerConfig;
use serial_test::serial;
use std::env;

const VARS: &[&str] = &[
    "CIRCUITSIM_CONFIG",
    "CIRCUITSIM_NGSPICE_PATH",
    "CIRCUITSIM_TIMEOUT_SECS",
    "CIRCUITSIM_PORT",
    "CIRCUITSIM_MAX_CIRCUITS",
    "CIRCUITSIM_LOG_LEVEL",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_env_overrides_file_values() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("server.toml");
    std::fs::write(
        &path,
        r#"
[simulator]
ngspice_path = "/usr/local/bin/ngspice"
timeout_secs = 30

[http]
port = 4000
"#,
    )
    .unwrap();

    env::set_var("CIRCUITSIM_PORT", "4100");
    env::set_var("CIRCUITSIM_LOG_LEVEL", "debug");
    let config = ServerConfig::load(Some(&path)).unwrap();
    clear_env();

    assert_eq!(config.simulator.ngspice_path, "/usr/local/bin/ngspice");
    assert_eq!(config.simulator.timeout_secs, 30);
    assert_eq!(config.http.port, 4100);
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_config_path_from_env() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("circuitsim.json");
    std::fs::write(&path, r#"{"limits": {"max_circuits": 7}}"#).unwrap();

    env::set_var("CIRCUITSIM_CONFIG", &path);
    let config = ServerConfig::load(None).unwrap();
    clear_env();

    assert_eq!(config.limits.max_circuits, 7);
    assert_eq!(config.limits.max_components_per_circuit, 500);
}

#[test]
#[serial]
fn test_invalid_override_fails_validation() {
    clear_env();
    env::set_var("CIRCUITSIM_TIMEOUT_SECS", "0");
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.toml");
    std::fs::write(&path, "").unwrap();

    let result = ServerConfig::load(Some(&path));
    clear_env();

    let err = result.unwrap_err();
    assert!(err.to_string().contains("timeout_secs"));
}

#[test]
#[serial]
fn test_missing_file_is_an_error() {
    clear_env();
    let result = ServerConfig::load(Some(std::path::Path::new("/nonexistent/circuitsim.toml")));
    assert!(result.is_err());
}
