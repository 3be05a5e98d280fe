// Config loading tests - AppConfig::load validation and defaults

use mcp_agent_runtime::config::{AppConfig, ConfigError, ServerConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::tempdir;

fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("agent.toml");
    fs::write(&path, content).expect("Failed to write config");
    path
}

fn find_server<'a>(config: &'a AppConfig, name: &str) -> &'a ServerConfig {
    config
        .servers
        .iter()
        .find(|server| server.name == name)
        .expect("server configured")
}

#[test]
fn returns_error_when_file_not_found() {
    let result = AppConfig::load(Some(Path::new("/nonexistent/path/agent.toml")));
    assert!(matches!(result, Err(ConfigError::NotFound { .. })));
}

#[test]
fn returns_error_on_invalid_toml() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), "[[servers]\nname = ");
    let result = AppConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}

#[test]
fn returns_error_when_no_servers_configured() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"
[model]
model = "gpt-4o-mini"
"#,
    );
    let result = AppConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::NoServersConfigured)));
}

#[test]
fn returns_error_on_duplicate_server_names() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"
[[servers]]
name = "search"
command = "python"

[[servers]]
name = "search"
command = "node"
"#,
    );
    let result = AppConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::DuplicateServer { ref name }) if name == "search"));
}

#[test]
fn returns_error_on_empty_command() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"
[[servers]]
name = "search"
command = "  "
"#,
    );
    let result = AppConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::EmptyCommand { ref name }) if name == "search"));
}

#[test]
fn returns_error_on_zero_history_window() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"
[agent]
history_window = 0

[[servers]]
name = "search"
command = "python"
"#,
    );
    let result = AppConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::InvalidHistoryWindow)));
}

#[test]
fn minimal_config_uses_defaults() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"
[model]
endpoint = "http://localhost:9000/v1"

[[servers]]
name = "search"
command = "python"
args = ["mcpservers/bravesearch.py"]
"#,
    );

    let config = AppConfig::load(Some(&path)).expect("config loads");
    assert_eq!(config.model.endpoint, "http://localhost:9000/v1");
    assert_eq!(config.model.model, "gpt-4o-mini");
    assert_eq!(config.model.api_key_env, "OPENAI_API_KEY");
    assert_eq!(config.model.max_tokens, 2048);
    assert_eq!(config.agent.max_tool_uses, 1);
    assert_eq!(config.agent.history_window, 10);
    assert!(!config.agent.keep_system_prompt);
    assert_eq!(config.agent.tool_timeout, Duration::from_secs(120));

    let server = find_server(&config, "search");
    assert_eq!(server.command, PathBuf::from("python"));
    assert_eq!(server.args, vec!["mcpservers/bravesearch.py".to_string()]);
    assert!(server.workdir.is_none());
}

#[test]
fn full_config_overrides_every_section() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"
[model]
endpoint = "http://localhost:9000/v1"
api_key = "LOCAL_KEY"
model = "local-model"
temperature = 0.2
max_tokens = 512
timeout_secs = 5

[agent]
max_tool_uses = 3
history_window = 6
keep_system_prompt = true
max_decisions = 4
prompt_template = "custom/prompt.txt"
tool_timeout_secs = 9
connect_timeout_secs = 2
persist_history = false

[[servers]]
name = "weather"
command = "node"
args = ["weather.js"]
env = { UNITS = "metric" }
workdir = "/srv/weather"

[[servers]]
name = "search"
command = "python"
"#,
    );

    let config = AppConfig::load(Some(&path)).expect("config loads");
    assert_eq!(config.model.api_key_env, "LOCAL_KEY");
    assert_eq!(config.model.model, "local-model");
    assert_eq!(config.model.timeout, Duration::from_secs(5));

    assert_eq!(config.agent.max_tool_uses, 3);
    assert_eq!(config.agent.history_window, 6);
    assert!(config.agent.keep_system_prompt);
    assert_eq!(config.agent.max_decisions, 4);
    assert_eq!(config.agent.prompt_template, PathBuf::from("custom/prompt.txt"));
    assert_eq!(config.agent.connect_timeout, Duration::from_secs(2));
    assert!(!config.agent.persist_history);

    assert_eq!(config.servers.len(), 2);
    let weather = find_server(&config, "weather");
    assert_eq!(weather.env.get("UNITS").map(String::as_str), Some("metric"));
    assert_eq!(weather.workdir, Some(PathBuf::from("/srv/weather")));
}
