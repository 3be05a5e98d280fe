use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Launch descriptor for one tool server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub name: String,
    pub command: PathBuf,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub workdir: Option<PathBuf>,
}

impl ServerConfig {
    pub fn new(name: impl Into<String>, command: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            workdir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawServer {
    pub(crate) name: String,
    pub(crate) command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: HashMap<String, String>,
    workdir: Option<String>,
}

impl From<RawServer> for ServerConfig {
    fn from(raw: RawServer) -> Self {
        let expand = |s: &str| -> String {
            shellexpand::full(s)
                .map(|cow| cow.into_owned())
                .unwrap_or_else(|_| s.to_string())
        };

        let command = PathBuf::from(expand(&raw.command));
        let workdir = raw.workdir.map(|d| PathBuf::from(expand(&d)));
        let args = raw.args.into_iter().map(|arg| expand(&arg)).collect();

        Self {
            name: raw.name,
            command,
            args,
            env: raw.env,
            workdir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn expands_env_vars_in_command_and_args() {
        unsafe {
            env::set_var("TEST_TOOL_ROOT", "/opt/tools");
            env::set_var("TEST_TOOL_ARG", "notes");
        }

        let raw = RawServer {
            name: "obsidian".to_string(),
            command: "${TEST_TOOL_ROOT}/python".to_string(),
            args: vec!["--vault".to_string(), "${TEST_TOOL_ARG}".to_string()],
            env: HashMap::new(),
            workdir: Some("${TEST_TOOL_ROOT}/work".to_string()),
        };

        let config = ServerConfig::from(raw);

        let cmd = config.command.to_str().expect("valid utf8");
        assert!(cmd.contains("/opt/tools/python") || cmd.contains("\\opt\\tools\\python"));
        assert_eq!(config.args, vec!["--vault".to_string(), "notes".to_string()]);

        let workdir = config.workdir.expect("workdir exists");
        let workdir = workdir.to_str().expect("valid utf8");
        assert!(workdir.contains("/opt/tools/work") || workdir.contains("\\opt\\tools\\work"));

        unsafe {
            env::remove_var("TEST_TOOL_ROOT");
            env::remove_var("TEST_TOOL_ARG");
        }
    }
}
