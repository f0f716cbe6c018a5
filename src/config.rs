use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub interpreter: InterpreterConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub library: Vec<LibraryEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            environment: default_environment(),
        }
    }
}

fn default_port() -> u16 {
    8090
}

fn default_environment() -> String {
    "local".to_string()
}

#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub base_url: String,
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            timeout_secs: default_backend_timeout(),
        }
    }
}

fn default_backend_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_backend_timeout() -> u64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct InterpreterConfig {
    #[serde(default = "default_interpreter_command")]
    pub command: String,
    #[serde(default = "default_interpreter_args")]
    pub args: Vec<String>,
    #[serde(default = "default_interpreter_timeout")]
    pub timeout_secs: u64,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            command: default_interpreter_command(),
            args: default_interpreter_args(),
            timeout_secs: default_interpreter_timeout(),
        }
    }
}

fn default_interpreter_command() -> String {
    "python3".to_string()
}

fn default_interpreter_args() -> Vec<String> {
    // -I isolates the interpreter from host site-packages and env vars;
    // "-" reads the program from stdin.
    vec!["-I".to_string(), "-".to_string()]
}

fn default_interpreter_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    pub data_dir: Option<PathBuf>,
    pub ui_dir: Option<PathBuf>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            event_capacity: default_event_capacity(),
            data_dir: None,
            ui_dir: None,
        }
    }
}

fn default_event_capacity() -> usize {
    200
}

/// One file seeded into the sandboxed in-memory filesystem.
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryEntry {
    pub name: String,
    pub path: PathBuf,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Defaults when no config file exists; an unreadable file is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.workspace.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".scriptorium")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Config {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse("");
        assert_eq!(config.server.port, 8090);
        assert_eq!(config.server.environment, "local");
        assert_eq!(config.backend.base_url, "http://localhost:5000");
        assert_eq!(config.interpreter.command, "python3");
        assert_eq!(config.interpreter.args, vec!["-I", "-"]);
        assert_eq!(config.interpreter.timeout_secs, 30);
        assert_eq!(config.workspace.event_capacity, 200);
        assert!(config.workspace.data_dir.is_none());
        assert!(config.library.is_empty());
    }

    #[test]
    fn test_full_config() {
        let config = parse(
            r#"
            [server]
            port = 9090
            environment = "production"

            [backend]
            base_url = "http://models.internal:5000"
            timeout_secs = 5

            [interpreter]
            command = "python3.12"
            args = ["-"]
            timeout_secs = 60

            [workspace]
            event_capacity = 50
            data_dir = "/tmp/scriptorium"

            [[library]]
            name = "components/weather.py"
            path = "library/weather.py"
        "#,
        );
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.backend.base_url, "http://models.internal:5000");
        assert_eq!(config.interpreter.command, "python3.12");
        assert_eq!(config.interpreter.timeout_secs, 60);
        assert_eq!(config.workspace.event_capacity, 50);
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/scriptorium"));
        assert_eq!(config.library.len(), 1);
        assert_eq!(config.library[0].name, "components/weather.py");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = parse(
            r#"
            [interpreter]
            command = "pypy3"
        "#,
        );
        assert_eq!(config.interpreter.command, "pypy3");
        assert_eq!(config.interpreter.args, vec!["-I", "-"]);
        assert_eq!(config.server.port, 8090);
    }

    #[test]
    fn test_invalid_toml_fails() {
        let result: Result<Config, _> = toml::from_str("not valid toml {{{}}}");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_with_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/scriptorium.toml")).unwrap();
        assert_eq!(config.server.port, 8090);
    }
}
