/// Configuration and Environment Utilities
///
/// Server settings come from environment variables, read once at startup into
/// a `ServerConfig`. Tool settings come from an optional YAML file with a
/// `tools` section keyed by tool name:
///
/// ```yaml
/// tools:
///   echo:
///     prefix: "Echo: "
/// ```

use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::core::error::ServerError;

/// Loaded configuration file contents, keyed by top-level section.
pub type Config = HashMap<String, Value>;

const DEFAULT_PORT: u16 = 3000;

/// Transport the server speaks on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Newline-delimited JSON on stdin/stdout
    Stdio,
    /// One envelope per HTTP POST body
    Http,
}

impl TransportMode {
    pub fn parse(value: &str) -> Result<Self, ServerError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(TransportMode::Stdio),
            "http" => Ok(TransportMode::Http),
            _ => Err(ServerError::InvalidTransport(value.to_string())),
        }
    }
}

/// Server settings.
///
/// Environment Variables:
/// - SERVER_NAME: Name of the server (default: "tool-rpc-server")
/// - SERVER_VERSION: Version string (default: "1.0.0")
/// - MCP_TRANSPORT_MODE: "stdio" or "http" (default: "stdio")
/// - HOST: Bind address for HTTP mode (default: "0.0.0.0")
/// - PORT: Port number for HTTP mode (default: 3000)
/// - WORKER_THREADS: HTTP worker count (default: CPU count, at most 16)
/// - MCP_CONFIG_PATH: Tool configuration file (default: "kmcp.yaml")
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    pub transport: TransportMode,
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub config_path: PathBuf,
}

impl ServerConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which returns a variable's value if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ServerError> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let transport = TransportMode::parse(&get("MCP_TRANSPORT_MODE", "stdio"))?;
        let port = lookup("PORT")
            .and_then(|s| s.trim().parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let workers = lookup("WORKER_THREADS")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or_else(|| num_cpus::get().clamp(1, 16));

        Ok(Self {
            name: get("SERVER_NAME", "tool-rpc-server"),
            version: get("SERVER_VERSION", "1.0.0"),
            transport,
            host: get("HOST", "0.0.0.0"),
            port,
            workers,
            config_path: PathBuf::from(get("MCP_CONFIG_PATH", "kmcp.yaml")),
        })
    }
}

/// Load configuration from a YAML file.
///
/// A missing file yields an empty configuration. A file that cannot be read,
/// is not valid YAML, or whose top level is not a mapping is an error.
pub fn load_config(path: &Path) -> Result<Config, ServerError> {
    let config_error = |message: String| ServerError::Config {
        path: path.to_path_buf(),
        message,
    };

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Config::new());
        }
        Err(e) => return Err(config_error(e.to_string())),
    };

    let value: Value = serde_yaml::from_str(&content).map_err(|e| config_error(e.to_string()))?;
    match value {
        Value::Null => Ok(Config::new()),
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Err(config_error("top level must be a mapping".to_string())),
    }
}

/// Get tool-specific configuration.
///
/// Navigates `tools -> tool_name` and returns that section, or an empty map
/// if the tool has no configuration.
pub fn get_tool_config(config: &Config, tool_name: &str) -> HashMap<String, Value> {
    config
        .get("tools")
        .and_then(|v| v.as_object())
        .and_then(|tools| tools.get(tool_name))
        .and_then(|v| v.as_object())
        .map(|section| section.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default()
}
