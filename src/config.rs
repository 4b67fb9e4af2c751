//! Service configuration
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `WINDOWSTAT_*` environment variables. Command-line flags are applied last
//! by the binary.

use crate::error::{Error, Result};
use crate::stats::WindowPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_HOST: &str = "WINDOWSTAT_HOST";
pub const ENV_PORT: &str = "WINDOWSTAT_PORT";
pub const ENV_LOG_LEVEL: &str = "WINDOWSTAT_LOG_LEVEL";
pub const ENV_WINDOW_POLICY: &str = "WINDOWSTAT_WINDOW_POLICY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub window_policy: WindowPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            window_policy: WindowPolicy::default(),
        }
    }
}

impl ServiceConfig {
    /// Load defaults, the optional file at `path`, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.merge_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn merge_env_vars(&mut self) -> Result<()> {
        self.merge_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value
    pub fn merge_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST) {
            self.host = host;
        }

        if let Some(port) = lookup(ENV_PORT) {
            self.port = port.trim().parse().map_err(|_| {
                Error::Config(format!("{ENV_PORT} must be a port number, got '{port}'"))
            })?;
        }

        if let Some(log_level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = log_level;
        }

        if let Some(policy) = lookup(ENV_WINDOW_POLICY) {
            self.window_policy = policy.parse().map_err(Error::Config)?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("host must not be empty".to_string()));
        }
        if self.log_level.trim().is_empty() {
            return Err(Error::Config("log_level must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.window_policy, WindowPolicy::LastBuckets);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ServiceConfig::from_toml("port = 9000\n").unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_toml_window_policy() {
        let config = ServiceConfig::from_toml(
            r#"
host = "0.0.0.0"
window_policy = "trailing-seconds"
"#,
        )
        .unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.window_policy, WindowPolicy::TrailingSeconds);
    }

    #[test]
    fn test_toml_rejects_unknown_keys() {
        let result = ServiceConfig::from_toml("window_seconds = 300\n");
        assert!(matches!(result, Err(Error::Toml(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "port = 7070").unwrap();
        writeln!(file, "log_level = \"debug\"").unwrap();

        let config = ServiceConfig::from_file(file.path()).unwrap();

        assert_eq!(config.port, 7070);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ServiceConfig::from_file(Path::new("/nonexistent/windowstat.toml"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = ServiceConfig::from_toml("port = 9000\n").unwrap();

        config
            .merge_env_with(env(&[
                (ENV_PORT, "9100"),
                (ENV_HOST, "10.0.0.1"),
                (ENV_WINDOW_POLICY, "trailing-seconds"),
            ]))
            .unwrap();

        assert_eq!(config.bind_address(), "10.0.0.1:9100");
        assert_eq!(config.window_policy, WindowPolicy::TrailingSeconds);
    }

    #[test]
    fn test_env_rejects_bad_values() {
        let mut config = ServiceConfig::default();
        let result = config.merge_env_with(env(&[(ENV_PORT, "eighty")]));
        assert!(matches!(result, Err(Error::Config(_))));

        let result = config.merge_env_with(env(&[(ENV_WINDOW_POLICY, "hourly")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_blank_host() {
        let config = ServiceConfig {
            host: "  ".to_string(),
            ..ServiceConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
