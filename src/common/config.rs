//! Configuration file handling

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Default scenario parameters
    #[serde(default)]
    pub defaults: Defaults,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Explicit program locations (e.g. `envoy = "/opt/envoy/bin/envoy"`)
    #[serde(default)]
    pub programs: HashMap<String, PathBuf>,
}

/// Default settings
#[derive(Debug, Deserialize)]
pub struct Defaults {
    /// XDS API version handed to templates as `.XDS`
    #[serde(default = "default_xds")]
    pub xds: u32,

    /// First port handed out when a scenario allocates ports
    #[serde(default = "default_base_port")]
    pub base_port: u16,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            xds: default_xds(),
            base_port: default_base_port(),
        }
    }
}

fn default_xds() -> u32 {
    2
}

fn default_base_port() -> u16 {
    20000
}

/// Timeout settings
#[derive(Debug, Deserialize)]
pub struct Timeouts {
    /// Timeout for HTTP probes
    #[serde(default = "default_http")]
    pub http_secs: u64,

    /// How long a spawned process may take to open its ready port
    #[serde(default = "default_ready")]
    pub ready_secs: u64,

    /// Grace period between SIGTERM and SIGKILL on cleanup
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            http_secs: default_http(),
            ready_secs: default_ready(),
            shutdown_grace_ms: default_shutdown_grace(),
        }
    }
}

fn default_http() -> u64 {
    10
}
fn default_ready() -> u64 {
    15
}
fn default_shutdown_grace() -> u64 {
    2000
}

impl Timeouts {
    pub fn http(&self) -> Duration {
        Duration::from_secs(self.http_secs)
    }

    pub fn ready(&self) -> Duration {
        Duration::from_secs(self.ready_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Resolve a program name to an executable path
    ///
    /// Explicit configuration wins; otherwise the name is searched on PATH.
    /// Names containing a path separator are returned as-is.
    pub fn program(&self, name: &str) -> Result<PathBuf> {
        if let Some(path) = self.programs.get(name) {
            return Ok(path.clone());
        }

        let as_path = Path::new(name);
        if as_path.components().count() > 1 {
            return Ok(as_path.to_path_buf());
        }

        which::which(name).map_err(|e| {
            Error::Config(format!("program '{}' not found on PATH: {}", name, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.defaults.xds, 2);
        assert_eq!(config.defaults.base_port, 20000);
        assert_eq!(config.timeouts.http(), Duration::from_secs(10));
        assert!(config.programs.is_empty());
    }

    #[test]
    fn test_parse_overrides() {
        let config = Config::parse(
            r#"
[defaults]
xds = 3
base_port = 31000

[timeouts]
shutdown_grace_ms = 250

[programs]
envoy = "/opt/envoy/bin/envoy"
"#,
        )
        .unwrap();

        assert_eq!(config.defaults.xds, 3);
        assert_eq!(config.defaults.base_port, 31000);
        assert_eq!(config.timeouts.shutdown_grace(), Duration::from_millis(250));
        assert_eq!(
            config.program("envoy").unwrap(),
            PathBuf::from("/opt/envoy/bin/envoy")
        );
    }

    #[test]
    fn test_invalid_toml_is_config_parse_error() {
        let err = Config::parse("[defaults\nxds = ").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_program_with_path_is_kept() {
        let config = Config::default();
        assert_eq!(
            config.program("./bin/server").unwrap(),
            PathBuf::from("./bin/server")
        );
    }

    #[test]
    fn test_unknown_program_is_config_error() {
        let config = Config::default();
        let err = config.program("definitely-not-a-real-binary-xyz").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
