//! TOML configuration persistence for the agent.
//!
//! Reads and writes [`AgentConfig`] at the platform-appropriate location:
//! - Windows:  `%APPDATA%\necme\config.toml`
//! - Linux:    `~/.config/necme/config.toml`
//! - macOS:    `~/Library/Application Support/necme/config.toml`
//!
//! Each `[[displays]]` entry records the four values discovery produced:
//! host, monitor id, model, and serial.  Model and serial form the unique
//! key that stops the same physical display being configured twice.
//!
//! Fields absent from the file fall back to `#[serde(default)]` values, so
//! the agent runs before a config file exists and across schema additions.

use std::path::{Path, PathBuf};

use necme_core::{ControllerIdentity, MonitorId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transport::DEFAULT_CONTROL_PORT;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A display with the same model/serial identity is already configured.
    #[error("display {unique_id} is already configured")]
    DuplicateDisplay { unique_id: String },

    /// The poll interval is zero, which would spin the poll loop.
    #[error("poll_interval_secs must be at least 1")]
    InvalidPollInterval,
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level agent configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AgentConfig {
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub displays: Vec<DisplayEntry>,
}

/// General agent behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSettings {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Seconds between state refreshes of each display.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

/// Persisted record of one configured display, as produced by discovery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayEntry {
    /// Hostname or IP address of the display's LAN port.
    pub host: String,
    /// TCP control port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Monitor address on that host.
    pub monitor_id: MonitorId,
    /// Model name reported at discovery time.
    pub model: String,
    /// Serial number reported at discovery time.
    pub serial: String,
}

impl DisplayEntry {
    /// Stable key for this physical display, `"{model}:{serial}"`.
    pub fn unique_id(&self) -> String {
        format!("{}:{}", self.model, self.serial)
    }
}

impl From<ControllerIdentity> for DisplayEntry {
    fn from(identity: ControllerIdentity) -> Self {
        Self {
            host: identity.host,
            port: DEFAULT_CONTROL_PORT,
            monitor_id: identity.monitor_id,
            model: identity.model,
            serial: identity.serial,
        }
    }
}

impl AgentConfig {
    /// Checks cross-field constraints the TOML schema cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPollInterval`] when the poll interval
    /// is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidPollInterval);
        }
        Ok(())
    }

    /// Appends a display entry, refusing duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateDisplay`] when an entry with the same
    /// model/serial identity already exists.
    pub fn add_display(&mut self, entry: DisplayEntry) -> Result<(), ConfigError> {
        let unique_id = entry.unique_id();
        if self.displays.iter().any(|d| d.unique_id() == unique_id) {
            return Err(ConfigError::DuplicateDisplay { unique_id });
        }
        self.displays.push(entry);
        Ok(())
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_poll_interval() -> u64 {
    30
}
fn default_port() -> u16 {
    DEFAULT_CONTROL_PORT
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config
/// base directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the default path of the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot
/// be determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads [`AgentConfig`] from `path`, returning `AgentConfig::default()`
/// when the file does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not
/// found", [`ConfigError::Parse`] if the TOML is malformed, and
/// [`ConfigError::InvalidPollInterval`] if the file fails validation.
pub fn load_config_from(path: &Path) -> Result<AgentConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let cfg: AgentConfig = toml::from_str(&content)?;
            cfg.validate()?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AgentConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &AgentConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config base directory plus the `necme` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("necme"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("necme"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("necme")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(model: &str, serial: &str) -> DisplayEntry {
        DisplayEntry {
            host: "10.0.0.5".to_string(),
            port: DEFAULT_CONTROL_PORT,
            monitor_id: MonitorId::new(1).unwrap(),
            model: model.to_string(),
            serial: serial.to_string(),
        }
    }

    #[test]
    fn test_default_config_has_no_displays() {
        let cfg = AgentConfig::default();
        assert!(cfg.displays.is_empty());
        assert_eq!(cfg.agent.log_level, "info");
        assert_eq!(cfg.agent.poll_interval_secs, 30);
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        // Arrange
        let mut cfg = AgentConfig::default();
        cfg.agent.poll_interval_secs = 10;
        cfg.add_display(entry("ME501", "7Z00123")).unwrap();

        // Act
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: AgentConfig = toml::from_str(&toml_str).expect("deserialize");

        // Assert
        assert_eq!(cfg, restored);
        assert_eq!(restored.displays[0].unique_id(), "ME501:7Z00123");
    }

    #[test]
    fn test_deserialize_minimal_toml_uses_defaults() {
        let cfg: AgentConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, AgentConfig::default());

        let cfg: AgentConfig = toml::from_str("[agent]\n").expect("deserialize agent only");
        assert_eq!(cfg.agent.log_level, "info");
    }

    #[test]
    fn test_display_entry_port_defaults_when_absent() {
        let toml_str = r#"
[[displays]]
host = "10.0.0.5"
monitor_id = 1
model = "ME501"
serial = "7Z00123"
"#;
        let cfg: AgentConfig = toml::from_str(toml_str).expect("deserialize");
        assert_eq!(cfg.displays[0].port, DEFAULT_CONTROL_PORT);
    }

    #[test]
    fn test_out_of_range_monitor_id_fails_to_parse() {
        let toml_str = r#"
[[displays]]
host = "10.0.0.5"
monitor_id = 101
model = "ME501"
serial = "7Z00123"
"#;
        let result: Result<AgentConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }

    #[test]
    fn test_add_display_refuses_duplicate_identity() {
        let mut cfg = AgentConfig::default();
        cfg.add_display(entry("ME501", "7Z00123")).unwrap();

        // Same model/serial on a different host is still the same display.
        let mut dup = entry("ME501", "7Z00123");
        dup.host = "10.0.0.99".to_string();
        assert!(matches!(
            cfg.add_display(dup),
            Err(ConfigError::DuplicateDisplay { .. })
        ));
        assert_eq!(cfg.displays.len(), 1);
    }

    #[test]
    fn test_add_display_accepts_distinct_identity() {
        let mut cfg = AgentConfig::default();
        cfg.add_display(entry("ME501", "7Z00123")).unwrap();
        cfg.add_display(entry("ME501", "7Z00124")).unwrap();
        assert_eq!(cfg.displays.len(), 2);
    }

    #[test]
    fn test_zero_poll_interval_fails_validation() {
        // tokio's interval timer panics on a zero period, so a zero interval
        // must be rejected as a typed error before the agent ever runs.
        let cfg: AgentConfig =
            toml::from_str("[agent]\npoll_interval_secs = 0\n").expect("deserialize");
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidPollInterval)
        ));
    }

    #[test]
    fn test_load_rejects_zero_poll_interval() {
        let dir = std::env::temp_dir().join(format!("necme_interval_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[agent]\npoll_interval_secs = 0\n").unwrap();

        let result = load_config_from(&path);
        assert!(matches!(result, Err(ConfigError::InvalidPollInterval)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_parse_error() {
        let result = load_and_parse("[[[ not valid toml");
        assert!(result.is_err());
    }

    fn load_and_parse(content: &str) -> Result<AgentConfig, toml::de::Error> {
        toml::from_str(content)
    }

    #[test]
    fn test_load_config_returns_default_when_file_absent() {
        let path = PathBuf::from("/nonexistent/path/that/cannot/exist/config.toml");
        let cfg = load_config_from(&path).expect("absent file must yield defaults");
        assert_eq!(cfg, AgentConfig::default());
    }

    #[test]
    fn test_save_and_load_round_trip_via_temp_dir() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("necme_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let mut cfg = AgentConfig::default();
        cfg.agent.log_level = "debug".to_string();
        cfg.add_display(entry("M431", "8A00001")).unwrap();

        // Act
        save_config_to(&path, &cfg).unwrap();
        let loaded = load_config_from(&path).unwrap();

        // Assert
        assert_eq!(loaded, cfg);

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }
}
