use serde::Deserialize;
use std::path::Path;

/// Top-level configuration for taskexec.
///
/// Loaded from `$XDG_CONFIG_HOME/taskexec/config.toml`.
/// All fields are optional — missing values use defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub supervisor: SupervisorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Ceiling on the number of concurrently live tasks (spec §3: `MAX_TASKS`).
    pub max_tasks: usize,
    /// Maximum bytes retained for a single captured output line (spec §4.2).
    pub max_line: usize,
    /// Maximum bytes for a single command read from stdin (spec §6).
    pub max_command_line: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Maximum log file size in megabytes before rotation.
    pub max_file_size_mb: u64,
    /// Number of archived log files to keep.
    pub max_archives: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            supervisor: SupervisorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_tasks: 4096,
            max_line: 4096,
            max_command_line: 4096,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 10,
            max_archives: 5,
        }
    }
}

impl Config {
    /// Load config from a TOML file. Returns defaults if the file doesn't exist.
    /// Logs a warning and returns defaults if the file exists but is malformed.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("Failed to parse config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}
