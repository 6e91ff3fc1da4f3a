//! Console configuration
//!
//! Every path is derived from a base directory. Values can be overridden,
//! highest precedence first, by explicit overrides (command-line flags or
//! environment variables, resolved by the binary), by an optional
//! `hawk.yml` in the base directory, and finally by built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_NAMES: [&str; 2] = ["hawk.yml", "hawk.yaml"];

pub const DEFAULT_UNIT: &str = "hawk-agent.service";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Poll cadences per data source. The catalog has no cadence: it only
/// refreshes on startup and on manual refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cadences {
    pub health: Duration,
    pub streams: Duration,
    pub command: Duration,
    pub logs: Duration,
}

impl Default for Cadences {
    fn default() -> Self {
        Self {
            health: Duration::from_millis(2_000),
            streams: Duration::from_millis(2_000),
            command: Duration::from_millis(2_500),
            logs: Duration::from_millis(800),
        }
    }
}

/// Upper bound on how long each external probe may run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeouts {
    pub catalog: Duration,
    pub health: Duration,
    pub streams: Duration,
    pub command: Duration,
    pub lifecycle: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            catalog: Duration::from_secs(4),
            health: Duration::from_secs(6),
            streams: Duration::from_secs(5),
            command: Duration::from_secs(6),
            lifecycle: Duration::from_secs(6),
        }
    }
}

/// Cadence overrides in the config file (milliseconds)
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IntervalFile {
    pub health_ms: Option<u64>,
    pub streams_ms: Option<u64>,
    pub command_ms: Option<u64>,
    pub logs_ms: Option<u64>,
}

/// Timeout overrides in the config file (milliseconds)
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TimeoutFile {
    pub catalog_ms: Option<u64>,
    pub health_ms: Option<u64>,
    pub streams_ms: Option<u64>,
    pub command_ms: Option<u64>,
    pub lifecycle_ms: Option<u64>,
}

/// Root of the optional `hawk.yml`. Relative paths resolve against the
/// base directory.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub bin: Option<PathBuf>,
    #[serde(default)]
    pub daemon_ctl: Option<PathBuf>,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub stream_file: Option<PathBuf>,
    #[serde(default)]
    pub grpc_targets: Option<PathBuf>,
    #[serde(default)]
    pub grpc_fake: Option<PathBuf>,
    #[serde(default)]
    pub units_file: Option<PathBuf>,
    #[serde(default)]
    pub notes_file: Option<PathBuf>,
    #[serde(default)]
    pub default_unit: Option<String>,
    #[serde(default)]
    pub intervals: IntervalFile,
    #[serde(default)]
    pub timeouts: TimeoutFile,
}

impl FileConfig {
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Look for a config file in the base directory
    pub fn discover(base_dir: &Path) -> Result<Option<(PathBuf, Self)>, ConfigError> {
        for name in CONFIG_NAMES {
            let path = base_dir.join(name);
            if path.is_file() {
                let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                return Ok(Some((path, Self::from_str(&content)?)));
            }
        }
        Ok(None)
    }
}

/// Explicit overrides, usually from flags or environment variables
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub bin: Option<PathBuf>,
    pub daemon_ctl: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub stream_file: Option<PathBuf>,
    pub grpc_targets: Option<PathBuf>,
    pub grpc_fake: Option<PathBuf>,
    pub units_file: Option<PathBuf>,
    pub notes_file: Option<PathBuf>,
    pub default_unit: Option<String>,
}

#[derive(Clone, Debug)]
pub struct HawkConfig {
    pub base_dir: PathBuf,
    /// Probe executable (`list`, `run <id>`)
    pub bin: PathBuf,
    /// Lifecycle executable (`<action> <unit>`)
    pub daemon_ctl: PathBuf,
    pub log_file: PathBuf,
    pub stream_file: PathBuf,
    pub grpc_targets: PathBuf,
    pub grpc_fake: PathBuf,
    pub units_file: PathBuf,
    pub notes_file: PathBuf,
    pub default_unit: String,
    pub cadences: Cadences,
    pub timeouts: Timeouts,
}

impl HawkConfig {
    /// Built-in defaults for a base directory
    pub fn from_base(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let fake_env = base_dir.join("shell").join("fake_env");
        Self {
            bin: base_dir.join("bin").join("hawk-cmd"),
            daemon_ctl: base_dir.join("adapters").join("daemon_ctl.sh"),
            log_file: fake_env.join("runtime.log"),
            stream_file: fake_env.join("stream.events"),
            grpc_targets: fake_env.join("grpc.targets"),
            grpc_fake: fake_env.join("grpc_health.jsonl"),
            units_file: base_dir.join("conf").join("systemd_units.txt"),
            notes_file: base_dir.join("agent_chat.log"),
            default_unit: DEFAULT_UNIT.to_string(),
            cadences: Cadences::default(),
            timeouts: Timeouts::default(),
            base_dir,
        }
    }

    /// Resolve defaults, then the discovered config file, then overrides
    pub fn load(base_dir: impl Into<PathBuf>, overrides: Overrides) -> Result<Self, ConfigError> {
        let mut config = Self::from_base(base_dir);
        if let Some((path, file)) = FileConfig::discover(&config.base_dir)? {
            tracing::debug!(path = %path.display(), "loaded config file");
            config.apply_file(file);
        }
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Environment handed to every probe so collaborators see the same
    /// resolved paths and unit as the console
    pub fn probe_env(&self) -> Vec<(String, String)> {
        let path = |p: &Path| p.to_string_lossy().into_owned();
        vec![
            ("HAWK_BASE_DIR".into(), path(&self.base_dir)),
            ("HAWK_LOG_FILE".into(), path(&self.log_file)),
            ("HAWK_STREAM_FILE".into(), path(&self.stream_file)),
            ("HAWK_GRPC_TARGETS".into(), path(&self.grpc_targets)),
            ("HAWK_GRPC_FAKE_FILE".into(), path(&self.grpc_fake)),
            ("HAWK_UNITS_FILE".into(), path(&self.units_file)),
            ("HAWK_CHAT_FILE".into(), path(&self.notes_file)),
            ("HAWK_DAEMON_UNIT".into(), self.default_unit.clone()),
        ]
    }

    fn resolve(&self, path: PathBuf) -> PathBuf {
        if path.is_absolute() {
            path
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn apply_file(&mut self, file: FileConfig) {
        macro_rules! take_path {
            ($($field:ident),*) => {
                $(if let Some(p) = file.$field {
                    self.$field = self.resolve(p);
                })*
            };
        }
        take_path!(
            bin,
            daemon_ctl,
            log_file,
            stream_file,
            grpc_targets,
            grpc_fake,
            units_file,
            notes_file
        );
        if let Some(unit) = file.default_unit {
            self.default_unit = unit;
        }

        let ms = Duration::from_millis;
        let i = file.intervals;
        if let Some(v) = i.health_ms {
            self.cadences.health = ms(v);
        }
        if let Some(v) = i.streams_ms {
            self.cadences.streams = ms(v);
        }
        if let Some(v) = i.command_ms {
            self.cadences.command = ms(v);
        }
        if let Some(v) = i.logs_ms {
            self.cadences.logs = ms(v);
        }

        let t = file.timeouts;
        if let Some(v) = t.catalog_ms {
            self.timeouts.catalog = ms(v);
        }
        if let Some(v) = t.health_ms {
            self.timeouts.health = ms(v);
        }
        if let Some(v) = t.streams_ms {
            self.timeouts.streams = ms(v);
        }
        if let Some(v) = t.command_ms {
            self.timeouts.command = ms(v);
        }
        if let Some(v) = t.lifecycle_ms {
            self.timeouts.lifecycle = ms(v);
        }
    }

    pub fn apply_overrides(&mut self, o: Overrides) {
        macro_rules! take_path {
            ($($field:ident),*) => {
                $(if let Some(p) = o.$field {
                    self.$field = self.resolve(p);
                })*
            };
        }
        take_path!(
            bin,
            daemon_ctl,
            log_file,
            stream_file,
            grpc_targets,
            grpc_fake,
            units_file,
            notes_file
        );
        if let Some(unit) = o.default_unit {
            self.default_unit = unit;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_unit.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "default_unit".into(),
                reason: "must not be empty".into(),
            });
        }

        let durations = [
            ("intervals.health_ms", self.cadences.health),
            ("intervals.streams_ms", self.cadences.streams),
            ("intervals.command_ms", self.cadences.command),
            ("intervals.logs_ms", self.cadences.logs),
            ("timeouts.catalog_ms", self.timeouts.catalog),
            ("timeouts.health_ms", self.timeouts.health),
            ("timeouts.streams_ms", self.timeouts.streams),
            ("timeouts.command_ms", self.timeouts.command),
            ("timeouts.lifecycle_ms", self.timeouts.lifecycle),
        ];
        for (field, value) in durations {
            if value.is_zero() {
                return Err(ConfigError::InvalidValue {
                    field: field.into(),
                    reason: "must be greater than zero".into(),
                });
            }
        }
        Ok(())
    }
}
