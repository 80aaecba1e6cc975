use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::{Result, ServerError};

/// File names probed in the working directory when no config path is given.
pub const DEFAULT_CONFIG_FILES: &[&str] = &["circuitsim.toml", "circuitsim.json"];

/// Configuration for the CircuitSim MCP server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// ngspice invocation and deck options
    pub simulator: SimulatorConfig,

    /// Datasheet library sources
    pub library: LibraryConfig,

    /// Resource limits applied to tool requests
    pub limits: LimitsConfig,

    /// Streamable HTTP transport
    pub http: HttpConfig,

    /// Log level and optional log directory
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// ngspice executable, looked up on PATH when not absolute
    pub ngspice_path: String,

    /// Wall-clock limit for a single ngspice run
    pub timeout_secs: u64,

    /// Circuit temperature in degrees Celsius
    pub temperature_c: f64,

    /// Temperature at which model parameters were measured
    pub nominal_temperature_c: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Directory of additional datasheet JSON files
    pub datasheet_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_circuits: usize,
    pub max_components_per_circuit: usize,
    pub max_ac_points: usize,
    pub max_transient_points: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    /// SSE keep-alive interval
    pub keep_alive_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,

    /// Write a daily rotated log file here in addition to stderr
    pub log_dir: Option<PathBuf>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            ngspice_path: "ngspice".to_string(),
            timeout_secs: 60,
            temperature_c: 25.0,
            nominal_temperature_c: 25.0,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_circuits: 100,
            max_components_per_circuit: 500,
            max_ac_points: 10_000,
            max_transient_points: 1_000_000,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            keep_alive_seconds: 15,
        }
    }
}

impl HttpConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML or JSON file, picked by extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let config = if is_json {
            serde_json::from_str(&content)?
        } else {
            toml::from_str(&content).map_err(|e| {
                ServerError::config(format!("failed to parse {}: {}", path.display(), e))
            })?
        };
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let content = if is_json {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)
                .map_err(|e| ServerError::config(format!("failed to encode config: {}", e)))?
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolve the effective configuration.
    ///
    /// Precedence, lowest first: built-in defaults, the config file
    /// (`explicit`, then `CIRCUITSIM_CONFIG`, then a `circuitsim.toml` or
    /// `circuitsim.json` in the working directory), `CIRCUITSIM_*`
    /// environment variables.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| env::var("CIRCUITSIM_CONFIG").ok().map(PathBuf::from))
            .or_else(|| {
                DEFAULT_CONFIG_FILES
                    .iter()
                    .map(PathBuf::from)
                    .find(|p| p.is_file())
            });

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply overrides from any key lookup; unparsable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CIRCUITSIM_NGSPICE_PATH") {
            self.simulator.ngspice_path = v;
        }
        override_parsed(&lookup, "CIRCUITSIM_TIMEOUT_SECS", &mut self.simulator.timeout_secs);
        override_parsed(&lookup, "CIRCUITSIM_TEMPERATURE", &mut self.simulator.temperature_c);
        if let Some(v) = lookup("CIRCUITSIM_DATASHEET_DIR") {
            self.library.datasheet_dir = Some(PathBuf::from(v));
        }
        override_parsed(&lookup, "CIRCUITSIM_MAX_CIRCUITS", &mut self.limits.max_circuits);
        override_parsed(
            &lookup,
            "CIRCUITSIM_MAX_COMPONENTS",
            &mut self.limits.max_components_per_circuit,
        );
        if let Some(v) = lookup("CIRCUITSIM_HOST") {
            self.http.host = v;
        }
        override_parsed(&lookup, "CIRCUITSIM_PORT", &mut self.http.port);
        if let Some(v) = lookup("CIRCUITSIM_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = lookup("CIRCUITSIM_LOG_DIR") {
            self.logging.log_dir = Some(PathBuf::from(v));
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.simulator.ngspice_path.trim().is_empty() {
            return Err(ServerError::config("simulator.ngspice_path must not be empty"));
        }

        if self.simulator.timeout_secs == 0 {
            return Err(ServerError::config(
                "simulator.timeout_secs must be greater than 0",
            ));
        }

        if !self.simulator.temperature_c.is_finite()
            || !self.simulator.nominal_temperature_c.is_finite()
        {
            return Err(ServerError::config("simulator temperatures must be finite"));
        }

        if self.limits.max_circuits == 0 {
            return Err(ServerError::config("limits.max_circuits must be greater than 0"));
        }

        if self.limits.max_components_per_circuit == 0 {
            return Err(ServerError::config(
                "limits.max_components_per_circuit must be greater than 0",
            ));
        }

        if self.limits.max_ac_points == 0 || self.limits.max_transient_points == 0 {
            return Err(ServerError::config(
                "limits.max_ac_points and limits.max_transient_points must be greater than 0",
            ));
        }

        if self.http.keep_alive_seconds == 0 {
            return Err(ServerError::config(
                "http.keep_alive_seconds must be greater than 0",
            ));
        }

        Ok(())
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse() {
            Ok(value) => *target = value,
            Err(_) => warn!("Ignoring {}={:?}: not a valid value", key, raw),
        }
    }
}
