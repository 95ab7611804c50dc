use reqwest::Method;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::endpoint::Endpoint;
use crate::error::ConfigError;

pub const REQUEST_TIMEOUT: Duration = Duration::from_millis(500);
pub const CHECK_INTERVAL: Duration = Duration::from_secs(15);
pub const DEFAULT_HTTP_METHOD: &str = "GET";

/// How the probes of one round are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProbeMode {
    /// One endpoint at a time, in config order.
    #[default]
    Sequential,
    /// All endpoints at once; verdicts are recorded in config order after
    /// every probe has finished.
    Concurrent,
}

impl FromStr for ProbeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "concurrent" => Ok(Self::Concurrent),
            other => Err(format!("expected `sequential` or `concurrent`, got `{other}`")),
        }
    }
}

impl fmt::Display for ProbeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => f.write_str("sequential"),
            Self::Concurrent => f.write_str("concurrent"),
        }
    }
}

/// What a probe sends as its request body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProbeBody {
    /// The endpoint definition itself, JSON encoded.
    #[default]
    Descriptor,
    /// The endpoint's configured `body` string.
    Template,
}

impl FromStr for ProbeBody {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "descriptor" => Ok(Self::Descriptor),
            "template" => Ok(Self::Template),
            other => Err(format!("expected `descriptor` or `template`, got `{other}`")),
        }
    }
}

impl fmt::Display for ProbeBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Descriptor => f.write_str("descriptor"),
            Self::Template => f.write_str("template"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub request_timeout: Duration,
    pub check_interval: Duration,
    pub default_method: String,
    pub probe_mode: ProbeMode,
    pub probe_body: ProbeBody,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            request_timeout: REQUEST_TIMEOUT,
            check_interval: CHECK_INTERVAL,
            default_method: DEFAULT_HTTP_METHOD.to_string(),
            probe_mode: ProbeMode::default(),
            probe_body: ProbeBody::default(),
        }
    }
}

impl MonitorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds a config from `lookup`, falling back to the defaults for unset
    /// variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            request_timeout: parse_var(&lookup, "MONITOR_REQUEST_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),

            check_interval: parse_var(&lookup, "MONITOR_CHECK_INTERVAL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.check_interval),

            default_method: lookup("MONITOR_DEFAULT_METHOD")
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .unwrap_or(defaults.default_method),

            probe_mode: parse_var(&lookup, "MONITOR_PROBE_MODE")?.unwrap_or(defaults.probe_mode),

            probe_body: parse_var(&lookup, "MONITOR_PROBE_BODY")?.unwrap_or(defaults.probe_body),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.check_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "Check interval must be greater than 0".to_string(),
            ));
        }

        if Method::from_bytes(self.default_method.as_bytes()).is_err() {
            return Err(ConfigError::Invalid(format!(
                "Default method {:?} is not a valid HTTP method",
                self.default_method
            )));
        }

        Ok(())
    }

    pub fn log_configuration(&self) {
        info!(
            request_timeout = ?self.request_timeout,
            check_interval = ?self.check_interval,
            default_method = %self.default_method,
            probe_mode = %self.probe_mode,
            probe_body = %self.probe_body,
            "Monitor configuration"
        );
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnv {
                var,
                value,
                reason: e.to_string(),
            }),
    }
}

/// Reads the YAML endpoint list at `path`.
pub fn load_endpoints(path: &Path) -> Result<Vec<Endpoint>, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_endpoints(&contents, path)
}

pub fn parse_endpoints(contents: &str, path: &Path) -> Result<Vec<Endpoint>, ConfigError> {
    if contents.trim().is_empty() {
        return Err(ConfigError::NoEndpoints(path.to_path_buf()));
    }

    let endpoints: Vec<Endpoint> =
        serde_yaml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    if endpoints.is_empty() {
        return Err(ConfigError::NoEndpoints(path.to_path_buf()));
    }

    if let Some((index, endpoint)) = endpoints
        .iter()
        .enumerate()
        .find(|(_, e)| e.url.trim().is_empty())
    {
        return Err(ConfigError::MissingUrl {
            index,
            name: endpoint.name.clone(),
        });
    }

    Ok(endpoints)
}
