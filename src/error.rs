use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Startup failures. Any of these stops the process before the first round.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("config file {0} contains no endpoints")]
    NoEndpoints(PathBuf),

    #[error("endpoint #{index} ({name:?}) has an empty url")]
    MissingUrl { index: usize, name: String },

    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0}")]
    Invalid(String),
}

/// Anything that stops a probe from producing a response. Always folded into
/// an unhealthy verdict by the classifier.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("invalid HTTP method {0:?}")]
    InvalidMethod(String),

    #[error("invalid header {name:?}")]
    InvalidHeader { name: String },

    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("{}", error_chain(.0))]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Transport(String),
}

/// Renders `err` followed by each of its sources, joined by `": "`.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        // Some layers repeat their inner error in their own message.
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("domain {0:?} was recorded before it was seeded")]
    UnseededDomain(String),

    #[error("failed to write availability report: {0}")]
    Report(#[from] std::io::Error),
}
