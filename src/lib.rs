pub mod config;
pub mod domain;
pub mod domain_stats;
pub mod endpoint;
pub mod error;
pub mod health_check;
pub mod http_client;
pub mod monitor;
pub mod reporter;

pub use config::{load_endpoints, MonitorConfig, ProbeBody, ProbeMode};
pub use domain::extract_domain;
pub use domain_stats::{DomainStats, DomainStatsRegistry};
pub use endpoint::Endpoint;
pub use error::{ConfigError, MonitorError, ProbeError};
pub use health_check::{classify, HealthClassifier, ProbeVerdict};
pub use http_client::{HttpClient, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use monitor::{HealthMonitor, RoundSummary};
