use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{debug, warn};

use crate::config::{MonitorConfig, ProbeBody};
use crate::endpoint::Endpoint;
use crate::error::ProbeError;
use crate::http_client::{HttpClient, HttpRequest};

/// Outcome of a single probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeVerdict {
    pub healthy: bool,
    pub status_code: Option<u16>,
    pub latency: Duration,
    pub error: Option<String>,
}

/// A probe is healthy iff it got a response (`status_code` is `Some`) with a
/// 2xx status, no later than `timeout`.
pub fn classify(status_code: Option<u16>, latency: Duration, timeout: Duration) -> bool {
    match status_code {
        Some(code) => (200..300).contains(&code) && latency <= timeout,
        None => false,
    }
}

pub struct HealthClassifier {
    http_client: Box<dyn HttpClient>,
    timeout: Duration,
    default_method: String,
    probe_body: ProbeBody,
}

impl HealthClassifier {
    pub fn new(http_client: Box<dyn HttpClient>, config: &MonitorConfig) -> Self {
        Self {
            http_client,
            timeout: config.request_timeout,
            default_method: config.default_method.clone(),
            probe_body: config.probe_body,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issues exactly one request to `endpoint` and classifies it. Never fails:
    /// every error becomes an unhealthy verdict.
    pub async fn probe(&self, endpoint: &Endpoint) -> ProbeVerdict {
        let (result, latency) = match self.build_request(endpoint) {
            Ok(request) => self.send(request).await,
            Err(e) => (Err(e), Duration::ZERO),
        };

        match result {
            Ok(status_code) => {
                let healthy = classify(Some(status_code), latency, self.timeout);
                if healthy {
                    debug!(url = %endpoint.url, status_code, ?latency, "Probe succeeded");
                } else {
                    warn!(
                        "Request to {} returned {} in {:?} (unavailable)",
                        endpoint.url, status_code, latency
                    );
                }
                ProbeVerdict {
                    healthy,
                    status_code: Some(status_code),
                    latency,
                    error: None,
                }
            }
            Err(e) => {
                warn!(
                    "Request to {} failed: {} with duration: {:?}",
                    endpoint.url, e, latency
                );
                ProbeVerdict {
                    healthy: false,
                    status_code: None,
                    latency,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn send(&self, request: HttpRequest) -> (Result<u16, ProbeError>, Duration) {
        let start = Instant::now();
        let result = match time::timeout(self.timeout, self.http_client.send(request)).await {
            Ok(Ok(response)) => Ok(response.status_code),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        };
        (result, start.elapsed())
    }

    fn build_request(&self, endpoint: &Endpoint) -> Result<HttpRequest, ProbeError> {
        let body = match self.probe_body {
            ProbeBody::Descriptor => serde_json::to_vec(endpoint)?,
            ProbeBody::Template => endpoint.body.clone().into_bytes(),
        };

        let method_name = endpoint.effective_method(&self.default_method);
        let method = Method::from_bytes(method_name.as_bytes())
            .map_err(|_| ProbeError::InvalidMethod(method_name.to_string()))?;

        let mut headers = HeaderMap::with_capacity(endpoint.headers.len());
        for (name, value) in &endpoint.headers {
            let invalid = || ProbeError::InvalidHeader { name: name.clone() };
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
            let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
            headers.insert(header_name, header_value);
        }

        Ok(HttpRequest {
            method,
            url: endpoint.url.clone(),
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::MockHttpClient;

    const URL: &str = "http://svc.local/health";

    fn classifier(client: &MockHttpClient, config: MonitorConfig) -> HealthClassifier {
        HealthClassifier::new(Box::new(client.clone()), &config)
    }

    #[test]
    fn test_classify_rule() {
        let timeout = Duration::from_millis(500);

        assert!(classify(Some(204), Duration::from_millis(10), timeout));
        assert!(classify(Some(200), timeout, timeout));
        assert!(!classify(Some(200), Duration::from_millis(501), timeout));
        assert!(!classify(Some(500), Duration::from_millis(10), timeout));
        assert!(!classify(Some(301), Duration::from_millis(10), timeout));
        assert!(!classify(Some(199), Duration::from_millis(10), timeout));
        assert!(!classify(None, Duration::from_millis(10), timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_success() {
        let client = MockHttpClient::new().with_response(URL, 204, Duration::from_millis(10));
        let classifier = classifier(&client, MonitorConfig::default());

        let verdict = classifier.probe(&Endpoint::new("svc", URL)).await;

        assert!(verdict.healthy);
        assert_eq!(verdict.status_code, Some(204));
        assert!(verdict.latency >= Duration::from_millis(10));
        assert!(verdict.latency < Duration::from_millis(500));
        assert_eq!(verdict.error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_server_error_is_unhealthy() {
        let client = MockHttpClient::new().with_response(URL, 500, Duration::from_millis(50));
        let classifier = classifier(&client, MonitorConfig::default());

        let verdict = classifier.probe(&Endpoint::new("svc", URL)).await;

        assert!(!verdict.healthy);
        assert_eq!(verdict.status_code, Some(500));
        assert_eq!(verdict.error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_transport_error_is_unhealthy() {
        let client =
            MockHttpClient::new().with_error(URL, "connection refused", Duration::from_millis(5));
        let classifier = classifier(&client, MonitorConfig::default());

        let verdict = classifier.probe(&Endpoint::new("svc", URL)).await;

        assert!(!verdict.healthy);
        assert_eq!(verdict.status_code, None);
        assert_eq!(verdict.error.as_deref(), Some("connection refused"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_timeout_is_unhealthy() {
        let client = MockHttpClient::new().with_response(URL, 200, Duration::from_millis(800));
        let classifier = classifier(&client, MonitorConfig::default());

        let verdict = classifier.probe(&Endpoint::new("svc", URL)).await;

        assert!(!verdict.healthy);
        assert_eq!(verdict.status_code, None);
        assert!(verdict.latency >= Duration::from_millis(500));
        assert!(verdict.error.unwrap().contains("timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_defaults_method_without_touching_endpoint() {
        let client = MockHttpClient::new().with_response(URL, 200, Duration::ZERO);
        let classifier = classifier(&client, MonitorConfig::default());
        let endpoint = Endpoint::new("svc", URL);

        classifier.probe(&endpoint).await;

        assert!(endpoint.method.is_empty());
        assert_eq!(client.requests()[0].method, Method::GET);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_uses_configured_method_and_headers() {
        let client = MockHttpClient::new().with_response(URL, 200, Duration::ZERO);
        let classifier = classifier(&client, MonitorConfig::default());
        let endpoint = Endpoint::new("svc", URL)
            .with_method("POST")
            .with_header("user-agent", "availability-probe")
            .with_header("x-api-key", "secret");

        classifier.probe(&endpoint).await;

        let request = &client.requests()[0];
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.headers["user-agent"], "availability-probe");
        assert_eq!(request.headers["x-api-key"], "secret");
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_sends_descriptor_as_body() {
        let client = MockHttpClient::new().with_response(URL, 200, Duration::ZERO);
        let classifier = classifier(&client, MonitorConfig::default());
        let endpoint = Endpoint::new("svc", URL).with_body(r#"{"foo":"bar"}"#);

        classifier.probe(&endpoint).await;

        let sent: Endpoint = serde_json::from_slice(&client.requests()[0].body).unwrap();
        assert_eq!(sent, endpoint);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_sends_template_body_when_configured() {
        let client = MockHttpClient::new().with_response(URL, 200, Duration::ZERO);
        let config = MonitorConfig {
            probe_body: ProbeBody::Template,
            ..MonitorConfig::default()
        };
        let classifier = classifier(&client, config);
        let endpoint = Endpoint::new("svc", URL).with_body(r#"{"foo":"bar"}"#);

        classifier.probe(&endpoint).await;

        assert_eq!(client.requests()[0].body, br#"{"foo":"bar"}"#.to_vec());
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_invalid_method_is_unhealthy_without_request() {
        let client = MockHttpClient::new().with_response(URL, 200, Duration::ZERO);
        let classifier = classifier(&client, MonitorConfig::default());
        let endpoint = Endpoint::new("svc", URL).with_method("NOT A METHOD");

        let verdict = classifier.probe(&endpoint).await;

        assert!(!verdict.healthy);
        assert!(verdict.error.is_some());
        assert!(client.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_invalid_header_is_unhealthy() {
        let client = MockHttpClient::new().with_response(URL, 200, Duration::ZERO);
        let classifier = classifier(&client, MonitorConfig::default());
        let endpoint = Endpoint::new("svc", URL).with_header("bad header", "value");

        let verdict = classifier.probe(&endpoint).await;

        assert!(!verdict.healthy);
        assert_eq!(verdict.error.as_deref(), Some("invalid header \"bad header\""));
    }
}
