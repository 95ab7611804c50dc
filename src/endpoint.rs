use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One monitored endpoint as loaded from the config file.
///
/// Read-only once loaded. The probe applies defaults (such as the method) to
/// its own copy of the request, never to this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(default)]
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: String,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            method: String::new(),
            headers: BTreeMap::new(),
            body: String::new(),
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// The method to send: the configured one, or `default` when unset.
    pub fn effective_method<'a>(&'a self, default: &'a str) -> &'a str {
        if self.method.is_empty() {
            default
        } else {
            &self.method
        }
    }
}
