//! Logged outbound HTTP.
//!
//! # Responsibilities
//! - Wrap `reqwest` so every outbound call writes a request line before
//!   dispatch and a response line after
//!
//! # Design Decisions
//! - JSON segments are serialized with sorted keys for stable log output
//! - Response body logging can be disabled per call for large payloads

use std::collections::BTreeMap;

use reqwest::{Method, StatusCode};
use serde_json::Value;

use crate::error::Error;

/// HTTP client logging every request and response.
#[derive(Debug, Clone, Default)]
pub struct LoggedClient {
    client: reqwest::Client,
}

impl LoggedClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already-configured `reqwest` client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn get(&self, url: impl Into<String>) -> LoggedRequest {
        self.request(Method::GET, url)
    }

    pub fn post(&self, url: impl Into<String>) -> LoggedRequest {
        self.request(Method::POST, url)
    }

    pub fn put(&self, url: impl Into<String>) -> LoggedRequest {
        self.request(Method::PUT, url)
    }

    pub fn patch(&self, url: impl Into<String>) -> LoggedRequest {
        self.request(Method::PATCH, url)
    }

    pub fn delete(&self, url: impl Into<String>) -> LoggedRequest {
        self.request(Method::DELETE, url)
    }

    pub fn options(&self, url: impl Into<String>) -> LoggedRequest {
        self.request(Method::OPTIONS, url)
    }

    pub fn request(&self, method: Method, url: impl Into<String>) -> LoggedRequest {
        LoggedRequest {
            client: self.client.clone(),
            method,
            url: url.into(),
            params: None,
            json: None,
            form: None,
            headers: BTreeMap::new(),
            title: None,
            log_response_body: true,
        }
    }
}

/// One outbound call under construction.
#[derive(Debug, Clone)]
pub struct LoggedRequest {
    client: reqwest::Client,
    method: Method,
    url: String,
    params: Option<BTreeMap<String, String>>,
    json: Option<Value>,
    form: Option<BTreeMap<String, String>>,
    headers: BTreeMap<String, String>,
    title: Option<String>,
    log_response_body: bool,
}

impl LoggedRequest {
    /// Query parameters, logged as the `PARAMS:` segment.
    pub fn query(mut self, params: &[(&str, &str)]) -> Self {
        self.params = Some(
            params
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        );
        self
    }

    /// JSON body, logged as the `JSON:` segment.
    pub fn json(mut self, body: &Value) -> Self {
        self.json = Some(body.clone());
        self
    }

    /// Form body, logged as the `DATA:` segment.
    pub fn form(mut self, fields: &[(&str, &str)]) -> Self {
        self.form = Some(
            fields
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        );
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Prefix prepended to both log lines, to tie them to a caller.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Disable the `CONTENT:` segment of the response line.
    pub fn log_response_body(mut self, enabled: bool) -> Self {
        self.log_response_body = enabled;
        self
    }

    /// Dispatch the request, logging before and after.
    pub async fn send(self) -> Result<LoggedResponse, Error> {
        tracing::info!("{}", self.request_line());

        let mut builder = self.client.request(self.method.clone(), &self.url);
        if let Some(params) = &self.params {
            builder = builder.query(params);
        }
        if let Some(json) = &self.json {
            builder = builder.json(json);
        }
        if let Some(form) = &self.form {
            builder = builder.form(form);
        }
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        tracing::info!("{}", self.response_line(status, &body));

        Ok(LoggedResponse { status, body })
    }

    fn request_line(&self) -> String {
        let mut line = self.title.clone().unwrap_or_default();
        line.push_str(&format!("Triggered {} on {}:", self.method, self.url));
        if let Some(params) = &self.params {
            line.push_str(&format!("\nPARAMS: {}", map_json(params)));
        }
        if let Some(form) = &self.form {
            line.push_str(&format!("\nDATA: {}", map_json(form)));
        }
        if let Some(json) = &self.json {
            line.push_str(&format!("\nJSON: {json}"));
        }
        if !self.headers.is_empty() {
            line.push_str(&format!("\nHEADERS: {}", map_json(&self.headers)));
        }
        line
    }

    fn response_line(&self, status: StatusCode, body: &str) -> String {
        let mut line = self.title.clone().unwrap_or_default();
        line.push_str(&format!(
            "Response for {} on {}:\nSTATUS: {}",
            self.method,
            self.url,
            status.as_u16()
        ));
        if self.log_response_body {
            line.push_str(&format!("\nCONTENT: {body}"));
        }
        line
    }
}

fn map_json(map: &BTreeMap<String, String>) -> String {
    serde_json::to_string(map).unwrap_or_else(|_| "{}".to_string())
}

/// Buffered outcome of a logged call.
#[derive(Debug, Clone)]
pub struct LoggedResponse {
    pub status: StatusCode,
    pub body: String,
}

impl LoggedResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn json(&self) -> Result<Value, Error> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_line_segments_in_order() {
        let request = LoggedClient::new()
            .post("http://api.local/orders")
            .query(&[("b", "2"), ("a", "1")])
            .json(&json!({"z": 1, "a": 2}))
            .header("x-token", "t")
            .title("orders ");

        let line = request.request_line();
        assert!(line.starts_with("orders Triggered POST on http://api.local/orders:"));
        assert!(line.contains("\nPARAMS: {\"a\":\"1\",\"b\":\"2\"}"));
        assert!(line.contains("\nJSON: {\"a\":2,\"z\":1}"));
        assert!(line.ends_with("\nHEADERS: {\"x-token\":\"t\"}"));
    }

    #[test]
    fn test_response_line_respects_body_switch() {
        let request = LoggedClient::new()
            .get("http://api.local/x")
            .log_response_body(false);
        let line = request.response_line(StatusCode::OK, "ignored");
        assert_eq!(line, "Response for GET on http://api.local/x:\nSTATUS: 200");

        let request = LoggedClient::new().get("http://api.local/x");
        let line = request.response_line(StatusCode::NOT_FOUND, "missing");
        assert!(line.ends_with("STATUS: 404\nCONTENT: missing"));
    }
}
