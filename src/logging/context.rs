//! Per-call logging context and named accessors.
//!
//! # Responsibilities
//! - Snapshot inbound requests and outbound responses for logging
//! - Resolve the named placeholders used by the message templates
//!
//! # Design Decisions
//! - Explicit composition instead of mixin inheritance: the context owns the
//!   request/response snapshots and a free-form extra map
//! - `resolve` is a static match over accessor names, no reflection
//! - Every accessor degrades to `None` (rendered as the sentinel) when its
//!   context is missing; resolution never fails a request

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::request::Parts;
use axum::http::StatusCode;
use serde_json::{Map, Value};

/// Request header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "user-id";

/// Request header carrying the session id.
pub const SESSION_ID_HEADER: &str = "x-session-id";

const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Snapshot of an inbound request, taken before the handler consumes it.
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    pub path: String,
    pub method: String,
    /// Header names lowercased; non-UTF-8 values are dropped.
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub remote_addr: Option<String>,
    /// Buffered body, classified by content type. Multipart file parts are
    /// replaced by `FILE[<filename>]` descriptors, never file bytes.
    pub body: Option<Value>,
}

impl RequestInfo {
    /// Capture path, method, headers, query parameters and the peer address
    /// (when `ConnectInfo` is present in the request extensions).
    pub fn from_parts(parts: &Parts) -> Self {
        let headers = parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let query = parts.uri.query().map(parse_query).unwrap_or_default();

        let remote_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip().to_string());

        Self {
            path: parts.uri.path().to_string(),
            method: parts.method.to_string(),
            headers,
            query,
            remote_addr,
            body: None,
        }
    }

    /// Attach a buffered body, classified by the request content type.
    pub fn with_body(mut self, bytes: &[u8]) -> Self {
        let content_type = self.header("content-type").unwrap_or("").to_string();
        self.body = classify_body(&content_type, bytes);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Snapshot of an outbound response.
#[derive(Debug, Clone, Default)]
pub struct ResponseInfo {
    pub status: u16,
    /// Response payload; non-JSON bodies are kept as raw text.
    pub body: Option<Value>,
}

impl ResponseInfo {
    pub fn from_status(status: StatusCode) -> Self {
        Self {
            status: status.as_u16(),
            body: None,
        }
    }

    /// Attach a buffered response body, parsed as JSON when possible.
    pub fn with_body(mut self, bytes: &[u8]) -> Self {
        if !bytes.is_empty() {
            self.body = Some(serde_json::from_slice(bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(bytes).into_owned())
            }));
        }
        self
    }
}

/// Context consumed by one log statement.
///
/// Built by the call site immediately before the adapter call and dropped
/// afterwards; nothing persists across log statements.
#[derive(Debug, Clone, Default)]
pub struct LogContext {
    request: Option<RequestInfo>,
    response: Option<ResponseInfo>,
    api_action: Option<String>,
    header_keys: Vec<String>,
    extra: BTreeMap<String, String>,
}

impl LogContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request(mut self, request: RequestInfo) -> Self {
        self.request = Some(request);
        self
    }

    pub fn with_response(mut self, response: ResponseInfo) -> Self {
        self.response = Some(response);
        self
    }

    pub fn with_api_action(mut self, action: impl Into<String>) -> Self {
        self.api_action = Some(action.into());
        self
    }

    /// Restrict `request_data` headers to an allow-list. Empty = all headers.
    pub fn with_header_keys(mut self, keys: &[String]) -> Self {
        self.header_keys = keys.to_vec();
        self
    }

    /// Add a free-form value, used as the fallback lookup for placeholders
    /// no accessor covers (e.g. `processing_time`).
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub(crate) fn extra(&self, key: &str) -> Option<String> {
        self.extra.get(key).cloned()
    }

    /// Resolve a named accessor.
    ///
    /// Returns `None` for unknown names and for accessors whose context is
    /// missing; the builder then falls back to the extra map and finally the
    /// sentinel.
    pub fn resolve(&self, name: &str) -> Option<String> {
        match name {
            "api_action" => Some(
                self.api_action
                    .clone()
                    .unwrap_or_else(|| super::builder::DEFAULT_VALUE.to_string()),
            ),
            "user_id" => {
                let request = self.request.as_ref()?;
                Some(
                    request
                        .header(USER_ID_HEADER)
                        .unwrap_or(super::builder::DEFAULT_VALUE)
                        .to_string(),
                )
            }
            "request_path" => Some(self.request.as_ref()?.path.clone()),
            "request_method" => Some(self.request.as_ref()?.method.to_uppercase()),
            "session_id" => {
                let request = self.request.as_ref()?;
                Some(
                    request
                        .header(SESSION_ID_HEADER)
                        .filter(|id| !id.is_empty())
                        .unwrap_or(super::builder::DEFAULT_VALUE)
                        .to_string(),
                )
            }
            "request_client_ip" => self.request_client_ip(),
            "request_data" => {
                let request = self.request.as_ref()?;
                Some(self.request_data(request))
            }
            "response_data" => {
                let response = self.response.as_ref()?;
                let body = response.body.clone().unwrap_or(Value::Null);
                Some(format!("RESPONSE: {body}"))
            }
            "response_code" => Some(self.response.as_ref()?.status.to_string()),
            _ => None,
        }
    }

    /// First entry of `x-forwarded-for`, falling back to the peer address.
    fn request_client_ip(&self) -> Option<String> {
        let request = self.request.as_ref()?;
        if let Some(forwarded) = request.header(FORWARDED_FOR_HEADER) {
            if !forwarded.is_empty() {
                return Some(
                    forwarded
                        .split(',')
                        .next()
                        .unwrap_or(forwarded)
                        .trim()
                        .to_string(),
                );
            }
        }
        request.remote_addr.clone()
    }

    /// Serialized headers, query parameters and body. Key order is
    /// deterministic (sorted) for downstream log parsing.
    fn request_data(&self, request: &RequestInfo) -> String {
        let headers: Map<String, Value> = if self.header_keys.is_empty() {
            request
                .headers
                .iter()
                .map(|(name, value)| (name.clone(), Value::String(value.clone())))
                .collect()
        } else {
            self.header_keys
                .iter()
                .map(|name| {
                    let value = request
                        .header(&name.to_ascii_lowercase())
                        .map(|v| Value::String(v.to_string()))
                        .unwrap_or(Value::Null);
                    (name.clone(), value)
                })
                .collect()
        };

        let query: Map<String, Value> = request
            .query
            .iter()
            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
            .collect();

        let body = match &request.body {
            Some(value) => value.to_string(),
            None => "{}".to_string(),
        };

        format!(
            "HEADERS: {}, QUERY_PARAMS: {}, REQUEST_DATA: {}",
            Value::Object(headers),
            Value::Object(query),
            body
        )
    }
}

fn parse_query(query: &str) -> BTreeMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

/// Classify a buffered body by content type. Parse failures degrade to the
/// raw text; logging never rejects a request.
fn classify_body(content_type: &str, bytes: &[u8]) -> Option<Value> {
    if bytes.is_empty() {
        return None;
    }

    let content_type = content_type.to_ascii_lowercase();

    if content_type.contains("multipart/form-data") {
        let boundary = boundary_param(&content_type)?;
        return Some(parse_multipart(bytes, &boundary));
    }

    if content_type.contains("application/json") {
        return Some(serde_json::from_slice(bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }));
    }

    if content_type.contains("application/x-www-form-urlencoded") {
        let fields: Map<String, Value> = url::form_urlencoded::parse(bytes)
            .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
            .collect();
        return Some(Value::Object(fields));
    }

    Some(Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

fn boundary_param(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|segment| {
        segment
            .trim()
            .strip_prefix("boundary=")
            .map(|b| b.trim_matches('"').to_string())
    })
}

/// Shallow multipart parse: text fields keep their value, file parts become
/// `FILE[<filename>]` descriptors.
fn parse_multipart(bytes: &[u8], boundary: &str) -> Value {
    let text = String::from_utf8_lossy(bytes);
    let delimiter = format!("--{boundary}");
    let mut fields = Map::new();

    for part in text.split(delimiter.as_str()) {
        let part = part.trim_start_matches("\r\n");
        if part.is_empty() || part.starts_with("--") {
            continue;
        }
        let Some((head, body)) = part.split_once("\r\n\r\n") else {
            continue;
        };

        let disposition = head
            .lines()
            .find(|line| line.to_ascii_lowercase().starts_with("content-disposition:"));
        let Some(disposition) = disposition else {
            continue;
        };

        let name = disposition_param(disposition, "name");
        let filename = disposition_param(disposition, "filename");

        if let Some(name) = name {
            let value = match filename {
                Some(filename) => format!("FILE[{filename}]"),
                None => body.trim_end_matches("\r\n").to_string(),
            };
            fields.insert(name, Value::String(value));
        }
    }

    Value::Object(fields)
}

fn disposition_param(header: &str, param: &str) -> Option<String> {
    header.split(';').find_map(|segment| {
        segment
            .trim()
            .strip_prefix(param)
            .and_then(|rest| rest.strip_prefix('='))
            .map(|value| value.trim_matches('"').to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn request_info(builder: axum::http::request::Builder) -> RequestInfo {
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        RequestInfo::from_parts(&parts)
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut info = request_info(
            Request::builder()
                .uri("/x")
                .header("x-forwarded-for", "1.2.3.4, 5.6.7.8"),
        );
        info.remote_addr = Some("9.9.9.9".to_string());
        let context = LogContext::new().with_request(info);
        assert_eq!(
            context.resolve("request_client_ip"),
            Some("1.2.3.4".to_string())
        );
    }

    #[test]
    fn test_client_ip_falls_back_to_remote_addr() {
        let mut info = request_info(Request::builder().uri("/x"));
        info.remote_addr = Some("9.9.9.9".to_string());
        let context = LogContext::new().with_request(info);
        assert_eq!(
            context.resolve("request_client_ip"),
            Some("9.9.9.9".to_string())
        );
    }

    #[test]
    fn test_empty_session_id_degrades_to_sentinel() {
        let info = request_info(Request::builder().uri("/x").header("x-session-id", ""));
        let context = LogContext::new().with_request(info);
        assert_eq!(context.resolve("session_id"), Some("NA".to_string()));
    }

    #[test]
    fn test_user_id_from_header() {
        let info = request_info(Request::builder().uri("/x").header("user-id", "42"));
        let context = LogContext::new().with_request(info.clone());
        assert_eq!(context.resolve("user_id"), Some("42".to_string()));

        let mut info = info;
        info.headers.remove("user-id");
        let context = LogContext::new().with_request(info);
        assert_eq!(context.resolve("user_id"), Some("NA".to_string()));
    }

    #[test]
    fn test_accessors_without_context_resolve_to_none() {
        let context = LogContext::new();
        for name in [
            "user_id",
            "request_path",
            "request_method",
            "session_id",
            "request_client_ip",
            "request_data",
            "response_data",
            "response_code",
        ] {
            assert_eq!(context.resolve(name), None, "accessor {name}");
        }
        // api_action always resolves, to the sentinel when unset.
        assert_eq!(context.resolve("api_action"), Some("NA".to_string()));
    }

    #[test]
    fn test_request_data_sorts_keys_and_honors_allow_list() {
        let info = request_info(
            Request::builder()
                .uri("/x?b=2&a=1")
                .header("x-token", "t")
                .header("accept", "application/json"),
        );

        let context = LogContext::new().with_request(info.clone());
        let data = context.resolve("request_data").unwrap();
        assert!(data.contains(r#"QUERY_PARAMS: {"a":"1","b":"2"}"#));
        assert!(data.contains(r#""accept":"application/json""#));

        let keys = vec!["x-token".to_string(), "x-missing".to_string()];
        let context = LogContext::new().with_request(info).with_header_keys(&keys);
        let data = context.resolve("request_data").unwrap();
        assert!(data.contains(r#"HEADERS: {"x-missing":null,"x-token":"t"}"#));
    }

    #[test]
    fn test_json_body_is_parsed() {
        let info = request_info(
            Request::builder()
                .uri("/x")
                .header("content-type", "application/json"),
        )
        .with_body(br#"{"b": 2, "a": 1}"#);
        let context = LogContext::new().with_request(info);
        let data = context.resolve("request_data").unwrap();
        assert!(data.ends_with(r#"REQUEST_DATA: {"a":1,"b":2}"#));
    }

    #[test]
    fn test_multipart_files_become_descriptors() {
        let body = b"--XB\r\n\
            Content-Disposition: form-data; name=\"field1\"\r\n\r\n\
            value1\r\n\
            --XB\r\n\
            Content-Disposition: form-data; name=\"upload\"; filename=\"report.pdf\"\r\n\
            Content-Type: application/pdf\r\n\r\n\
            %PDF-bytes\r\n\
            --XB--\r\n";
        let info = request_info(
            Request::builder()
                .uri("/x")
                .header("content-type", "multipart/form-data; boundary=XB"),
        )
        .with_body(body);

        let fields = info.body.unwrap();
        assert_eq!(fields["field1"], "value1");
        assert_eq!(fields["upload"], "FILE[report.pdf]");
    }

    #[test]
    fn test_form_body_is_parsed() {
        let info = request_info(
            Request::builder()
                .uri("/x")
                .header("content-type", "application/x-www-form-urlencoded"),
        )
        .with_body(b"b=2&a=one+two");
        assert_eq!(info.body.unwrap(), serde_json::json!({"a": "one two", "b": "2"}));
    }

    #[test]
    fn test_response_accessors() {
        let response = ResponseInfo::from_status(StatusCode::OK).with_body(br#"{"ok": true}"#);
        let context = LogContext::new().with_response(response);
        assert_eq!(context.resolve("response_code"), Some("200".to_string()));
        assert_eq!(
            context.resolve("response_data"),
            Some(r#"RESPONSE: {"ok":true}"#.to_string())
        );
    }
}
