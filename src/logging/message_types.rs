//! Message type registry.
//!
//! # Responsibilities
//! - Catalogue the named log line templates (system in/out, exception, API in/out)
//! - Pair each template with the builder that renders it
//!
//! # Design Decisions
//! - Closed set of `pub const` entries; a new log category is a new constant
//! - Placeholders are not validated when a type is defined; an unresolvable
//!   placeholder degrades to the sentinel when the line is rendered

/// Selects the builder used to render a message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuilderKind {
    /// The generic template-expansion builder.
    #[default]
    Generic,
}

/// A named log line template paired with its builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageType {
    /// Format string with `{placeholder}` syntax.
    pub format: &'static str,

    /// Builder responsible for resolving the placeholders.
    pub builder: BuilderKind,
}

impl MessageType {
    /// Define a message type rendered by the generic builder.
    pub const fn new(format: &'static str) -> Self {
        Self {
            format,
            builder: BuilderKind::Generic,
        }
    }
}

/// Emitted when a request enters the service.
pub const SYSTEM_IN: MessageType = MessageType::new("SYSTEM_IN {request_path}");

/// Emitted when a response leaves the service, with elapsed wall-clock time.
pub const SYSTEM_OUT: MessageType =
    MessageType::new("SYSTEM_OUT {request_path} {response_code} {processing_time}");

/// Emitted when a handler panics.
pub const EXCEPTION: MessageType =
    MessageType::new("EXCEPTION {request_path}\nexception:{message}");

/// API entry line without the request payload.
pub const API_IN: MessageType =
    MessageType::new("API_IN {request_method} {request_path} api_action<{api_action}>");

/// API entry line including headers, query parameters and body.
pub const API_IN_WITH_DATA: MessageType = MessageType::new(
    "API_IN_WITH_DATA {request_method} {request_path} {request_client_ip}\napi_action<{api_action}> {request_data}",
);

/// API exit line without the response payload.
pub const API_OUT: MessageType =
    MessageType::new("API_OUT {request_path} {response_code} api_action<{api_action}>");

/// API exit line including the response payload.
pub const API_OUT_WITH_DATA: MessageType = MessageType::new(
    "API_OUT_WITH_DATA {request_method} {request_path} {request_client_ip} {response_code}\napi_action<{api_action}> {response_data}",
);

/// Every registered message type.
pub const ALL: &[MessageType] = &[
    SYSTEM_IN,
    SYSTEM_OUT,
    EXCEPTION,
    API_IN,
    API_IN_WITH_DATA,
    API_OUT,
    API_OUT_WITH_DATA,
];
