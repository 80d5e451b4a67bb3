//! Request/response logging toolkit for axum services.
//!
//! # Architecture
//! ```text
//! middleware / LoggedClient call sites
//!     → MessageAdapter (binds a message type + context to a sink)
//!     → MessageBuilder (template expansion, sentinel fallback)
//!     → LogContext (named accessors over request/response snapshots)
//!     → LogSink (tracing macros, or in-memory for tests)
//! ```
//!
//! Formatting never fails: any unresolved placeholder renders as the `NA`
//! sentinel, so logging can never be the reason a request fails.

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod observability;
pub mod util;

pub use client::{LoggedClient, LoggedResponse};
pub use config::ApiLoggingConfig;
pub use error::Error;
pub use logging::adapter::{
    LogSink, MemorySink, MessageAdapter, StrictMessageAdapter, TracingSink,
};
pub use logging::context::{LogContext, RequestInfo, ResponseInfo};
pub use logging::message_types::MessageType;
pub use logging::middleware::{
    api_logging, catch_panics, ApiLoggingState, ExceptionLoggingState, RequestLoggingLayer,
};
pub use observability::init_tracing;
