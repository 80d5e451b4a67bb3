//! Request/response tracing pipeline.
//!
//! # Data Flow
//! ```text
//! middleware / call site
//!     → MessageAdapter (selects the builder for the message type)
//!     → MessageBuilder (expands {placeholders}, sentinel fallback)
//!     → LogContext (named accessors over request/response snapshots)
//!     → LogSink (tracing macros, or in-memory for tests)
//! ```
//!
//! # Design Decisions
//! - Formatting never fails: unresolved placeholders render as `NA`, so
//!   logging can never be the reason a request fails
//! - All state is per-call; the only shared data is the read-only message
//!   type registry

pub mod adapter;
pub mod builder;
pub mod context;
pub mod message_types;
pub mod middleware;

pub use adapter::{LogSink, MemorySink, MessageAdapter, StrictMessageAdapter, TracingSink};
pub use builder::{MessageBuilder, DEFAULT_VALUE};
pub use context::{LogContext, RequestInfo, ResponseInfo};
pub use message_types::MessageType;
pub use middleware::{
    api_logging, catch_panics, ApiLoggingState, ExceptionLoggingState, RequestLoggingLayer,
};
