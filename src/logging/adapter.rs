//! Message adapters and log sinks.
//!
//! # Responsibilities
//! - Bind a message type and a per-call context to an underlying sink
//! - Provide the strict variant that discards caller free text
//!
//! # Design Decisions
//! - Explicit composition: the adapter holds a sink, the context is a call
//!   argument (no adapter-level state survives a call)
//! - The message type is a typed parameter, so the "missing message_type"
//!   programmer error of a dynamic kwargs API cannot happen here
//! - Sinks are trait objects so tests and host applications can capture lines

use std::sync::{Arc, Mutex};

use crate::logging::builder::MessageBuilder;
use crate::logging::context::LogContext;
use crate::logging::message_types::{BuilderKind, MessageType};

/// Severity of a sink write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkLevel {
    Debug,
    Info,
    Error,
}

/// The logger boundary: anything that can receive rendered log lines.
pub trait LogSink: Send + Sync {
    fn info(&self, message: &str);

    fn debug(&self, message: &str);

    /// Error-level write. `detail` carries the originating error text and is
    /// emitted alongside the rendered line, the way a traceback accompanies
    /// an exception log.
    fn exception(&self, message: &str, detail: Option<&str>);
}

/// Sink writing through the `tracing` macros.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn debug(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn exception(&self, message: &str, detail: Option<&str>) {
        match detail {
            Some(detail) => tracing::error!(error = %detail, "{message}"),
            None => tracing::error!("{message}"),
        }
    }
}

/// One captured sink write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkRecord {
    pub level: SinkLevel,
    pub message: String,
    pub detail: Option<String>,
}

/// Sink recording lines in memory, for assertions in tests and host
/// applications.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<SinkRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<SinkRecord> {
        self.records.lock().expect("memory sink mutex poisoned").clone()
    }

    /// Rendered messages, in emission order.
    pub fn messages(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.message).collect()
    }

    fn push(&self, level: SinkLevel, message: &str, detail: Option<&str>) {
        self.records
            .lock()
            .expect("memory sink mutex poisoned")
            .push(SinkRecord {
                level,
                message: message.to_string(),
                detail: detail.map(str::to_string),
            });
    }
}

impl LogSink for MemorySink {
    fn info(&self, message: &str) {
        self.push(SinkLevel::Info, message, None);
    }

    fn debug(&self, message: &str) {
        self.push(SinkLevel::Debug, message, None);
    }

    fn exception(&self, message: &str, detail: Option<&str>) {
        self.push(SinkLevel::Error, message, detail);
    }
}

/// Renders a message type against a per-call context and delegates the final
/// string to the wrapped sink.
#[derive(Clone)]
pub struct MessageAdapter {
    sink: Arc<dyn LogSink>,
}

impl MessageAdapter {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    /// Adapter over the global `tracing` dispatcher.
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingSink))
    }

    pub fn info(&self, message: Option<&str>, message_type: &MessageType, context: &LogContext) {
        self.sink.info(&self.process(message, message_type, context));
    }

    pub fn debug(&self, message: Option<&str>, message_type: &MessageType, context: &LogContext) {
        self.sink.debug(&self.process(message, message_type, context));
    }

    pub fn exception(
        &self,
        message: Option<&str>,
        message_type: &MessageType,
        context: &LogContext,
        detail: Option<&str>,
    ) {
        self.sink
            .exception(&self.process(message, message_type, context), detail);
    }

    /// Render the line through the builder attached to the message type.
    pub fn process(
        &self,
        message: Option<&str>,
        message_type: &MessageType,
        context: &LogContext,
    ) -> String {
        match message_type.builder {
            BuilderKind::Generic => MessageBuilder::new(message, message_type, context).render(),
        }
    }
}

/// Adapter that discards the caller's free-text message: used where the
/// template fully describes the line and ad hoc text would be redundant or
/// unsafe to interpolate. `detail` on exception calls still passes through.
#[derive(Clone)]
pub struct StrictMessageAdapter {
    inner: MessageAdapter,
}

impl StrictMessageAdapter {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            inner: MessageAdapter::new(sink),
        }
    }

    pub fn tracing() -> Self {
        Self {
            inner: MessageAdapter::tracing(),
        }
    }

    pub fn info(&self, _message: Option<&str>, message_type: &MessageType, context: &LogContext) {
        self.inner.info(None, message_type, context);
    }

    pub fn debug(&self, _message: Option<&str>, message_type: &MessageType, context: &LogContext) {
        self.inner.debug(None, message_type, context);
    }

    pub fn exception(
        &self,
        _message: Option<&str>,
        message_type: &MessageType,
        context: &LogContext,
        detail: Option<&str>,
    ) {
        self.inner.exception(None, message_type, context, detail);
    }

    pub fn process(
        &self,
        _message: Option<&str>,
        message_type: &MessageType,
        context: &LogContext,
    ) -> String {
        self.inner.process(None, message_type, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::message_types;

    #[test]
    fn test_registry_renders_sentinel_for_empty_context() {
        let adapter = MessageAdapter::tracing();
        let context = LogContext::new();
        for message_type in message_types::ALL {
            let rendered = adapter.process(None, message_type, &context);
            assert!(!rendered.contains('{'), "unexpanded: {rendered}");
            assert!(!rendered.contains('}'), "unexpanded: {rendered}");
            assert!(rendered.contains("NA"), "no sentinel in: {rendered}");
        }
        // The literal `message` key renders empty, not as the sentinel.
        assert_eq!(
            adapter.process(None, &message_types::EXCEPTION, &context),
            "EXCEPTION NA\nexception:"
        );
    }

    #[test]
    fn test_strict_adapter_discards_free_text() {
        let adapter = StrictMessageAdapter::tracing();
        let context = LogContext::new();
        assert_eq!(
            adapter.process(Some("ignored"), &message_types::EXCEPTION, &context),
            "EXCEPTION NA\nexception:"
        );
    }

    #[test]
    fn test_adapter_delegates_to_sink() {
        let sink = Arc::new(MemorySink::new());
        let adapter = MessageAdapter::new(sink.clone());
        let context = LogContext::new().with_api_action("demo.action");

        adapter.info(None, &message_types::API_IN, &context);
        adapter.debug(None, &message_types::API_IN, &context);
        adapter.exception(None, &message_types::EXCEPTION, &context, Some("boom"));

        let records = sink.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].level, SinkLevel::Info);
        assert_eq!(records[0].message, "API_IN NA NA api_action<demo.action>");
        assert_eq!(records[1].level, SinkLevel::Debug);
        assert_eq!(records[2].level, SinkLevel::Error);
        assert_eq!(records[2].detail.as_deref(), Some("boom"));
    }
}
