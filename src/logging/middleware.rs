//! Middleware call sites for the tracing pipeline.
//!
//! # Responsibilities
//! - Emit `SYSTEM_IN`/`SYSTEM_OUT` around every request with elapsed time
//! - Emit `EXCEPTION` for handler panics and convert them to 500 responses
//! - Emit `API_IN`/`API_OUT` (with or without payloads) around tagged routes
//!
//! # Design Decisions
//! - The in-line is written before the inner service runs, so it always
//!   precedes the out-line within one request
//! - Bodies are buffered and restored; a body over the configured cap is
//!   forwarded untouched and logged without data
//! - Middleware never fails a request: logging errors degrade, they do not
//!   propagate

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{Request, Response, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use http_body::Body as HttpBody;
use tower::{Layer, Service};

use crate::config::ApiLoggingConfig;
use crate::logging::adapter::{LogSink, MessageAdapter, StrictMessageAdapter};
use crate::logging::context::{LogContext, RequestInfo, ResponseInfo};
use crate::logging::message_types;

/// Layer emitting `SYSTEM_IN`/`SYSTEM_OUT` lines around every request.
///
/// Place outermost so the in/out lines bracket the rest of the stack.
#[derive(Clone)]
pub struct RequestLoggingLayer {
    adapter: MessageAdapter,
}

impl RequestLoggingLayer {
    pub fn new() -> Self {
        Self {
            adapter: MessageAdapter::tracing(),
        }
    }

    pub fn with_sink(sink: Arc<dyn LogSink>) -> Self {
        Self {
            adapter: MessageAdapter::new(sink),
        }
    }
}

impl Default for RequestLoggingLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for RequestLoggingLayer {
    type Service = RequestLogging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLogging {
            inner,
            adapter: self.adapter.clone(),
        }
    }
}

/// Service produced by [`RequestLoggingLayer`].
#[derive(Clone)]
pub struct RequestLogging<S> {
    inner: S,
    adapter: MessageAdapter,
}

impl<S> Service<Request<Body>> for RequestLogging<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), S::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let adapter = self.adapter.clone();
        let started = Instant::now();

        let (parts, body) = request.into_parts();
        let info = RequestInfo::from_parts(&parts);
        let request = Request::from_parts(parts, body);

        adapter.info(
            None,
            &message_types::SYSTEM_IN,
            &LogContext::new().with_request(info.clone()),
        );

        let future = self.inner.call(request);
        Box::pin(async move {
            let response = future.await?;

            let context = LogContext::new()
                .with_request(info)
                .with_response(ResponseInfo::from_status(response.status()))
                .with_extra(
                    "processing_time",
                    format!("{:.6}", started.elapsed().as_secs_f64()),
                );
            adapter.info(None, &message_types::SYSTEM_OUT, &context);

            Ok(response)
        })
    }
}

/// State for [`catch_panics`].
#[derive(Clone)]
pub struct ExceptionLoggingState {
    adapter: StrictMessageAdapter,
}

impl ExceptionLoggingState {
    pub fn new() -> Self {
        Self {
            adapter: StrictMessageAdapter::tracing(),
        }
    }

    pub fn with_sink(sink: Arc<dyn LogSink>) -> Self {
        Self {
            adapter: StrictMessageAdapter::new(sink),
        }
    }
}

impl Default for ExceptionLoggingState {
    fn default() -> Self {
        Self::new()
    }
}

/// Middleware logging handler panics as `EXCEPTION` lines.
///
/// The strict adapter discards the free-text message slot; the panic text
/// still reaches the sink as the exception detail. The panic is converted
/// into a plain 500 response.
pub async fn catch_panics(
    State(state): State<ExceptionLoggingState>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let (parts, body) = request.into_parts();
    let info = RequestInfo::from_parts(&parts);
    let request = Request::from_parts(parts, body);

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            let detail = panic_text(panic.as_ref());
            let context = LogContext::new().with_request(info);
            state.adapter.exception(
                Some(&detail),
                &message_types::EXCEPTION,
                &context,
                Some(&detail),
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn panic_text(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// State for [`api_logging`]: one instance per tagged route.
#[derive(Clone)]
pub struct ApiLoggingState {
    /// Action tag rendered into `api_action<...>`.
    pub api_action: String,
    pub config: ApiLoggingConfig,
    adapter: MessageAdapter,
}

impl ApiLoggingState {
    pub fn new(api_action: impl Into<String>, config: ApiLoggingConfig) -> Self {
        Self {
            api_action: api_action.into(),
            config,
            adapter: MessageAdapter::tracing(),
        }
    }

    pub fn with_sink(
        api_action: impl Into<String>,
        config: ApiLoggingConfig,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            api_action: api_action.into(),
            config,
            adapter: MessageAdapter::new(sink),
        }
    }

    fn skips_request_data(&self) -> bool {
        self.config
            .skip_request_data_actions
            .iter()
            .any(|action| action == &self.api_action)
    }

    fn skips_response_data(&self) -> bool {
        self.config
            .skip_response_data_actions
            .iter()
            .any(|action| action == &self.api_action)
    }
}

/// Middleware emitting `API_IN`/`API_OUT` lines around a tagged route.
///
/// Wire with `axum::middleware::from_fn_with_state(state, api_logging)`.
pub async fn api_logging(
    State(state): State<ApiLoggingState>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let (parts, body) = request.into_parts();
    let mut info = RequestInfo::from_parts(&parts);

    let request = if state.skips_request_data() {
        let context = LogContext::new()
            .with_request(info.clone())
            .with_api_action(&state.api_action);
        state.adapter.info(None, &message_types::API_IN, &context);
        Request::from_parts(parts, body)
    } else {
        let (body, bytes) = buffer_body(body, state.config.max_body_bytes).await;
        info = info.with_body(&bytes);
        let context = LogContext::new()
            .with_request(info.clone())
            .with_api_action(&state.api_action)
            .with_header_keys(&state.config.header_keys);
        state
            .adapter
            .info(None, &message_types::API_IN_WITH_DATA, &context);
        Request::from_parts(parts, body)
    };

    let response = next.run(request).await;

    if state.skips_response_data() {
        let context = LogContext::new()
            .with_request(info)
            .with_api_action(&state.api_action)
            .with_response(ResponseInfo::from_status(response.status()));
        state.adapter.info(None, &message_types::API_OUT, &context);
        response
    } else {
        let (parts, body) = response.into_parts();
        let (body, bytes) = buffer_body(body, state.config.max_body_bytes).await;
        let context = LogContext::new()
            .with_request(info)
            .with_api_action(&state.api_action)
            .with_response(ResponseInfo::from_status(parts.status).with_body(&bytes));
        state
            .adapter
            .info(None, &message_types::API_OUT_WITH_DATA, &context);
        Response::from_parts(parts, body)
    }
}

/// Buffer a body for logging and hand back an equivalent body for the
/// request/response to continue with.
///
/// Only bodies with an exact size hint within the cap are buffered; a
/// streaming or oversized body is forwarded untouched and the line is logged
/// without data.
async fn buffer_body(body: Body, limit: usize) -> (Body, Bytes) {
    match HttpBody::size_hint(&body).exact() {
        Some(length) if length as usize <= limit => {
            let bytes = axum::body::to_bytes(body, limit).await.unwrap_or_default();
            (Body::from(bytes.clone()), bytes)
        }
        _ => (body, Bytes::new()),
    }
}
