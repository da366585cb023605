//! Request logging and error normalization middleware.

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::header::USER_AGENT;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use roster_infra::{AppConfig, ExecutionMode};

use crate::app::errors::{ApiError, PendingError};
use crate::app::normalizer::ErrorNormalizer;
use crate::context::{client_ip, RequestContext};

/// Settings for [`log_requests`].
#[derive(Debug, Clone)]
pub struct RequestLogging {
    mode: ExecutionMode,
    detailed: bool,
    skip_prefixes: Arc<[String]>,
}

impl RequestLogging {
    pub fn new(mode: ExecutionMode, detailed: bool, skip_prefixes: Vec<String>) -> Self {
        Self {
            mode,
            detailed,
            skip_prefixes: skip_prefixes.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.mode, config.debug_requests, config.request_log_skip.clone())
    }

    pub fn skips(&self, path: &str) -> bool {
        self.skip_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }
}

macro_rules! request_finished {
    ($level:ident, $ctx:expr, $status:expr, $duration_ms:expr, $client_ip:expr, $query:expr) => {
        tracing::$level!(
            target: "roster::requests",
            method = %$ctx.method(),
            url = $ctx.original_url(),
            status = $status,
            duration_ms = $duration_ms,
            client_ip = $client_ip,
            query = $query,
            "request finished"
        )
    };
}

/// One record per finished request; error statuses log at warn/error.
///
/// Development mode adds a "request started" record and the client address.
/// Detailed mode (`DEBUG_REQUESTS=true`) logs user agent, query string and
/// client address on arrival instead.
pub async fn log_requests(State(logging): State<RequestLogging>, req: Request, next: Next) -> Response {
    if logging.skips(req.uri().path()) {
        return next.run(req).await;
    }

    let ctx = RequestContext::from_request(&req);
    let ip = client_ip(&req);
    let query = req.uri().query().map(str::to_string);
    let development = logging.mode.is_development();

    if logging.detailed {
        let user_agent = req
            .headers()
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("N/A");
        tracing::info!(
            target: "roster::requests",
            method = %ctx.method(),
            url = ctx.original_url(),
            client_ip = %ip,
            user_agent,
            query = query.as_deref(),
            "incoming request"
        );
    } else if development {
        tracing::info!(
            target: "roster::requests",
            method = %ctx.method(),
            url = ctx.original_url(),
            "request started"
        );
    }

    let started = Instant::now();
    let response = next.run(req).await;

    let status = response.status().as_u16();
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let client_ip = (development || logging.detailed).then_some(ip.as_str());
    let failed_query = if development && status >= 400 {
        query.as_deref()
    } else {
        None
    };

    match status {
        500.. => request_finished!(error, ctx, status, duration_ms, client_ip, failed_query),
        400.. => request_finished!(warn, ctx, status, duration_ms, client_ip, failed_query),
        _ => request_finished!(info, ctx, status, duration_ms, client_ip, failed_query),
    }

    response
}

/// Turn a parked [`crate::app::errors::ApiError`] into the error envelope.
///
/// Responses without one pass through untouched.
pub async fn normalize_errors(
    State(normalizer): State<ErrorNormalizer>,
    req: Request,
    next: Next,
) -> Response {
    let ctx = RequestContext::from_request(&req);
    let mut response = next.run(req).await;

    match response.extensions_mut().remove::<PendingError>() {
        Some(PendingError(err)) => normalizer.respond(&err, &ctx),
        None => response,
    }
}

/// Panic handler for `CatchPanicLayer`: the panic becomes an internal error
/// and is rendered by [`normalize_errors`] like any other.
pub fn panic_to_error(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());

    ApiError::Internal(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}
