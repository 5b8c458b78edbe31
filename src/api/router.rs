//! Request Routing
//!
//! Maps HTTP requests onto the [`BroadcastService`]. Handlers are generic over
//! the request body so they can be driven by hyper connections and by
//! in-memory bodies alike.

use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited, StreamBody};
use hyper::body::{Body, Frame};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode};
use tracing::{debug, warn};

use super::status;
use super::validation::{parse_broadcast, parse_messages_query};
use crate::error::ValidationError;
use crate::health::HealthCheck;
use crate::metrics::TowerMetrics;
use crate::service::BroadcastService;
use crate::store::Entry;

/// Response body type shared by all routes
pub type ResponseBody = BoxBody<Bytes, Infallible>;

/// Body sent with every validation failure
pub const FAILURE_BODY: &str = "failure";

/// Slack on top of the message limit for JSON/form framing and escapes
const BODY_OVERHEAD_BYTES: usize = 1024;

/// Escaped text can grow up to six times (`\uXXXX` per byte)
const BODY_EXPANSION_FACTOR: usize = 6;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// API Router
// =============================================================================

/// Routes for the public API listener
#[derive(Debug, Clone)]
pub struct ApiRouter {
    service: Arc<BroadcastService>,
}

impl ApiRouter {
    pub fn new(service: Arc<BroadcastService>) -> Self {
        Self { service }
    }

    /// Dispatch a request
    pub async fn handle<B>(&self, req: Request<B>) -> Response<ResponseBody>
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        match (req.method(), req.uri().path()) {
            (&Method::GET, "/") => self.status_page(),
            (&Method::GET, "/api/v1/messages") => self.messages(&req),
            (&Method::POST, "/api/v1/broadcast") => self.broadcast(req).await,
            _ => text(StatusCode::NOT_FOUND, "not found"),
        }
    }

    fn status_page(&self) -> Response<ResponseBody> {
        let html = status::render(&self.service.diagnostics(), self.service.config());
        full(StatusCode::OK, "text/html; charset=utf-8", html)
    }

    fn messages<B>(&self, req: &Request<B>) -> Response<ResponseBody> {
        let params = match parse_messages_query(req.uri().query(), self.service.config()) {
            Ok(params) => params,
            Err(e) => return self.reject("messages", e),
        };

        let entries = self.service.query(&params);
        respond(
            StatusCode::OK,
            "text/plain; charset=utf-8",
            stream_records(entries),
        )
    }

    async fn broadcast<B>(&self, req: Request<B>) -> Response<ResponseBody>
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let max_message = self.service.config().max_message_size_bytes;
        let body_limit = max_message
            .saturating_mul(BODY_EXPANSION_FACTOR)
            .saturating_add(BODY_OVERHEAD_BYTES);

        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let body = match Limited::new(req.into_body(), body_limit).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                let reason = if e.downcast_ref::<LengthLimitError>().is_some() {
                    ValidationError::BodyTooLarge { limit: body_limit }
                } else {
                    warn!("Failed to read broadcast body: {}", e);
                    ValidationError::MalformedBody(e.to_string())
                };
                return self.reject("broadcast", reason);
            }
        };

        let request = match parse_broadcast(content_type.as_deref(), &body, max_message) {
            Ok(request) => request,
            Err(e) => return self.reject("broadcast", e),
        };

        let entry = self.service.broadcast(request.message_text);
        text(StatusCode::CREATED, entry.to_record())
    }

    fn reject(&self, route: &str, reason: ValidationError) -> Response<ResponseBody> {
        debug!("Rejected {} request: {}", route, reason);
        self.service.metrics().record_rejection(route);
        text(StatusCode::BAD_REQUEST, FAILURE_BODY)
    }
}

/// Stream records as newline-separated chunks, one frame per record
pub fn stream_records(entries: Vec<Entry>) -> ResponseBody {
    let frames = entries.into_iter().enumerate().map(|(i, entry)| {
        let chunk = if i == 0 {
            entry.to_record()
        } else {
            format!("\n{}", entry)
        };
        Ok::<_, Infallible>(Frame::data(Bytes::from(chunk)))
    });
    StreamBody::new(futures::stream::iter(frames)).boxed()
}

// =============================================================================
// Health Router
// =============================================================================

/// Routes for the health and metrics listener
#[derive(Debug, Clone)]
pub struct HealthRouter {
    health: Arc<HealthCheck>,
    metrics: TowerMetrics,
}

impl HealthRouter {
    pub fn new(health: Arc<HealthCheck>, metrics: TowerMetrics) -> Self {
        Self { health, metrics }
    }

    /// Dispatch a request
    pub async fn handle<B>(&self, req: Request<B>) -> Response<ResponseBody> {
        if req.method() != Method::GET {
            return text(StatusCode::NOT_FOUND, "not found");
        }

        match req.uri().path() {
            "/healthz" | "/livez" => check_response(self.health.liveness().is_healthy()),
            "/readyz" => check_response(self.health.readiness().is_healthy()),
            "/health" => match serde_json::to_vec(&self.health.report()) {
                Ok(json) => full(StatusCode::OK, "application/json", json),
                Err(e) => {
                    warn!("Failed to serialize health report: {}", e);
                    text(StatusCode::INTERNAL_SERVER_ERROR, "error")
                }
            },
            "/metrics" => match self.metrics.encode() {
                Ok((buffer, content_type)) => full(StatusCode::OK, &content_type, buffer),
                Err(e) => {
                    warn!("Failed to encode metrics: {}", e);
                    text(StatusCode::INTERNAL_SERVER_ERROR, "error")
                }
            },
            _ => text(StatusCode::NOT_FOUND, "not found"),
        }
    }
}

fn check_response(healthy: bool) -> Response<ResponseBody> {
    if healthy {
        text(StatusCode::OK, "ok")
    } else {
        text(StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    }
}

// =============================================================================
// Response Helpers
// =============================================================================

fn text(status: StatusCode, body: impl Into<Bytes>) -> Response<ResponseBody> {
    full(status, "text/plain", body)
}

fn full(
    status: StatusCode,
    content_type: &str,
    body: impl Into<Bytes>,
) -> Response<ResponseBody> {
    respond(status, content_type, Full::new(body.into()).boxed())
}

fn respond(status: StatusCode, content_type: &str, body: ResponseBody) -> Response<ResponseBody> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    if let Ok(value) = HeaderValue::from_str(content_type) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}

// =============================================================================
// Tests
// =============================================================================
