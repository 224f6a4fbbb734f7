//! Axum adapter between HTTP and the router's request model.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tower_http::trace::TraceLayer;
use tracing::warn;

use readproxy_core::{RawRequest, RenderOutcome};

use crate::handler::ProxyHandler;

/// Every path is meaningful to the proxy, so the whole tree goes
/// through one fallback handler.
pub fn router(handler: Arc<ProxyHandler>) -> Router {
    Router::new()
        .fallback(dispatch)
        .with_state(handler)
        .layer(TraceLayer::new_for_http())
}

async fn dispatch(State(handler): State<Arc<ProxyHandler>>, request: Request) -> Response {
    let raw = to_raw_request(&request);
    let outcome = handler.handle(&raw).await;
    to_response(outcome)
}

fn to_raw_request(request: &Request) -> RawRequest {
    let mut raw = RawRequest::new(request.uri().path())
        .with_query(request.uri().query().unwrap_or_default());

    for (name, value) in request.headers() {
        if let Ok(value) = value.to_str() {
            // HeaderName is already lower-case.
            raw = raw.with_header(name.as_str(), value);
        }
    }

    raw
}

fn to_response(outcome: RenderOutcome) -> Response {
    let status =
        StatusCode::from_u16(outcome.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let body = if outcome.is_base64_encoded {
        match BASE64.decode(outcome.body.as_bytes()) {
            Ok(bytes) => Body::from(bytes),
            Err(e) => {
                warn!("invalid base64 response body: {}", e);
                return Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .body(Body::empty())
                    .unwrap_or_default();
            }
        }
    } else {
        Body::from(outcome.body)
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    for (name, value) in &outcome.headers {
        match (
            name.parse::<HeaderName>(),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => warn!(name = %name, value = %value, "dropping invalid response header"),
        }
    }

    response
}
