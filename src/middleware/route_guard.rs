use axum::{
    extract::Request,
    http::{header::LOCATION, HeaderMap, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::debug;

use super::auth::identity_from_headers;
use crate::guard::routes::{routes, RouteDecision};

/// Applies the pure route-guard decision to matched routes. API prefixes are
/// not in the protected-page table, so this passes them straight through;
/// their authorization happens in the JWT middleware and the action guard.
pub async fn route_guard_middleware(headers: HeaderMap, request: Request, next: Next) -> Response {
    match decide(&headers, request.uri().path()) {
        RouteDecision::Allow => next.run(request).await,
        RouteDecision::Redirect(target) => see_other(&target),
    }
}

/// Fallback for paths with no registered handler: page routes still get a
/// guard decision (redirect to login or landing); everything else is 404.
pub async fn route_guard_fallback(headers: HeaderMap, uri: Uri) -> Response {
    match decide(&headers, uri.path()) {
        RouteDecision::Redirect(target) => see_other(&target),
        RouteDecision::Allow => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": format!("No route for {}", uri.path()),
                "code": "NOT_FOUND",
            })),
        )
            .into_response(),
    }
}

fn decide(headers: &HeaderMap, path: &str) -> RouteDecision {
    let identity = identity_from_headers(headers);
    let decision = routes().decide(identity.as_ref(), path);
    if let RouteDecision::Redirect(target) = &decision {
        debug!("Route guard: {} -> redirect {}", path, target);
    }
    decision
}

fn see_other(target: &str) -> Response {
    (StatusCode::SEE_OTHER, [(LOCATION, target.to_string())]).into_response()
}
