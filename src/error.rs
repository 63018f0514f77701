// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::guard::admin::AdminActionError;
use crate::services::conversation_service::ConversationError;
use crate::services::embedding_service::EmbeddingError;
use crate::store::StoreError;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (external service issues)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::InternalServerError(_) => 500,
            ApiError::BadGateway(_) => 502,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::ValidationError(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::BadGateway(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": self.message(),
            "code": self.error_code(),
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        ApiError::ValidationError(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert domain error types to ApiError
impl From<AdminActionError> for ApiError {
    fn from(err: AdminActionError) -> Self {
        match err {
            AdminActionError::NotAuthenticated => ApiError::unauthorized("Not authenticated"),
            AdminActionError::Unauthorized => ApiError::forbidden("Unauthorized"),
            AdminActionError::InvalidRole => ApiError::bad_request("Invalid role"),
            AdminActionError::SelfChange => {
                ApiError::bad_request("Cannot change your own role")
            }
            AdminActionError::NotFound(msg) => ApiError::not_found(msg),
            AdminActionError::Validation(msg) => ApiError::validation_error(msg),
            AdminActionError::Persistence(msg) => {
                // Log the real error but return a generic message
                tracing::error!("Admin action persistence error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => ApiError::not_found(msg),
            StoreError::ConfigMissing(name) => {
                tracing::error!("Missing store configuration: {}", name);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            StoreError::Sqlx(sqlx_err) => {
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<ConversationError> for ApiError {
    fn from(err: ConversationError) -> Self {
        match err {
            ConversationError::NotFound(id) => {
                ApiError::not_found(format!("Conversation {} not found", id))
            }
            ConversationError::InvalidMessageRole(role) => {
                ApiError::validation_error(format!("Invalid message role: {}", role))
            }
            ConversationError::Store(store_err) => store_err.into(),
        }
    }
}

impl From<EmbeddingError> for ApiError {
    fn from(err: EmbeddingError) -> Self {
        tracing::error!("Embedding service error: {}", err);
        ApiError::bad_gateway("Embedding service unavailable")
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_errors_map_to_http_statuses() {
        assert_eq!(ApiError::from(AdminActionError::NotAuthenticated).status_code(), 401);
        assert_eq!(ApiError::from(AdminActionError::Unauthorized).status_code(), 403);
        assert_eq!(
            ApiError::from(AdminActionError::NotFound("Profile not found".into())).status_code(),
            404
        );
        let validation = ApiError::from(AdminActionError::Validation("bad ids".into()));
        assert_eq!(validation.status_code(), 400);
        assert_eq!(validation.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn persistence_detail_is_not_echoed() {
        let err = ApiError::from(AdminActionError::Persistence("connection refused".into()));
        assert_eq!(err.status_code(), 500);
        assert!(!err.message().contains("connection refused"));
    }

    #[test]
    fn json_body_carries_error_and_code() {
        let body = ApiError::validation_error("chapterIds must be a non-empty list").to_json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"], "chapterIds must be a non-empty list");
    }
}
