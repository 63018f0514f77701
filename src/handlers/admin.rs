use axum::{
    extract::{Extension, Path},
    http::HeaderMap,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;
use uuid::Uuid;

use crate::error::ApiError;
use crate::guard::admin::{AdminActionError, AdminActionGuard};
use crate::middleware::auth::{identity_from_headers, AuthUser};
use crate::store::{PgStore, PoolManager};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusRequest {
    pub chapter_ids: Vec<String>,
    pub status: String,
}

/// POST /api/admin/chapters/bulk-status - Set publication status for a batch of chapters
pub async fn bulk_chapter_status(
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<BulkStatusRequest>,
) -> Result<Json<Value>, ApiError> {
    let pool = PoolManager::pool()?;
    let guard = AdminActionGuard::new(PgStore::new(pool));

    let updated = guard
        .bulk_update_chapter_status(Some(auth.user_id), &payload.chapter_ids, &payload.status)
        .await?;

    Ok(Json(json!({
        "message": format!("Updated {} chapter(s) to {}", updated, payload.status),
    })))
}

#[derive(Debug, Deserialize)]
pub struct RoleUpdateRequest {
    pub role: String,
}

/// POST /api/admin/users/:id/role - Change a user's role
///
/// Action-style contract: the envelope is always `{"success": true}` or
/// `{"error": "<message>"}`. The four guard rejections carry their literal
/// messages; a persistence failure echoes the store's error text verbatim
/// on this path.
pub async fn update_user_role(
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<RoleUpdateRequest>,
) -> Json<Value> {
    let result = run_role_update(&headers, user_id, &payload.role).await;

    match result {
        Ok(()) => Json(json!({ "success": true })),
        Err(err) => {
            if let AdminActionError::Persistence(detail) = &err {
                error!("Role update for {} failed at the store: {}", user_id, detail);
            }
            Json(json!({ "error": err.to_string() }))
        }
    }
}

async fn run_role_update(
    headers: &HeaderMap,
    target: Uuid,
    new_role: &str,
) -> Result<(), AdminActionError> {
    // Resolve the actor before touching the store at all.
    let actor = identity_from_headers(headers)
        .map(|identity| identity.id)
        .ok_or(AdminActionError::NotAuthenticated)?;

    let pool = PoolManager::pool().map_err(|e| AdminActionError::Persistence(e.to_string()))?;
    let guard = AdminActionGuard::new(PgStore::new(pool));

    guard.update_user_role(Some(actor), target, new_role).await
}
