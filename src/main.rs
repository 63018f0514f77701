use axum::{
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

mod auth;
mod config;
mod error;
mod guard;
mod handlers;
mod middleware;
mod services;
mod store;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = crate::config::config();
    tracing::info!("Starting Studyhall API in {:?} mode", config.environment);

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("STUDYHALL_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("Studyhall API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Action-style endpoint; resolves its own identity so it can answer
        // {"error": "Not authenticated"} instead of an HTTP 401 envelope
        .route(
            "/api/admin/users/:id/role",
            post(handlers::admin::update_user_role),
        )
        // Protected API
        .merge(api_routes())
        // Page paths have no handlers here; the guard still decides them
        .fallback(middleware::route_guard::route_guard_fallback)
        // Global middleware
        .layer(axum::middleware::from_fn(
            middleware::route_guard::route_guard_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn api_routes() -> Router {
    use handlers::{admin, conversations};

    Router::new()
        .route(
            "/api/admin/chapters/bulk-status",
            post(admin::bulk_chapter_status),
        )
        .route(
            "/api/conversations",
            post(conversations::create_conversation),
        )
        .route(
            "/api/conversations/:id/messages",
            post(conversations::append_message),
        )
        .route(
            "/api/conversations/:id/context",
            get(conversations::conversation_context),
        )
        .layer(axum::middleware::from_fn(
            middleware::auth::jwt_auth_middleware,
        ))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Studyhall API",
            "version": version,
            "description": "Access-control and conversational-memory backend for the Studyhall tutoring platform",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "admin": "/api/admin/chapters/bulk-status, /api/admin/users/:id/role (admin)",
                "conversations": "/api/conversations[/:id/messages, /:id/context] (authenticated)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::store::PoolManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
