use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// GET / - service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Geofence API",
        "version": version,
        "description": "Accounts and priced service-area polygons",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "users": "/users, /users/:id (read public, write owner)",
            "user_polygons": "/users/:id/polygons, /users/:id/polygons/:polygon_id (read public, write owner)",
            "polygons": "/polygons?lat=&lng= (public)",
        }
    }))
}

/// GET /health - 503 when storage cannot be reached
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}

/// Fallback for known routes hit with a verb they do not serve
pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::method_not_allowed(method.as_str())
}

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::not_found()
}
