use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{polygons, system, users};
use crate::middleware::authenticate;
use crate::state::AppState;

/// Build the full router over `state`.
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        // Public
        .route("/", get(system::root))
        .route("/health", get(system::health))
        // Resources
        .merge(user_routes())
        .merge(polygon_routes())
        .fallback(system::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .with_state(state);

    // Global middleware
    if let Some(cors) = cors_layer(&config.security) {
        router = router.layer(cors);
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            get(users::users_get)
                .post(users::users_post)
                .fallback(system::method_not_allowed),
        )
        .route(
            "/users/:id",
            get(users::user_get)
                .put(users::user_update)
                .patch(users::user_update)
                .delete(users::user_delete)
                .fallback(system::method_not_allowed),
        )
}

fn polygon_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/:id/polygons",
            get(polygons::owner_polygons_get)
                .post(polygons::owner_polygons_post)
                .fallback(system::method_not_allowed),
        )
        .route(
            "/users/:id/polygons/:polygon_id",
            get(polygons::polygon_get)
                .put(polygons::polygon_update)
                .patch(polygons::polygon_update)
                .delete(polygons::polygon_delete)
                .fallback(system::method_not_allowed),
        )
        .route(
            "/polygons",
            get(polygons::polygons_by_location).fallback(system::method_not_allowed),
        )
}

/// No layer when CORS is disabled; any origin when no origins are listed.
fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }
    if security.cors_origins.is_empty() {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any),
    )
}
