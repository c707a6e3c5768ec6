use axum::{extract::State, http::Method};

use crate::auth::{self, Caller};
use crate::database::models::ServiceAreaPolygon;
use crate::error::ApiError;
use crate::handlers::extract::{IdPath, JsonBody};
use crate::middleware::{ApiResponse, ApiResult};
use crate::serializers::polygon::{self, ServiceAreaView};
use crate::state::AppState;
use crate::types::RequestKind;

/// Load by polygon id, then check ownership of the stored record. The
/// account segment of the path does not scope the lookup.
async fn load_authorized(
    state: &AppState,
    method: &Method,
    caller: &Caller,
    id: i64,
) -> Result<ServiceAreaPolygon, ApiError> {
    let polygon = state.store.find_polygon(id).await?.ok_or_else(ApiError::not_found)?;
    let allowed = auth::resource_owner_or_read_only(RequestKind::from(method), caller, &polygon);
    auth::ensure(allowed, caller)?;
    Ok(polygon)
}

/// GET /users/:id/polygons/:polygon_id
pub async fn get(
    State(state): State<AppState>,
    method: Method,
    caller: Caller,
    IdPath((_owner_id, id)): IdPath<(i64, i64)>,
) -> ApiResult<ServiceAreaView> {
    let polygon = load_authorized(&state, &method, &caller, id).await?;
    Ok(ApiResponse::success(ServiceAreaView::from(&polygon)))
}

/// PUT|PATCH /users/:id/polygons/:polygon_id
pub async fn update(
    State(state): State<AppState>,
    method: Method,
    caller: Caller,
    IdPath((_owner_id, id)): IdPath<(i64, i64)>,
    body: Result<JsonBody, ApiError>,
) -> ApiResult<ServiceAreaView> {
    let current = load_authorized(&state, &method, &caller, id).await?;

    let JsonBody(body) = body?;
    let changes = polygon::validate_update(&body, method == Method::PATCH)?;
    if changes.is_empty() {
        return Ok(ApiResponse::success(ServiceAreaView::from(&current)));
    }

    let updated = state.store.update_polygon(id, changes).await?;
    Ok(ApiResponse::success(ServiceAreaView::from(&updated)))
}

/// DELETE /users/:id/polygons/:polygon_id
pub async fn delete(
    State(state): State<AppState>,
    method: Method,
    caller: Caller,
    IdPath((_owner_id, id)): IdPath<(i64, i64)>,
) -> ApiResult<()> {
    load_authorized(&state, &method, &caller, id).await?;
    state.store.delete_polygon(id).await?;
    tracing::info!("Deleted service area {}", id);
    Ok(ApiResponse::no_content())
}
