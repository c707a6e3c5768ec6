use axum::{
    extract::{Query, State},
    http::{Method, Uri},
};

use crate::api::{PageBody, PageParams};
use crate::auth::{self, Caller};
use crate::error::ApiError;
use crate::handlers::extract::{IdPath, JsonBody};
use crate::middleware::{ApiResponse, ApiResult};
use crate::serializers::polygon::{self, ServiceAreaView};
use crate::state::AppState;
use crate::types::RequestKind;

/// GET /users/:id/polygons - the account's service areas, newest first
pub async fn list(
    State(state): State<AppState>,
    IdPath(owner_id): IdPath<i64>,
    params: Option<Query<PageParams>>,
    uri: Uri,
) -> ApiResult<PageBody<ServiceAreaView>> {
    if state.store.find_account(owner_id).await?.is_none() {
        return Err(ApiError::not_found());
    }

    let request = params.map(|Query(p)| p).unwrap_or_default().resolve(&state.config.api);
    let page = state.store.list_owner_polygons(owner_id, request).await?;
    let page = page.map(|p| ServiceAreaView::from(&p));
    Ok(ApiResponse::success(PageBody::new(page, request, &uri)))
}

/// POST /users/:id/polygons - only the account itself may add areas
pub async fn create(
    State(state): State<AppState>,
    method: Method,
    caller: Caller,
    IdPath(owner_id): IdPath<i64>,
    body: Result<JsonBody, ApiError>,
) -> ApiResult<ServiceAreaView> {
    let allowed = auth::account_owner_or_read_only(RequestKind::from(&method), &caller, owner_id);
    auth::ensure(allowed, &caller)?;
    if state.store.find_account(owner_id).await?.is_none() {
        return Err(ApiError::not_found());
    }

    let JsonBody(body) = body?;
    let new_polygon = polygon::validate_create(&body, owner_id)?;

    let created = state.store.create_polygon(new_polygon).await?;
    tracing::info!("Created service area {} for account {}", created.id, owner_id);
    Ok(ApiResponse::created(ServiceAreaView::from(&created)))
}
