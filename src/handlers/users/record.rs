use axum::{extract::State, http::Method};

use crate::auth::{self, Caller};
use crate::error::ApiError;
use crate::handlers::extract::{IdPath, JsonBody};
use crate::middleware::{ApiResponse, ApiResult};
use crate::serializers::account::{self, AccountView};
use crate::state::AppState;
use crate::types::RequestKind;

/// Account routes check ownership of the path id before touching storage.
fn authorize(method: &Method, caller: &Caller, id: i64) -> Result<(), ApiError> {
    let allowed = auth::account_owner_or_read_only(RequestKind::from(method), caller, id);
    auth::ensure(allowed, caller)
}

/// GET /users/:id
pub async fn get(
    State(state): State<AppState>,
    method: Method,
    caller: Caller,
    IdPath(id): IdPath<i64>,
) -> ApiResult<AccountView> {
    authorize(&method, &caller, id)?;
    let account = state.store.find_account(id).await?.ok_or_else(ApiError::not_found)?;
    Ok(ApiResponse::success(AccountView::from(&account)))
}

/// PUT|PATCH /users/:id - PATCH validates only the fields it carries. A body
/// with nothing to change leaves the record, and its `updated_at`, alone.
pub async fn update(
    State(state): State<AppState>,
    method: Method,
    caller: Caller,
    IdPath(id): IdPath<i64>,
    body: Result<JsonBody, ApiError>,
) -> ApiResult<AccountView> {
    authorize(&method, &caller, id)?;
    let current = state.store.find_account(id).await?.ok_or_else(ApiError::not_found)?;

    let JsonBody(body) = body?;
    let partial = method == Method::PATCH;
    let changes = account::validate_update(state.store.as_ref(), &body, id, partial).await?;
    if changes.is_empty() {
        return Ok(ApiResponse::success(AccountView::from(&current)));
    }

    let updated = state.store.update_account(id, changes).await?;
    Ok(ApiResponse::success(AccountView::from(&updated)))
}

/// DELETE /users/:id - removes the token and polygons with it
pub async fn delete(
    State(state): State<AppState>,
    method: Method,
    caller: Caller,
    IdPath(id): IdPath<i64>,
) -> ApiResult<()> {
    authorize(&method, &caller, id)?;
    state.store.delete_account(id).await?;
    tracing::info!("Deleted account {}", id);
    Ok(ApiResponse::no_content())
}
