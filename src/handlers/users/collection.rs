use axum::{
    extract::{Query, State},
    http::Uri,
};

use crate::api::{PageBody, PageParams};
use crate::auth;
use crate::error::ApiError;
use crate::handlers::extract::JsonBody;
use crate::middleware::{ApiResponse, ApiResult};
use crate::serializers::account::{self, AccountCreatedView, AccountView};
use crate::state::AppState;

/// GET /users - paginated accounts, ordered by id
pub async fn list(
    State(state): State<AppState>,
    params: Option<Query<PageParams>>,
    uri: Uri,
) -> ApiResult<PageBody<AccountView>> {
    let request = params.map(|Query(p)| p).unwrap_or_default().resolve(&state.config.api);
    let page = state.store.list_accounts(request).await?;
    let page = page.map(|a| AccountView::from(&a));
    Ok(ApiResponse::success(PageBody::new(page, request, &uri)))
}

/// POST /users - open registration; responds with the account and its token
pub async fn create(
    State(state): State<AppState>,
    body: Result<JsonBody, ApiError>,
) -> ApiResult<AccountCreatedView> {
    let JsonBody(body) = body?;
    let new_account = account::validate_create(state.store.as_ref(), &body).await?;

    let (created, token) = state
        .store
        .create_account(new_account, auth::generate_token_key())
        .await?;
    tracing::info!("Created account {}", created.id);

    Ok(ApiResponse::created(AccountCreatedView {
        account: AccountView::from(&created),
        token: token.key,
    }))
}
