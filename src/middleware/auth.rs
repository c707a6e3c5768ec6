use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{AuthAccount, Caller};
use crate::error::ApiError;
use crate::state::AppState;

const TOKEN_KEYWORDS: [&str; 2] = ["Token", "Bearer"];

const NO_CREDENTIALS: &str = "Invalid token header. No credentials provided.";
const CONTAINS_SPACES: &str = "Invalid token header. Token string should not contain spaces.";
const INVALID_CHARACTERS: &str = "Invalid token header. Token string should not contain invalid characters.";
const INVALID_TOKEN: &str = "Invalid token.";

/// Resolves the caller from the `Authorization` header and stores it as a
/// request extension. Requests without a token header continue anonymously;
/// a malformed header or an unknown key is rejected with 401.
pub async fn authenticate(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = match extract_token_from_headers(&headers).map_err(ApiError::unauthorized)? {
        None => Caller::Anonymous,
        Some(key) => {
            let account = state.store.find_token_account(&key).await?.ok_or_else(|| {
                tracing::warn!("Rejected unknown API token");
                ApiError::unauthorized(INVALID_TOKEN)
            })?;
            Caller::Account(AuthAccount {
                id: account.id,
                email: account.email,
            })
        }
    };

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

/// Token key from `Authorization: Token <key>`. `Ok(None)` when the header is
/// absent or uses another scheme.
fn extract_token_from_headers(headers: &HeaderMap) -> Result<Option<String>, &'static str> {
    let Some(auth_header) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let bytes = auth_header.as_bytes();
    let mut parts = bytes.split(|b| *b == b' ').filter(|part| !part.is_empty());
    let Some(keyword) = parts.next() else {
        return Ok(None);
    };
    if !TOKEN_KEYWORDS
        .iter()
        .any(|k| k.as_bytes().eq_ignore_ascii_case(keyword))
    {
        return Ok(None);
    }

    let Some(key) = parts.next() else {
        return Err(NO_CREDENTIALS);
    };
    if parts.next().is_some() {
        return Err(CONTAINS_SPACES);
    }

    std::str::from_utf8(key)
        .map(|key| Some(key.to_string()))
        .map_err(|_| INVALID_CHARACTERS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn missing_header_is_anonymous() {
        assert_eq!(extract_token_from_headers(&HeaderMap::new()), Ok(None));
        assert_eq!(extract_token_from_headers(&headers("Basic dXNlcjpwYXNz")), Ok(None));
    }

    #[test]
    fn accepts_token_and_bearer_schemes() {
        assert_eq!(
            extract_token_from_headers(&headers("Token abc123")),
            Ok(Some("abc123".to_string()))
        );
        assert_eq!(
            extract_token_from_headers(&headers("Bearer abc123")),
            Ok(Some("abc123".to_string()))
        );
    }

    #[test]
    fn malformed_headers_are_rejected() {
        assert_eq!(extract_token_from_headers(&headers("Token")), Err(NO_CREDENTIALS));
        assert_eq!(extract_token_from_headers(&headers("Token a b")), Err(CONTAINS_SPACES));
    }
}
