//! Limit/offset pagination for list endpoints.

use axum::http::Uri;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::config::ApiConfig;
use crate::database::{Page, PageRequest};

/// Raw `limit`/`offset` query parameters. Kept as strings so a malformed
/// value falls back to the default instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl PageParams {
    pub fn resolve(&self, api: &ApiConfig) -> PageRequest {
        let limit = match self.limit.as_deref().and_then(|v| v.trim().parse::<u32>().ok()) {
            Some(0) | None => api.default_page_size,
            Some(limit) if limit > api.max_page_size => {
                tracing::warn!("Requested page size {} capped at {}", limit, api.max_page_size);
                api.max_page_size
            }
            Some(limit) => limit,
        };
        let offset = self
            .offset
            .as_deref()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0);
        PageRequest { limit, offset }
    }
}

#[derive(Debug, Serialize)]
pub struct PageBody<T: Serialize> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T: Serialize> PageBody<T> {
    /// Wrap a storage page, linking to its neighbours relative to `uri`.
    /// Query parameters other than `limit`/`offset` are carried along.
    pub fn new(page: Page<T>, request: PageRequest, uri: &Uri) -> Self {
        let limit = u64::from(request.limit);

        let next = request
            .offset
            .checked_add(limit)
            .filter(|&next_offset| next_offset < page.count)
            .map(|next_offset| page_link(uri, request.limit, Some(next_offset)));

        let previous = (request.offset > 0).then(|| {
            let previous_offset = request.offset.saturating_sub(limit);
            page_link(uri, request.limit, (previous_offset > 0).then_some(previous_offset))
        });

        Self {
            count: page.count,
            next,
            previous,
            results: page.items,
        }
    }
}

fn page_link(uri: &Uri, limit: u32, offset: Option<u64>) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(existing) = uri.query() {
        for (key, value) in form_urlencoded::parse(existing.as_bytes()) {
            if key != "limit" && key != "offset" {
                query.append_pair(&key, &value);
            }
        }
    }
    query.append_pair("limit", &limit.to_string());
    if let Some(offset) = offset {
        query.append_pair("offset", &offset.to_string());
    }
    format!("{}?{}", uri.path(), query.finish())
}
