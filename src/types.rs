/// Shared types used across the codebase

use axum::http::Method;
use serde::{Deserialize, Serialize};

/// Whether a request only reads state or may mutate it.
/// GET, HEAD and OPTIONS are reads; every other verb is a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestKind {
    Read,
    Write,
}

impl RequestKind {
    pub fn is_read(self) -> bool {
        matches!(self, RequestKind::Read)
    }
}

impl From<&Method> for RequestKind {
    fn from(method: &Method) -> Self {
        if method == Method::GET || method == Method::HEAD || method == Method::OPTIONS {
            RequestKind::Read
        } else {
            RequestKind::Write
        }
    }
}
