#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use geofence_api::config::AppConfig;
use geofence_api::database::MemoryStore;
use geofence_api::{app, AppState};

/// Router over a fresh in-memory store. Each test builds its own, so tests
/// never share state.
pub struct TestApp {
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Account created through the API, with its token
pub struct TestAccount {
    pub id: i64,
    pub token: String,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::new(Arc::new(MemoryStore::new()), AppConfig::for_tests());
        Self { router: app(state) }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .context("router failed")?;

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("response was not JSON")?
        };
        Ok(TestResponse { status, body })
    }

    /// Send `body` verbatim with the given content type
    pub async fn raw(&self, method: Method, uri: &str, content_type: &str, body: &str) -> Result<TestResponse> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body.to_string()))?;
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> Result<TestResponse> {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Result<TestResponse> {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> Result<TestResponse> {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> Result<TestResponse> {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Result<TestResponse> {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Register an account with `email` and return its id and token
    pub async fn create_account(&self, email: &str) -> Result<TestAccount> {
        let res = self.post("/users", None, account_body(email)).await?;
        anyhow::ensure!(
            res.status == StatusCode::CREATED,
            "account creation failed: {} {}",
            res.status,
            res.body
        );
        let id = res.body["id"].as_i64().context("missing id")?;
        let token = res.body["token"].as_str().context("missing token")?.to_string();
        Ok(TestAccount { id, token, body: res.body })
    }

    /// Create a square service area `[x, y]..[x + size, y + size]` owned by `account`
    pub async fn create_polygon(&self, account: &TestAccount, name: &str, x: f64, y: f64, size: f64) -> Result<Value> {
        let res = self
            .post(
                &format!("/users/{}/polygons", account.id),
                Some(&account.token),
                polygon_body(name, square(x, y, size)),
            )
            .await?;
        anyhow::ensure!(
            res.status == StatusCode::CREATED,
            "polygon creation failed: {} {}",
            res.status,
            res.body
        );
        Ok(res.body)
    }
}

pub fn account_body(email: &str) -> Value {
    json!({
        "email": email,
        "password": "pass1234",
        "name": "John Doe",
        "phone_number": "3001234567",
        "language": "en",
        "currency": "USD"
    })
}

pub fn square(x: f64, y: f64, size: f64) -> Value {
    json!({
        "type": "Polygon",
        "coordinates": [[
            [x, y],
            [x, y + size],
            [x + size, y + size],
            [x + size, y],
            [x, y]
        ]]
    })
}

pub fn polygon_body(name: &str, geometry: Value) -> Value {
    json!({
        "name": name,
        "price": "10.50",
        "geometry": geometry
    })
}
