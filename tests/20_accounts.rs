mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use common::{account_body, TestApp};
use serde_json::json;

#[tokio::test]
async fn create_returns_account_and_token() -> Result<()> {
    let app = TestApp::new();

    let res = app.post("/users", None, account_body("johndoe@gmail.com")).await?;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["email"], "johndoe@gmail.com");
    assert_eq!(res.body["language"], "en");
    assert!(res.body["created_at"].is_string());
    assert!(res.body.get("password").is_none());

    let token = res.body["token"].as_str().unwrap();
    assert_eq!(token.len(), 40);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    Ok(())
}

#[tokio::test]
async fn create_reports_field_errors() -> Result<()> {
    let app = TestApp::new();

    let mut body = account_body("johndoe@gmail.c");
    body.as_object_mut().unwrap().remove("password");
    body["language"] = json!("lan123");
    body["phone_number"] = json!("3".repeat(16));

    let res = app.post("/users", None, body).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["email"], json!(["Enter a valid email address."]));
    assert_eq!(res.body["password"], json!(["This field is required."]));
    assert_eq!(res.body["language"], json!(["\"lan123\" is not a valid choice."]));
    assert_eq!(
        res.body["phone_number"],
        json!(["Ensure this field has no more than 15 characters."])
    );
    assert!(res.body.get("name").is_none());
    Ok(())
}

#[tokio::test]
async fn create_requires_email() -> Result<()> {
    let app = TestApp::new();

    let mut body = account_body("x@example.com");
    body.as_object_mut().unwrap().remove("email");
    let res = app.post("/users", None, body).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["email"], json!(["This field is required."]));
    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_rejected() -> Result<()> {
    let app = TestApp::new();
    app.create_account("johndoe@gmail.com").await?;

    let res = app.post("/users", None, account_body("johndoe@gmail.com")).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["email"], json!(["user with this email already exists."]));
    Ok(())
}

#[tokio::test]
async fn malformed_body_is_rejected() -> Result<()> {
    let app = TestApp::new();

    let res = app.raw(Method::POST, "/users", "application/json", "{\"email\": ").await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["detail"].as_str().unwrap().starts_with("JSON parse error - "));

    let res = app.raw(Method::POST, "/users", "text/plain", "email=a").await?;
    assert_eq!(res.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    Ok(())
}

#[tokio::test]
async fn anyone_can_read_accounts() -> Result<()> {
    let app = TestApp::new();
    let account = app.create_account("johndoe@gmail.com").await?;

    let res = app.get(&format!("/users/{}", account.id)).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["id"], account.id);
    assert!(res.body.get("password").is_none());
    assert!(res.body.get("token").is_none());

    let res = app.get("/users/999").await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["detail"], "Not found.");

    let res = app.get("/users/abc").await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn owner_can_patch_own_account() -> Result<()> {
    let app = TestApp::new();
    let account = app.create_account("johndoe@gmail.com").await?;

    let res = app
        .patch(
            &format!("/users/{}", account.id),
            Some(&account.token),
            json!({ "name": "X", "password": "changed" }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["name"], "X");
    assert_eq!(res.body["email"], "johndoe@gmail.com");
    assert_eq!(res.body["phone_number"], "3001234567");
    assert_eq!(res.body["currency"], "USD");
    Ok(())
}

#[tokio::test]
async fn other_account_cannot_write() -> Result<()> {
    let app = TestApp::new();
    let a = app.create_account("a@example.com").await?;
    let b = app.create_account("b@example.com").await?;

    let res = app
        .patch(&format!("/users/{}", b.id), Some(&a.token), json!({ "name": "X" }))
        .await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.body["detail"], "You do not have permission to perform this action.");

    let res = app.delete(&format!("/users/{}", b.id), Some(&a.token)).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.get(&format!("/users/{}", b.id)).await?;
    assert_eq!(res.body["name"], "John Doe");
    Ok(())
}

#[tokio::test]
async fn anonymous_writes_are_rejected() -> Result<()> {
    let app = TestApp::new();
    let account = app.create_account("a@example.com").await?;

    let res = app
        .patch(&format!("/users/{}", account.id), None, json!({ "name": "X" }))
        .await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.body["detail"], "Authentication credentials were not provided.");

    // Ownership is decided before the record is looked up
    let res = app.delete("/users/999", None).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn invalid_token_is_unauthorized() -> Result<()> {
    let app = TestApp::new();
    let account = app.create_account("a@example.com").await?;

    let res = app
        .patch(&format!("/users/{}", account.id), Some("0".repeat(40).as_str()), json!({ "name": "X" }))
        .await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["detail"], "Invalid token.");
    Ok(())
}

#[tokio::test]
async fn put_requires_every_writable_field() -> Result<()> {
    let app = TestApp::new();
    let account = app.create_account("a@example.com").await?;
    let uri = format!("/users/{}", account.id);

    let res = app.put(&uri, Some(&account.token), json!({ "name": "X" })).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["email"], json!(["This field is required."]));
    assert!(res.body.get("password").is_none());

    let mut body = account_body("new@example.com");
    body.as_object_mut().unwrap().remove("password");
    let res = app.put(&uri, Some(&account.token), body).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["email"], "new@example.com");
    Ok(())
}

#[tokio::test]
async fn update_cannot_take_another_email() -> Result<()> {
    let app = TestApp::new();
    let a = app.create_account("a@example.com").await?;
    app.create_account("b@example.com").await?;

    let res = app
        .patch(&format!("/users/{}", a.id), Some(&a.token), json!({ "email": "b@example.com" }))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["email"], json!(["user with this email already exists."]));
    Ok(())
}

#[tokio::test]
async fn delete_removes_account_and_token() -> Result<()> {
    let app = TestApp::new();
    let account = app.create_account("a@example.com").await?;
    let uri = format!("/users/{}", account.id);

    let res = app.delete(&uri, Some(&account.token)).await?;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    assert!(res.body.is_null());

    assert_eq!(app.get(&uri).await?.status, StatusCode::NOT_FOUND);

    // The token died with the account
    let res = app.delete(&uri, Some(&account.token)).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn list_is_paginated() -> Result<()> {
    let app = TestApp::new();
    for i in 0..12 {
        app.create_account(&format!("user{i}@example.com")).await?;
    }

    let res = app.get("/users").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["count"], 12);
    assert_eq!(res.body["results"].as_array().unwrap().len(), 10);
    assert_eq!(res.body["next"], "/users?limit=10&offset=10");
    assert!(res.body["previous"].is_null());
    assert_eq!(res.body["results"][0]["email"], "user0@example.com");

    let res = app.get("/users?limit=5&offset=10").await?;
    assert_eq!(res.body["results"].as_array().unwrap().len(), 2);
    assert!(res.body["next"].is_null());
    assert_eq!(res.body["previous"], "/users?limit=5&offset=5");
    Ok(())
}

#[tokio::test]
async fn offset_past_the_end_is_an_empty_page() -> Result<()> {
    let app = TestApp::new();
    app.create_account("a@example.com").await?;

    let res = app.get("/users?offset=18446744073709551615").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["count"], 1);
    assert_eq!(res.body["results"], json!([]));
    assert!(res.body["next"].is_null());
    assert_eq!(res.body["previous"], "/users?limit=10&offset=18446744073709551605");
    Ok(())
}

#[tokio::test]
async fn patch_without_changes_returns_the_stored_account() -> Result<()> {
    let app = TestApp::new();
    let account = app.create_account("a@example.com").await?;

    let res = app
        .patch(&format!("/users/{}", account.id), Some(&account.token), json!({ "id": 99 }))
        .await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["id"], account.id);
    assert_eq!(res.body["updated_at"], account.body["updated_at"]);
    Ok(())
}

#[derive(Clone, Default)]
struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        let bytes = self.0.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(mut bytes) = self.0.lock() {
            bytes.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn creation_log_names_the_id_only() -> Result<()> {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    // Current-thread runtime, so the handler logs through this subscriber
    let _guard = tracing::subscriber::set_default(subscriber);

    let app = TestApp::new();
    let account = app.create_account("private@example.com").await?;

    let text = logs.text();
    assert!(text.contains(&format!("Created account {}", account.id)));
    assert!(!text.contains("private@example.com"));
    Ok(())
}
