use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::auth;
use crate::database::models::{Account, AccountChanges, NewAccount, LANGUAGES};
use crate::database::{DatabaseError, Store};
use crate::validation::{messages, FieldReader, ValidationErrors};

pub const EMAIL_MAX_LENGTH: usize = 100;
pub const NAME_MAX_LENGTH: usize = 100;
pub const PHONE_MAX_LENGTH: usize = 15;
pub const CURRENCY_LENGTH: usize = 3;
pub const PASSWORD_MAX_LENGTH: usize = 128;

/// Public account representation. The password digest is not part of it.
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub phone_number: String,
    pub language: String,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Account> for AccountView {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            name: account.name.clone(),
            phone_number: account.phone_number.clone(),
            language: account.language.clone(),
            currency: account.currency.clone(),
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Returned once, on creation, together with the new token key
#[derive(Debug, Clone, Serialize)]
pub struct AccountCreatedView {
    #[serde(flatten)]
    pub account: AccountView,
    pub token: String,
}

/// Validation failures, or the storage or hashing error hit along the way.
#[derive(Debug)]
pub enum AccountInputError {
    Invalid(ValidationErrors),
    Storage(DatabaseError),
    Hashing(auth::PasswordHashError),
}

impl From<ValidationErrors> for AccountInputError {
    fn from(errors: ValidationErrors) -> Self {
        AccountInputError::Invalid(errors)
    }
}

impl From<DatabaseError> for AccountInputError {
    fn from(err: DatabaseError) -> Self {
        AccountInputError::Storage(err)
    }
}

impl From<AccountInputError> for crate::error::ApiError {
    fn from(err: AccountInputError) -> Self {
        match err {
            AccountInputError::Invalid(errors) => errors.into(),
            AccountInputError::Storage(err) => err.into(),
            AccountInputError::Hashing(err) => {
                tracing::error!("Password hashing failed: {}", err);
                crate::error::ApiError::internal_server_error(crate::error::SERVER_ERROR)
            }
        }
    }
}

fn read_currency(reader: &mut FieldReader<'_>) -> Option<String> {
    let currency = reader.string("currency", CURRENCY_LENGTH)?;
    if currency.len() != CURRENCY_LENGTH || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        reader.error("currency", messages::INVALID_CURRENCY);
        return None;
    }
    Some(currency)
}

/// Read the writable profile fields shared by create and update
fn read_profile(reader: &mut FieldReader<'_>) -> AccountChanges {
    AccountChanges {
        email: reader.email("email", EMAIL_MAX_LENGTH),
        name: reader.string("name", NAME_MAX_LENGTH),
        phone_number: reader.string("phone_number", PHONE_MAX_LENGTH),
        language: reader.choice("language", LANGUAGES),
        currency: read_currency(reader),
    }
}

async fn check_email_unique(
    store: &dyn Store,
    reader: &mut FieldReader<'_>,
    email: Option<&str>,
    exclude: Option<i64>,
) -> Result<(), DatabaseError> {
    if let Some(email) = email {
        if store.email_in_use(email, exclude).await? {
            reader.error("email", messages::already_exists("user", "email"));
        }
    }
    Ok(())
}

/// Validate a creation body. The password comes back hashed.
pub async fn validate_create(store: &dyn Store, body: &Value) -> Result<NewAccount, AccountInputError> {
    let mut reader = FieldReader::new(body, false)?;

    let profile = read_profile(&mut reader);
    let password = reader.string("password", PASSWORD_MAX_LENGTH);
    check_email_unique(store, &mut reader, profile.email.as_deref(), None).await?;

    let errors = reader.finish();
    match (
        profile.email,
        profile.name,
        profile.phone_number,
        profile.language,
        profile.currency,
        password,
    ) {
        (Some(email), Some(name), Some(phone_number), Some(language), Some(currency), Some(password))
            if errors.is_empty() =>
        {
            Ok(NewAccount {
                email,
                name,
                phone_number,
                language,
                currency,
                password: auth::hash_password(&password).map_err(AccountInputError::Hashing)?,
            })
        }
        _ => Err(errors.into()),
    }
}

/// Validate an update body for account `id`. `password`, `id`, timestamps
/// and unknown keys are ignored.
pub async fn validate_update(
    store: &dyn Store,
    body: &Value,
    id: i64,
    partial: bool,
) -> Result<AccountChanges, AccountInputError> {
    let mut reader = FieldReader::new(body, partial)?;

    let changes = read_profile(&mut reader);
    check_email_unique(store, &mut reader, changes.email.as_deref(), Some(id)).await?;

    Ok(reader.finish().into_result(changes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use serde_json::json;

    fn valid_body() -> Value {
        json!({
            "email": "johndoe@gmail.com",
            "password": "pass1234",
            "name": "John Doe",
            "phone_number": "3001234567",
            "language": "en",
            "currency": "USD"
        })
    }

    fn invalid(result: Result<impl std::fmt::Debug, AccountInputError>) -> ValidationErrors {
        match result {
            Err(AccountInputError::Invalid(errors)) => errors,
            other => panic!("expected validation errors, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn accepts_valid_body_and_hashes_password() {
        let store = MemoryStore::new();
        let account = validate_create(&store, &valid_body()).await.unwrap();
        assert_eq!(account.email, "johndoe@gmail.com");
        assert_ne!(account.password, "pass1234");
        assert!(auth::verify_password("pass1234", &account.password));
    }

    #[tokio::test]
    async fn reports_every_invalid_field() {
        let store = MemoryStore::new();
        let body = json!({
            "email": "johndoe@gmail.c",
            "name": "",
            "phone_number": "3".repeat(16),
            "language": "lan123",
            "currency": "US1"
        });
        let errors = invalid(validate_create(&store, &body).await);
        assert!(errors.contains("email", messages::INVALID_EMAIL));
        assert!(errors.contains("password", messages::REQUIRED));
        assert!(errors.contains("name", messages::BLANK));
        assert!(errors.contains("phone_number", "Ensure this field has no more than 15 characters."));
        assert!(errors.contains("language", "\"lan123\" is not a valid choice."));
        assert!(errors.contains("currency", messages::INVALID_CURRENCY));
    }

    #[tokio::test]
    async fn rejects_taken_email() {
        let store = MemoryStore::new();
        let account = validate_create(&store, &valid_body()).await.unwrap();
        store.create_account(account, auth::generate_token_key()).await.unwrap();

        let errors = invalid(validate_create(&store, &valid_body()).await);
        assert!(errors.contains("email", "user with this email already exists."));
    }

    #[tokio::test]
    async fn partial_update_ignores_absent_and_unknown_fields() {
        let store = MemoryStore::new();
        let changes = validate_update(&store, &json!({ "name": "X", "password": "new", "id": 9 }), 1, true)
            .await
            .unwrap();
        assert_eq!(changes.name.as_deref(), Some("X"));
        assert_eq!(changes.email, None);
    }

    #[tokio::test]
    async fn full_update_requires_writable_fields() {
        let store = MemoryStore::new();
        let errors = invalid(validate_update(&store, &json!({ "name": "X" }), 1, false).await);
        assert!(errors.contains("email", messages::REQUIRED));
        assert!(!errors.has_field("password"));
    }

    #[tokio::test]
    async fn own_email_is_not_a_conflict() {
        let store = MemoryStore::new();
        let account = validate_create(&store, &valid_body()).await.unwrap();
        let (created, _) = store.create_account(account, auth::generate_token_key()).await.unwrap();

        let changes = validate_update(&store, &json!({ "email": "johndoe@gmail.com" }), created.id, true)
            .await
            .unwrap();
        assert_eq!(changes.email.as_deref(), Some("johndoe@gmail.com"));
    }
}
