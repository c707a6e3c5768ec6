use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Language codes an account may choose from
pub const LANGUAGES: &[&str] = &[
    "en", "es", "pt", "pt-br", "fr", "de", "it", "nl", "ru", "ja", "ko", "zh-hans", "zh-hant", "ar",
    "hi",
];

/// Stored account row. `password` holds the Argon2 PHC string, never the
/// plain text, and is never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub phone_number: String,
    pub language: String,
    pub currency: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new account. `password` is already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub name: String,
    pub phone_number: String,
    pub language: String,
    pub currency: String,
    pub password: String,
}

/// Fields an update may touch; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub language: Option<String>,
    pub currency: Option<String>,
}

impl AccountChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(self, account: &mut Account) {
        if let Some(email) = self.email {
            account.email = email;
        }
        if let Some(name) = self.name {
            account.name = name;
        }
        if let Some(phone_number) = self.phone_number {
            account.phone_number = phone_number;
        }
        if let Some(language) = self.language {
            account.language = language;
        }
        if let Some(currency) = self.currency {
            account.currency = currency;
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AuthToken {
    pub key: String,
    pub account_id: i64,
    pub created_at: DateTime<Utc>,
}
