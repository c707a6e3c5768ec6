pub mod permissions;

use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::Argon2;
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub use argon2::password_hash::Error as PasswordHashError;
pub use permissions::{account_owner_or_read_only, ensure, resource_owner_or_read_only, Owned};

/// Length of an API token key, in hex characters.
pub const TOKEN_KEY_LENGTH: usize = 40;

/// Authenticated account attached to a request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthAccount {
    pub id: i64,
    pub email: String,
}

/// Who is making the request. Requests without credentials are anonymous.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Caller {
    #[default]
    Anonymous,
    Account(AuthAccount),
}

impl Caller {
    pub fn account_id(&self) -> Option<i64> {
        match self {
            Caller::Anonymous => None,
            Caller::Account(account) => Some(account.id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Caller::Account(_))
    }
}

/// Argon2id digest of `password` as a PHC string (`$argon2id$v=19$...`).
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

#[cfg(test)]
pub(crate) fn verify_password(password: &str, encoded: &str) -> bool {
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    PasswordHash::new(encoded)
        .map(|hash| Argon2::default().verify_password(password.as_bytes(), &hash).is_ok())
        .unwrap_or(false)
}

/// Fresh random token key: 40 lowercase hex characters.
pub fn generate_token_key() -> String {
    let mut hasher = Sha256::new();
    hasher.update(Uuid::new_v4().as_bytes());
    hasher.update(Uuid::new_v4().as_bytes());
    let mut key = format!("{:x}", hasher.finalize());
    key.truncate(TOKEN_KEY_LENGTH);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies_only_its_password() {
        let encoded = hash_password("s3cret").unwrap();
        assert!(encoded.starts_with("$argon2id$"));
        assert!(!encoded.contains("s3cret"));
        assert!(verify_password("s3cret", &encoded));
        assert!(!verify_password("S3cret", &encoded));
        assert!(!verify_password("s3cret", "plain"));
    }

    #[test]
    fn password_hashes_are_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn token_keys_are_forty_hex_chars() {
        let key = generate_token_key();
        assert_eq!(key.len(), TOKEN_KEY_LENGTH);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(key, generate_token_key());
    }

    #[test]
    fn caller_identity() {
        assert_eq!(Caller::Anonymous.account_id(), None);
        let caller = Caller::Account(AuthAccount {
            id: 7,
            email: "a@b.co".to_string(),
        });
        assert_eq!(caller.account_id(), Some(7));
        assert!(caller.is_authenticated());
    }
}
