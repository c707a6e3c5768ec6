//! Ownership rules. Reads are open to everyone; writes are limited to the
//! owning account.

use super::Caller;
use crate::error::ApiError;
use crate::types::RequestKind;

pub const NOT_AUTHENTICATED: &str = "Authentication credentials were not provided.";
pub const PERMISSION_DENIED: &str = "You do not have permission to perform this action.";

/// Anything with an owning account.
pub trait Owned {
    fn owner_id(&self) -> i64;
}

/// Writes to `/users/{id}/...` are allowed only for account `id` itself.
pub fn account_owner_or_read_only(kind: RequestKind, caller: &Caller, path_account_id: i64) -> bool {
    if kind.is_read() {
        return true;
    }
    caller.account_id() == Some(path_account_id)
}

/// Writes to a resource are allowed only for its owner.
pub fn resource_owner_or_read_only<R: Owned + ?Sized>(
    kind: RequestKind,
    caller: &Caller,
    resource: &R,
) -> bool {
    if kind.is_read() {
        return true;
    }
    caller.account_id() == Some(resource.owner_id())
}

/// Turn a predicate outcome into the matching 403.
pub fn ensure(allowed: bool, caller: &Caller) -> Result<(), ApiError> {
    if allowed {
        Ok(())
    } else if caller.is_authenticated() {
        Err(ApiError::forbidden(PERMISSION_DENIED))
    } else {
        Err(ApiError::forbidden(NOT_AUTHENTICATED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthAccount;

    struct Area {
        owner: i64,
    }

    impl Owned for Area {
        fn owner_id(&self) -> i64 {
            self.owner
        }
    }

    fn account(id: i64) -> Caller {
        Caller::Account(AuthAccount {
            id,
            email: format!("user{id}@example.com"),
        })
    }

    #[test]
    fn reads_are_always_allowed() {
        assert!(account_owner_or_read_only(RequestKind::Read, &Caller::Anonymous, 1));
        assert!(resource_owner_or_read_only(
            RequestKind::Read,
            &account(2),
            &Area { owner: 1 }
        ));
    }

    #[test]
    fn writes_require_matching_account() {
        assert!(account_owner_or_read_only(RequestKind::Write, &account(1), 1));
        assert!(!account_owner_or_read_only(RequestKind::Write, &account(2), 1));
        assert!(!account_owner_or_read_only(RequestKind::Write, &Caller::Anonymous, 1));
    }

    #[test]
    fn writes_require_resource_owner() {
        let area = Area { owner: 3 };
        assert!(resource_owner_or_read_only(RequestKind::Write, &account(3), &area));
        assert!(!resource_owner_or_read_only(RequestKind::Write, &account(4), &area));
        assert!(!resource_owner_or_read_only(RequestKind::Write, &Caller::Anonymous, &area));
    }

    #[test]
    fn denial_message_depends_on_caller() {
        let anonymous = ensure(false, &Caller::Anonymous).unwrap_err();
        assert_eq!(anonymous.message(), NOT_AUTHENTICATED);
        let other = ensure(false, &account(9)).unwrap_err();
        assert_eq!(other.message(), PERMISSION_DENIED);
        assert_eq!(other.status_code(), 403);
        assert!(ensure(true, &Caller::Anonymous).is_ok());
    }
}
