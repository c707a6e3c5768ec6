use async_trait::async_trait;

use super::models::{
    Account, AccountChanges, AuthToken, NewAccount, NewServiceAreaPolygon, PolygonChanges,
    ServiceAreaPolygon, ServiceAreaWithOwner,
};
use super::DatabaseError;
use crate::geometry::Point;

/// Window into an ordered listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u64,
}

/// One page of results plus the total number of matching rows
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub count: u64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

/// Persistence for accounts, their tokens and their service areas.
///
/// Every method is a single atomic operation. Lookups by id return
/// `Ok(None)`; mutations of a missing row return `DatabaseError::NotFound`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    /// Accounts ordered by id
    async fn list_accounts(&self, page: PageRequest) -> Result<Page<Account>, DatabaseError>;

    async fn find_account(&self, id: i64) -> Result<Option<Account>, DatabaseError>;

    /// Whether `email` belongs to an account other than `exclude`
    async fn email_in_use(&self, email: &str, exclude: Option<i64>) -> Result<bool, DatabaseError>;

    /// Insert the account and its token together
    async fn create_account(
        &self,
        account: NewAccount,
        token_key: String,
    ) -> Result<(Account, AuthToken), DatabaseError>;

    async fn update_account(&self, id: i64, changes: AccountChanges) -> Result<Account, DatabaseError>;

    /// Removes the account with its token and polygons
    async fn delete_account(&self, id: i64) -> Result<(), DatabaseError>;

    /// Account owning the token `key`
    async fn find_token_account(&self, key: &str) -> Result<Option<Account>, DatabaseError>;

    /// Polygons of one owner, newest first
    async fn list_owner_polygons(
        &self,
        owner_id: i64,
        page: PageRequest,
    ) -> Result<Page<ServiceAreaPolygon>, DatabaseError>;

    /// All polygons ordered by id, or only those strictly containing `point`
    async fn list_polygons(
        &self,
        point: Option<Point>,
        page: PageRequest,
    ) -> Result<Page<ServiceAreaWithOwner>, DatabaseError>;

    async fn find_polygon(&self, id: i64) -> Result<Option<ServiceAreaPolygon>, DatabaseError>;

    async fn create_polygon(&self, polygon: NewServiceAreaPolygon) -> Result<ServiceAreaPolygon, DatabaseError>;

    async fn update_polygon(&self, id: i64, changes: PolygonChanges) -> Result<ServiceAreaPolygon, DatabaseError>;

    async fn delete_polygon(&self, id: i64) -> Result<(), DatabaseError>;
}
