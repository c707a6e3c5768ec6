use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::models::{
    Account, AccountChanges, AuthToken, NewAccount, NewServiceAreaPolygon, PolygonChanges,
    ServiceAreaPolygon, ServiceAreaWithOwner,
};
use super::{DatabaseError, Page, PageRequest, Store};
use crate::geometry::Point;

#[derive(Default)]
struct Tables {
    next_account_id: i64,
    next_polygon_id: i64,
    accounts: BTreeMap<i64, Account>,
    tokens: HashMap<String, AuthToken>,
    polygons: BTreeMap<i64, ServiceAreaPolygon>,
}

impl Tables {
    fn email_taken(&self, email: &str, exclude: Option<i64>) -> bool {
        self.accounts
            .values()
            .any(|a| a.email == email && Some(a.id) != exclude)
    }
}

/// Process-local storage with the same semantics as the PostGIS store.
/// Writes are serialized through a single lock.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T>(items: Vec<T>, page: PageRequest) -> Page<T> {
    let count = items.len() as u64;
    let offset = usize::try_from(page.offset).unwrap_or(usize::MAX);
    let items = items
        .into_iter()
        .skip(offset)
        .take(page.limit as usize)
        .collect();
    Page { count, items }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn list_accounts(&self, page: PageRequest) -> Result<Page<Account>, DatabaseError> {
        let tables = self.tables.read().await;
        let accounts = tables.accounts.values().cloned().collect();
        Ok(paginate(accounts, page))
    }

    async fn find_account(&self, id: i64) -> Result<Option<Account>, DatabaseError> {
        Ok(self.tables.read().await.accounts.get(&id).cloned())
    }

    async fn email_in_use(&self, email: &str, exclude: Option<i64>) -> Result<bool, DatabaseError> {
        Ok(self.tables.read().await.email_taken(email, exclude))
    }

    async fn create_account(
        &self,
        account: NewAccount,
        token_key: String,
    ) -> Result<(Account, AuthToken), DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.email_taken(&account.email, None) {
            return Err(DatabaseError::UniqueViolation {
                entity: "user",
                field: "email",
            });
        }

        tables.next_account_id += 1;
        let now = Utc::now();
        let created = Account {
            id: tables.next_account_id,
            email: account.email,
            name: account.name,
            phone_number: account.phone_number,
            language: account.language,
            currency: account.currency,
            password: account.password,
            created_at: now,
            updated_at: now,
        };
        let token = AuthToken {
            key: token_key,
            account_id: created.id,
            created_at: now,
        };

        tables.accounts.insert(created.id, created.clone());
        tables.tokens.insert(token.key.clone(), token.clone());
        Ok((created, token))
    }

    async fn update_account(&self, id: i64, changes: AccountChanges) -> Result<Account, DatabaseError> {
        let mut tables = self.tables.write().await;
        if let Some(email) = &changes.email {
            if tables.email_taken(email, Some(id)) {
                return Err(DatabaseError::UniqueViolation {
                    entity: "user",
                    field: "email",
                });
            }
        }

        let account = tables.accounts.get_mut(&id).ok_or(DatabaseError::NotFound)?;
        changes.apply(account);
        account.updated_at = Utc::now();
        Ok(account.clone())
    }

    async fn delete_account(&self, id: i64) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.accounts.remove(&id).ok_or(DatabaseError::NotFound)?;
        tables.tokens.retain(|_, token| token.account_id != id);
        tables.polygons.retain(|_, polygon| polygon.owner_id != id);
        Ok(())
    }

    async fn find_token_account(&self, key: &str) -> Result<Option<Account>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tokens
            .get(key)
            .and_then(|token| tables.accounts.get(&token.account_id))
            .cloned())
    }

    async fn list_owner_polygons(
        &self,
        owner_id: i64,
        page: PageRequest,
    ) -> Result<Page<ServiceAreaPolygon>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut polygons: Vec<_> = tables
            .polygons
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        polygons.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(paginate(polygons, page))
    }

    async fn list_polygons(
        &self,
        point: Option<Point>,
        page: PageRequest,
    ) -> Result<Page<ServiceAreaWithOwner>, DatabaseError> {
        let tables = self.tables.read().await;
        let polygons = tables
            .polygons
            .values()
            .filter(|p| point.map_or(true, |point| p.geometry.contains(point)))
            .filter_map(|p| {
                tables.accounts.get(&p.owner_id).map(|owner| ServiceAreaWithOwner {
                    polygon: p.clone(),
                    owner_name: owner.name.clone(),
                })
            })
            .collect();
        Ok(paginate(polygons, page))
    }

    async fn find_polygon(&self, id: i64) -> Result<Option<ServiceAreaPolygon>, DatabaseError> {
        Ok(self.tables.read().await.polygons.get(&id).cloned())
    }

    async fn create_polygon(&self, polygon: NewServiceAreaPolygon) -> Result<ServiceAreaPolygon, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.accounts.contains_key(&polygon.owner_id) {
            return Err(DatabaseError::NotFound);
        }

        tables.next_polygon_id += 1;
        let now = Utc::now();
        let created = ServiceAreaPolygon {
            id: tables.next_polygon_id,
            name: polygon.name,
            price: polygon.price,
            owner_id: polygon.owner_id,
            geometry: polygon.geometry,
            created_at: now,
            updated_at: now,
        };
        tables.polygons.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_polygon(&self, id: i64, changes: PolygonChanges) -> Result<ServiceAreaPolygon, DatabaseError> {
        let mut tables = self.tables.write().await;
        let polygon = tables.polygons.get_mut(&id).ok_or(DatabaseError::NotFound)?;
        changes.apply(polygon);
        polygon.updated_at = Utc::now();
        Ok(polygon.clone())
    }

    async fn delete_polygon(&self, id: i64) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.polygons.remove(&id).ok_or(DatabaseError::NotFound)?;
        Ok(())
    }
}
