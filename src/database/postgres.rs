use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{types::Json, FromRow, PgPool};

use super::models::{
    Account, AccountChanges, AuthToken, NewAccount, NewServiceAreaPolygon, PolygonChanges,
    ServiceAreaPolygon, ServiceAreaWithOwner,
};
use super::{DatabaseError, Page, PageRequest, Store};
use crate::geometry::{Point, PolygonGeometry, SRID_WGS84};

const ACCOUNT_COLUMNS: &str =
    "id, email, name, phone_number, language, currency, password, created_at, updated_at";

// Geometry travels as EWKT on the way in and GeoJSON on the way out
const POLYGON_COLUMNS: &str = "p.id, p.name, p.price, p.owner_id, \
     ST_AsGeoJSON(p.geom, 15)::jsonb AS geometry, p.created_at, p.updated_at";

/// PostgreSQL + PostGIS storage
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PolygonRow {
    id: i64,
    name: String,
    price: Decimal,
    owner_id: i64,
    geometry: Json<Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PolygonRow> for ServiceAreaPolygon {
    type Error = DatabaseError;

    fn try_from(row: PolygonRow) -> Result<Self, Self::Error> {
        let geometry = PolygonGeometry::from_geojson(&row.geometry.0)
            .map_err(|e| DatabaseError::Decode(format!("polygon {}: {}", row.id, e)))?;
        Ok(ServiceAreaPolygon {
            id: row.id,
            name: row.name,
            price: row.price,
            owner_id: row.owner_id,
            geometry,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct PolygonWithOwnerRow {
    #[sqlx(flatten)]
    polygon: PolygonRow,
    owner_name: String,
}

const EMAIL_CONSTRAINT: &str = "accounts_email_key";

/// Map the email constraint to a field-level conflict. Other violations stay
/// storage errors.
fn map_unique_violation(err: sqlx::Error) -> DatabaseError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.constraint() == Some(EMAIL_CONSTRAINT) {
            return DatabaseError::UniqueViolation {
                entity: "user",
                field: "email",
            };
        }
    }
    DatabaseError::Sqlx(err)
}

fn to_count(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

fn to_offset(page: PageRequest) -> i64 {
    i64::try_from(page.offset).unwrap_or(i64::MAX)
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_accounts(&self, page: PageRequest) -> Result<Page<Account>, DatabaseError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;

        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id LIMIT $1 OFFSET $2");
        let items = sqlx::query_as::<_, Account>(&sql)
            .bind(i64::from(page.limit))
            .bind(to_offset(page))
            .fetch_all(&self.pool)
            .await?;

        Ok(Page {
            count: to_count(count),
            items,
        })
    }

    async fn find_account(&self, id: i64) -> Result<Option<Account>, DatabaseError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn email_in_use(&self, email: &str, exclude: Option<i64>) -> Result<bool, DatabaseError> {
        let in_use: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM accounts WHERE email = $1 AND ($2::bigint IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(in_use)
    }

    async fn create_account(
        &self,
        account: NewAccount,
        token_key: String,
    ) -> Result<(Account, AuthToken), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO accounts (email, name, phone_number, language, currency, password) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {ACCOUNT_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Account>(&sql)
            .bind(&account.email)
            .bind(&account.name)
            .bind(&account.phone_number)
            .bind(&account.language)
            .bind(&account.currency)
            .bind(&account.password)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_unique_violation)?;

        let token = sqlx::query_as::<_, AuthToken>(
            "INSERT INTO auth_tokens (key, account_id) VALUES ($1, $2) RETURNING key, account_id, created_at",
        )
        .bind(&token_key)
        .bind(created.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((created, token))
    }

    async fn update_account(&self, id: i64, changes: AccountChanges) -> Result<Account, DatabaseError> {
        let sql = format!(
            "UPDATE accounts SET \
               email = COALESCE($2, email), \
               name = COALESCE($3, name), \
               phone_number = COALESCE($4, phone_number), \
               language = COALESCE($5, language), \
               currency = COALESCE($6, currency), \
               updated_at = now() \
             WHERE id = $1 RETURNING {ACCOUNT_COLUMNS}"
        );
        sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .bind(changes.email)
            .bind(changes.name)
            .bind(changes.phone_number)
            .bind(changes.language)
            .bind(changes.currency)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_unique_violation)?
            .ok_or(DatabaseError::NotFound)
    }

    async fn delete_account(&self, id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    async fn find_token_account(&self, key: &str) -> Result<Option<Account>, DatabaseError> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts \
             WHERE id = (SELECT account_id FROM auth_tokens WHERE key = $1)"
        );
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn list_owner_polygons(
        &self,
        owner_id: i64,
        page: PageRequest,
    ) -> Result<Page<ServiceAreaPolygon>, DatabaseError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM polygons WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {POLYGON_COLUMNS} FROM polygons p WHERE p.owner_id = $1 \
             ORDER BY p.created_at DESC, p.id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, PolygonRow>(&sql)
            .bind(owner_id)
            .bind(i64::from(page.limit))
            .bind(to_offset(page))
            .fetch_all(&self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(ServiceAreaPolygon::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            count: to_count(count),
            items,
        })
    }

    async fn list_polygons(
        &self,
        point: Option<Point>,
        page: PageRequest,
    ) -> Result<Page<ServiceAreaWithOwner>, DatabaseError> {
        let (x, y) = match point {
            Some(p) => (Some(p.x), Some(p.y)),
            None => (None, None),
        };
        let filter = format!(
            "($1::float8 IS NULL OR ST_Contains(p.geom, ST_SetSRID(ST_MakePoint($1, $2), {SRID_WGS84})))"
        );

        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM polygons p WHERE {filter}"))
            .bind(x)
            .bind(y)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {POLYGON_COLUMNS}, a.name AS owner_name \
             FROM polygons p JOIN accounts a ON a.id = p.owner_id \
             WHERE {filter} ORDER BY p.id LIMIT $3 OFFSET $4"
        );
        let rows = sqlx::query_as::<_, PolygonWithOwnerRow>(&sql)
            .bind(x)
            .bind(y)
            .bind(i64::from(page.limit))
            .bind(to_offset(page))
            .fetch_all(&self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(|row| {
                Ok(ServiceAreaWithOwner {
                    polygon: ServiceAreaPolygon::try_from(row.polygon)?,
                    owner_name: row.owner_name,
                })
            })
            .collect::<Result<Vec<_>, DatabaseError>>()?;
        Ok(Page {
            count: to_count(count),
            items,
        })
    }

    async fn find_polygon(&self, id: i64) -> Result<Option<ServiceAreaPolygon>, DatabaseError> {
        let sql = format!("SELECT {POLYGON_COLUMNS} FROM polygons p WHERE p.id = $1");
        sqlx::query_as::<_, PolygonRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(ServiceAreaPolygon::try_from)
            .transpose()
    }

    async fn create_polygon(&self, polygon: NewServiceAreaPolygon) -> Result<ServiceAreaPolygon, DatabaseError> {
        let sql = format!(
            "WITH p AS ( \
               INSERT INTO polygons (name, price, owner_id, geom) \
               VALUES ($1, $2, $3, ST_GeomFromEWKT($4)) RETURNING * \
             ) SELECT {POLYGON_COLUMNS} FROM p"
        );
        let row = sqlx::query_as::<_, PolygonRow>(&sql)
            .bind(&polygon.name)
            .bind(polygon.price)
            .bind(polygon.owner_id)
            .bind(polygon.geometry.to_ewkt())
            .fetch_one(&self.pool)
            .await?;
        ServiceAreaPolygon::try_from(row)
    }

    async fn update_polygon(&self, id: i64, changes: PolygonChanges) -> Result<ServiceAreaPolygon, DatabaseError> {
        let sql = format!(
            "WITH p AS ( \
               UPDATE polygons SET \
                 name = COALESCE($2, name), \
                 price = COALESCE($3, price), \
                 geom = COALESCE(ST_GeomFromEWKT($4), geom), \
                 updated_at = now() \
               WHERE id = $1 RETURNING * \
             ) SELECT {POLYGON_COLUMNS} FROM p"
        );
        let row = sqlx::query_as::<_, PolygonRow>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.price)
            .bind(changes.geometry.as_ref().map(PolygonGeometry::to_ewkt))
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DatabaseError::NotFound)?;
        ServiceAreaPolygon::try_from(row)
    }

    async fn delete_polygon(&self, id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM polygons WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }
}
