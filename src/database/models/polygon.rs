use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::auth::Owned;
use crate::geometry::PolygonGeometry;

/// A priced service area owned by one account
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceAreaPolygon {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub owner_id: i64,
    pub geometry: PolygonGeometry,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Owned for ServiceAreaPolygon {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

/// Polygon joined with its owner's display name
#[derive(Debug, Clone)]
pub struct ServiceAreaWithOwner {
    pub polygon: ServiceAreaPolygon,
    pub owner_name: String,
}

#[derive(Debug, Clone)]
pub struct NewServiceAreaPolygon {
    pub name: String,
    pub price: Decimal,
    pub owner_id: i64,
    pub geometry: PolygonGeometry,
}

/// The owner is never part of an update.
#[derive(Debug, Clone, Default)]
pub struct PolygonChanges {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub geometry: Option<PolygonGeometry>,
}

impl PolygonChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.geometry.is_none()
    }

    pub fn apply(self, polygon: &mut ServiceAreaPolygon) {
        if let Some(name) = self.name {
            polygon.name = name;
        }
        if let Some(price) = self.price {
            polygon.price = price;
        }
        if let Some(geometry) = self.geometry {
            polygon.geometry = geometry;
        }
    }
}
