use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::database::models::{NewServiceAreaPolygon, PolygonChanges, ServiceAreaPolygon, ServiceAreaWithOwner};
use crate::geometry::{self, GeoJsonPolygon, PolygonGeometry};
use crate::validation::{FieldReader, ValidationErrors};

pub const NAME_MAX_LENGTH: usize = 100;
pub const PRICE_MAX_DIGITS: u32 = 10;
pub const PRICE_DECIMAL_PLACES: u32 = 2;

/// Read shape of a service area. `owner_name` only appears in the global
/// listing.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceAreaView {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub owner: i64,
    pub geometry: GeoJsonPolygon,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
}

impl From<&ServiceAreaPolygon> for ServiceAreaView {
    fn from(polygon: &ServiceAreaPolygon) -> Self {
        Self {
            id: polygon.id,
            name: polygon.name.clone(),
            price: polygon.price,
            owner: polygon.owner_id,
            geometry: geometry::to_response_geometry(&polygon.geometry),
            created_at: polygon.created_at,
            updated_at: polygon.updated_at,
            owner_name: None,
        }
    }
}

impl From<&ServiceAreaWithOwner> for ServiceAreaView {
    fn from(row: &ServiceAreaWithOwner) -> Self {
        Self {
            owner_name: Some(row.owner_name.clone()),
            ..Self::from(&row.polygon)
        }
    }
}

fn read_geometry(reader: &mut FieldReader<'_>) -> Option<PolygonGeometry> {
    let candidate = reader.raw("geometry")?;
    match geometry::validate_polygon(candidate) {
        Ok(ring) => Some(geometry::to_storage_geometry(&ring)),
        Err(errors) => {
            reader.nest("geometry", errors);
            None
        }
    }
}

fn read_changes(reader: &mut FieldReader<'_>) -> PolygonChanges {
    PolygonChanges {
        name: reader.string("name", NAME_MAX_LENGTH),
        price: reader.decimal("price", PRICE_MAX_DIGITS, PRICE_DECIMAL_PLACES),
        geometry: read_geometry(reader),
    }
}

/// Validate a creation body for `owner_id`. An `owner` key in the body is
/// ignored.
pub fn validate_create(body: &Value, owner_id: i64) -> Result<NewServiceAreaPolygon, ValidationErrors> {
    let mut reader = FieldReader::new(body, false)?;
    let changes = read_changes(&mut reader);
    let errors = reader.finish();

    match (changes.name, changes.price, changes.geometry) {
        (Some(name), Some(price), Some(geometry)) if errors.is_empty() => Ok(NewServiceAreaPolygon {
            name,
            price,
            owner_id,
            geometry,
        }),
        _ => Err(errors),
    }
}

/// Validate an update body. A supplied geometry is validated again in full.
pub fn validate_update(body: &Value, partial: bool) -> Result<PolygonChanges, ValidationErrors> {
    let mut reader = FieldReader::new(body, partial)?;
    let changes = read_changes(&mut reader);
    reader.finish().into_result(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::messages;
    use serde_json::json;

    fn body() -> Value {
        json!({
            "name": "Downtown",
            "price": "10.5",
            "owner": 99,
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0, 0], [0, 50], [50, 50], [50, 0], [0, 0]]]
            }
        })
    }

    #[test]
    fn attaches_owner_from_context() {
        let polygon = validate_create(&body(), 3).unwrap();
        assert_eq!(polygon.owner_id, 3);
        assert_eq!(polygon.price.to_string(), "10.50");
        assert_eq!(polygon.geometry.exterior.points().len(), 5);
    }

    #[test]
    fn nests_geometry_errors() {
        let mut candidate = body();
        candidate["geometry"]["type"] = json!("Point");
        candidate["geometry"]["coordinates"] = json!([[[0, 0], [0, 50], [50, 50], [50, 0]]]);
        candidate["price"] = json!("1.234");

        let errors = validate_create(&candidate, 1).unwrap_err();
        let geometry = errors.nested("geometry").unwrap();
        assert!(geometry.contains("type", messages::NOT_POLYGON));
        assert!(geometry.contains("coordinates", messages::RING_NOT_CLOSED));
        assert!(errors.contains("price", "Ensure that there are no more than 2 decimal places."));

        let value = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            value["geometry"]["type"],
            json!(["The value of this field should be \"Polygon\"."])
        );
    }

    #[test]
    fn geometry_is_required_on_create() {
        let mut candidate = body();
        candidate.as_object_mut().unwrap().remove("geometry");
        let errors = validate_create(&candidate, 1).unwrap_err();
        assert!(errors.contains("geometry", messages::REQUIRED));
    }

    #[test]
    fn partial_update_validates_supplied_geometry() {
        let errors = validate_update(&json!({ "geometry": { "type": "Polygon", "coordinates": [] } }), true)
            .unwrap_err();
        assert!(errors
            .nested("geometry")
            .unwrap()
            .contains("coordinates", messages::GEOJSON_STRUCTURE));

        let changes = validate_update(&json!({ "name": "Renamed" }), true).unwrap();
        assert_eq!(changes.name.as_deref(), Some("Renamed"));
        assert!(changes.geometry.is_none());
    }

    #[test]
    fn read_shape_serializes_price_as_string() {
        let new = validate_create(&body(), 3).unwrap();
        let polygon = ServiceAreaPolygon {
            id: 1,
            name: new.name,
            price: new.price,
            owner_id: new.owner_id,
            geometry: new.geometry,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let view = serde_json::to_value(ServiceAreaView::from(&polygon)).unwrap();
        assert_eq!(view["price"], json!("10.50"));
        assert_eq!(view["owner"], json!(3));
        assert_eq!(view["geometry"]["type"], json!("Polygon"));
        assert!(view.get("owner_name").is_none());

        let with_owner = ServiceAreaWithOwner {
            polygon,
            owner_name: "John Doe".to_string(),
        };
        let view = serde_json::to_value(ServiceAreaView::from(&with_owner)).unwrap();
        assert_eq!(view["owner_name"], json!("John Doe"));
    }
}
