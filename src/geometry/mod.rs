//! Polygon geometry: validation of incoming GeoJSON, conversion to and from
//! the stored representation, and a point containment test for storage
//! backends without a spatial engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write as _;
use thiserror::Error;

use crate::validation::{json_shape, messages, ValidationErrors, NON_FIELD_ERRORS};

/// WGS 84 longitude/latitude.
pub const SRID_WGS84: i32 = 4326;

const MIN_RING_POINTS: usize = 4;
const BOUNDARY_TOLERANCE: f64 = 1e-12;

/// A closed sequence of `[x, y]` positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ring(pub Vec<[f64; 2]>);

impl Ring {
    pub fn points(&self) -> &[[f64; 2]] {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// GeoJSON Polygon object as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonPolygon {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<Ring>,
}

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("stored geometry is not a polygon: {0}")]
    NotPolygon(String),

    #[error("stored polygon has no rings")]
    Empty,

    #[error("malformed stored geometry: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Polygon with a single exterior ring, bound to a spatial reference.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonGeometry {
    pub srid: i32,
    pub exterior: Ring,
}

impl PolygonGeometry {
    /// Extended WKT accepted by `ST_GeomFromEWKT`.
    pub fn to_ewkt(&self) -> String {
        let mut out = format!("SRID={};POLYGON((", self.srid);
        for (i, [x, y]) in self.exterior.points().iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{x} {y}");
        }
        out.push_str("))");
        out
    }

    /// Read back a stored polygon from `ST_AsGeoJSON` output. Only the
    /// exterior ring is kept; stored rows were validated on the way in.
    pub fn from_geojson(value: &Value) -> Result<Self, GeometryError> {
        let polygon: GeoJsonPolygon = serde_json::from_value(value.clone())?;
        if polygon.kind != "Polygon" {
            return Err(GeometryError::NotPolygon(polygon.kind));
        }
        let exterior = polygon
            .coordinates
            .into_iter()
            .next()
            .ok_or(GeometryError::Empty)?;
        Ok(Self {
            srid: SRID_WGS84,
            exterior,
        })
    }

    /// Strict interior test, matching `ST_Contains`: points on the boundary
    /// are not contained.
    pub fn contains(&self, point: Point) -> bool {
        let ring = self.exterior.points();
        if ring.len() < MIN_RING_POINTS {
            return false;
        }

        let mut inside = false;
        for edge in ring.windows(2) {
            let (a, b) = (edge[0], edge[1]);
            if on_segment(point, a, b) {
                return false;
            }
            let (xa, ya) = (a[0], a[1]);
            let (xb, yb) = (b[0], b[1]);
            if (ya > point.y) != (yb > point.y) {
                let x_cross = xa + (point.y - ya) * (xb - xa) / (yb - ya);
                if point.x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }
}

fn on_segment(p: Point, a: [f64; 2], b: [f64; 2]) -> bool {
    let cross = (b[0] - a[0]) * (p.y - a[1]) - (b[1] - a[1]) * (p.x - a[0]);
    if cross.abs() > BOUNDARY_TOLERANCE {
        return false;
    }
    let within_x = p.x >= a[0].min(b[0]) - BOUNDARY_TOLERANCE
        && p.x <= a[0].max(b[0]) + BOUNDARY_TOLERANCE;
    let within_y = p.y >= a[1].min(b[1]) - BOUNDARY_TOLERANCE
        && p.y <= a[1].max(b[1]) + BOUNDARY_TOLERANCE;
    within_x && within_y
}

/// Validate a candidate GeoJSON Polygon, reporting every violated rule.
///
/// Errors are keyed by `type` and `coordinates`. On success the single ring
/// is returned, ready for [`to_storage_geometry`].
pub fn validate_polygon(candidate: &Value) -> Result<Ring, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let Value::Object(fields) = candidate else {
        return Err(ValidationErrors::single(
            NON_FIELD_ERRORS,
            messages::not_a_dict(json_shape(candidate)),
        ));
    };

    match fields.get("type") {
        None => errors.add("type", messages::REQUIRED),
        Some(Value::Null) => errors.add("type", messages::NULL),
        Some(Value::String(kind)) if kind == "Polygon" => {}
        Some(Value::String(_)) | Some(Value::Number(_)) => errors.add("type", messages::NOT_POLYGON),
        Some(_) => errors.add("type", messages::NOT_A_STRING),
    }

    let rings = match fields.get("coordinates") {
        None => {
            errors.add("coordinates", messages::REQUIRED);
            None
        }
        Some(Value::Null) => {
            errors.add("coordinates", messages::NULL);
            None
        }
        Some(value) => parse_rings(value, &mut errors),
    };

    if let Some(rings) = rings {
        check_ring_rules(&rings, &mut errors);
        if errors.is_empty() {
            if let Some(ring) = rings.into_iter().next() {
                let points = ring.into_iter().map(|p| [p[0], p[1]]).collect();
                return Ok(Ring(points));
            }
        }
    }

    Err(errors)
}

type RawRing = Vec<Vec<f64>>;

/// Parse three levels of nested lists, reporting shape problems under
/// `coordinates`. Returns `None` when any level is malformed.
fn parse_rings(value: &Value, errors: &mut ValidationErrors) -> Option<Vec<RawRing>> {
    let outer = expect_list(value, errors)?;
    let mut well_formed = true;
    let mut rings = Vec::with_capacity(outer.len());

    for ring_value in outer {
        let Some(positions) = expect_list(ring_value, errors) else {
            well_formed = false;
            continue;
        };
        let mut ring = Vec::with_capacity(positions.len());
        for position_value in positions {
            let Some(components) = expect_list(position_value, errors) else {
                well_formed = false;
                continue;
            };
            let mut position = Vec::with_capacity(components.len());
            for component in components {
                match component.as_f64() {
                    Some(n) => position.push(n),
                    None => {
                        if component.is_null() {
                            errors.add("coordinates", messages::NULL);
                        } else {
                            errors.add("coordinates", messages::INVALID_NUMBER);
                        }
                        well_formed = false;
                    }
                }
            }
            ring.push(position);
        }
        rings.push(ring);
    }

    well_formed.then_some(rings)
}

fn expect_list<'v>(value: &'v Value, errors: &mut ValidationErrors) -> Option<&'v Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Null => {
            errors.add("coordinates", messages::NULL);
            None
        }
        other => {
            errors.add("coordinates", messages::not_a_list(json_shape(other)));
            None
        }
    }
}

fn check_ring_rules(rings: &[RawRing], errors: &mut ValidationErrors) {
    if rings.len() != 1 {
        errors.add("coordinates", messages::GEOJSON_STRUCTURE);
    }

    let Some(ring) = rings.first() else {
        return;
    };

    if ring.len() < MIN_RING_POINTS {
        errors.add("coordinates", messages::MIN_VERTICES);
    }
    if ring.iter().any(|position| position.len() != 2) {
        errors.add("coordinates", messages::COORDINATE_ARITY);
    }
    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        if first != last {
            errors.add("coordinates", messages::RING_NOT_CLOSED);
        }
    }
}

pub fn to_storage_geometry(ring: &Ring) -> PolygonGeometry {
    PolygonGeometry {
        srid: SRID_WGS84,
        exterior: ring.clone(),
    }
}

pub fn to_response_geometry(geometry: &PolygonGeometry) -> GeoJsonPolygon {
    GeoJsonPolygon {
        kind: "Polygon".to_string(),
        coordinates: vec![geometry.exterior.clone()],
    }
}
