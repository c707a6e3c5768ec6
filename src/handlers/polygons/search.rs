use axum::{
    extract::{Query, State},
    http::Uri,
};
use serde::Deserialize;

use crate::api::{PageBody, PageParams};
use crate::geometry::Point;
use crate::middleware::{ApiResponse, ApiResult};
use crate::serializers::polygon::ServiceAreaView;
use crate::state::AppState;
use crate::validation::{messages, ValidationErrors};

#[derive(Debug, Default, Deserialize)]
pub struct LocationQuery {
    pub lat: Option<String>,
    pub lng: Option<String>,
    #[serde(flatten)]
    pub page: PageParams,
}

impl LocationQuery {
    /// Point to filter by, as x = lat and y = lng. Empty values count as
    /// absent; both must be present for a filter to apply.
    pub fn point(&self) -> Result<Option<Point>, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let lat = parse_coordinate("lat", self.lat.as_deref(), &mut errors);
        let lng = parse_coordinate("lng", self.lng.as_deref(), &mut errors);

        errors.into_result(match (lat, lng) {
            (Some(lat), Some(lng)) => Some(Point::new(lat, lng)),
            _ => None,
        })
    }
}

fn parse_coordinate(field: &str, raw: Option<&str>, errors: &mut ValidationErrors) -> Option<f64> {
    let raw = raw.map(str::trim).filter(|v| !v.is_empty())?;
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            errors.add(field, messages::INVALID_NUMBER);
            None
        }
    }
}

/// GET /polygons?lat=&lng= - areas containing the point, or every area
pub async fn by_location(
    State(state): State<AppState>,
    query: Option<Query<LocationQuery>>,
    uri: Uri,
) -> ApiResult<PageBody<ServiceAreaView>> {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let point = query.point()?;
    let request = query.page.resolve(&state.config.api);

    let page = state.store.list_polygons(point, request).await?;
    let page = page.map(|row| ServiceAreaView::from(&row));
    Ok(ApiResponse::success(PageBody::new(page, request, &uri)))
}
