//! GeoJSON export of stored tours for map rendering.
//!
//! Each tour becomes one `Feature` whose geometry is a `LineString` over the
//! recorded `[lon, lat]` points and whose properties carry the list columns a
//! map popup needs.

use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, Value as JsonValue};
use time::format_description::well_known::Rfc3339;

use crate::errors::AppError;
use crate::models::{Tour, TourFilter};
use crate::store::TourStore;

/// A `LineString` feature for the tour, or `None` when it has no geometry.
pub fn tour_feature(tour: &Tour) -> Option<Feature> {
    if tour.geometry.is_empty() {
        return None;
    }

    let coords: Vec<Vec<f64>> = tour.geometry.iter().map(|p| p.to_vec()).collect();

    let mut props = Map::new();
    props.insert("id".to_string(), JsonValue::String(tour.id.to_string()));
    props.insert("name".to_string(), JsonValue::String(tour.name.clone()));
    props.insert("type".to_string(), tour.tour_type.as_str().into());
    props.insert(
        "date".to_string(),
        tour.date
            .format(&Rfc3339)
            .map(JsonValue::String)
            .unwrap_or(JsonValue::Null),
    );
    props.insert("distance_km".to_string(), tour.distance_km.into());
    props.insert("start_lat".to_string(), tour.start_lat.into());
    props.insert("start_lon".to_string(), tour.start_lon.into());
    props.insert("ebike".to_string(), JsonValue::Bool(tour.electric_assist));

    Some(Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::LineString(coords))),
        id: None,
        properties: Some(props),
        foreign_members: None,
    })
}

/// Tours matching the filter as one collection, newest first.
pub async fn export_geojson(
    store: &dyn TourStore,
    filter: &TourFilter,
) -> Result<FeatureCollection, AppError> {
    let tours = store.query(filter).await?;
    let features: Vec<Feature> = tours.iter().filter_map(tour_feature).collect();

    tracing::info!("GeoJSON export: {} of {} tours", features.len(), tours.len());

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}
