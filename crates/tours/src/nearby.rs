//! Proximity search over stored tour geometries.
//!
//! A tour matches when any one of its recorded points lies within the radius
//! of the center. Points are sampled as recorded; there is no interpolation
//! along the segments between them.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::Tour;
use crate::store::TourStore;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub fn default_radius_km() -> f64 {
    10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lon: f64,
    #[serde(default = "default_radius_km")]
    pub radius_km: f64,
}

/// Great-circle distance in kilometers between two (lat, lon) positions.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();

    // Rounding can push `a` just past 1 for antipodal points
    let a = ((d_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (d_lon / 2.0).sin().powi(2))
    .clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Whether any `[lon, lat]` point of the geometry lies within `radius_km`.
pub fn passes_near(geometry: &[[f64; 2]], query: &NearbyQuery) -> bool {
    geometry
        .iter()
        .any(|&[lon, lat]| haversine_km(query.lat, query.lon, lat, lon) <= query.radius_km)
}

/// Filters tours to those passing near the query point, keeping input order.
pub fn tours_near(tours: Vec<Tour>, query: &NearbyQuery) -> Vec<Tour> {
    tours
        .into_par_iter()
        .filter(|tour| passes_near(&tour.geometry, query))
        .collect()
}

/// Scans every stored tour for proximity to the query point.
pub async fn find_nearby(store: &dyn TourStore, query: &NearbyQuery) -> Result<Vec<Tour>, AppError> {
    if query.radius_km.is_nan() || query.radius_km < 0.0 {
        return Err(AppError::InvalidInput(format!(
            "radius must be a non-negative number of kilometers, got {}",
            query.radius_km
        )));
    }

    let tours = store.query_all().await?;
    let scanned = tours.len();
    let matches = tours_near(tours, query);

    tracing::info!(
        "Nearby ({:.5}, {:.5}) r={} km: {} of {} tours",
        query.lat,
        query.lon,
        query.radius_km,
        matches.len(),
        scanned
    );

    Ok(matches)
}
