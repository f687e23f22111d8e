use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::scoring::TourMetrics;

/// A single GPS sample. Coordinates are in degrees, elevation in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lon: f64,
    pub lat: f64,
    pub elevation: Option<f64>,
    pub timestamp: Option<OffsetDateTime>,
}

impl TrackPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self {
            lon,
            lat,
            elevation: None,
            timestamp: None,
        }
    }

    pub fn with_elevation(mut self, elevation: Option<f64>) -> Self {
        self.elevation = elevation;
        self
    }

    pub fn with_timestamp(mut self, timestamp: Option<OffsetDateTime>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn point(&self) -> geo::Point<f64> {
        geo::Point::new(self.lon, self.lat)
    }
}

/// One track of a parsed document: its points and the track's hyperlink, if any.
#[derive(Debug, Clone, Default)]
pub struct RawTrack {
    pub points: Vec<TrackPoint>,
    pub link: Option<String>,
}

/// Format-agnostic parse result. Transient: dropped once a tour is built or the
/// file is rejected.
#[derive(Debug, Clone, Default)]
pub struct RawDocument {
    pub name: Option<String>,
    pub time: Option<OffsetDateTime>,
    pub tracks: Vec<RawTrack>,
    pub waypoints: Vec<TrackPoint>,
}

impl RawDocument {
    pub fn point_count(&self) -> usize {
        self.tracks.iter().map(|t| t.points.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.point_count() == 0 && self.waypoints.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "tour_type", rename_all = "lowercase")]
pub enum TourType {
    Bike,
    Hike,
    Inline,
    Undefined,
}

impl TourType {
    pub const ALL: [TourType; 4] = [
        TourType::Bike,
        TourType::Hike,
        TourType::Inline,
        TourType::Undefined,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TourType::Bike => "Bike",
            TourType::Hike => "Hike",
            TourType::Inline => "Inline",
            TourType::Undefined => "Undefined",
        }
    }
}

impl fmt::Display for TourType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TourType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TourType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown tour type: {s}"))
    }
}

/// A normalized, persisted tour. Created once per successful import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Tour {
    pub id: Uuid,
    pub name: String,
    pub tour_type: TourType,
    pub date: OffsetDateTime,
    pub distance_km: f64,
    pub duration_s: f64,
    pub speed_kmh: f64,
    pub elevation_up: f64,
    pub elevation_down: f64,
    pub start_lat: f64,
    pub start_lon: f64,
    pub electric_assist: bool,
    pub external_id: Option<String>,
    pub external_href: Option<String>,
    /// `[longitude, latitude]` pairs in recording order.
    #[sqlx(json)]
    pub geometry: Vec<[f64; 2]>,
}

/// Everything needed to materialize a [`Tour`].
#[derive(Debug, Clone)]
pub struct NewTour {
    pub name: String,
    pub tour_type: TourType,
    pub date: OffsetDateTime,
    pub metrics: TourMetrics,
    pub electric_assist: bool,
    pub external_id: Option<String>,
    pub external_href: Option<String>,
    pub points: Vec<TrackPoint>,
}

impl Tour {
    /// Builds a tour from its parts. Returns `None` for an empty point sequence.
    pub fn new(new: NewTour) -> Option<Self> {
        let start = *new.points.first()?;
        let geometry = new.points.iter().map(|p| [p.lon, p.lat]).collect();

        Some(Self {
            id: Uuid::new_v4(),
            name: new.name,
            tour_type: new.tour_type,
            date: new.date,
            distance_km: new.metrics.distance_km.max(0.0),
            duration_s: new.metrics.duration_s.max(0.0),
            speed_kmh: round2(new.metrics.speed_kmh.max(0.0)),
            elevation_up: round2(new.metrics.elevation_up.max(0.0)),
            elevation_down: round2(new.metrics.elevation_down.max(0.0)),
            start_lat: start.lat,
            start_lon: start.lon,
            electric_assist: new.electric_assist,
            external_id: new.external_id,
            external_href: new.external_href,
            geometry,
        })
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn default_limit() -> i64 {
    100
}

/// Optional constraints for listing tours. Every field narrows the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourFilter {
    pub tour_type: Option<TourType>,
    /// Inclusive calendar date lower bound (UTC).
    pub date_from: Option<Date>,
    /// Inclusive calendar date upper bound (UTC).
    pub date_to: Option<Date>,
    pub ebike_only: Option<bool>,
    pub min_distance: Option<f64>,
    pub max_distance: Option<f64>,
    pub min_elevation: Option<f64>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl Default for TourFilter {
    fn default() -> Self {
        Self {
            tour_type: None,
            date_from: None,
            date_to: None,
            ebike_only: None,
            min_distance: None,
            max_distance: None,
            min_elevation: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl TourFilter {
    /// Whether a tour satisfies every set constraint. Ignores limit/offset.
    pub fn matches(&self, tour: &Tour) -> bool {
        let date = tour.date.to_offset(time::UtcOffset::UTC).date();

        self.tour_type.is_none_or(|t| t == tour.tour_type)
            && self.date_from.is_none_or(|from| date >= from)
            && self.date_to.is_none_or(|to| date <= to)
            && self.ebike_only.is_none_or(|e| e == tour.electric_assist)
            && self.min_distance.is_none_or(|d| tour.distance_km >= d)
            && self.max_distance.is_none_or(|d| tour.distance_km <= d)
            && self.min_elevation.is_none_or(|e| tour.elevation_up >= e)
    }

    /// Applies the filter to an in-memory set: newest first, then offset and limit.
    pub fn apply(&self, tours: impl IntoIterator<Item = Tour>) -> Vec<Tour> {
        let mut matching: Vec<Tour> = tours.into_iter().filter(|t| self.matches(t)).collect();
        matching.sort_by(|a, b| b.date.cmp(&a.date));
        matching
            .into_iter()
            .skip(self.offset.max(0) as usize)
            .take(self.limit.max(0) as usize)
            .collect()
    }
}

/// Aggregates over a set of tours.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TourSummary {
    pub total_tours: i64,
    pub total_distance: f64,
    pub total_duration: f64,
    pub total_elevation_up: f64,
    pub types: BTreeMap<String, i64>,
}

impl TourSummary {
    /// Distance and elevation totals are rounded to two decimals.
    pub fn from_tours<'a>(tours: impl IntoIterator<Item = &'a Tour>) -> Self {
        let mut summary = tours.into_iter().fold(Self::default(), |mut acc, tour| {
            acc.total_tours += 1;
            acc.total_distance += tour.distance_km;
            acc.total_duration += tour.duration_s;
            acc.total_elevation_up += tour.elevation_up;
            *acc.types.entry(tour.tour_type.to_string()).or_default() += 1;
            acc
        });
        summary.total_distance = round2(summary.total_distance);
        summary.total_elevation_up = round2(summary.total_elevation_up);
        summary
    }
}
