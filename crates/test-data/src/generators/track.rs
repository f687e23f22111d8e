//! Straight-line track generation at a fixed sampling interval.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};
use tours::models::TrackPoint;

use crate::profiles::{self, AthleteProfile};

/// Meters per degree of latitude.
const METERS_PER_DEGREE: f64 = 111_000.0;

#[derive(Debug, Clone)]
struct TrackConfig {
    /// Starting point (lat, lon).
    start: (f64, f64),
    /// Heading in degrees clockwise from north.
    heading_deg: f64,
    point_count: usize,
    interval_s: f64,
    start_time: OffsetDateTime,
    start_elevation: f64,
    /// Elevation change per interval in meters; positive climbs.
    climb_per_point_m: f64,
    /// GPS position jitter standard deviation in meters.
    gps_jitter_m: f64,
    /// Whether points carry timestamps at all.
    timestamps: bool,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            start: crate::config::Region::ZURICH.center(),
            heading_deg: 0.0,
            point_count: 60,
            interval_s: 5.0,
            start_time: datetime!(2021-07-04 09:00 UTC),
            start_elevation: 410.0,
            climb_per_point_m: 0.0,
            gps_jitter_m: 0.0,
            timestamps: true,
        }
    }
}

/// Generates tracks whose moving speed follows an athlete profile.
pub struct TrackGenerator {
    config: TrackConfig,
}

impl TrackGenerator {
    pub fn new(start: (f64, f64)) -> Self {
        Self {
            config: TrackConfig {
                start,
                ..Default::default()
            },
        }
    }

    pub fn with_points(mut self, count: usize) -> Self {
        self.config.point_count = count;
        self
    }

    pub fn with_heading(mut self, degrees: f64) -> Self {
        self.config.heading_deg = degrees;
        self
    }

    pub fn with_start_time(mut self, start_time: OffsetDateTime) -> Self {
        self.config.start_time = start_time;
        self
    }

    pub fn with_climb(mut self, meters_per_point: f64) -> Self {
        self.config.climb_per_point_m = meters_per_point;
        self
    }

    pub fn with_gps_jitter(mut self, meters: f64) -> Self {
        self.config.gps_jitter_m = meters;
        self
    }

    pub fn without_timestamps(mut self) -> Self {
        self.config.timestamps = false;
        self
    }

    pub fn generate(&self, profile: &dyn AthleteProfile, rng: &mut impl Rng) -> Vec<TrackPoint> {
        let c = &self.config;
        if c.point_count == 0 {
            return Vec::new();
        }

        let jitter = Normal::new(0.0, c.gps_jitter_m / METERS_PER_DEGREE).ok();
        let heading = c.heading_deg.to_radians();

        let mut points = Vec::with_capacity(c.point_count);
        let (mut lat, mut lon) = c.start;
        let mut elevation = c.start_elevation;
        let mut timestamp = c.start_time;

        for i in 0..c.point_count {
            if i > 0 {
                let horizontal = profiles::speed_at_grade(profile, 0.0, 1.0) * c.interval_s;
                let grade = if horizontal > 0.0 {
                    c.climb_per_point_m / horizontal
                } else {
                    0.0
                };
                let variance = profiles::sample_variance(profile, rng);
                let step = profiles::speed_at_grade(profile, grade, variance) * c.interval_s;

                lat += step * heading.cos() / METERS_PER_DEGREE;
                lon += step * heading.sin() / (METERS_PER_DEGREE * lat.to_radians().cos());
                elevation += c.climb_per_point_m;
                timestamp += Duration::seconds_f64(c.interval_s);
            }

            let (jlat, jlon) = match &jitter {
                Some(normal) if c.gps_jitter_m > 0.0 => (normal.sample(rng), normal.sample(rng)),
                _ => (0.0, 0.0),
            };

            points.push(
                TrackPoint::new(lon + jlon, lat + jlat)
                    .with_elevation(Some(elevation))
                    .with_timestamp(c.timestamps.then_some(timestamp)),
            );
        }

        points
    }
}
