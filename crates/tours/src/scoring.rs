use geo::{Distance as _, Haversine, geometry::Point};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::config::MetricsConfig;
use crate::models::TrackPoint;

pub trait TrackMetric {
    type Score;
    fn next_point(&mut self, point: &TrackPoint);
    fn finish(&mut self) -> Self::Score;
}

/// Moving-based figures derived from a point sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TourMetrics {
    pub distance_km: f64,
    pub duration_s: f64,
    pub speed_kmh: f64,
    pub elevation_up: f64,
    pub elevation_down: f64,
}

pub fn score_track(points: &[TrackPoint], config: &MetricsConfig) -> TourMetrics {
    let mut acc = Metrics::new(config);

    for point in points {
        acc.next_point(point);
    }

    acc.finish()
}

#[derive(Debug, Clone)]
struct Metrics {
    moving: MovingMetric,
    elevation: ElevationMetric,
}

impl Metrics {
    fn new(config: &MetricsConfig) -> Self {
        Self {
            moving: MovingMetric::new(config.min_moving_speed_kmh, config.max_moving_gap_s),
            elevation: ElevationMetric::new(config.elevation_noise_m),
        }
    }
}

impl TrackMetric for Metrics {
    type Score = TourMetrics;

    fn next_point(&mut self, point: &TrackPoint) {
        self.moving.next_point(point);
        self.elevation.next_point(point);
    }

    fn finish(&mut self) -> TourMetrics {
        let moving = self.moving.finish();
        let (elevation_up, elevation_down) = self.elevation.finish();

        let distance_km = moving.distance_m / 1000.0;
        let speed_kmh = if moving.time_s > 0.0 {
            distance_km / (moving.time_s / 3600.0)
        } else {
            0.0
        };

        TourMetrics {
            distance_km,
            duration_s: moving.time_s,
            speed_kmh,
            elevation_up,
            elevation_down,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovingData {
    pub distance_m: f64,
    pub time_s: f64,
}

/// Sums distance and time over intervals that look like actual movement: the
/// implied speed is above `min_speed_kmh` and the gap is at most `max_gap_s`.
/// Intervals without timestamps on both ends are never counted.
#[derive(Debug, Clone)]
struct MovingMetric {
    min_speed_kmh: f64,
    max_gap_s: f64,
    totals: MovingData,
    last: Option<(Point, Option<OffsetDateTime>)>,
}

impl MovingMetric {
    fn new(min_speed_kmh: f64, max_gap_s: f64) -> Self {
        Self {
            min_speed_kmh,
            max_gap_s,
            totals: MovingData::default(),
            last: None,
        }
    }
}

impl TrackMetric for MovingMetric {
    type Score = MovingData;

    fn next_point(&mut self, wpt: &TrackPoint) {
        let current = wpt.point();

        if let Some((prev, Some(prev_time))) = self.last
            && let Some(time) = wpt.timestamp
        {
            let elapsed = (time - prev_time).as_seconds_f64();
            if elapsed > 0.0 && elapsed <= self.max_gap_s {
                let distance = Haversine.distance(prev, current);
                let speed_kmh = (distance / 1000.0) / (elapsed / 3600.0);
                if speed_kmh > self.min_speed_kmh {
                    self.totals.distance_m += distance;
                    self.totals.time_s += elapsed;
                }
            }
        }

        self.last = Some((current, wpt.timestamp));
    }

    fn finish(&mut self) -> MovingData {
        self.totals
    }
}

/// Cumulative gain and loss with a hysteresis band: elevation changes count only
/// once they move at least `noise_m` away from the last accepted elevation, so
/// sensor jitter inside the band never accumulates.
#[derive(Debug, Clone)]
struct ElevationMetric {
    noise_m: f64,
    gain: f64,
    loss: f64,
    reference: Option<f64>,
}

impl ElevationMetric {
    fn new(noise_m: f64) -> Self {
        Self {
            noise_m,
            gain: 0.0,
            loss: 0.0,
            reference: None,
        }
    }
}

impl TrackMetric for ElevationMetric {
    type Score = (f64, f64);

    fn next_point(&mut self, wpt: &TrackPoint) {
        let Some(elevation) = wpt.elevation else {
            return;
        };

        match self.reference {
            None => self.reference = Some(elevation),
            Some(reference) => {
                let delta = elevation - reference;
                if delta.abs() >= self.noise_m {
                    if delta > 0.0 {
                        self.gain += delta;
                    } else {
                        self.loss -= delta;
                    }
                    self.reference = Some(elevation);
                }
            }
        }
    }

    fn finish(&mut self) -> (f64, f64) {
        (self.gain, self.loss)
    }
}
