//! Hiker profile.

use super::AthleteProfile;

/// Recreational hiker: about 5 km/h on the flat, strongly slowed by climbs.
#[derive(Debug, Clone)]
pub struct HikerProfile {
    base_speed: f64,
    variance: f64,
}

impl Default for HikerProfile {
    fn default() -> Self {
        Self {
            base_speed: 1.4, // ~5 km/h
            variance: 0.12,
        }
    }
}

impl HikerProfile {
    /// A steady hiker moving at exactly `speed_kmh` on the flat.
    pub fn with_speed(speed_kmh: f64) -> Self {
        Self {
            base_speed: speed_kmh / 3.6,
            variance: 0.0,
        }
    }

    pub fn leisurely() -> Self {
        Self::with_speed(4.0)
    }
}

impl AthleteProfile for HikerProfile {
    fn base_speed_mps(&self) -> f64 {
        self.base_speed
    }

    fn grade_factor(&self, grade: f64) -> f64 {
        if grade >= 0.0 {
            (1.0 - grade * 12.0).max(0.25)
        } else {
            (1.0 - grade * 5.0).min(1.3)
        }
    }

    fn variance(&self) -> f64 {
        self.variance
    }
}
