//! Inline skater profile.

use super::AthleteProfile;

/// Inline skater: about 12 km/h, between hiking and cycling pace.
#[derive(Debug, Clone)]
pub struct SkaterProfile {
    base_speed: f64,
    variance: f64,
}

impl Default for SkaterProfile {
    fn default() -> Self {
        Self {
            base_speed: 3.3, // ~12 km/h
            variance: 0.08,
        }
    }
}

impl SkaterProfile {
    pub fn with_speed(speed_kmh: f64) -> Self {
        Self {
            base_speed: speed_kmh / 3.6,
            variance: 0.0,
        }
    }
}

impl AthleteProfile for SkaterProfile {
    fn base_speed_mps(&self) -> f64 {
        self.base_speed
    }

    fn grade_factor(&self, grade: f64) -> f64 {
        // Skating uphill is hard, downhill speed is braked
        if grade >= 0.0 {
            (1.0 - grade * 20.0).max(0.2)
        } else {
            (1.0 - grade * 8.0).min(1.5)
        }
    }

    fn variance(&self) -> f64 {
        self.variance
    }
}
