//! Cyclist profile.

use super::AthleteProfile;

/// Touring cyclist: about 22 km/h on the flat.
#[derive(Debug, Clone)]
pub struct CyclistProfile {
    base_speed: f64,
    variance: f64,
}

impl Default for CyclistProfile {
    fn default() -> Self {
        Self {
            base_speed: 6.1, // ~22 km/h
            variance: 0.10,
        }
    }
}

impl CyclistProfile {
    /// A steady cyclist moving at exactly `speed_kmh` on the flat.
    pub fn with_speed(speed_kmh: f64) -> Self {
        Self {
            base_speed: speed_kmh / 3.6,
            variance: 0.0,
        }
    }

    /// Assisted rider holding a high pace even on climbs.
    pub fn e_bike() -> Self {
        Self::with_speed(25.0)
    }
}

impl AthleteProfile for CyclistProfile {
    fn base_speed_mps(&self) -> f64 {
        self.base_speed
    }

    fn grade_factor(&self, grade: f64) -> f64 {
        if grade >= 0.0 {
            (1.0 - grade * 25.0).max(0.15)
        } else {
            (1.0 - grade * 15.0).min(2.5)
        }
    }

    fn variance(&self) -> f64 {
        self.variance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steep_climb() {
        assert!(CyclistProfile::default().grade_factor(0.10) < 0.5);
    }

    #[test]
    fn test_downhill_boost() {
        assert!(CyclistProfile::default().grade_factor(-0.05) > 1.5);
    }
}
