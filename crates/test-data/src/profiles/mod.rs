//! Movement profiles.
//!
//! A profile fixes how fast a synthetic athlete moves, so a generated track
//! lands in a known band of the tour classifier.

mod cyclist;
mod hiker;
mod skater;

pub use cyclist::CyclistProfile;
pub use hiker::HikerProfile;
pub use skater::SkaterProfile;

pub trait AthleteProfile: Send + Sync {
    /// Base speed on flat terrain in meters per second.
    fn base_speed_mps(&self) -> f64;

    /// Speed multiplier for a grade expressed as a fraction (0.05 = 5%).
    fn grade_factor(&self, grade: f64) -> f64;

    /// Pace variance between points as a coefficient of variation.
    /// Zero means every interval is covered at exactly the base speed.
    fn variance(&self) -> f64;

    fn base_speed_kmh(&self) -> f64 {
        self.base_speed_mps() * 3.6
    }
}

/// Speed in m/s for a grade, scaled by a sampled variance factor.
pub fn speed_at_grade(profile: &dyn AthleteProfile, grade: f64, variance_factor: f64) -> f64 {
    let target = profile.base_speed_mps() * profile.grade_factor(grade);
    (target * variance_factor).max(0.5)
}

/// Samples a multiplier around 1.0 from the profile's variance.
pub fn sample_variance(profile: &dyn AthleteProfile, rng: &mut impl rand::Rng) -> f64 {
    use rand_distr::{Distribution, Normal};

    match Normal::new(1.0, profile.variance()) {
        Ok(normal) if profile.variance() > 0.0 => {
            let sample: f64 = normal.sample(rng);
            sample.clamp(0.7, 1.4)
        }
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steady_profile_has_no_variance() {
        let mut rng = crate::seeded_rng(3);
        let profile = HikerProfile::with_speed(5.0);
        assert_eq!(sample_variance(&profile, &mut rng), 1.0);
        assert!((profile.base_speed_kmh() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_variance_is_clamped() {
        let mut rng = crate::seeded_rng(3);
        let profile = CyclistProfile::default();
        for _ in 0..200 {
            let v = sample_variance(&profile, &mut rng);
            assert!((0.7..=1.4).contains(&v));
        }
    }
}
