//! Geographic areas for fixture generation.

/// Geographic bounding box defined by southwest and northeast corners.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    /// Minimum latitude (south)
    pub min_lat: f64,
    /// Minimum longitude (west)
    pub min_lon: f64,
    /// Maximum latitude (north)
    pub max_lat: f64,
    /// Maximum longitude (east)
    pub max_lon: f64,
}

impl BoundingBox {
    pub const fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Returns a random point within the bounding box.
    pub fn random_point(&self, rng: &mut impl rand::Rng) -> (f64, f64) {
        let lat = rng.gen_range(self.min_lat..self.max_lat);
        let lon = rng.gen_range(self.min_lon..self.max_lon);
        (lat, lon)
    }

    /// Returns the center of the bounding box as (lat, lon).
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

/// Pre-defined geographic regions.
#[derive(Debug, Clone, Copy)]
pub struct Region;

impl Region {
    /// Zurich and the lake shore.
    pub const ZURICH: BoundingBox = BoundingBox::new(47.32, 8.45, 47.42, 8.62);

    /// Lake Geneva, far enough from Zurich to never match a nearby search there.
    pub const GENEVA: BoundingBox = BoundingBox::new(46.17, 6.08, 46.25, 6.20);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_point_within_bounds() {
        let mut rng = crate::seeded_rng(1);
        for _ in 0..100 {
            let (lat, lon) = Region::ZURICH.random_point(&mut rng);
            assert!(Region::ZURICH.contains(lat, lon));
        }
    }
}
