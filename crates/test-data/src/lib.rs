//! Fixture generation for the tours crate.
//!
//! Produces synthetic GPS tracks with a known speed and renders them as GPX,
//! KML or KMZ bytes, ready to hand to the importer.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_data::prelude::*;
//!
//! let mut rng = seeded_rng(7);
//! let points = TrackGenerator::new(Region::ZURICH.center())
//!     .with_points(120)
//!     .generate(&HikerProfile::default(), &mut rng);
//!
//! let bytes = GpxFixture::new("Wanderung Uetliberg")
//!     .link("https://www.komoot.de/tour/123456")
//!     .track(points)
//!     .to_bytes();
//! ```

pub mod config;
pub mod generators;
pub mod gpx;
pub mod kml;
pub mod kmz;
pub mod profiles;

pub use tours::models::TrackPoint;

/// Deterministic RNG so fixtures are reproducible across runs.
pub fn seeded_rng(seed: u64) -> rand::rngs::StdRng {
    use rand::SeedableRng;
    rand::rngs::StdRng::seed_from_u64(seed)
}

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::{BoundingBox, Region};
    pub use crate::generators::TrackGenerator;
    pub use crate::gpx::GpxFixture;
    pub use crate::kml::{KmlFixture, KmlGeometry};
    pub use crate::kmz::{kmz_from_kml, kmz_without_kml};
    pub use crate::profiles::{
        AthleteProfile, CyclistProfile, HikerProfile, SkaterProfile, sample_variance,
    };
    pub use crate::{TrackPoint, seeded_rng};
}
