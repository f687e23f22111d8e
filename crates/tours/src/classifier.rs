//! Activity classification from the tour name and average moving speed.

use serde::Serialize;

use crate::config::ClassifierConfig;
use crate::file_parsers::FileType;
use crate::models::TourType;

/// Name keywords in priority order; the first one contained in the name wins.
const TYPE_KEYWORDS: [(&str, TourType); 5] = [
    ("fahrradtour", TourType::Bike),
    ("wanderung", TourType::Hike),
    ("inline", TourType::Inline),
    ("mountainbike", TourType::Bike),
    ("e-bike", TourType::Bike),
];

const EBIKE_KEYWORDS: [&str; 3] = ["e-bike", "ebike", "husq"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub tour_type: TourType,
    pub electric_assist: bool,
}

pub fn classify(
    name: &str,
    speed_kmh: f64,
    file_type: FileType,
    config: &ClassifierConfig,
) -> Classification {
    let lower = name.to_lowercase();

    let mut tour_type = keyword_type(&lower)
        .or_else(|| speed_type(speed_kmh, config))
        .unwrap_or(TourType::Undefined);

    // Speeds in this band from KML recordings are reliably inline skating,
    // whatever the name suggests.
    let (band_low, band_high) = config.placemark_inline_band_kmh;
    if file_type.is_placemark_format() && (band_low..band_high).contains(&speed_kmh) {
        if tour_type != TourType::Inline {
            tracing::info!("KML tour at {speed_kmh:.1} km/h classified as Inline");
        }
        tour_type = TourType::Inline;
    }

    Classification {
        tour_type,
        electric_assist: EBIKE_KEYWORDS.iter().any(|k| lower.contains(k)),
    }
}

fn keyword_type(lower_name: &str) -> Option<TourType> {
    TYPE_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower_name.contains(keyword))
        .map(|&(_, tour_type)| tour_type)
}

fn speed_type(speed_kmh: f64, config: &ClassifierConfig) -> Option<TourType> {
    if speed_kmh <= 0.0 {
        None
    } else if speed_kmh < config.hike_below_kmh {
        Some(TourType::Hike)
    } else if speed_kmh < config.bike_from_kmh {
        Some(TourType::Inline)
    } else {
        Some(TourType::Bike)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gpx(name: &str, speed: f64) -> Classification {
        classify(name, speed, FileType::Gpx, &ClassifierConfig::default())
    }

    #[test]
    fn test_keywords_win_at_any_speed() {
        for speed in [0.0, 5.0, 10.0, 40.0] {
            assert_eq!(gpx("Fahrradtour Zürich", speed).tour_type, TourType::Bike);
            assert_eq!(gpx("WANDERUNG am See", speed).tour_type, TourType::Hike);
            assert_eq!(gpx("Inline-Skating Runde", speed).tour_type, TourType::Inline);
            assert_eq!(gpx("Mountainbike Uetliberg", speed).tour_type, TourType::Bike);
        }
    }

    #[test]
    fn test_keyword_priority() {
        // "fahrradtour" outranks "wanderung"
        assert_eq!(gpx("Wanderung und Fahrradtour", 3.0).tour_type, TourType::Bike);
        // "wanderung" outranks "inline"
        assert_eq!(gpx("Inline dann Wanderung", 20.0).tour_type, TourType::Hike);
    }

    #[test]
    fn test_speed_fallback() {
        assert_eq!(gpx("Sonntag", 5.0).tour_type, TourType::Hike);
        assert_eq!(gpx("Sonntag", 8.0).tour_type, TourType::Inline);
        assert_eq!(gpx("Sonntag", 14.9).tour_type, TourType::Inline);
        assert_eq!(gpx("Sonntag", 15.0).tour_type, TourType::Bike);
        assert_eq!(gpx("Sonntag", 20.0).tour_type, TourType::Bike);
        assert_eq!(gpx("Sonntag", 0.0).tour_type, TourType::Undefined);
    }

    #[test]
    fn test_placemark_override() {
        let config = ClassifierConfig::default();

        let c = classify("Sonntag", 10.0, FileType::Kml, &config);
        assert_eq!(c.tour_type, TourType::Inline);

        let c = classify("Fahrradtour", 10.0, FileType::Kmz, &config);
        assert_eq!(c.tour_type, TourType::Inline);

        let c = classify("Fahrradtour", 10.0, FileType::Gpx, &config);
        assert_eq!(c.tour_type, TourType::Bike);

        let c = classify("Fahrradtour", 20.0, FileType::Kml, &config);
        assert_eq!(c.tour_type, TourType::Bike);
    }

    #[test]
    fn test_configurable_band() {
        let config = ClassifierConfig {
            placemark_inline_band_kmh: (9.0, 12.0),
            ..Default::default()
        };
        let c = classify("Wanderung", 8.5, FileType::Kml, &config);
        assert_eq!(c.tour_type, TourType::Hike);
    }

    #[test]
    fn test_electric_assist() {
        assert!(gpx("E-Bike Tour", 20.0).electric_assist);
        assert_eq!(gpx("E-Bike Tour", 20.0).tour_type, TourType::Bike);
        assert!(gpx("Ebike Ausflug", 20.0).electric_assist);
        assert!(gpx("Husqvarna Runde", 20.0).electric_assist);
        assert!(!gpx("Fahrradtour", 20.0).electric_assist);
        // "ebike" alone sets the flag but is not a type keyword
        assert_eq!(gpx("Ebike Ausflug", 5.0).tour_type, TourType::Hike);
    }
}
