//! Flattens a [`RawDocument`] into the ordered point sequence and metadata a
//! tour is built from.

use std::path::Path;

use time::OffsetDateTime;

use crate::models::{RawDocument, TrackPoint};

/// Marker some exporters append to finished recordings.
const COMPLETED_MARKER: &str = "(Completed)";

#[derive(Debug, Clone)]
pub struct ParsedTrack {
    pub name: String,
    /// Every track point of every track, in document order.
    pub points: Vec<TrackPoint>,
    /// First non-empty per-track hyperlink.
    pub link: Option<String>,
    pub started_at: OffsetDateTime,
}

impl ParsedTrack {
    pub fn from_document(doc: RawDocument, filename: &str) -> Self {
        let name = tour_name(doc.name.as_deref(), filename);
        let started_at = started_at(&doc);

        let link = doc
            .tracks
            .iter()
            .filter_map(|t| t.link.as_deref())
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string);

        let points = doc.tracks.into_iter().flat_map(|t| t.points).collect();

        Self {
            name,
            points,
            link,
            started_at,
        }
    }
}

/// Picks the tour date: first timestamped waypoint, else first timestamped track
/// point, else the document time, else the Unix epoch. Waypoints come first
/// because KML exports timestamp placemark points but rarely track points.
pub fn started_at(doc: &RawDocument) -> OffsetDateTime {
    doc.waypoints
        .iter()
        .find_map(|w| w.timestamp)
        .or_else(|| {
            doc.tracks
                .iter()
                .flat_map(|t| t.points.iter())
                .find_map(|p| p.timestamp)
        })
        .or(doc.time)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

/// The document name, else the file stem, with the completion marker removed.
pub fn tour_name(doc_name: Option<&str>, filename: &str) -> String {
    let raw = doc_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            Path::new(filename)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| filename.to_string())
        });

    raw.replace(COMPLETED_MARKER, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawTrack;
    use time::macros::datetime;

    fn point(lon: f64, time: Option<OffsetDateTime>) -> TrackPoint {
        TrackPoint::new(lon, 47.0).with_timestamp(time)
    }

    #[test]
    fn test_points_flattened_in_document_order() {
        let doc = RawDocument {
            tracks: vec![
                RawTrack {
                    points: vec![point(1.0, None), point(2.0, None)],
                    link: None,
                },
                RawTrack {
                    points: vec![point(3.0, None)],
                    link: Some("  ".to_string()),
                },
                RawTrack {
                    points: vec![point(4.0, None)],
                    link: Some("https://www.komoot.de/tour/1".to_string()),
                },
                RawTrack {
                    points: vec![],
                    link: Some("https://www.komoot.de/tour/2".to_string()),
                },
            ],
            ..Default::default()
        };

        let track = ParsedTrack::from_document(doc, "a.gpx");
        let lons: Vec<f64> = track.points.iter().map(|p| p.lon).collect();
        assert_eq!(lons, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(track.link.as_deref(), Some("https://www.komoot.de/tour/1"));
    }

    #[test]
    fn test_started_at_priority() {
        let waypoint_time = datetime!(2021-01-01 10:00 UTC);
        let point_time = datetime!(2021-01-01 09:00 UTC);
        let doc_time = datetime!(2021-01-01 08:00 UTC);

        let mut doc = RawDocument {
            time: Some(doc_time),
            tracks: vec![RawTrack {
                points: vec![point(1.0, None), point(2.0, Some(point_time))],
                link: None,
            }],
            waypoints: vec![point(0.0, None), point(0.5, Some(waypoint_time))],
            ..Default::default()
        };
        assert_eq!(started_at(&doc), waypoint_time);

        doc.waypoints.clear();
        assert_eq!(started_at(&doc), point_time);

        doc.tracks[0].points[1].timestamp = None;
        assert_eq!(started_at(&doc), doc_time);

        doc.time = None;
        assert_eq!(started_at(&doc), OffsetDateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_tour_name() {
        assert_eq!(tour_name(Some("Wanderung (Completed)"), "x.gpx"), "Wanderung");
        assert_eq!(tour_name(Some("  "), "dir/Seerunde 2020.kml"), "Seerunde 2020");
        assert_eq!(tour_name(None, "Fahrradtour.gpx"), "Fahrradtour");
    }
}
