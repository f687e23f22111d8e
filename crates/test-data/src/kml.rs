//! KML rendering: placemarks with a `LineString`, a `gx:Track` or a `Point`.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tours::models::TrackPoint;

use crate::gpx::escape_xml;

#[derive(Debug, Clone)]
pub enum KmlGeometry {
    /// Coordinates only; the placemark's `TimeStamp` covers all of them.
    LineString(Vec<TrackPoint>),
    /// One `when` per point, taken from each point's timestamp.
    GxTrack(Vec<TrackPoint>),
    Point(TrackPoint),
}

#[derive(Debug, Clone)]
struct Placemark {
    name: Option<String>,
    when: Option<OffsetDateTime>,
    geometry: Option<KmlGeometry>,
}

#[derive(Debug, Clone, Default)]
pub struct KmlFixture {
    name: Option<String>,
    placemarks: Vec<Placemark>,
}

impl KmlFixture {
    pub fn new(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            placemarks: Vec::new(),
        }
    }

    pub fn unnamed() -> Self {
        Self::default()
    }

    pub fn placemark(
        mut self,
        name: Option<&str>,
        when: Option<OffsetDateTime>,
        geometry: Option<KmlGeometry>,
    ) -> Self {
        self.placemarks.push(Placemark {
            name: name.map(str::to_string),
            when,
            geometry,
        });
        self
    }

    /// Placemark holding a `gx:Track` of the given points.
    pub fn gx_track(self, points: Vec<TrackPoint>) -> Self {
        self.placemark(None, None, Some(KmlGeometry::GxTrack(points)))
    }

    pub fn line_string(self, when: Option<OffsetDateTime>, points: Vec<TrackPoint>) -> Self {
        self.placemark(None, when, Some(KmlGeometry::LineString(points)))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl std::fmt::Display for KmlFixture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(
            f,
            r#"<kml xmlns="http://www.opengis.net/kml/2.2" xmlns:gx="http://www.google.com/kml/ext/2.2">"#
        )?;
        writeln!(f, "<Document>")?;
        if let Some(name) = &self.name {
            writeln!(f, "  <name>{}</name>", escape_xml(name))?;
        }

        for pm in &self.placemarks {
            writeln!(f, "  <Placemark>")?;
            if let Some(name) = &pm.name {
                writeln!(f, "    <name>{}</name>", escape_xml(name))?;
            }
            if let Some(when) = pm.when {
                writeln!(f, "    <TimeStamp><when>{}</when></TimeStamp>", format_time(when))?;
            }
            match &pm.geometry {
                Some(KmlGeometry::LineString(points)) => {
                    writeln!(f, "    <LineString><coordinates>")?;
                    for p in points {
                        writeln!(f, "      {}", coordinate_tuple(p))?;
                    }
                    writeln!(f, "    </coordinates></LineString>")?;
                }
                Some(KmlGeometry::GxTrack(points)) => {
                    writeln!(f, "    <gx:Track>")?;
                    for p in points.iter().filter_map(|p| p.timestamp) {
                        writeln!(f, "      <when>{}</when>", format_time(p))?;
                    }
                    for p in points {
                        match p.elevation {
                            Some(ele) => writeln!(f, "      <gx:coord>{} {} {ele}</gx:coord>", p.lon, p.lat)?,
                            None => writeln!(f, "      <gx:coord>{} {}</gx:coord>", p.lon, p.lat)?,
                        }
                    }
                    writeln!(f, "    </gx:Track>")?;
                }
                Some(KmlGeometry::Point(p)) => {
                    writeln!(f, "    <Point><coordinates>{}</coordinates></Point>", coordinate_tuple(p))?;
                }
                None => {}
            }
            writeln!(f, "  </Placemark>")?;
        }

        writeln!(f, "</Document>")?;
        writeln!(f, "</kml>")
    }
}

fn coordinate_tuple(p: &TrackPoint) -> String {
    match p.elevation {
        Some(ele) => format!("{},{},{ele}", p.lon, p.lat),
        None => format!("{},{}", p.lon, p.lat),
    }
}

fn format_time(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_gx_track_emits_when_per_timestamped_point() {
        let points = vec![
            TrackPoint::new(8.5, 47.3).with_timestamp(Some(datetime!(2021-06-01 08:00 UTC))),
            TrackPoint::new(8.6, 47.4)
                .with_elevation(Some(400.0))
                .with_timestamp(Some(datetime!(2021-06-01 08:00:05 UTC))),
        ];
        let kml = KmlFixture::new("Seerunde").gx_track(points).to_string();

        assert!(kml.contains("<name>Seerunde</name>"));
        assert_eq!(kml.matches("<when>").count(), 2);
        assert!(kml.contains("<gx:coord>8.5 47.3</gx:coord>"));
        assert!(kml.contains("<gx:coord>8.6 47.4 400</gx:coord>"));
    }

    #[test]
    fn test_line_string_and_point() {
        let kml = KmlFixture::unnamed()
            .line_string(
                Some(datetime!(2021-05-01 10:00 UTC)),
                vec![TrackPoint::new(8.61, 47.67).with_elevation(Some(390.0))],
            )
            .placemark(Some("Parkplatz"), None, Some(KmlGeometry::Point(TrackPoint::new(8.6, 47.66))))
            .to_string();

        assert!(kml.contains("<when>2021-05-01T10:00:00Z</when>"));
        assert!(kml.contains("8.61,47.67,390"));
        assert!(kml.contains("<Point><coordinates>8.6,47.66</coordinates></Point>"));
    }
}
