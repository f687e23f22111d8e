//! GPX 1.1 rendering of synthetic tracks.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tours::models::TrackPoint;

#[derive(Debug, Clone, Default)]
struct GpxTrack {
    name: Option<String>,
    link: Option<String>,
    points: Vec<TrackPoint>,
}

/// Builder for a GPX document with any number of tracks and waypoints.
#[derive(Debug, Clone, Default)]
pub struct GpxFixture {
    name: Option<String>,
    time: Option<OffsetDateTime>,
    tracks: Vec<GpxTrack>,
    waypoints: Vec<TrackPoint>,
    pending_link: Option<String>,
}

impl GpxFixture {
    /// A document whose metadata carries `name`.
    pub fn new(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    /// A document without metadata name.
    pub fn unnamed() -> Self {
        Self::default()
    }

    pub fn time(mut self, time: OffsetDateTime) -> Self {
        self.time = Some(time);
        self
    }

    /// Link attached to the next track added.
    pub fn link(mut self, href: &str) -> Self {
        self.pending_link = Some(href.to_string());
        self
    }

    pub fn track(self, points: Vec<TrackPoint>) -> Self {
        self.named_track(None, points)
    }

    pub fn named_track(mut self, name: Option<&str>, points: Vec<TrackPoint>) -> Self {
        self.tracks.push(GpxTrack {
            name: name.map(str::to_string),
            link: self.pending_link.take(),
            points,
        });
        self
    }

    pub fn waypoint(mut self, point: TrackPoint) -> Self {
        self.waypoints.push(point);
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl std::fmt::Display for GpxFixture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(
            f,
            r#"<gpx version="1.1" creator="tours-test-data" xmlns="http://www.topografix.com/GPX/1/1">"#
        )?;

        if self.name.is_some() || self.time.is_some() {
            writeln!(f, "  <metadata>")?;
            if let Some(name) = &self.name {
                writeln!(f, "    <name>{}</name>", escape_xml(name))?;
            }
            if let Some(time) = self.time {
                writeln!(f, "    <time>{}</time>", format_time(time))?;
            }
            writeln!(f, "  </metadata>")?;
        }

        for wpt in &self.waypoints {
            writeln!(f, r#"  <wpt lat="{:.7}" lon="{:.7}">"#, wpt.lat, wpt.lon)?;
            write_point_body(f, wpt, "    ")?;
            writeln!(f, "  </wpt>")?;
        }

        for track in &self.tracks {
            writeln!(f, "  <trk>")?;
            if let Some(name) = &track.name {
                writeln!(f, "    <name>{}</name>", escape_xml(name))?;
            }
            if let Some(href) = &track.link {
                writeln!(f, r#"    <link href="{}"><text>Tour</text></link>"#, escape_xml(href))?;
            }
            writeln!(f, "    <trkseg>")?;
            for point in &track.points {
                writeln!(f, r#"      <trkpt lat="{:.7}" lon="{:.7}">"#, point.lat, point.lon)?;
                write_point_body(f, point, "        ")?;
                writeln!(f, "      </trkpt>")?;
            }
            writeln!(f, "    </trkseg>")?;
            writeln!(f, "  </trk>")?;
        }

        writeln!(f, "</gpx>")
    }
}

fn write_point_body(f: &mut std::fmt::Formatter<'_>, point: &TrackPoint, indent: &str) -> std::fmt::Result {
    if let Some(ele) = point.elevation {
        writeln!(f, "{indent}<ele>{ele:.2}</ele>")?;
    }
    if let Some(ts) = point.timestamp {
        writeln!(f, "{indent}<time>{}</time>", format_time(ts))?;
    }
    Ok(())
}

fn format_time(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_default()
}

/// Escapes XML special characters in a string.
pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn points() -> Vec<TrackPoint> {
        vec![
            TrackPoint::new(8.54, 47.37)
                .with_elevation(Some(410.0))
                .with_timestamp(Some(datetime!(2021-07-04 09:00 UTC))),
            TrackPoint::new(8.5401, 47.3701),
        ]
    }

    #[test]
    fn test_generate_gpx_basic() {
        let gpx = GpxFixture::new("Uetliberg")
            .link("https://www.komoot.de/tour/42")
            .track(points())
            .to_string();

        assert!(gpx.contains(r#"version="1.1""#));
        assert!(gpx.contains("<name>Uetliberg</name>"));
        assert!(gpx.contains(r#"<link href="https://www.komoot.de/tour/42">"#));
        assert!(gpx.contains(r#"lat="47.3700000""#));
        assert!(gpx.contains("<ele>410.00</ele>"));
        assert!(gpx.contains("<time>2021-07-04T09:00:00Z</time>"));
    }

    #[test]
    fn test_link_applies_to_next_track_only() {
        let gpx = GpxFixture::unnamed()
            .track(points())
            .link("https://example.com/tour/1")
            .track(points())
            .to_string();

        assert_eq!(gpx.matches("<link").count(), 1);
        assert!(!gpx.contains("<metadata>"));
    }

    #[test]
    fn test_generate_gpx_escapes_special_chars() {
        let gpx = GpxFixture::new("Berg & <Tal>").to_string();
        assert!(gpx.contains("Berg &amp; &lt;Tal&gt;"));
    }
}
