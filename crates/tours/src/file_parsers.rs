//! Track file parsers for GPX, KML and KMZ.
//!
//! Every format is normalized into a [`RawDocument`] so the rest of the
//! pipeline never needs to know where the points came from.

use std::borrow::Cow;
use std::io::{Cursor, Read as _};
use std::path::Path;

use bytes::Bytes;
use serde::Serialize;
use time::OffsetDateTime;

use crate::kml_parser;
use crate::models::{RawDocument, RawTrack, TrackPoint};

/// Supported upload formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FileType {
    Gpx,
    Kml,
    /// Zip archive wrapping a single KML document.
    Kmz,
}

impl FileType {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "gpx" => Some(FileType::Gpx),
            "kml" => Some(FileType::Kml),
            "kmz" => Some(FileType::Kmz),
            _ => None,
        }
    }

    pub fn from_filename(filename: &str) -> Result<Self, ParseError> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_extension(ext).ok_or_else(|| ParseError::UnsupportedFileType(ext.to_string()))
    }

    /// True for formats built from KML placemarks.
    pub fn is_placemark_format(self) -> bool {
        matches!(self, FileType::Kml | FileType::Kmz)
    }
}

/// A recovered, non-fatal condition met while reading a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseWarning {
    /// The bytes were not valid UTF-8 and were read as ISO-8859-1 instead.
    EncodingFallback { encoding: &'static str },
}

/// Result of parsing a track file
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub file_type: FileType,
    pub document: RawDocument,
    pub warnings: Vec<ParseWarning>,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to parse GPX file: {0}")]
    GpxError(String),
    #[error("Failed to parse KML file: {0}")]
    KmlError(String),
    #[error("Invalid KMZ archive: {0}")]
    ArchiveError(String),
    #[error("KMZ archive contains no .kml document")]
    NoInnerDocument,
    #[error("No track points or waypoints found")]
    Empty,
    #[error("Unsupported file type: {0:?}")]
    UnsupportedFileType(String),
}

/// Parse a track file of a known type. Fails with [`ParseError::Empty`] when the
/// document holds neither track points nor waypoints.
pub fn parse_track_file(file_type: FileType, bytes: Bytes) -> Result<ParsedDocument, ParseError> {
    let mut warnings = Vec::new();

    let document = match file_type {
        FileType::Gpx => parse_gpx(&bytes, &mut warnings)?,
        FileType::Kml => parse_kml(&bytes, &mut warnings)?,
        FileType::Kmz => parse_kmz(&bytes, &mut warnings)?,
    };

    if document.is_empty() {
        return Err(ParseError::Empty);
    }

    tracing::debug!(
        "Parsed {:?}: {} tracks, {} points, {} waypoints",
        file_type,
        document.tracks.len(),
        document.point_count(),
        document.waypoints.len()
    );

    Ok(ParsedDocument {
        file_type,
        document,
        warnings,
    })
}

/// Decode text as UTF-8, falling back to ISO-8859-1 (which maps every byte).
pub fn decode_text<'a>(bytes: &'a [u8], warnings: &mut Vec<ParseWarning>) -> Cow<'a, str> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(e) => {
            tracing::warn!(
                "Invalid UTF-8 at byte {}, retrying as ISO-8859-1",
                e.valid_up_to()
            );
            warnings.push(ParseWarning::EncodingFallback {
                encoding: "ISO-8859-1",
            });
            Cow::Owned(bytes.iter().map(|&b| b as char).collect())
        }
    }
}

/// Parse a GPX file: waypoints, tracks with their first link, and point timestamps.
pub fn parse_gpx(bytes: &[u8], warnings: &mut Vec<ParseWarning>) -> Result<RawDocument, ParseError> {
    let gpx = match gpx::read(bytes) {
        Ok(gpx) => gpx,
        Err(first) if std::str::from_utf8(bytes).is_err() => {
            let text = decode_text(bytes, warnings);
            gpx::read(text.as_bytes()).map_err(|e| {
                ParseError::GpxError(format!("{first}; after ISO-8859-1 fallback: {e}"))
            })?
        }
        Err(e) => return Err(ParseError::GpxError(e.to_string())),
    };

    let metadata = gpx.metadata.as_ref();
    // Track names are not a fallback; an unnamed document takes the file stem.
    let name = metadata.and_then(|m| m.name.clone());

    let tracks = gpx
        .tracks
        .iter()
        .map(|track| RawTrack {
            points: track
                .segments
                .iter()
                .flat_map(|seg| seg.points.iter())
                .map(gpx_point)
                .collect(),
            link: track
                .links
                .iter()
                .map(|l| l.href.trim())
                .find(|href| !href.is_empty())
                .map(str::to_string),
        })
        .collect();

    Ok(RawDocument {
        name,
        time: metadata.and_then(|m| m.time).map(OffsetDateTime::from),
        tracks,
        waypoints: gpx.waypoints.iter().map(gpx_point).collect(),
    })
}

fn gpx_point(pt: &gpx::Waypoint) -> TrackPoint {
    let p = pt.point();
    TrackPoint::new(p.x(), p.y())
        .with_elevation(pt.elevation)
        .with_timestamp(pt.time.map(OffsetDateTime::from))
}

/// Parse a KML document.
pub fn parse_kml(bytes: &[u8], warnings: &mut Vec<ParseWarning>) -> Result<RawDocument, ParseError> {
    let text = decode_text(bytes, warnings);
    kml_parser::parse_kml(&text)
}

/// Parse a KMZ archive by extracting the first `.kml` entry and parsing it as KML.
/// The archive is read in memory; nothing is staged on disk.
pub fn parse_kmz(bytes: &[u8], warnings: &mut Vec<ParseWarning>) -> Result<RawDocument, ParseError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ParseError::ArchiveError(e.to_string()))?;

    let kml_name = archive
        .file_names()
        .find(|n| n.to_ascii_lowercase().ends_with(".kml"))
        .map(str::to_string)
        .ok_or(ParseError::NoInnerDocument)?;

    tracing::info!("Found KML document in archive: {kml_name}");

    let mut entry = archive
        .by_name(&kml_name)
        .map_err(|e| ParseError::ArchiveError(e.to_string()))?;
    let mut inner = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut inner)
        .map_err(|e| ParseError::ArchiveError(e.to_string()))?;

    parse_kml(&inner, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    const GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <metadata>
    <name>Andelfingen Altikon Fahrradtour</name>
    <time>2020-08-16T07:00:00Z</time>
  </metadata>
  <wpt lat="47.60" lon="8.68">
    <name>Start</name>
  </wpt>
  <trk>
    <name>Track</name>
    <link href="https://www.komoot.de/tour/239946769">
      <text>komoot</text>
    </link>
    <trkseg>
      <trkpt lat="47.600" lon="8.680"><ele>400.0</ele><time>2020-08-16T09:56:00Z</time></trkpt>
      <trkpt lat="47.601" lon="8.681"><ele>401.5</ele><time>2020-08-16T09:56:05Z</time></trkpt>
    </trkseg>
    <trkseg>
      <trkpt lat="47.602" lon="8.682"><ele>402.0</ele></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    fn kmz_with(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    const KML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Document>
    <name>Seerunde</name>
    <Placemark>
      <LineString><coordinates>8.5,47.3,400 8.6,47.4,410</coordinates></LineString>
    </Placemark>
  </Document>
</kml>"#;

    #[test]
    fn test_file_type_from_filename() {
        assert_eq!(FileType::from_filename("a.gpx").unwrap(), FileType::Gpx);
        assert_eq!(FileType::from_filename("dir/B.KML").unwrap(), FileType::Kml);
        assert_eq!(FileType::from_filename("c.kmz").unwrap(), FileType::Kmz);
        assert!(matches!(
            FileType::from_filename("track.fit"),
            Err(ParseError::UnsupportedFileType(ext)) if ext == "fit"
        ));
        assert!(FileType::from_filename("noext").is_err());
    }

    #[test]
    fn test_parse_gpx() {
        let parsed = parse_track_file(FileType::Gpx, Bytes::from_static(GPX.as_bytes())).unwrap();
        let doc = parsed.document;

        assert!(parsed.warnings.is_empty());
        assert_eq!(doc.name.as_deref(), Some("Andelfingen Altikon Fahrradtour"));
        assert!(doc.time.is_some());
        assert_eq!(doc.waypoints.len(), 1);
        assert_eq!(doc.tracks.len(), 1);
        assert_eq!(doc.point_count(), 3);
        assert_eq!(
            doc.tracks[0].link.as_deref(),
            Some("https://www.komoot.de/tour/239946769")
        );

        let first = doc.tracks[0].points[0];
        assert!((first.lat - 47.6).abs() < 1e-9);
        assert!((first.lon - 8.68).abs() < 1e-9);
        assert_eq!(first.elevation, Some(400.0));
        assert!(first.timestamp.is_some());
        assert!(doc.tracks[0].points[2].timestamp.is_none());
    }

    #[test]
    fn test_parse_gpx_ignores_track_name() {
        let gpx = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>Wanderung</name>
    <trkseg><trkpt lat="47.600" lon="8.680"></trkpt></trkseg>
  </trk>
</gpx>"#;
        let parsed = parse_track_file(FileType::Gpx, Bytes::from_static(gpx.as_bytes())).unwrap();
        assert_eq!(parsed.document.name, None);
        assert_eq!(parsed.document.point_count(), 1);
    }

    #[test]
    fn test_parse_gpx_malformed() {
        let err = parse_track_file(FileType::Gpx, Bytes::from_static(b"<gpx version=\"1.1\"><trk>"))
            .unwrap_err();
        assert!(matches!(err, ParseError::GpxError(_)));
    }

    #[test]
    fn test_parse_gpx_empty() {
        let gpx = r#"<?xml version="1.0"?><gpx version="1.1" creator="t"></gpx>"#;
        let err = parse_track_file(FileType::Gpx, Bytes::from(gpx)).unwrap_err();
        assert!(matches!(err, ParseError::Empty));
    }

    #[test]
    fn test_decode_text_falls_back_to_latin1() {
        let mut warnings = Vec::new();
        let text = decode_text(b"Z\xfcrich", &mut warnings);
        assert_eq!(text, "Zürich");
        assert_eq!(
            warnings,
            vec![ParseWarning::EncodingFallback {
                encoding: "ISO-8859-1"
            }]
        );

        let mut warnings = Vec::new();
        assert_eq!(decode_text("Zürich".as_bytes(), &mut warnings), "Zürich");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_parse_kml_latin1_records_warning() {
        let kml = KML.replace("Seerunde", "Z\u{fc}rich");
        let latin1: Vec<u8> = kml.chars().map(|c| c as u8).collect();

        let parsed = parse_track_file(FileType::Kml, Bytes::from(latin1)).unwrap();
        assert_eq!(parsed.document.name.as_deref(), Some("Zürich"));
        assert_eq!(parsed.warnings.len(), 1);
    }

    #[test]
    fn test_parse_kmz_uses_first_kml_entry() {
        let other = KML.replace("Seerunde", "Second");
        let kmz = kmz_with(&[
            ("files/image.png", "not xml"),
            ("doc.kml", KML),
            ("other.kml", &other),
        ]);

        let parsed = parse_track_file(FileType::Kmz, Bytes::from(kmz)).unwrap();
        assert_eq!(parsed.file_type, FileType::Kmz);
        assert_eq!(parsed.document.name.as_deref(), Some("Seerunde"));
        assert_eq!(parsed.document.point_count(), 2);
    }

    #[test]
    fn test_parse_kmz_without_kml() {
        let kmz = kmz_with(&[("readme.txt", "hello")]);
        let err = parse_track_file(FileType::Kmz, Bytes::from(kmz)).unwrap_err();
        assert!(matches!(err, ParseError::NoInnerDocument));
    }

    #[test]
    fn test_parse_kmz_not_a_zip() {
        let err = parse_track_file(FileType::Kmz, Bytes::from_static(b"definitely not a zip"))
            .unwrap_err();
        assert!(matches!(err, ParseError::ArchiveError(_)));
    }
}
