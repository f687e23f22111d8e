//! KML placemark parser.
//!
//! Each `Placemark` contributes one track (its `LineString` and `gx:Track`
//! points) and at most one waypoint (its `Point`). A placemark's
//! `TimeStamp/when` is reused for every point derived from its `LineString`
//! and for its `Point`; only `gx:Track` carries a timestamp per point.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

use crate::file_parsers::ParseError;
use crate::models::{RawDocument, RawTrack, TrackPoint};

type Result<T> = std::result::Result<T, ParseError>;

#[derive(Debug, Default)]
struct PlacemarkBuilder {
    when: Option<OffsetDateTime>,
    /// Each `LineString` in document order.
    lines: Vec<Vec<TrackPoint>>,
    gx_coords: Vec<TrackPoint>,
    gx_whens: Vec<Option<OffsetDateTime>>,
    point: Option<TrackPoint>,
}

impl PlacemarkBuilder {
    fn finish(self, doc: &mut RawDocument) {
        let when = self.when;
        let mut points: Vec<TrackPoint> = self
            .lines
            .into_iter()
            .flatten()
            .map(|p| p.with_timestamp(when))
            .collect();

        points.extend(
            self.gx_coords
                .into_iter()
                .enumerate()
                .map(|(i, p)| p.with_timestamp(self.gx_whens.get(i).copied().flatten())),
        );

        if !points.is_empty() {
            doc.tracks.push(RawTrack { points, link: None });
        }

        if let Some(point) = self.point {
            doc.waypoints.push(point.with_timestamp(when));
        }
    }
}

/// Parse a KML string into a [`RawDocument`].
pub fn parse_kml(xml: &str) -> Result<RawDocument> {
    let mut reader = Reader::from_str(xml);
    let mut doc = RawDocument::default();
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut placemark: Option<PlacemarkBuilder> = None;
    let mut saw_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let local = e.local_name().as_ref().to_vec();
                let is_leaf = matches!(
                    local.as_slice(),
                    b"name" | b"when" | b"coordinates" | b"coord"
                );
                if !is_leaf {
                    match local.as_slice() {
                        b"kml" => saw_root = true,
                        b"Placemark" => placemark = Some(PlacemarkBuilder::default()),
                        _ => {}
                    }
                    path.push(local);
                    continue;
                }

                let parent = path.last().map(Vec::as_slice);
                match local.as_slice() {
                    b"name" => {
                        let text = read_text_owned(&mut reader, &e)?;
                        if parent == Some(b"Document".as_slice()) && doc.name.is_none() {
                            doc.name = non_empty(text);
                        }
                    }
                    b"when" => {
                        let text = read_text_owned(&mut reader, &e)?;
                        if let Some(pm) = placemark.as_mut() {
                            match parent {
                                Some(b"Track") => pm.gx_whens.push(parse_when(&text)),
                                Some(b"TimeStamp") => pm.when = parse_when(&text),
                                _ => {}
                            }
                        }
                    }
                    b"coordinates" => {
                        let text = read_text_owned(&mut reader, &e)?;
                        if let Some(pm) = placemark.as_mut() {
                            match parent {
                                Some(b"LineString") => pm.lines.push(parse_coordinates(&text)?),
                                Some(b"Point") => {
                                    pm.point = parse_coordinates(&text)?.into_iter().next()
                                }
                                _ => {}
                            }
                        }
                    }
                    b"coord" => {
                        let text = read_text_owned(&mut reader, &e)?;
                        if let Some(pm) = placemark.as_mut()
                            && parent == Some(b"Track".as_slice())
                        {
                            pm.gx_coords.push(parse_gx_coord(&text)?);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"kml" {
                    saw_root = true;
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"Placemark"
                    && let Some(pm) = placemark.take()
                {
                    pm.finish(&mut doc);
                }
                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::KmlError(e.to_string())),
            _ => {}
        }
    }

    if !saw_root {
        return Err(ParseError::KmlError("missing <kml> root element".to_string()));
    }

    Ok(doc)
}

/// Read the text content of the element opened by `start`, consuming its end tag.
fn read_text_owned<'a>(reader: &mut Reader<&'a [u8]>, start: &BytesStart<'_>) -> Result<String> {
    let end_name = start.name().0.to_vec();
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                text.push_str(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::CData(e)) => {
                text.push_str(std::str::from_utf8(e.as_ref()).unwrap_or_default());
            }
            Ok(Event::GeneralRef(e)) => {
                if let Ok(Some(ch)) = e.resolve_char_ref() {
                    text.push(ch);
                } else {
                    match std::str::from_utf8(e.as_ref()).unwrap_or_default() {
                        "amp" => text.push('&'),
                        "lt" => text.push('<'),
                        "gt" => text.push('>'),
                        "quot" => text.push('"'),
                        "apos" => text.push('\''),
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => {
                return Err(ParseError::KmlError(format!(
                    "unexpected end of document inside <{}>",
                    String::from_utf8_lossy(&end_name)
                )));
            }
            Err(e) => return Err(ParseError::KmlError(e.to_string())),
            _ => {}
        }
    }

    Ok(text)
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parse a KML time value: full RFC 3339, or a bare date taken as midnight UTC.
fn parse_when(text: &str) -> Option<OffsetDateTime> {
    let text = text.trim();
    if let Ok(dt) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(dt);
    }
    if let Ok(date) = time::Date::parse(text, format_description!("[year]-[month]-[day]")) {
        return Some(date.midnight().assume_utc());
    }
    tracing::warn!("Could not parse KML timestamp: {text}");
    None
}

fn parse_f64(s: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| ParseError::KmlError(format!("invalid coordinate value: {s:?}")))
}

/// Parse `lon,lat[,alt]` tuples separated by whitespace.
fn parse_coordinates(text: &str) -> Result<Vec<TrackPoint>> {
    text.split_whitespace()
        .filter_map(|tuple| {
            let parts: Vec<&str> = tuple.split(',').collect();
            (parts.len() >= 2).then_some(parts)
        })
        .map(|parts| {
            let elevation = parts.get(2).map(|s| parse_f64(s)).transpose()?;
            Ok(TrackPoint::new(parse_f64(parts[0])?, parse_f64(parts[1])?).with_elevation(elevation))
        })
        .collect()
}

/// Parse a `gx:coord` value: `lon lat [alt]` separated by spaces.
fn parse_gx_coord(text: &str) -> Result<TrackPoint> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() < 2 {
        return Err(ParseError::KmlError(format!("invalid gx:coord: {text:?}")));
    }
    let elevation = parts.get(2).map(|s| parse_f64(s)).transpose()?;
    Ok(TrackPoint::new(parse_f64(parts[0])?, parse_f64(parts[1])?).with_elevation(elevation))
}
