//! KMZ packaging: a zip archive around a KML document.

use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::result::ZipResult;
use zip::write::SimpleFileOptions;

/// Archive entries in order, each a (name, contents) pair.
pub fn zip_entries(entries: &[(&str, &[u8])]) -> ZipResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer.start_file(*name, SimpleFileOptions::default())?;
        writer.write_all(contents)?;
    }
    Ok(writer.finish()?.into_inner())
}

/// A KMZ holding `doc.kml` plus an image, the way exporters usually ship it.
pub fn kmz_from_kml(kml: &[u8]) -> ZipResult<Vec<u8>> {
    zip_entries(&[("files/icon.png", &b"\x89PNG"[..]), ("doc.kml", kml)])
}

/// A well-formed archive that holds no KML document.
pub fn kmz_without_kml() -> ZipResult<Vec<u8>> {
    zip_entries(&[("readme.txt", &b"no track here"[..])])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kmz_contains_kml_entry() {
        let bytes = kmz_from_kml(b"<kml/>").unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert!(archive.file_names().any(|n| n == "doc.kml"));
    }
}
