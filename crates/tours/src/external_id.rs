//! Provider tour ids embedded in track hyperlinks.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Matches `/tour/<digits>` as used by komoot tour URLs.
static TOUR_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/tour/(\d+)").expect("valid tour path regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalRef {
    pub id: String,
    pub href: String,
}

/// Extract the provider tour id from a hyperlink, e.g.
/// `https://www.komoot.de/tour/239946769` gives id `239946769`.
pub fn extract_external_ref(link: Option<&str>) -> Option<ExternalRef> {
    let href = link?.trim();
    let id = TOUR_PATH.captures(href)?.get(1)?.as_str();

    Some(ExternalRef {
        id: id.to_string(),
        href: href.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_komoot_link() {
        let r = extract_external_ref(Some("https://www.komoot.de/tour/239946769")).unwrap();
        assert_eq!(r.id, "239946769");
        assert_eq!(r.href, "https://www.komoot.de/tour/239946769");
    }

    #[test]
    fn test_link_with_query_and_locale() {
        let r = extract_external_ref(Some(" https://www.komoot.com/de-de/tour/12345?ref=wtd ")).unwrap();
        assert_eq!(r.id, "12345");
        assert_eq!(r.href, "https://www.komoot.com/de-de/tour/12345?ref=wtd");
    }

    #[test]
    fn test_no_match() {
        assert_eq!(extract_external_ref(None), None);
        assert_eq!(extract_external_ref(Some("")), None);
        assert_eq!(extract_external_ref(Some("https://www.komoot.de/tour/")), None);
        assert_eq!(extract_external_ref(Some("https://www.komoot.de/tour/abc")), None);
        assert_eq!(extract_external_ref(Some("https://example.com/route/42")), None);
    }
}
