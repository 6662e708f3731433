//! Content negotiation
//!
//! Parses `Accept`, `Accept-Charset`, `Accept-Encoding` and `Accept-Language`
//! values into lists ordered by descending client preference.

const DEFAULT_CHARSET: &str = "iso-8859-1";

/// Parse a quality-weighted header value.
///
/// Items with `q=0` or empty items are dropped. Ties keep header order.
pub fn parse_quality_list(value: &str) -> Vec<String> {
    let mut items: Vec<(String, f32)> = value
        .split(',')
        .filter_map(|item| {
            let mut params = item.split(';');
            let name = params.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let quality = params
                .filter_map(|p| p.trim().strip_prefix("q="))
                .find_map(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            Some((name.to_string(), quality))
        })
        .filter(|(_, q)| *q > 0.0)
        .collect();

    // sort_by is stable, so equal weights stay in header order
    items.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    items.into_iter().map(|(name, _)| name).collect()
}

/// Parse `Accept-Charset`, adding the implicit `iso-8859-1` fallback last
/// when the client neither lists it nor sends `*`.
pub fn parse_accept_charset(value: &str) -> Vec<String> {
    let mut charsets = parse_quality_list(value);
    let mentioned = value.split(',').any(|item| {
        let name = item.split(';').next().unwrap_or_default().trim();
        name == "*" || name.eq_ignore_ascii_case(DEFAULT_CHARSET)
    });
    if !mentioned {
        charsets.push(DEFAULT_CHARSET.to_string());
    }
    charsets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_media_types() {
        let list = parse_quality_list(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        );
        assert_eq!(
            list,
            vec![
                "text/html",
                "application/xhtml+xml",
                "image/webp",
                "application/xml",
                "*/*"
            ]
        );
    }

    #[test]
    fn test_accept_language_trailing_comma() {
        let list =
            parse_quality_list("en-US,en;q=0.8,de;q=0.6,es;q=0.4,fr;q=0.2,it;q=0.2,pt;q=0.2,");
        assert_eq!(list, vec!["en-US", "en", "de", "es", "fr", "it", "pt"]);
    }

    #[test]
    fn test_zero_quality_dropped() {
        assert_eq!(parse_quality_list("gzip;q=0, deflate"), vec!["deflate"]);
    }

    #[test]
    fn test_accept_encoding_plain() {
        assert_eq!(
            parse_quality_list("gzip,deflate,sdch"),
            vec!["gzip", "deflate", "sdch"]
        );
    }

    #[test]
    fn test_accept_charset_default_appended() {
        assert_eq!(
            parse_accept_charset("iso-8859-5,unicode-1-1;q=0.8"),
            vec!["iso-8859-5", "unicode-1-1", "iso-8859-1"]
        );
    }

    #[test]
    fn test_accept_charset_explicit_default_kept() {
        assert_eq!(
            parse_accept_charset("utf-8,ISO-8859-1;q=0.5"),
            vec!["utf-8", "ISO-8859-1"]
        );
        assert_eq!(parse_accept_charset("utf-8,*;q=0.1"), vec!["utf-8", "*"]);
    }
}
