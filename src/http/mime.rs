//! MIME type detection module
//!
//! Returns the corresponding content type, and charset where one applies,
//! based on file extension.

/// Get MIME content type and charset based on file extension
///
/// # Examples
/// ```
/// use rust_webframework::http::mime::get_content_type;
/// assert_eq!(get_content_type(Some("html")), ("text/html", Some("utf-8")));
/// assert_eq!(get_content_type(Some("png")), ("image/png", None));
/// assert_eq!(get_content_type(None), ("application/octet-stream", None));
/// ```
pub fn get_content_type(extension: Option<&str>) -> (&'static str, Option<&'static str>) {
    let extension = extension.map(str::to_ascii_lowercase);
    match extension.as_deref() {
        // Text
        Some("html" | "htm") => ("text/html", Some("utf-8")),
        Some("css") => ("text/css", Some("utf-8")),
        Some("txt" | "md") => ("text/plain", Some("utf-8")),
        Some("csv") => ("text/csv", Some("utf-8")),
        Some("xml") => ("application/xml", None),

        // JavaScript/WASM
        Some("js" | "mjs") => ("application/javascript", Some("utf-8")),
        Some("json") => ("application/json", None),
        Some("wasm") => ("application/wasm", None),

        // Images
        Some("png") => ("image/png", None),
        Some("jpg" | "jpeg") => ("image/jpeg", None),
        Some("gif") => ("image/gif", None),
        Some("svg") => ("image/svg+xml", None),
        Some("ico") => ("image/x-icon", None),
        Some("webp") => ("image/webp", None),

        // Video
        Some("mp4") => ("video/mp4", None),
        Some("webm") => ("video/webm", None),
        Some("ogg" | "ogv") => ("video/ogg", None),

        // Audio
        Some("mp3") => ("audio/mpeg", None),
        Some("wav") => ("audio/wav", None),

        // Fonts
        Some("woff") => ("font/woff", None),
        Some("woff2") => ("font/woff2", None),
        Some("ttf") => ("font/ttf", None),
        Some("otf") => ("font/otf", None),

        // Documents
        Some("pdf") => ("application/pdf", None),
        Some("zip") => ("application/zip", None),
        Some("gz" | "gzip") => ("application/gzip", None),
        Some("tar") => ("application/x-tar", None),

        // Default
        _ => ("application/octet-stream", None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_types() {
        assert_eq!(get_content_type(Some("html")), ("text/html", Some("utf-8")));
        assert_eq!(get_content_type(Some("css")).0, "text/css");
        assert_eq!(get_content_type(Some("js")).0, "application/javascript");
        assert_eq!(get_content_type(Some("png")), ("image/png", None));
        assert_eq!(get_content_type(Some("PNG")), ("image/png", None));
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(
            get_content_type(Some("xyz")),
            ("application/octet-stream", None)
        );
        assert_eq!(get_content_type(None), ("application/octet-stream", None));
    }
}
