//! Cookie parsing and `Set-Cookie` rendering

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

const COOKIE_DATE_FORMAT: &str = "%a, %d-%b-%Y %H:%M:%S GMT";

/// Attributes of a `Set-Cookie` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    /// `Max-Age` in seconds; `None` makes a session cookie
    pub max_age: Option<i64>,
    pub path: String,
    pub domain: Option<String>,
    pub secure: bool,
    pub http_only: bool,
    pub comment: Option<String>,
    /// Drop any earlier `Set-Cookie` for the same key first
    pub overwrite: bool,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            max_age: None,
            path: "/".to_string(),
            domain: None,
            secure: false,
            http_only: false,
            comment: None,
            overwrite: false,
        }
    }
}

impl CookieOptions {
    #[must_use]
    pub const fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub const fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub const fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    #[must_use]
    pub const fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// Parse a `Cookie` request header into a flat map (later pairs win)
pub fn parse_cookie_header(value: &str) -> HashMap<String, String> {
    value
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), unquote(value.trim()).to_string()))
        })
        .collect()
}

/// Render a `Set-Cookie` header value
pub fn render_set_cookie(key: &str, value: &str, options: &CookieOptions) -> String {
    render_at(key, value, options, Utc::now())
}

fn render_at(key: &str, value: &str, options: &CookieOptions, now: DateTime<Utc>) -> String {
    let mut parts = vec![format!("{key}={}", quote(value))];

    if let Some(comment) = &options.comment {
        parts.push(format!("Comment={}", quote(comment)));
    }
    if let Some(domain) = &options.domain {
        parts.push(format!("Domain={domain}"));
    }
    if let Some(max_age) = options.max_age {
        parts.push(format!("Max-Age={max_age}"));
    }
    parts.push(format!("Path={}", options.path));
    if let Some(expires) = options
        .max_age
        .and_then(Duration::try_seconds)
        .and_then(|delta| now.checked_add_signed(delta))
    {
        parts.push(format!("expires={}", expires.format(COOKIE_DATE_FORMAT)));
    }
    if options.secure {
        parts.push("secure".to_string());
    }
    if options.http_only {
        parts.push("HttpOnly".to_string());
    }

    parts.join("; ")
}

/// Name of the cookie a `Set-Cookie` header value sets
pub fn set_cookie_name(header_value: &str) -> Option<&str> {
    header_value
        .split(';')
        .next()
        .and_then(|pair| pair.split_once('='))
        .map(|(name, _)| name.trim())
}

/// Value of the cookie a `Set-Cookie` header value sets
pub fn set_cookie_value(header_value: &str) -> Option<&str> {
    header_value
        .split(';')
        .next()
        .and_then(|pair| pair.split_once('='))
        .map(|(_, value)| unquote(value.trim()))
}

fn needs_quoting(value: &str) -> bool {
    value
        .chars()
        .any(|c| c.is_ascii_whitespace() || c.is_ascii_control() || matches!(c, '"' | ',' | ';' | '\\'))
}

fn quote(value: &str) -> String {
    if needs_quoting(value) {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_cookie_header() {
        let cookies = parse_cookie_header("abc=def; 123=456; quoted=\"x y\"");
        assert_eq!(cookies["abc"], "def");
        assert_eq!(cookies["123"], "456");
        assert_eq!(cookies["quoted"], "x y");
    }

    #[test]
    fn test_parse_cookie_header_skips_garbage() {
        let cookies = parse_cookie_header(";;novalue; =x; a=b");
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies["a"], "b");
    }

    #[test]
    fn test_render_session_cookie() {
        let header = render_set_cookie("sid", "abc", &CookieOptions::default());
        assert_eq!(header, "sid=abc; Path=/");
    }

    #[test]
    fn test_render_full_cookie() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let options = CookieOptions::default()
            .max_age(60)
            .domain("example.com")
            .secure(true)
            .http_only(true)
            .comment("hello world");
        let header = render_at("sid", "abc", &options, now);
        assert_eq!(
            header,
            "sid=abc; Comment=\"hello world\"; Domain=example.com; Max-Age=60; Path=/; \
             expires=Mon, 01-Jan-2024 00:01:00 GMT; secure; HttpOnly"
        );
    }

    #[test]
    fn test_value_quoting() {
        let header = render_set_cookie("k", "a;b", &CookieOptions::default());
        assert!(header.starts_with("k=\"a;b\""));
    }

    #[test]
    fn test_set_cookie_name_and_value() {
        assert_eq!(set_cookie_name("sid=abc; Path=/"), Some("sid"));
        assert_eq!(set_cookie_value("sid=abc; Path=/"), Some("abc"));
        assert_eq!(set_cookie_value("sid=; Max-Age=0"), Some(""));
        assert_eq!(set_cookie_name("garbage"), None);
    }
}
