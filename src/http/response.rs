//! Response builder
//!
//! Status, body, content type, charset and an ordered header list. `Set-Cookie`
//! entries live in the header list and may repeat.

use super::cookie::{self, CookieOptions};
use crate::logger;
use chrono::{Duration, Utc};
use hyper::body::Bytes;
use hyper::header::{self, HeaderName, HeaderValue};
use hyper::StatusCode;

const DEFAULT_CONTENT_TYPE: &str = "text/html";
const DEFAULT_CHARSET: &str = "UTF-8";
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";
const EPOCH_COOKIE_DATE: &str = "Thu, 01-Jan-1970 00:00:00 GMT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    body: Bytes,
    content_type: Option<String>,
    charset: Option<String>,
    headers: Vec<(String, String)>,
}

impl Response {
    /// 200 response, `text/html; charset=UTF-8`
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.into(),
            content_type: Some(DEFAULT_CONTENT_TYPE.to_string()),
            charset: Some(DEFAULT_CHARSET.to_string()),
            headers: Vec::new(),
        }
    }

    /// 200 response, `text/plain; charset=UTF-8`
    pub fn plain(body: impl Into<String>) -> Self {
        Self::new(body.into()).with_content_type("text/plain")
    }

    #[must_use]
    pub const fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    #[must_use]
    pub fn with_charset(mut self, charset: Option<&str>) -> Self {
        self.charset = charset.map(ToString::to_string);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.append_header(name, value);
        self
    }

    #[must_use]
    pub fn with_headers<'a>(mut self, headers: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        for (name, value) in headers {
            self.append_header(name, value);
        }
        self
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// Drop the body, keeping status, content type, charset and headers
    pub fn clear_body(&mut self) {
        self.body = Bytes::new();
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    /// Explicit headers in insertion order
    pub fn header_list(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of a header (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn append_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    /// Replace every value of a header with a single one
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.remove_header(name);
        self.append_header(name, value);
    }

    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    /// Let caches keep the response for `seconds`
    pub fn cache_expires(&mut self, seconds: i64) {
        self.set_header("Cache-Control", &format!("max-age={seconds}"));
        if let Some(expires) = Duration::try_seconds(seconds)
            .and_then(|delta| Utc::now().checked_add_signed(delta))
        {
            self.set_header("Expires", &expires.format(HTTP_DATE_FORMAT).to_string());
        }
    }

    pub fn set_cookie(&mut self, key: &str, value: &str, options: &CookieOptions) {
        if options.overwrite {
            self.unset_cookie(key);
        }
        let header = cookie::render_set_cookie(key, value, options);
        self.append_header("Set-Cookie", &header);
    }

    /// Remove `Set-Cookie` entries for `key` added so far. Returns false if there were none.
    pub fn unset_cookie(&mut self, key: &str) -> bool {
        let before = self.headers.len();
        self.headers.retain(|(name, value)| {
            !(name.eq_ignore_ascii_case("Set-Cookie") && cookie::set_cookie_name(value) == Some(key))
        });
        self.headers.len() != before
    }

    /// Tell the client to discard the cookie now
    pub fn delete_cookie(&mut self, key: &str, path: &str, domain: Option<&str>) {
        let mut parts = vec![format!("{key}=")];
        if let Some(domain) = domain {
            parts.push(format!("Domain={domain}"));
        }
        parts.push("Max-Age=0".to_string());
        parts.push(format!("Path={path}"));
        parts.push(format!("expires={EPOCH_COOKIE_DATE}"));
        self.append_header("Set-Cookie", &parts.join("; "));
    }

    /// Values of all `Set-Cookie` headers
    pub fn set_cookies(&self) -> impl Iterator<Item = &str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("Set-Cookie"))
            .map(|(_, v)| v.as_str())
    }

    /// Rendered `Content-Type` header value
    pub fn content_type_header(&self) -> Option<String> {
        let content_type = self.content_type.as_deref()?;
        Some(match self.charset.as_deref() {
            Some(charset) => format!("{content_type}; charset={charset}"),
            None => content_type.to_string(),
        })
    }

    /// Convert into a transport response. Invalid headers are dropped and logged.
    pub fn into_http(self) -> hyper::Response<Bytes> {
        let content_type = self.content_type_header();
        let mut response = hyper::Response::new(self.body);
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        let rendered_type = content_type.and_then(|ct| HeaderValue::from_str(&ct).ok());
        // The rendered content type replaces any explicit Content-Type entry
        let explicit: Vec<&(String, String)> = self
            .headers
            .iter()
            .filter(|(name, _)| {
                rendered_type.is_none() || !name.eq_ignore_ascii_case(header::CONTENT_TYPE.as_str())
            })
            .collect();
        if let Some(value) = rendered_type {
            headers.insert(header::CONTENT_TYPE, value);
        }
        for (name, value) in explicit {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => logger::log_warning(&format!("Dropping invalid response header '{name}'")),
            }
        }
        response
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(Bytes::new())
    }
}

/// 302 redirect to `uri`
pub fn redirect(uri: &str) -> Response {
    Response::default()
        .with_status(StatusCode::FOUND)
        .with_header("Location", uri)
}

/// 301 redirect to `uri`
pub fn redirect_permanent(uri: &str) -> Response {
    Response::default()
        .with_status(StatusCode::MOVED_PERMANENTLY)
        .with_header("Location", uri)
}
