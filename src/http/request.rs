//! Request wrapper
//!
//! Normalizes a transport-level `hyper::Request` into a read-mostly view with
//! parsed parameters, cookies and content negotiation lists. Handlers and
//! extensions can attach typed per-request attributes through [`Request::extensions_mut`].

use super::cookie::parse_cookie_header;
use super::form::{self, FormValue};
use super::multidict::MultiDict;
use super::negotiation::{parse_accept_charset, parse_quality_list};
use crate::logger;
use hyper::body::Bytes;
use hyper::header::{self, HeaderMap, HeaderName, HeaderValue};
use hyper::http::Extensions;
use hyper::{Method, Uri, Version};
use std::collections::HashMap;

const DEFAULT_CHARSET: &str = "UTF-8";

/// Where the request was received; used when no `Host` header is present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub scheme: String,
    pub server_name: String,
    pub server_port: u16,
}

impl Default for Origin {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            server_name: "localhost".to_string(),
            server_port: 8000,
        }
    }
}

/// Incoming request
#[derive(Debug)]
pub struct Request {
    method: Method,
    version: Version,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    origin: Origin,
    get_params: MultiDict<String>,
    post_params: MultiDict<FormValue>,
    cookies: HashMap<String, String>,
    accept: Vec<String>,
    accept_charset: Vec<String>,
    accept_encoding: Vec<String>,
    accept_language: Vec<String>,
    extensions: Extensions,
}

impl Request {
    /// Build from a fully buffered transport request
    pub fn new(request: hyper::Request<Bytes>, origin: Origin) -> Self {
        let (parts, body) = request.into_parts();
        let headers = parts.headers;

        let get_params = form::parse_query(parts.uri.query().unwrap_or_default());
        let post_params = if matches!(parts.method, Method::POST | Method::PUT) {
            parse_post_params(&headers, &body)
        } else {
            MultiDict::new()
        };

        let cookies = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| parse_cookie_header(v).into_iter())
            .collect();

        let accept = header_str(&headers, &header::ACCEPT).map_or_else(Vec::new, parse_quality_list);
        let accept_charset =
            header_str(&headers, &header::ACCEPT_CHARSET).map_or_else(Vec::new, parse_accept_charset);
        let accept_encoding =
            header_str(&headers, &header::ACCEPT_ENCODING).map_or_else(Vec::new, parse_quality_list);
        let accept_language =
            header_str(&headers, &header::ACCEPT_LANGUAGE).map_or_else(Vec::new, parse_quality_list);

        Self {
            method: parts.method,
            version: parts.version,
            uri: parts.uri,
            headers,
            body,
            origin,
            get_params,
            post_params,
            cookies,
            accept,
            accept_charset,
            accept_encoding,
            accept_language,
            extensions: parts.extensions,
        }
    }

    /// Start building a request without a transport
    pub fn builder(method: Method, path: &str) -> RequestBuilder {
        RequestBuilder::new(method, path)
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub const fn version(&self) -> Version {
        self.version
    }

    /// Protocol in `HTTP/x.y` form
    pub const fn http_version(&self) -> &'static str {
        match self.version {
            Version::HTTP_09 => "HTTP/0.9",
            Version::HTTP_10 => "HTTP/1.0",
            Version::HTTP_2 => "HTTP/2.0",
            Version::HTTP_3 => "HTTP/3.0",
            _ => "HTTP/1.1",
        }
    }

    /// Charset declared by the request's Content-Type, `UTF-8` otherwise
    pub fn charset(&self) -> String {
        self.header(header::CONTENT_TYPE.as_str())
            .and_then(|ct| {
                ct.split(';')
                    .skip(1)
                    .filter_map(|p| p.trim().split_once('='))
                    .find(|(k, _)| k.eq_ignore_ascii_case("charset"))
                    .map(|(_, v)| v.trim_matches('"').to_string())
            })
            .unwrap_or_else(|| DEFAULT_CHARSET.to_string())
    }

    pub fn scheme(&self) -> &str {
        &self.origin.scheme
    }

    /// `Host` header, or `server_name:server_port`
    pub fn host(&self) -> String {
        self.header(header::HOST.as_str()).map_or_else(
            || format!("{}:{}", self.origin.server_name, self.origin.server_port),
            ToString::to_string,
        )
    }

    pub fn host_port(&self) -> u16 {
        match self.header(header::HOST.as_str()) {
            Some(host) => split_host(host)
                .1
                .and_then(|port| port.parse().ok())
                .unwrap_or_else(|| default_port(&self.origin.scheme)),
            None => self.origin.server_port,
        }
    }

    /// `scheme://host`, with the port omitted when it is the scheme default
    pub fn host_url(&self) -> String {
        let host = self.host();
        let (name, _) = split_host(&host);
        let port = self.host_port();
        if port == default_port(&self.origin.scheme) {
            format!("{}://{name}", self.origin.scheme)
        } else {
            format!("{}://{name}:{port}", self.origin.scheme)
        }
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn query_string(&self) -> &str {
        self.uri.query().unwrap_or_default()
    }

    /// Full URL including the query string
    pub fn url(&self) -> String {
        let query = self.query_string();
        if query.is_empty() {
            format!("{}{}", self.host_url(), self.path())
        } else {
            format!("{}{}?{query}", self.host_url(), self.path())
        }
    }

    pub const fn uri(&self) -> &Uri {
        &self.uri
    }

    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body decoded as text; invalid sequences are replaced
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Query string parameters
    pub const fn get_params(&self) -> &MultiDict<String> {
        &self.get_params
    }

    /// Form body parameters (POST and PUT only)
    pub const fn post_params(&self) -> &MultiDict<FormValue> {
        &self.post_params
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Single value for a header; the last one wins when repeated
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get_all(name)
            .iter()
            .last()
            .and_then(|v| v.to_str().ok())
    }

    pub const fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn accept(&self) -> &[String] {
        &self.accept
    }

    pub fn accept_charset(&self) -> &[String] {
        &self.accept_charset
    }

    pub fn accept_encoding(&self) -> &[String] {
        &self.accept_encoding
    }

    pub fn accept_language(&self) -> &[String] {
        &self.accept_language
    }

    /// Per-request attributes attached by extensions and handlers
    pub const fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn parse_post_params(headers: &HeaderMap, body: &Bytes) -> MultiDict<FormValue> {
    let Some(content_type) = header_str(headers, &header::CONTENT_TYPE) else {
        return MultiDict::new();
    };
    match form::parse_body(content_type, body) {
        Ok(params) => params,
        Err(e) => {
            logger::log_warning(&format!("Malformed form body ({content_type}): {e}"));
            MultiDict::new()
        }
    }
}

/// Split `name[:port]`; a bracketed IPv6 literal keeps its colons
fn split_host(host: &str) -> (&str, Option<&str>) {
    let name_end = if host.starts_with('[') {
        host.find(']').map_or(0, |i| i + 1)
    } else {
        0
    };
    match host[name_end..].rfind(':') {
        Some(i) => (&host[..name_end + i], Some(&host[name_end + i + 1..])),
        None => (host, None),
    }
}

fn default_port(scheme: &str) -> u16 {
    if scheme.eq_ignore_ascii_case("https") {
        443
    } else {
        80
    }
}

/// Builds a [`Request`] without a socket; used by the test client
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    path: String,
    query: String,
    version: Version,
    origin: Origin,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    form: Vec<(String, FormValue)>,
    body: Option<(String, Bytes)>,
}

impl RequestBuilder {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            query: String::new(),
            version: Version::HTTP_11,
            origin: Origin::default(),
            headers: Vec::new(),
            cookies: Vec::new(),
            form: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn head(path: &str) -> Self {
        Self::new(Method::HEAD, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn query(mut self, query: &str) -> Self {
        self.query = query.to_string();
        self
    }

    #[must_use]
    pub const fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn scheme(mut self, scheme: &str) -> Self {
        self.origin.scheme = scheme.to_string();
        self
    }

    #[must_use]
    pub fn server(mut self, name: &str, port: u16) -> Self {
        self.origin.server_name = name.to_string();
        self.origin.server_port = port;
        self
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.push((name.to_string(), value.to_string()));
        self
    }

    /// Add a form field; switches the body to a form encoding
    #[must_use]
    pub fn param(mut self, name: &str, value: &str) -> Self {
        self.form.push((name.to_string(), FormValue::from(value)));
        self
    }

    /// Add a file field; the body is encoded as multipart
    #[must_use]
    pub fn file(mut self, name: &str, filename: &str, content: impl Into<Bytes>) -> Self {
        self.form.push((
            name.to_string(),
            FormValue::File(form::UploadedFile {
                filename: filename.to_string(),
                content_type: None,
                content: content.into(),
            }),
        ));
        self
    }

    /// Raw body with an explicit content type; overrides form fields
    #[must_use]
    pub fn body(mut self, content_type: &str, body: impl Into<Bytes>) -> Self {
        self.body = Some((content_type.to_string(), body.into()));
        self
    }

    pub fn build(self) -> Result<Request, hyper::http::Error> {
        let uri = if self.query.is_empty() {
            self.path
        } else {
            format!("{}?{}", self.path, self.query)
        };

        let has_body = matches!(self.method, Method::POST | Method::PUT) || !self.form.is_empty();
        let body = match self.body {
            Some(raw) => Some(raw),
            None if has_body => {
                if self.form.iter().any(|(_, v)| matches!(v, FormValue::File(_))) {
                    let (content_type, body) = form::encode_multipart(&self.form);
                    Some((content_type, Bytes::from(body)))
                } else {
                    let body = form::encode_urlencoded(
                        self.form
                            .iter()
                            .filter_map(|(k, v)| v.as_text().map(|t| (k.as_str(), t))),
                    );
                    Some((form::URLENCODED.to_string(), Bytes::from(body)))
                }
            }
            None => None,
        };

        let mut builder = hyper::Request::builder()
            .method(self.method)
            .uri(uri)
            .version(self.version);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some((content_type, body)) => {
                let length = HeaderValue::from(body.len());
                builder
                    .header(header::CONTENT_TYPE, content_type)
                    .header(header::CONTENT_LENGTH, length)
                    .body(body)?
            }
            None => builder.body(Bytes::new())?,
        };

        Ok(Request::new(request, self.origin))
    }
}
