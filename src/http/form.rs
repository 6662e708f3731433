//! Query string and form body parsing
//!
//! Bodies arrive fully buffered, so the multipart parser is fed a single-chunk
//! stream and driven to completion on the calling thread.

use super::multidict::MultiDict;
use futures::{future, stream};
use hyper::body::Bytes;
use rand::distributions::Alphanumeric;
use rand::Rng;

pub const URLENCODED: &str = "application/x-www-form-urlencoded";
pub const MULTIPART: &str = "multipart/form-data";

/// A file part of a multipart body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub content: Bytes,
}

/// A single form value: plain text or an uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(UploadedFile),
}

impl FormValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::File(_) => None,
        }
    }

    pub const fn as_file(&self) -> Option<&UploadedFile> {
        match self {
            Self::Text(_) => None,
            Self::File(f) => Some(f),
        }
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Parse `a=1&b=2&a=3` into a multi-valued map
pub fn parse_query(query: &str) -> MultiDict<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

/// Parse a request body according to its content type.
///
/// Unknown content types yield an empty map.
pub fn parse_body(content_type: &str, body: &Bytes) -> Result<MultiDict<FormValue>, multer::Error> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        URLENCODED => Ok(url::form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), FormValue::Text(v.into_owned())))
            .collect()),
        MULTIPART => parse_multipart(content_type, body.clone()),
        _ => Ok(MultiDict::new()),
    }
}

fn parse_multipart(content_type: &str, body: Bytes) -> Result<MultiDict<FormValue>, multer::Error> {
    let boundary = multer::parse_boundary(content_type)?;
    let chunks = stream::once(future::ready(Ok::<_, std::io::Error>(body)));
    let mut multipart = multer::Multipart::new(chunks, boundary);

    futures::executor::block_on(async move {
        let mut form = MultiDict::new();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field.file_name().map(ToString::to_string);
            let content_type = field.content_type().map(ToString::to_string);
            let content = field.bytes().await?;

            let value = match filename {
                Some(filename) => FormValue::File(UploadedFile {
                    filename,
                    content_type,
                    content,
                }),
                None => FormValue::Text(String::from_utf8_lossy(&content).into_owned()),
            };
            form.insert(name, value);
        }
        Ok(form)
    })
}

/// Encode fields as `application/x-www-form-urlencoded`
pub fn encode_urlencoded<'a>(fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish()
}

/// Encode fields as `multipart/form-data`, returning `(content_type, body)`
pub fn encode_multipart(fields: &[(String, FormValue)]) -> (String, Vec<u8>) {
    let boundary: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();

    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        match value {
            FormValue::Text(text) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(text.as_bytes());
            }
            FormValue::File(file) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{}\"\r\n",
                        file.filename
                    )
                    .as_bytes(),
                );
                let content_type = file
                    .content_type
                    .as_deref()
                    .unwrap_or("application/octet-stream");
                body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
                body.extend_from_slice(&file.content);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    (format!("{MULTIPART}; boundary={boundary}"), body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_multi_values() {
        let params = parse_query("abc=def&123=456&abc=ghi");
        assert_eq!(params.get_all("abc"), vec!["def", "ghi"]);
        assert_eq!(params.get("123").map(String::as_str), Some("456"));
    }

    #[test]
    fn test_parse_query_decodes() {
        let params = parse_query("name=John+Doe&city=S%C3%A3o%20Paulo");
        assert_eq!(params.get("name").map(String::as_str), Some("John Doe"));
        assert_eq!(params.get("city").map(String::as_str), Some("São Paulo"));
    }

    #[test]
    fn test_parse_urlencoded_body() {
        let body = Bytes::from(encode_urlencoded([("abc", "def"), ("123", "456")]));
        let form = parse_body(URLENCODED, &body).unwrap();
        assert_eq!(form.get("abc").and_then(FormValue::as_text), Some("def"));
        assert_eq!(form.get("123").and_then(FormValue::as_text), Some("456"));
    }

    #[test]
    fn test_multipart_round_trip_with_file() {
        let fields = vec![
            ("title".to_string(), FormValue::from("hello")),
            (
                "file".to_string(),
                FormValue::File(UploadedFile {
                    filename: "filename".to_string(),
                    content_type: None,
                    content: Bytes::from_static(b"content"),
                }),
            ),
        ];
        let (content_type, body) = encode_multipart(&fields);
        assert!(content_type.starts_with("multipart/form-data; boundary="));

        let form = parse_body(&content_type, &Bytes::from(body)).unwrap();
        assert_eq!(form.get("title").and_then(FormValue::as_text), Some("hello"));
        let file = form.get("file").and_then(FormValue::as_file).unwrap();
        assert_eq!(file.filename, "filename");
        assert_eq!(file.content, Bytes::from_static(b"content"));
        assert_eq!(file.content_type.as_deref(), Some("application/octet-stream"));
    }

    #[test]
    fn test_unknown_content_type_is_empty() {
        let form = parse_body("application/json", &Bytes::from_static(b"{}")).unwrap();
        assert!(form.is_empty());
    }

    #[test]
    fn test_multipart_without_boundary_fails() {
        assert!(parse_body(MULTIPART, &Bytes::new()).is_err());
    }
}
