//! Error handler
//!
//! Turns an [`HttpError`] into a response. Lookup order on every call: a
//! function for the exact status, then one for its class (`4xx`, `5xx`), then
//! the fallback.

use crate::error::HttpError;
use crate::http::Response;
use std::collections::HashMap;
use std::fmt;

type ErrorFn = Box<dyn Fn(&HttpError) -> Response + Send + Sync>;

pub struct ErrorHandler {
    exact: HashMap<u16, ErrorFn>,
    class: HashMap<u16, ErrorFn>,
    fallback: ErrorFn,
}

/// Plain-text body `Error <code>` with the failure's status
pub fn default_response(error: &HttpError) -> Response {
    Response::plain(error.to_string()).with_status(error.status())
}

impl ErrorHandler {
    pub fn new() -> Self {
        Self {
            exact: HashMap::new(),
            class: HashMap::new(),
            fallback: Box::new(default_response),
        }
    }

    /// Handle one exact status code, e.g. `404`
    #[must_use]
    pub fn on<F>(mut self, code: u16, f: F) -> Self
    where
        F: Fn(&HttpError) -> Response + Send + Sync + 'static,
    {
        self.exact.insert(code, Box::new(f));
        self
    }

    /// Handle a status class by its leading digit, e.g. `5` for `5xx`
    #[must_use]
    pub fn on_class<F>(mut self, class: u16, f: F) -> Self
    where
        F: Fn(&HttpError) -> Response + Send + Sync + 'static,
    {
        self.class.insert(class, Box::new(f));
        self
    }

    /// Replace the generic fallback
    #[must_use]
    pub fn fallback<F>(mut self, f: F) -> Self
    where
        F: Fn(&HttpError) -> Response + Send + Sync + 'static,
    {
        self.fallback = Box::new(f);
        self
    }

    pub fn handle(&self, error: &HttpError) -> Response {
        let code = error.status().as_u16();
        let f = self
            .exact
            .get(&code)
            .or_else(|| self.class.get(&(code / 100)))
            .unwrap_or(&self.fallback);
        f(error)
    }
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut exact: Vec<_> = self.exact.keys().copied().collect();
        exact.sort_unstable();
        let mut class: Vec<_> = self.class.keys().map(|c| format!("{c}xx")).collect();
        class.sort();
        f.debug_struct("ErrorHandler")
            .field("exact", &exact)
            .field("class", &class)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::StatusCode;

    fn handler() -> ErrorHandler {
        ErrorHandler::new()
            .on(404, |_| Response::new("error404").with_status(StatusCode::NOT_FOUND))
            .on_class(4, |e| Response::new("error4xx").with_status(e.status()))
            .on_class(5, |e| Response::new("error5xx").with_status(e.status()))
    }

    #[test]
    fn test_exact_beats_class() {
        let res = handler().handle(&HttpError::not_found());
        assert_eq!(res.text(), "error404");
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_class_match() {
        let res = handler().handle(&HttpError::from_code(503));
        assert_eq!(res.text(), "error5xx");
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

        let res = handler().handle(&HttpError::forbidden());
        assert_eq!(res.text(), "error4xx");
    }

    #[test]
    fn test_default_fallback() {
        let res = handler().handle(&HttpError::from_code(302));
        assert_eq!(res.text(), "Error 302");
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.content_type(), Some("text/plain"));

        let res = ErrorHandler::default().handle(&HttpError::method_not_allowed());
        assert_eq!(res.text(), "Error 405");
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_custom_fallback() {
        let handler = ErrorHandler::new().fallback(|e| Response::new(format!("oops {e}")));
        let res = handler.handle(&HttpError::internal_server_error());
        assert_eq!(res.text(), "oops Error 500");
        assert_eq!(res.status(), StatusCode::OK);
    }
}
