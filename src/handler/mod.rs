//! Request handler module
//!
//! A [`Handler`] answers requests for one URL pattern through per-method
//! operations. [`MethodTable`] builds one from closures; [`Route`] binds a
//! handler to a template and an optional name.

pub mod error_handler;
pub mod static_files;

pub use error_handler::ErrorHandler;

use crate::error::{HttpError, Result};
use crate::http::{Method, Request, Response};
use std::fmt;
use std::sync::Arc;

/// Per-method request handling. Methods a handler does not override answer 405.
///
/// `args` holds the path segments captured by the route's placeholders.
pub trait Handler: Send + Sync {
    fn get(&self, _request: &mut Request, _args: &[String]) -> Result<Response> {
        Err(HttpError::method_not_allowed().into())
    }

    fn post(&self, _request: &mut Request, _args: &[String]) -> Result<Response> {
        Err(HttpError::method_not_allowed().into())
    }

    fn put(&self, _request: &mut Request, _args: &[String]) -> Result<Response> {
        Err(HttpError::method_not_allowed().into())
    }

    fn delete(&self, _request: &mut Request, _args: &[String]) -> Result<Response> {
        Err(HttpError::method_not_allowed().into())
    }
}

/// Invoke the operation named by the request method. HEAD runs `get`.
pub fn call(handler: &dyn Handler, request: &mut Request, args: &[String]) -> Result<Response> {
    let method = request.method().clone();
    match method {
        Method::GET | Method::HEAD => handler.get(request, args),
        Method::POST => handler.post(request, args),
        Method::PUT => handler.put(request, args),
        Method::DELETE => handler.delete(request, args),
        _ => Err(HttpError::method_not_allowed().into()),
    }
}

type MethodFn = Box<dyn Fn(&mut Request, &[String]) -> Result<Response> + Send + Sync>;

/// Handler assembled from closures, one per supported method
#[derive(Default)]
pub struct MethodTable {
    get: Option<MethodFn>,
    post: Option<MethodFn>,
    put: Option<MethodFn>,
    delete: Option<MethodFn>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_get<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Request, &[String]) -> Result<Response> + Send + Sync + 'static,
    {
        self.get = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_post<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Request, &[String]) -> Result<Response> + Send + Sync + 'static,
    {
        self.post = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_put<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Request, &[String]) -> Result<Response> + Send + Sync + 'static,
    {
        self.put = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn on_delete<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Request, &[String]) -> Result<Response> + Send + Sync + 'static,
    {
        self.delete = Some(Box::new(f));
        self
    }

    fn invoke(slot: Option<&MethodFn>, request: &mut Request, args: &[String]) -> Result<Response> {
        match slot {
            Some(f) => f(request, args),
            None => Err(HttpError::method_not_allowed().into()),
        }
    }
}

impl Handler for MethodTable {
    fn get(&self, request: &mut Request, args: &[String]) -> Result<Response> {
        Self::invoke(self.get.as_ref(), request, args)
    }

    fn post(&self, request: &mut Request, args: &[String]) -> Result<Response> {
        Self::invoke(self.post.as_ref(), request, args)
    }

    fn put(&self, request: &mut Request, args: &[String]) -> Result<Response> {
        Self::invoke(self.put.as_ref(), request, args)
    }

    fn delete(&self, request: &mut Request, args: &[String]) -> Result<Response> {
        Self::invoke(self.delete.as_ref(), request, args)
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodTable")
            .field("get", &self.get.is_some())
            .field("post", &self.post.is_some())
            .field("put", &self.put.is_some())
            .field("delete", &self.delete.is_some())
            .finish()
    }
}

/// A handler bound to a URL template, optionally named for reversal
#[derive(Clone)]
pub struct Route {
    pattern: String,
    handler: Arc<dyn Handler>,
    name: Option<String>,
}

impl Route {
    pub fn new(pattern: &str, handler: impl Handler + 'static) -> Self {
        Self::shared(pattern, Arc::new(handler))
    }

    /// Bind a handler that is also used elsewhere
    pub fn shared(pattern: &str, handler: Arc<dyn Handler>) -> Self {
        Self {
            pattern: pattern.to_string(),
            handler,
            name: None,
        }
    }

    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
