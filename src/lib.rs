//! A small web framework
//!
//! Applications are assembled from routes (URL patterns with `_` capture
//! slots bound to method handlers), at most one error handler and a list of
//! extensions. [`Application::handle`] dispatches one request synchronously;
//! the [`server`] module runs an application behind a development HTTP server.

pub mod app;
pub mod batteries;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod routing;
pub mod server;
pub mod testing;

pub use app::{Application, Component, Extension, Services};
pub use error::{Error, HttpError, Result, ReverseError, SetupError};
pub use handler::{ErrorHandler, Handler, MethodTable, Route};
pub use http::{redirect, redirect_permanent, Request, RequestBuilder, Response};
