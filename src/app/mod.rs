//! Application core
//!
//! Owns the route registry, the error handler, the extension list and the
//! service registry. [`Application::handle`] turns one request into one
//! response and never fails: every error ends up in the error handler.

pub mod extension;
pub mod services;

pub use extension::Extension;
pub use services::Services;

use crate::config::AppConfig;
use crate::error::{Error, HttpError, Result, ReverseError, SetupError};
use crate::handler::{self, static_files, ErrorHandler, Route};
use crate::http::{redirect, Request, Response};
use crate::logger;
use crate::routing::Router;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Something the application is assembled from
pub enum Component {
    Route(Route),
    ErrorHandler(ErrorHandler),
}

impl From<Route> for Component {
    fn from(route: Route) -> Self {
        Self::Route(route)
    }
}

impl From<ErrorHandler> for Component {
    fn from(handler: ErrorHandler) -> Self {
        Self::ErrorHandler(handler)
    }
}

pub struct Application {
    config: AppConfig,
    router: Router,
    error_handler: ErrorHandler,
    extensions: Vec<Box<dyn Extension>>,
    services: Services,
}

impl Application {
    /// Assemble an application.
    ///
    /// Routes are registered in iteration order. At most one error handler may
    /// be supplied; without one the default plain-text handler is used. Each
    /// extension is attached once, in order, after routes are registered.
    pub fn new(
        config: AppConfig,
        components: impl IntoIterator<Item = Component>,
        extensions: Vec<Box<dyn Extension>>,
    ) -> Result<Self, SetupError> {
        let mut router = Router::new();
        let mut error_handler = None;

        for component in components {
            match component {
                Component::Route(route) => router.register(route)?,
                Component::ErrorHandler(handler) => {
                    if error_handler.is_some() {
                        return Err(SetupError::MultipleErrorHandlers);
                    }
                    error_handler = Some(handler);
                }
            }
        }

        let mut app = Self {
            config,
            router,
            error_handler: error_handler.unwrap_or_default(),
            extensions,
            services: Services::new(),
        };

        let debug = app.config.debug;
        for extension in &mut app.extensions {
            extension.attach(&mut app.services, debug);
        }

        Ok(app)
    }

    /// Register another route after construction
    pub fn add_route(&mut self, route: Route) -> Result<(), SetupError> {
        self.router.register(route)
    }

    pub fn set_error_handler(&mut self, handler: ErrorHandler) {
        self.error_handler = handler;
    }

    /// Path of the route registered under `name`, with `args` in its capture slots
    pub fn reverse(&self, name: &str, args: &[&str]) -> Result<String, ReverseError> {
        self.router.reverse(name, args)
    }

    pub const fn services(&self) -> &Services {
        &self.services
    }

    pub const fn debug(&self) -> bool {
        self.config.debug
    }

    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Produce the response for `request`
    pub fn handle(&self, request: &mut Request) -> Response {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(request)));

        let error = match outcome {
            Ok(Ok(response)) => return response,
            Ok(Err(Error::Http(error))) => error,
            Ok(Err(Error::Internal(error))) => {
                if self.debug() {
                    logger::log_error(&format!(
                        "Internal error handling {} {}: {error:?}",
                        request.method(),
                        request.path()
                    ));
                }
                HttpError::internal_server_error()
            }
            Err(payload) => {
                if self.debug() {
                    logger::log_error(&format!(
                        "Panic handling {} {}: {}",
                        request.method(),
                        request.path(),
                        panic_message(payload.as_ref())
                    ));
                }
                HttpError::internal_server_error()
            }
        };

        self.error_handler.handle(&error)
    }

    fn dispatch(&self, request: &mut Request) -> Result<Response> {
        let path = request.path().to_string();
        logger::log_request(request.method().as_str(), &path);

        if let Some((target, args)) = self.router.resolve(&path) {
            for extension in &self.extensions {
                extension.process_request(request)?;
            }

            let mut response = handler::call(target, request, &args)?;
            for extension in &self.extensions {
                extension.process_response(request, &mut response)?;
            }

            // HEAD responses carry no body, including one written by a post-hook
            if request.is_head() {
                response.clear_body();
            }
            return Ok(response);
        }

        if !path.ends_with('/') && self.router.is_match(&format!("{path}/")) {
            let location = match request.query_string() {
                "" => format!("{path}/"),
                query => format!("{path}/?{query}"),
            };
            return Ok(redirect(&location));
        }

        if let Some(mut response) = self.serve_static(&path) {
            if request.is_head() {
                response.clear_body();
            }
            return Ok(response);
        }

        Err(HttpError::not_found().into())
    }

    fn serve_static(&self, path: &str) -> Option<Response> {
        if !self.config.debug {
            return None;
        }
        let root = self.config.static_root.as_deref()?;
        static_files::serve(root, &self.config.static_prefix, path)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("config", &self.config)
            .field("routes", &self.router.len())
            .field("error_handler", &self.error_handler)
            .field("extensions", &self.extensions.len())
            .field("services", &self.services)
            .finish()
    }
}
