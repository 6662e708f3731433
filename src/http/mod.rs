//! HTTP protocol layer module
//!
//! Request/response wrappers over hyper's types, plus the parsing helpers
//! they are built from (forms, cookies, content negotiation, MIME types).

pub mod cookie;
pub mod form;
pub mod mime;
pub mod multidict;
pub mod negotiation;
pub mod request;
pub mod response;

// Re-export commonly used types
pub use cookie::CookieOptions;
pub use form::{FormValue, UploadedFile};
pub use multidict::MultiDict;
pub use request::{Origin, Request, RequestBuilder};
pub use response::{redirect, redirect_permanent, Response};

pub use hyper::{Method, StatusCode};
