//! Routing module
//!
//! Provides the URL pattern compiler and the ordered handler registry:
//! - `_` segments capture one non-empty path segment
//! - Lookup iterates routes in registration order
//! - Named routes support reverse URL generation

pub mod pattern;
mod registry;

pub use pattern::UrlPattern;
pub use registry::Router;
