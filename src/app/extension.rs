//! Extension capability
//!
//! Extensions are attached once when the application is built, then see every
//! routed request before the handler runs and every response after it. Hooks of
//! all extensions run in registration order, both before and after.

use super::services::Services;
use crate::error::Result;
use crate::http::{Request, Response};

pub trait Extension: Send + Sync {
    /// Called once at application construction
    fn attach(&mut self, _services: &mut Services, _debug: bool) {}

    /// May modify the request, or abort the call with an error
    fn process_request(&self, _request: &mut Request) -> Result<()> {
        Ok(())
    }

    /// May modify the response in place
    fn process_response(&self, _request: &Request, _response: &mut Response) -> Result<()> {
        Ok(())
    }
}
