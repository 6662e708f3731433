//! In-process test client
//!
//! Drives an [`Application`] without a socket. Cookies set by responses are
//! remembered and sent back on later requests.

use crate::app::Application;
use crate::http::cookie;
use crate::http::{RequestBuilder, Response};
use std::collections::BTreeMap;

pub struct Client<'a> {
    app: &'a Application,
    cookies: BTreeMap<String, String>,
}

impl<'a> Client<'a> {
    pub const fn new(app: &'a Application) -> Self {
        Self {
            app,
            cookies: BTreeMap::new(),
        }
    }

    pub fn get(&mut self, path: &str) -> Result<Response, hyper::http::Error> {
        self.send(RequestBuilder::get(path))
    }

    pub fn head(&mut self, path: &str) -> Result<Response, hyper::http::Error> {
        self.send(RequestBuilder::head(path))
    }

    pub fn delete(&mut self, path: &str) -> Result<Response, hyper::http::Error> {
        self.send(RequestBuilder::delete(path))
    }

    /// POST form fields as `application/x-www-form-urlencoded`
    pub fn post(&mut self, path: &str, params: &[(&str, &str)]) -> Result<Response, hyper::http::Error> {
        self.send(with_params(RequestBuilder::post(path), params))
    }

    pub fn put(&mut self, path: &str, params: &[(&str, &str)]) -> Result<Response, hyper::http::Error> {
        self.send(with_params(RequestBuilder::put(path), params))
    }

    /// Send an arbitrary request, adding the stored cookies
    pub fn send(&mut self, builder: RequestBuilder) -> Result<Response, hyper::http::Error> {
        let builder = self
            .cookies
            .iter()
            .fold(builder, |builder, (name, value)| builder.cookie(name, value));
        let mut request = builder.build()?;
        let response = self.app.handle(&mut request);
        self.remember_cookies(&response);
        Ok(response)
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    pub fn clear_cookies(&mut self) {
        self.cookies.clear();
    }

    fn remember_cookies(&mut self, response: &Response) {
        for header in response.set_cookies() {
            let (Some(name), Some(value)) = (
                cookie::set_cookie_name(header),
                cookie::set_cookie_value(header),
            ) else {
                continue;
            };
            if value.is_empty() || expired(header) {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }
    }
}

/// A `Set-Cookie` value whose `Max-Age` is zero or negative
fn expired(set_cookie: &str) -> bool {
    set_cookie
        .split(';')
        .skip(1)
        .filter_map(|attr| attr.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("max-age"))
        .and_then(|(_, value)| value.trim().parse::<i64>().ok())
        .is_some_and(|max_age| max_age <= 0)
}

fn with_params(builder: RequestBuilder, params: &[(&str, &str)]) -> RequestBuilder {
    params
        .iter()
        .fold(builder, |builder, (name, value)| builder.param(name, value))
}
