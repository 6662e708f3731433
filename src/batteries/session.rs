//! Session battery
//!
//! [`SessionExtension`] loads the session named by a cookie before each routed
//! request (creating one when needed), checks the CSRF token of POST requests,
//! and sets the session cookie on the way out. Sessions are stored as JSON
//! strings in a [`SessionStore`].

use crate::app::{Extension, Services};
use crate::error::{Error, HttpError, Result};
use crate::handler::Handler;
use crate::http::{redirect, CookieOptions, FormValue, Method, Request, Response};
use crate::logger;
use chrono::Local;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const TOKEN_LENGTH: usize = 64;
const CSRF_FIELD: &str = "csrf_token";

/// Random string of ASCII letters
pub fn random_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(LETTERS[rng.gen_range(0..LETTERS.len())]))
        .collect()
}

/// Key-value storage for serialized sessions
pub trait SessionStore: Send + Sync {
    fn load(&self, id: &str) -> Result<Option<String>>;
    fn save(&self, id: &str, value: &str) -> Result<()>;
}

/// Process-local session storage
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.sessions
            .lock()
            .map_err(|_| Error::internal("session store lock poisoned"))
    }

    pub fn len(&self) -> usize {
        self.lock().map_or(0, |sessions| sessions.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemoryStore {
    fn load(&self, id: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn save(&self, id: &str, value: &str) -> Result<()> {
        self.lock()?.insert(id.to_string(), value.to_string());
        Ok(())
    }
}

fn now() -> String {
    Local::now().to_rfc3339()
}

fn new_token() -> String {
    random_string(TOKEN_LENGTH)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SessionState {
    #[serde(default = "now")]
    created_at: String,
    #[serde(default = "new_token")]
    csrf_token: String,
    #[serde(default)]
    user: Option<Value>,
    #[serde(default)]
    data: Map<String, Value>,
}

/// A user session; clones share the same state
#[derive(Clone)]
pub struct Session {
    id: String,
    store: Arc<dyn SessionStore>,
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    /// Load session `id` from `store`, or start it fresh when nothing is stored.
    /// A fresh session is saved immediately.
    pub fn open(store: Arc<dyn SessionStore>, id: &str) -> Result<Self> {
        let stored = store.load(id)?;
        let state: SessionState = serde_json::from_str(stored.as_deref().unwrap_or("{}"))?;
        let session = Self {
            id: id.to_string(),
            store,
            state: Arc::new(Mutex::new(state)),
        };
        if stored.is_none() {
            session.save()?;
        }
        Ok(session)
    }

    fn state(&self) -> Result<MutexGuard<'_, SessionState>> {
        self.state
            .lock()
            .map_err(|_| Error::internal("session state lock poisoned"))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> Result<String> {
        Ok(self.state()?.created_at.clone())
    }

    pub fn csrf_token(&self) -> Result<String> {
        Ok(self.state()?.csrf_token.clone())
    }

    /// Identification of the logged-in user
    pub fn user(&self) -> Result<Option<Value>> {
        Ok(self.state()?.user.clone())
    }

    pub fn login(&self, user: impl Into<Value>) -> Result<()> {
        self.state()?.user = Some(user.into());
        self.save()
    }

    pub fn logout(&self) -> Result<()> {
        self.state()?.user = None;
        self.save()
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.state()?.data.get(key).cloned())
    }

    /// Set a data value; call [`Session::save`] to persist
    pub fn insert(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.state()?.data.insert(key.to_string(), value.into());
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.state()?.data.remove(key))
    }

    pub fn save(&self) -> Result<()> {
        let serialized = serde_json::to_string(&*self.state()?)?;
        self.store.save(&self.id, &serialized)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// The session attached to `request` by [`SessionExtension`]
pub fn session(request: &Request) -> Option<&Session> {
    request.extensions().get::<Session>()
}

pub struct SessionExtension {
    cookie_name: String,
    cookie_max_age: Option<i64>,
    check_csrf_token: bool,
    store: Arc<dyn SessionStore>,
}

impl SessionExtension {
    pub fn new(cookie_name: &str, store: impl SessionStore + 'static) -> Self {
        Self::shared(cookie_name, Arc::new(store))
    }

    pub fn shared(cookie_name: &str, store: Arc<dyn SessionStore>) -> Self {
        Self {
            cookie_name: cookie_name.to_string(),
            cookie_max_age: None,
            check_csrf_token: true,
            store,
        }
    }

    /// `Max-Age` of the session cookie; a session cookie by default
    #[must_use]
    pub const fn cookie_max_age(mut self, seconds: i64) -> Self {
        self.cookie_max_age = Some(seconds);
        self
    }

    #[must_use]
    pub const fn check_csrf_token(mut self, check: bool) -> Self {
        self.check_csrf_token = check;
        self
    }
}

impl Extension for SessionExtension {
    fn attach(&mut self, services: &mut Services, _debug: bool) {
        services.insert("session_store", Arc::clone(&self.store));
    }

    fn process_request(&self, request: &mut Request) -> Result<()> {
        let cookie_id = request.cookie(&self.cookie_name).map(ToString::to_string);
        let id = match cookie_id {
            Some(id) if self.store.load(&id)?.is_some() => id,
            _ => new_token(),
        };
        let session = Session::open(Arc::clone(&self.store), &id)?;

        if self.check_csrf_token && request.method() == Method::POST {
            let posted = request
                .post_params()
                .get(CSRF_FIELD)
                .and_then(FormValue::as_text);
            if posted != Some(session.csrf_token()?.as_str()) {
                logger::log_debug(&format!("CSRF token mismatch on {}", request.path()));
                return Err(HttpError::forbidden().into());
            }
        }

        request.extensions_mut().insert(session);
        Ok(())
    }

    fn process_response(&self, request: &Request, response: &mut Response) -> Result<()> {
        let Some(session) = session(request) else {
            return Ok(());
        };
        if request.cookie(&self.cookie_name) != Some(session.id()) {
            let mut options = CookieOptions::default();
            options.max_age = self.cookie_max_age;
            response.set_cookie(&self.cookie_name, session.id(), &options);
        }
        Ok(())
    }
}

/// Redirects to a login page unless the request's session has a user
pub struct LoginRequired<H> {
    login_url: String,
    inner: H,
}

impl<H: Handler> LoginRequired<H> {
    pub fn new(login_url: &str, inner: H) -> Self {
        Self {
            login_url: login_url.to_string(),
            inner,
        }
    }

    fn check(&self, request: &Request) -> Result<Option<Response>> {
        let logged_in = match session(request) {
            Some(session) => session.user()?.is_some(),
            None => false,
        };
        Ok((!logged_in).then(|| redirect(&self.login_url)))
    }
}

impl<H: Handler> Handler for LoginRequired<H> {
    fn get(&self, request: &mut Request, args: &[String]) -> Result<Response> {
        match self.check(request)? {
            Some(response) => Ok(response),
            None => self.inner.get(request, args),
        }
    }

    fn post(&self, request: &mut Request, args: &[String]) -> Result<Response> {
        match self.check(request)? {
            Some(response) => Ok(response),
            None => self.inner.post(request, args),
        }
    }

    fn put(&self, request: &mut Request, args: &[String]) -> Result<Response> {
        match self.check(request)? {
            Some(response) => Ok(response),
            None => self.inner.put(request, args),
        }
    }

    fn delete(&self, request: &mut Request, args: &[String]) -> Result<Response> {
        match self.check(request)? {
            Some(response) => Ok(response),
            None => self.inner.delete(request, args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Application;
    use crate::config::AppConfig;
    use crate::handler::{MethodTable, Route};
    use crate::http::StatusCode;
    use crate::testing::Client;

    #[test]
    fn test_random_string() {
        let s = random_string(64);
        assert_eq!(s.len(), 64);
        assert!(s.chars().all(|c| c.is_ascii_alphabetic()));
        assert_ne!(random_string(64), s);
    }

    #[test]
    fn test_session_persists() {
        let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());
        let session = Session::open(Arc::clone(&store), "abc").unwrap();
        assert!(store.load("abc").unwrap().is_some());
        assert_eq!(session.csrf_token().unwrap().len(), 64);

        session.insert("cart", 3).unwrap();
        session.login("alice").unwrap();

        let reloaded = Session::open(Arc::clone(&store), "abc").unwrap();
        assert_eq!(reloaded.user().unwrap(), Some(Value::from("alice")));
        assert_eq!(reloaded.get("cart").unwrap(), Some(Value::from(3)));
        assert_eq!(reloaded.csrf_token().unwrap(), session.csrf_token().unwrap());
        assert_eq!(reloaded.created_at().unwrap(), session.created_at().unwrap());

        reloaded.logout().unwrap();
        let again = Session::open(store, "abc").unwrap();
        assert_eq!(again.user().unwrap(), None);
    }

    #[test]
    fn test_partial_stored_state() {
        let store = Arc::new(MemoryStore::new());
        store.save("x", r#"{"user":"bob"}"#).unwrap();
        let session = Session::open(store, "x").unwrap();
        assert_eq!(session.user().unwrap(), Some(Value::from("bob")));
        assert_eq!(session.csrf_token().unwrap().len(), 64);
        assert!(session.get("missing").unwrap().is_none());
    }

    fn app(check_csrf: bool) -> Application {
        let counter = Route::new(
            "/count/",
            MethodTable::new()
                .on_get(|req, _| {
                    let session = session(req).ok_or("no session")?;
                    let count = session.get("count")?.and_then(|v| v.as_i64()).unwrap_or(0) + 1;
                    session.insert("count", count)?;
                    session.save()?;
                    Ok(Response::new(count.to_string()))
                })
                .on_post(|_, _| Ok(Response::new("posted"))),
        );
        let token = Route::new(
            "/token/",
            MethodTable::new().on_get(|req, _| {
                let session = session(req).ok_or("no session")?;
                Ok(Response::new(session.csrf_token()?))
            }),
        );
        let login = Route::new(
            "/login/",
            MethodTable::new().on_get(|req, _| {
                session(req).ok_or("no session")?.login("carol")?;
                Ok(Response::new("logged in"))
            }),
        );
        let private = Route::new(
            "/private/",
            LoginRequired::new(
                "/login/",
                MethodTable::new().on_get(|_, _| Ok(Response::new("secret"))),
            ),
        );
        let sessions: Box<dyn Extension> = Box::new(
            SessionExtension::new("sid", MemoryStore::new())
                .cookie_max_age(3600)
                .check_csrf_token(check_csrf),
        );
        Application::new(
            AppConfig::default(),
            vec![counter.into(), token.into(), login.into(), private.into()],
            vec![sessions],
        )
        .unwrap()
    }

    #[test]
    fn test_session_cookie_and_counter() {
        let app = app(true);
        let mut client = Client::new(&app);

        let res = client.get("/count/").unwrap();
        assert_eq!(res.text(), "1");
        let cookie = res.set_cookies().next().unwrap().to_string();
        assert!(cookie.starts_with("sid="));
        assert!(cookie.contains("Max-Age=3600"));

        let res = client.get("/count/").unwrap();
        assert_eq!(res.text(), "2");
        assert_eq!(res.set_cookies().count(), 0);
    }

    #[test]
    fn test_unknown_session_id_is_replaced() {
        let app = app(true);
        let mut client = Client::new(&app);
        client.set_cookie("sid", "forged");
        let res = client.get("/count/").unwrap();
        assert_eq!(res.text(), "1");
        assert_ne!(client.cookie("sid"), Some("forged"));
    }

    #[test]
    fn test_csrf_check() {
        let app = app(true);
        let mut client = Client::new(&app);

        let res = client.post("/count/", &[]).unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let token = client.get("/token/").unwrap().text();
        let res = client.post("/count/", &[("csrf_token", "wrong")]).unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        let res = client.post("/count/", &[("csrf_token", token.as_str())]).unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.text(), "posted");
    }

    #[test]
    fn test_csrf_check_disabled() {
        let app = app(false);
        let mut client = Client::new(&app);
        let res = client.post("/count/", &[]).unwrap();
        assert_eq!(res.text(), "posted");
    }

    #[test]
    fn test_login_required() {
        let app = app(true);
        let mut client = Client::new(&app);

        let res = client.get("/private/").unwrap();
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.header("Location"), Some("/login/"));

        client.get("/login/").unwrap();
        let res = client.get("/private/").unwrap();
        assert_eq!(res.text(), "secret");
    }

    #[test]
    fn test_store_published_as_service() {
        let app = app(true);
        assert!(app.services().contains("session_store"));
    }
}
