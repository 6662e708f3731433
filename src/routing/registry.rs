//! Handler registry
//!
//! Routes are kept in registration order and the first structural match wins.
//! Named routes can be turned back into paths with [`Router::reverse`].

use super::pattern::UrlPattern;
use crate::error::{ReverseError, SetupError};
use crate::handler::{Handler, Route};
use std::collections::HashMap;
use std::sync::Arc;

struct Entry {
    pattern: UrlPattern,
    handler: Arc<dyn Handler>,
}

#[derive(Default)]
pub struct Router {
    routes: Vec<Entry>,
    names: HashMap<String, UrlPattern>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route. A name that is already taken is rejected and nothing is added.
    pub fn register(&mut self, route: Route) -> Result<(), SetupError> {
        let pattern = UrlPattern::compile(route.pattern());

        if let Some(name) = route.name() {
            if self.names.contains_key(name) {
                return Err(SetupError::DuplicateRouteName(name.to_string()));
            }
            self.names.insert(name.to_string(), pattern.clone());
        }

        self.routes.push(Entry {
            pattern,
            handler: Arc::clone(route.handler()),
        });
        Ok(())
    }

    /// First handler whose pattern matches the whole path, with its captures
    pub fn resolve(&self, path: &str) -> Option<(&dyn Handler, Vec<String>)> {
        self.routes.iter().find_map(|entry| {
            entry
                .pattern
                .captures(path)
                .map(|captures| (entry.handler.as_ref(), captures))
        })
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.routes.iter().any(|entry| entry.pattern.is_match(path))
    }

    /// Build the path of a named route from positional arguments
    pub fn reverse(&self, name: &str, args: &[&str]) -> Result<String, ReverseError> {
        let pattern = self
            .names
            .get(name)
            .ok_or_else(|| ReverseError::UnknownHandler(name.to_string()))?;

        if let Some(bad) = args.iter().find(|a| a.is_empty() || a.contains('/')) {
            return Err(ReverseError::InvalidArgument {
                name: name.to_string(),
                value: (*bad).to_string(),
            });
        }

        pattern
            .format(args)
            .ok_or_else(|| ReverseError::ArgumentMismatch {
                name: name.to_string(),
                expected: pattern.arity(),
                given: args.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::http::{Request, RequestBuilder, Response};

    struct Echo(&'static str);

    impl Handler for Echo {
        fn get(&self, _request: &mut Request, args: &[String]) -> Result<Response> {
            Ok(Response::new(format!("{}:{}", self.0, args.join(","))))
        }
    }

    fn body_of(router: &Router, path: &str) -> Option<String> {
        let (handler, args) = router.resolve(path)?;
        let mut request = RequestBuilder::get(path).build().unwrap();
        Some(handler.get(&mut request, &args).unwrap().text())
    }

    fn router() -> Router {
        let mut router = Router::new();
        router
            .register(Route::new("/metal/_/food/_/", Echo("metal")).named("metal"))
            .unwrap();
        router
            .register(Route::new("/golden/corn/", Echo("corn")).named("corn"))
            .unwrap();
        router.register(Route::new("/_/", Echo("any"))).unwrap();
        router
    }

    #[test]
    fn test_resolve_with_captures() {
        let router = router();
        assert_eq!(
            body_of(&router, "/metal/gold/food/apple/").as_deref(),
            Some("metal:gold,apple")
        );
        assert_eq!(body_of(&router, "/golden/corn/").as_deref(), Some("corn:"));
        assert!(router.resolve("/golden/corn").is_none());
        assert!(router.resolve("/nowhere/at/all/").is_none());
    }

    #[test]
    fn test_first_registered_wins() {
        let mut router = Router::new();
        router.register(Route::new("/_/", Echo("first"))).unwrap();
        router.register(Route::new("/fixed/", Echo("second"))).unwrap();
        assert_eq!(body_of(&router, "/fixed/").as_deref(), Some("first:fixed"));
        assert_eq!(router.len(), 2);
    }

    #[test]
    fn test_reverse_round_trip() {
        let router = router();
        let path = router.reverse("metal", &["gold", "apple"]).unwrap();
        assert_eq!(path, "/metal/gold/food/apple/");
        let (_, captures) = router.resolve(&path).unwrap();
        assert_eq!(captures, vec!["gold", "apple"]);

        assert_eq!(router.reverse("corn", &[]).unwrap(), "/golden/corn/");
    }

    #[test]
    fn test_reverse_errors() {
        let router = router();
        assert_eq!(
            router.reverse("missing", &[]),
            Err(ReverseError::UnknownHandler("missing".to_string()))
        );
        assert_eq!(
            router.reverse("metal", &["gold"]),
            Err(ReverseError::ArgumentMismatch {
                name: "metal".to_string(),
                expected: 2,
                given: 1,
            })
        );
        assert!(matches!(
            router.reverse("metal", &["a/b", "c"]),
            Err(ReverseError::InvalidArgument { .. })
        ));
        assert!(matches!(
            router.reverse("metal", &["", "c"]),
            Err(ReverseError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_duplicate_name_fails_fast() {
        let mut router = router();
        let err = router
            .register(Route::new("/other/", Echo("other")).named("corn"))
            .unwrap_err();
        assert_eq!(err, SetupError::DuplicateRouteName("corn".to_string()));
        assert_eq!(router.len(), 3);
        assert_eq!(router.reverse("corn", &[]).unwrap(), "/golden/corn/");
    }
}
