//! Service registry
//!
//! Values published by extensions at attach time, looked up by name and type.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type Service = Arc<dyn Any + Send + Sync>;

#[derive(Default, Clone)]
pub struct Services {
    entries: HashMap<String, Service>,
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `value` under `name`, replacing any earlier value
    pub fn insert<T: Any + Send + Sync>(&mut self, name: &str, value: T) {
        self.insert_shared(name, Arc::new(value));
    }

    pub fn insert_shared<T: Any + Send + Sync>(&mut self, name: &str, value: Arc<T>) {
        self.entries.insert(name.to_string(), value);
    }

    /// The service named `name`, if present and of type `T`
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.entries
            .get(name)
            .and_then(|service| Arc::clone(service).downcast::<T>().ok())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("Services").field("names", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_lookup() {
        let mut services = Services::new();
        services.insert("greeting", String::from("hello"));
        services.insert("answer", 42_u32);

        assert_eq!(services.get::<String>("greeting").as_deref().map(String::as_str), Some("hello"));
        assert_eq!(services.get::<u32>("answer").as_deref(), Some(&42));
        assert!(services.get::<u32>("greeting").is_none());
        assert!(services.get::<u32>("missing").is_none());
        assert_eq!(services.len(), 2);
    }

    #[test]
    fn test_replace() {
        let mut services = Services::new();
        services.insert("n", 1_i32);
        services.insert("n", 2_i32);
        assert_eq!(services.get::<i32>("n").as_deref(), Some(&2));
        assert!(services.contains("n"));
    }
}
