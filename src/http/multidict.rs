//! Ordered multi-valued map for query and form parameters

/// Map that keeps every `(key, value)` pair in insertion order
#[derive(Debug, Clone)]
pub struct MultiDict<V> {
    items: Vec<(String, V)>,
}

impl<V> MultiDict<V> {
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// First value stored under `key`
    pub fn get(&self, key: &str) -> Option<&V> {
        self.items.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Every value stored under `key`, in insertion order
    pub fn get_all(&self, key: &str) -> Vec<&V> {
        self.items
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v)
            .collect()
    }

    /// Append a pair; existing values for the key are kept
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        self.items.push((key.into(), value));
    }

    /// Remove all pairs for `key`. Returns false if there were none.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|(k, _)| k != key);
        self.items.len() != before
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.items.iter().any(|(k, _)| k == key)
    }

    /// Distinct keys in first-seen order
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for (k, _) in &self.items {
            if !keys.contains(&k.as_str()) {
                keys.push(k);
            }
        }
        keys
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: Self) {
        self.items.extend(other.items);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<V> Default for MultiDict<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for MultiDict<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

// Order-insensitive, multiplicity-sensitive
impl<V: PartialEq> PartialEq for MultiDict<V> {
    fn eq(&self, other: &Self) -> bool {
        if self.items.len() != other.items.len() {
            return false;
        }
        let mut remaining: Vec<&(String, V)> = other.items.iter().collect();
        for item in &self.items {
            match remaining.iter().position(|o| *o == item) {
                Some(idx) => {
                    remaining.swap_remove(idx);
                }
                None => return false,
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MultiDict<&'static str> {
        [("abc", "def"), ("123", "456"), ("abc", "ghi")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_get_returns_first_value() {
        let dict = sample();
        assert_eq!(dict.get("abc"), Some(&"def"));
        assert_eq!(dict.get("missing"), None);
    }

    #[test]
    fn test_get_all() {
        let dict = sample();
        assert_eq!(dict.get_all("abc"), vec![&"def", &"ghi"]);
        assert!(dict.get_all("missing").is_empty());
    }

    #[test]
    fn test_insert_and_remove() {
        let mut dict = sample();
        dict.insert("abc", "jkl");
        assert_eq!(dict.get_all("abc").len(), 3);

        assert!(dict.remove("abc"));
        assert!(!dict.contains_key("abc"));
        assert!(!dict.remove("abc"));
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_keys_unique_in_order() {
        assert_eq!(sample().keys(), vec!["abc", "123"]);
    }

    #[test]
    fn test_equality_ignores_order() {
        let other: MultiDict<&str> = [("abc", "ghi"), ("abc", "def"), ("123", "456")]
            .into_iter()
            .collect();
        assert_eq!(sample(), other);

        let fewer: MultiDict<&str> = [("abc", "def"), ("123", "456"), ("123", "456")]
            .into_iter()
            .collect();
        assert_ne!(sample(), fewer);
    }

    #[test]
    fn test_extend_and_clear() {
        let mut dict = sample();
        dict.extend(sample());
        assert_eq!(dict.len(), 6);
        dict.clear();
        assert!(dict.is_empty());
    }
}
