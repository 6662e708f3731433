//! URL pattern compiler
//!
//! A template such as `/metal/_/food/_/` is split on `/` into segments. A segment
//! made of the single character `_` is a capture placeholder; every other segment
//! is matched literally, underscores included.

const PLACEHOLDER: &str = "_";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Capture,
}

/// Compiled URL template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlPattern {
    template: String,
    segments: Vec<Segment>,
}

impl UrlPattern {
    /// Compile a template. Compilation cannot fail.
    pub fn compile(template: &str) -> Self {
        let segments = template
            .split('/')
            .map(|s| {
                if s == PLACEHOLDER {
                    Segment::Capture
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();

        Self {
            template: template.to_string(),
            segments,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Number of capture slots
    pub fn arity(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Capture))
            .count()
    }

    /// Match the whole path, returning captures left to right
    pub fn captures(&self, path: &str) -> Option<Vec<String>> {
        let mut parts = path.split('/');
        let mut captures = Vec::new();

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Capture if part.is_empty() => return None,
                Segment::Capture => captures.push(part.to_string()),
            }
        }

        // Anything left over means the path is longer than the template
        if parts.next().is_some() {
            return None;
        }
        Some(captures)
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.captures(path).is_some()
    }

    /// Substitute arguments into the capture slots.
    ///
    /// Returns `None` when the argument count differs from the arity.
    pub fn format(&self, args: &[&str]) -> Option<String> {
        if args.len() != self.arity() {
            return None;
        }

        let mut args = args.iter();
        let parts: Vec<&str> = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(lit) => lit.as_str(),
                Segment::Capture => args.next().copied().unwrap_or_default(),
            })
            .collect();
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_pattern() {
        let pattern = UrlPattern::compile("/golden/corn/");
        assert_eq!(pattern.arity(), 0);
        assert_eq!(pattern.captures("/golden/corn/"), Some(vec![]));
        assert!(!pattern.is_match("/golden/corn"));
        assert!(!pattern.is_match("/golden/corn/extra"));
        assert!(!pattern.is_match("/golden/corn//"));
    }

    #[test]
    fn test_captures_in_order() {
        let pattern = UrlPattern::compile("/metal/_/food/_/");
        assert_eq!(pattern.arity(), 2);
        assert_eq!(
            pattern.captures("/metal/gold/food/apple/"),
            Some(vec!["gold".to_string(), "apple".to_string()])
        );
    }

    #[test]
    fn test_capture_is_single_segment() {
        let pattern = UrlPattern::compile("/test/_/");
        assert!(!pattern.is_match("/test/a/b/"));
        assert!(!pattern.is_match("/test//"));
        assert!(pattern.is_match("/test/a.b-c/"));
    }

    #[test]
    fn test_underscore_inside_segment_is_literal() {
        let pattern = UrlPattern::compile("/my_page/_/");
        assert_eq!(pattern.arity(), 1);
        assert_eq!(pattern.captures("/my_page/1/"), Some(vec!["1".to_string()]));
        assert!(!pattern.is_match("/myXpage/1/"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let pattern = UrlPattern::compile("/a.b/(c)/");
        assert!(pattern.is_match("/a.b/(c)/"));
        assert!(!pattern.is_match("/axb/(c)/"));
    }

    #[test]
    fn test_format() {
        let pattern = UrlPattern::compile("/metal/_/food/_/");
        assert_eq!(
            pattern.format(&["gold", "apple"]).as_deref(),
            Some("/metal/gold/food/apple/")
        );
        assert_eq!(pattern.format(&["gold"]), None);

        let formatted = pattern.format(&["silver", "pear"]).unwrap();
        assert!(pattern.is_match(&formatted));
    }
}
