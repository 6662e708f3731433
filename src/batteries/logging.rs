//! Logger battery
//!
//! Publishes a named [`Logger`] in the service registry. The logger writes
//! through the framework log writer at DEBUG level in debug mode, INFO otherwise.

use crate::app::{Extension, Services};
use crate::logger::{self, Level};

pub const DEFAULT_SERVICE_NAME: &str = "logger";

/// Named logger with its own threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logger {
    name: String,
    level: Level,
}

impl Logger {
    pub fn new(name: &str, level: Level) -> Self {
        Self {
            name: name.to_string(),
            level,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn level(&self) -> Level {
        self.level
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.level
    }

    pub fn log(&self, level: Level, message: &str) {
        if self.enabled(level) {
            logger::emit(level, &self.name, message);
        }
    }

    pub fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(Level::Info, message);
    }

    pub fn warning(&self, message: &str) {
        self.log(Level::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }
}

pub struct LoggerExtension {
    name: String,
    service_name: String,
}

impl LoggerExtension {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
        }
    }

    /// Publish under a name other than `logger`
    #[must_use]
    pub fn service_name(mut self, service_name: &str) -> Self {
        self.service_name = service_name.to_string();
        self
    }
}

impl Extension for LoggerExtension {
    fn attach(&mut self, services: &mut Services, debug: bool) {
        let level = if debug { Level::Debug } else { Level::Info };
        services.insert(&self.service_name, Logger::new(&self.name, level));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Application;
    use crate::config::AppConfig;

    fn build(debug: bool, extension: LoggerExtension) -> Application {
        let config = AppConfig {
            debug,
            ..AppConfig::default()
        };
        let extension: Box<dyn Extension> = Box::new(extension);
        Application::new(config, Vec::new(), vec![extension]).unwrap()
    }

    #[test]
    fn test_level_follows_debug_flag() {
        let app = build(true, LoggerExtension::new("corn"));
        let logger = app.services().get::<Logger>("logger").unwrap();
        assert_eq!(logger.name(), "corn");
        assert_eq!(logger.level(), Level::Debug);
        assert!(logger.enabled(Level::Debug));

        let app = build(false, LoggerExtension::new("corn"));
        let logger = app.services().get::<Logger>("logger").unwrap();
        assert_eq!(logger.level(), Level::Info);
        assert!(!logger.enabled(Level::Debug));
        assert!(logger.enabled(Level::Error));
    }

    #[test]
    fn test_custom_service_name() {
        let app = build(false, LoggerExtension::new("corn").service_name("log"));
        assert!(app.services().get::<Logger>("log").is_some());
        assert!(app.services().get::<Logger>("logger").is_none());
    }
}
