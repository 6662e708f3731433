// Configuration module entry point
// Layered settings: file, then APP_* environment variables, then defaults

mod types;

use std::net::SocketAddr;
use std::path::Path;

pub use types::{AppConfig, Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// A missing file is fine; every key has a default. Environment variables
    /// use the `APP` prefix and `__` between section and key, e.g. `APP_SERVER__PORT`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .set_default("app.debug", false)?
            .set_default("app.static_prefix", "/static/")?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "Tokio-Hyper/1.0")?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Resolve a relative static root against the project directory
    pub fn resolve_static_root(&mut self, project_dir: &Path) {
        if let Some(root) = self.app.static_root.as_mut() {
            if Path::new(root.as_str()).is_relative() {
                *root = project_dir.join(root.as_str()).to_string_lossy().into_owned();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = Config::load_from("/nonexistent/config-file").unwrap();
        assert!(!config.app.debug);
        assert_eq!(config.app.static_prefix, "/static/");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.logging.access_log_format, "combined");
        assert_eq!(config.http.max_body_size, 10_485_760);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[app]\ndebug = true\nstatic_root = \"public\"\n\n[server]\nport = 9001"
        )
        .unwrap();

        let stem = dir.path().join("config");
        let mut config = Config::load_from(stem.to_str().unwrap()).unwrap();
        assert!(config.app.debug);
        assert_eq!(config.server.port, 9001);
        assert_eq!(config.server.host, "127.0.0.1");

        config.resolve_static_root(dir.path());
        let root = config.app.static_root.unwrap();
        assert_eq!(Path::new(&root), dir.path().join("public"));
    }

    #[test]
    fn test_socket_addr() {
        let config = Config::default();
        assert_eq!(
            config.get_socket_addr().unwrap(),
            "127.0.0.1:8000".parse().unwrap()
        );
    }
}
