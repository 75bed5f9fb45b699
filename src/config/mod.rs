// Configuration module entry point
// Loads settings from config file, environment, and coded defaults

mod types;

use std::net::SocketAddr;

// Re-export public types
pub use types::{
    Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig, StaticConfig,
    StorageConfig,
};

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("SERVER"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8081)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("http.enable_cors", true)?
            .set_default("http.default_content_type", "text/html; charset=utf-8")?
            .set_default("http.max_body_size", 52_428_800)? // 50MB
            .set_default("static.root", ".")?
            .set_default("static.index_files", vec!["index.html".to_string()])?
            .set_default("storage.data_dir", "data")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.request_timeout", 30)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
pub(crate) fn test_config(workspace: &std::path::Path) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            workers: None,
        },
        logging: LoggingConfig {
            level: "info".to_string(),
            access_log: false,
            access_log_format: "combined".to_string(),
            access_log_file: None,
            error_log_file: None,
        },
        http: HttpConfig {
            enable_cors: true,
            default_content_type: "text/html; charset=utf-8".to_string(),
            max_body_size: 52_428_800,
        },
        static_files: StaticConfig {
            root: workspace.display().to_string(),
            index_files: vec!["index.html".to_string()],
        },
        storage: StorageConfig {
            data_dir: workspace.join("data").display().to_string(),
        },
        performance: PerformanceConfig {
            keep_alive_timeout: 75,
            request_timeout: 30,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_config_file() {
        let cfg = Config::load_from("definitely-not-a-config-file")
            .expect("defaults should satisfy the config schema");
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 8081);
        assert!(cfg.http.enable_cors);
        assert_eq!(cfg.storage.data_dir, "data");
        assert_eq!(cfg.static_files.index_files, vec!["index.html"]);
    }

    #[test]
    fn test_socket_addr() {
        let cfg = Config::load_from("definitely-not-a-config-file").unwrap();
        let addr = cfg.socket_addr().unwrap();
        assert_eq!(addr.port(), 8081);
        assert!(addr.ip().is_loopback());
    }
}
