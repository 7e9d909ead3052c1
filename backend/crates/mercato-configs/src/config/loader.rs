use super::types::ServerConfig;
use std::fs;
use std::path::Path;

const VALID_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
const VALID_FORMATS: [&str; 3] = ["compact", "pretty", "json"];
const VALID_BACKENDS: [&str; 2] = ["memory", "rocksdb"];

impl ServerConfig {
    /// Load configuration from a TOML file
    ///
    /// Note: Environment overrides are applied separately via `apply_env_overrides()`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: ServerConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults with a warning.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            log::warn!(
                "Config file '{}' not found, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// Apply `MERCATO_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        self.apply_overrides_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (the process environment in
    /// production, a map in tests).
    pub fn apply_overrides_with<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("MERCATO_SERVER_HOST") {
            self.server.host = host;
        }

        if let Some(port_str) = lookup("MERCATO_SERVER_PORT") {
            self.server.port = port_str
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid MERCATO_SERVER_PORT value: {}", port_str))?;
        }

        if let Some(level) = lookup("MERCATO_LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }

        if let Some(backend) = lookup("MERCATO_STORAGE_BACKEND") {
            self.storage.backend = backend.to_lowercase();
        }

        if let Some(path) = lookup("MERCATO_DATA_PATH") {
            self.storage.data_path = path;
        }

        Ok(())
    }

    /// Validate configuration. Call this after applying environment overrides.
    pub fn finalize(&mut self) -> anyhow::Result<()> {
        self.storage.data_path = self.storage.data_path.trim_end_matches('/').to_string();
        if self.storage.data_path.is_empty() {
            self.storage.data_path = "/".to_string();
        }
        self.validate()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if !VALID_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                VALID_LEVELS.join(", ")
            ));
        }

        if !VALID_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                VALID_FORMATS.join(", ")
            ));
        }

        for (target, level) in &self.logging.targets {
            if !VALID_LEVELS.contains(&level.as_str()) {
                return Err(anyhow::anyhow!(
                    "Invalid log level '{}' for target '{}'. Must be one of: {}",
                    level,
                    target,
                    VALID_LEVELS.join(", ")
                ));
            }
        }

        if !VALID_BACKENDS.contains(&self.storage.backend.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid storage backend '{}'. Must be one of: {}",
                self.storage.backend,
                VALID_BACKENDS.join(", ")
            ));
        }

        if self.limits.max_body_size == 0 {
            return Err(anyhow::anyhow!("max_body_size cannot be 0"));
        }

        if self.limits.max_query_limit == 0 {
            return Err(anyhow::anyhow!("max_query_limit cannot be 0"));
        }

        if self.limits.default_query_limit > self.limits.max_query_limit {
            return Err(anyhow::anyhow!(
                "default_query_limit ({}) cannot exceed max_query_limit ({})",
                self.limits.default_query_limit,
                self.limits.max_query_limit
            ));
        }

        Ok(())
    }
}
