// ⚙️ Configuration - fairsplit.toml + environment overrides
//
// Resolution order (later wins):
//   1. Built-in defaults
//   2. TOML file ($FAIRSPLIT_CONFIG, else ./fairsplit.toml if present)
//   3. DATABASE_URL environment variable (path to a SQLite database)

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "fairsplit.toml";
pub const DEFAULT_JSON_PATH: &str = "local_data.json";
pub const DEFAULT_LOG_FILTER: &str = "fair_split=info,warn";

pub const CONFIG_ENV: &str = "FAIRSPLIT_CONFIG";
pub const DATABASE_ENV: &str = "DATABASE_URL";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// JSON document store used when no database is configured
    pub json_path: PathBuf,
    /// SQLite database path; takes precedence over the JSON store
    pub database_path: Option<PathBuf>,
    /// tracing EnvFilter directive
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            json_path: PathBuf::from(DEFAULT_JSON_PATH),
            database_path: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Raw deserialization target for fairsplit.toml
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    storage: StorageSection,
    #[serde(default)]
    logging: LoggingSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct StorageSection {
    json_path: Option<PathBuf>,
    database_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoggingSection {
    filter: Option<String>,
}

impl Config {
    /// Parse TOML text on top of the defaults
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Config, ConfigError> {
        let file: ConfigFile = toml::from_str(text).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Config::default();
        if let Some(json_path) = file.storage.json_path {
            config.json_path = json_path;
        }
        config.database_path = file.storage.database_path;
        if let Some(filter) = file.logging.filter {
            config.log_filter = filter;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load a specific config file
    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&text, path)
    }

    /// Apply a DATABASE_URL-style override. Accepts a bare path or a
    /// `sqlite://` URL; an empty value is ignored.
    pub fn with_database_url(mut self, url: Option<&str>) -> Config {
        if let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) {
            let path = url
                .strip_prefix("sqlite://")
                .or_else(|| url.strip_prefix("sqlite:"))
                .unwrap_or(url);
            self.database_path = Some(PathBuf::from(path));
        }
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.json_path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError {
                field: "storage.json_path".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: "logging.filter".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

/// Load configuration from the environment and optional config file
pub fn load_config() -> Result<Config, ConfigError> {
    let base = match std::env::var_os(CONFIG_ENV) {
        // An explicitly named file must exist
        Some(path) => Config::from_file(Path::new(&path))?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                Config::from_file(default_path)?
            } else {
                Config::default()
            }
        }
    };

    let database_url = std::env::var(DATABASE_ENV).ok();
    Ok(base.with_database_url(database_url.as_deref()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Config, ConfigError> {
        Config::from_toml_str(text, Path::new("test.toml"))
    }

    #[test]
    fn defaults() {
        let config = Config::default();

        assert_eq!(config.json_path, PathBuf::from("local_data.json"));
        assert!(config.database_path.is_none());
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn empty_file_uses_defaults() {
        assert_eq!(parse("").unwrap(), Config::default());
    }

    #[test]
    fn full_file() {
        let config = parse(
            r#"
            [storage]
            json_path = "data/groups.json"
            database_path = "data/groups.db"

            [logging]
            filter = "fair_split=debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.json_path, PathBuf::from("data/groups.json"));
        assert_eq!(config.database_path, Some(PathBuf::from("data/groups.db")));
        assert_eq!(config.log_filter, "fair_split=debug");
    }

    #[test]
    fn unknown_key_is_a_parse_error() {
        let err = parse("[storage]\npostgres = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn empty_values_fail_validation() {
        let err = parse("[storage]\njson_path = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "storage.json_path"));

        let err = parse("[logging]\nfilter = \"  \"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn missing_file() {
        let err = Config::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn database_url_override() {
        let config = Config::default().with_database_url(Some("sqlite://groups.db"));
        assert_eq!(config.database_path, Some(PathBuf::from("groups.db")));

        let config = Config::default().with_database_url(Some("/tmp/fair.db"));
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/fair.db")));

        let config = Config::default().with_database_url(Some("  "));
        assert!(config.database_path.is_none());

        let config = Config::default().with_database_url(None);
        assert!(config.database_path.is_none());
    }
}
