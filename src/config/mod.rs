//! Event store configuration.
//!
//! Loaded from YAML files and environment variables, then resolved into a
//! concrete store by `storage::connect`.

mod storage;

pub use storage::{StorageType, StoreConfig, StrategyType, WriteLockType};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "event-store.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "EVENT_STORE_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "EVENT_STORE";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "EVENT_STORE_LOG";

impl StoreConfig {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `event-store.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix, `__` separated
    pub fn load(path: Option<&str>) -> Result<Self, ::config::ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Parse configuration from a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        for key in [
            CONFIG_ENV_VAR,
            "EVENT_STORE__TYPE",
            "EVENT_STORE__URI",
            "EVENT_STORE__LOAD_BATCH_SIZE",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_load_defaults_without_sources() {
        clear_env();
        let config = StoreConfig::load(None).unwrap();
        assert_eq!(config.storage_type, StorageType::Sqlite);
        assert_eq!(config.uri, "sqlite::memory:");
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        clear_env();
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "type: mysql\nuri: mysql://root@localhost/events\nstrategy: single").unwrap();

        let config = StoreConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.storage_type, StorageType::Mysql);
        assert_eq!(config.strategy, StrategyType::Single);
        assert_eq!(config.event_streams_table, "event_streams");
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        clear_env();
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "uri: \"sqlite::memory:\"\nload_batch_size: 50").unwrap();

        std::env::set_var(CONFIG_ENV_VAR, file.path());
        std::env::set_var("EVENT_STORE__LOAD_BATCH_SIZE", "7");
        let config = StoreConfig::load(None);
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.uri, "sqlite::memory:");
        assert_eq!(config.load_batch_size, 7);
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_is_error() {
        clear_env();
        assert!(StoreConfig::load(Some("/nonexistent/event-store.yaml")).is_err());
    }

    #[test]
    fn test_from_yaml() {
        let config = StoreConfig::from_yaml("write_lock: metadata\nlock_timeout_secs: 5\n").unwrap();
        assert_eq!(config.write_lock, WriteLockType::Metadata);
        assert_eq!(config.lock_timeout_secs, 5);
    }
}
