use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use storage::config::{Config as StorageConfig, StoreType};

#[derive(Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "0.0.0.0".into(),
            port: 8080,
        }
    }
}

#[derive(Clone, Copy, Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    fn from_env(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directives
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    pub sentry_dsn: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: LogFormat::default(),
            sentry_dsn: None,
        }
    }
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Deserialize, Debug, Default)]
pub struct Config {
    #[serde(default)]
    pub listener: Listener,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub metrics: Option<MetricsConfig>,
    pub storage: Option<StorageConfig>,
    #[serde(default)]
    pub optimization: optimization::config::Config,
    #[serde(default)]
    pub api: api::Config,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }

    /// Reads the optional config file, applies environment overrides and
    /// validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Environment variables take precedence over values from the file.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.listener.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "PORT",
                value: port,
            })?;
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.logging.format = LogFormat::from_env(&format);
        }

        let storage_project_id = lookup("STORAGE_PROJECT_ID");
        let storage_credentials = lookup("STORAGE_CREDENTIALS");
        if let Some(bucket) = lookup("STORAGE_BUCKET_NAME") {
            self.storage = Some(StorageConfig {
                r#type: StoreType::Gcs {
                    bucket,
                    project_id: storage_project_id,
                    credentials: storage_credentials,
                },
            });
        } else if let Some(StorageConfig {
            r#type:
                StoreType::Gcs {
                    project_id,
                    credentials,
                    ..
                },
        }) = &mut self.storage
        {
            if storage_project_id.is_some() {
                *project_id = storage_project_id;
            }
            if storage_credentials.is_some() {
                *credentials = storage_credentials;
            }
        }

        if let Some(project_id) = lookup("PROJECT_ID") {
            self.optimization.project_id = Some(project_id);
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listener.port == 0 {
            return Err(ConfigError::Invalid("listener port must not be 0".into()));
        }
        if self.api.max_body_bytes == 0 {
            return Err(ConfigError::Invalid("max_body_bytes must not be 0".into()));
        }

        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid value {value:?} for environment variable {name}")]
    InvalidEnv { name: &'static str, value: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn full_config() {
        let yaml = r#"
            listener:
                host: 127.0.0.1
                port: 3000
            logging:
                level: debug
                format: json
                sentry_dsn: https://key@sentry.example.com/1
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            storage:
                type: filesystem
                base_dir: /var/lib/fleetroute
            optimization:
                endpoint: http://localhost:9000
                project_id: routing-project
            api:
                max_body_bytes: 1024
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        assert_eq!(
            config.listener,
            Listener {
                host: "127.0.0.1".into(),
                port: 3000
            }
        );
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(
            config.metrics,
            Some(MetricsConfig {
                statsd_host: "127.0.0.1".into(),
                statsd_port: 8125
            })
        );
        assert_eq!(
            config.storage.expect("storage config").r#type,
            StoreType::Filesystem {
                base_dir: "/var/lib/fleetroute".into()
            }
        );
        assert_eq!(config.optimization.endpoint.as_str(), "http://localhost:9000/");
        assert_eq!(config.api.max_body_bytes, 1024);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let tmp = write_tmp_file("{}");
        let config = Config::from_file(tmp.path()).expect("load config");

        assert_eq!(config.listener, Listener::default());
        assert_eq!(config.logging, LoggingConfig::default());
        assert!(config.metrics.is_none());
        assert!(config.storage.is_none());
        assert_eq!(config.api, api::Config::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_file() {
        let yaml = r#"
            listener:
                port: 3000
            storage:
                type: filesystem
                base_dir: /tmp/fleetroute
            optimization:
                project_id: from-file
            "#;
        let tmp = write_tmp_file(yaml);
        let mut config = Config::from_file(tmp.path()).expect("load config");

        config
            .apply_env(env(&[
                ("PORT", "9090"),
                ("LOG_LEVEL", "warn"),
                ("LOG_FORMAT", "JSON"),
                ("STORAGE_BUCKET_NAME", "routing-data"),
                ("STORAGE_PROJECT_ID", "storage-project"),
                ("PROJECT_ID", "routing-project"),
            ]))
            .expect("apply env");

        assert_eq!(config.listener.port, 9090);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(
            config.storage.expect("storage config").r#type,
            StoreType::Gcs {
                bucket: "routing-data".into(),
                project_id: Some("storage-project".into()),
                credentials: None,
            }
        );
        assert_eq!(
            config.optimization.project_id.as_deref(),
            Some("routing-project")
        );
    }

    #[test]
    fn env_updates_gcs_fields_from_file() {
        let yaml = r#"
            storage:
                type: gcs
                bucket: routing-data
                project_id: from-file
            "#;
        let tmp = write_tmp_file(yaml);
        let mut config = Config::from_file(tmp.path()).expect("load config");

        config
            .apply_env(env(&[("STORAGE_CREDENTIALS", "{\"type\": \"service_account\"}")]))
            .expect("apply env");

        assert_eq!(
            config.storage.expect("storage config").r#type,
            StoreType::Gcs {
                bucket: "routing-data".into(),
                project_id: Some("from-file".into()),
                credentials: Some("{\"type\": \"service_account\"}".into()),
            }
        );
    }

    #[test]
    fn unknown_log_format_falls_back_to_text() {
        let mut config = Config::default();
        config
            .apply_env(env(&[("LOG_FORMAT", "pretty")]))
            .expect("apply env");
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn invalid_port() {
        let mut config = Config::default();
        assert!(matches!(
            config.apply_env(env(&[("PORT", "http")])),
            Err(ConfigError::InvalidEnv { name: "PORT", .. })
        ));

        config.apply_env(env(&[("PORT", "0")])).expect("apply env");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_file() {
        assert!(matches!(
            Config::from_file(Path::new("/nonexistent/fleetroute.yaml")),
            Err(ConfigError::LoadError(_))
        ));
    }
}
