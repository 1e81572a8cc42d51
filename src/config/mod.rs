use config::{Config, ConfigError};
use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use validator::Validate;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SOURCE_URLS: [&str; 2] = ["http://localhost:8888", "http://localhost:8889"];

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1, max = 65535))]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct LogConfig {
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_format() -> String {
    "pretty".to_string()
}

/// Backend sources, in the order their results are collected.
///
/// Entries are either a bare base URL or `id=base_url`.
#[derive(Debug, Deserialize, Clone, Validate)]
pub struct SourcesConfig {
    #[validate(length(min = 1))]
    pub urls: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct ClientConfig {
    #[validate(range(min = 1))]
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[validate(range(min = 1))]
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
}

fn default_cache_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub log: LogConfig,
    #[validate(nested)]
    pub sources: SourcesConfig,
    #[validate(nested)]
    pub client: ClientConfig,
    #[validate(nested)]
    pub cache: CacheConfig,
}

/// A configured backend: logical id plus the base URL requests are built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub id: String,
    pub base_url: String,
}

impl SourceDescriptor {
    pub fn new(id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into(),
        }
    }

    /// Parses one `sources.urls` entry. `position` is 1-based and names
    /// entries that carry no explicit id.
    pub fn parse(entry: &str, position: usize) -> Result<Self, ConfigError> {
        let entry = entry.trim();
        let (id, base_url) = match entry.split_once('=') {
            Some((id, url)) => (id.trim().to_string(), url.trim()),
            None => (format!("source-{position}"), entry),
        };

        if id.is_empty() {
            return Err(ConfigError::Message(format!(
                "Source entry '{entry}' has an empty id"
            )));
        }

        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Message(format!(
                "Source '{id}' base URL must start with http:// or https://, got '{base_url}'"
            )));
        }

        Ok(Self::new(id, base_url.trim_end_matches('/')))
    }
}

impl SourcesConfig {
    pub fn descriptors(&self) -> Result<Vec<SourceDescriptor>, ConfigError> {
        let descriptors = self
            .urls
            .iter()
            .enumerate()
            .map(|(index, entry)| SourceDescriptor::parse(entry, index + 1))
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen = HashSet::new();
        for descriptor in &descriptors {
            if !seen.insert(descriptor.id.as_str()) {
                return Err(ConfigError::Message(format!(
                    "Duplicate source id '{}'",
                    descriptor.id
                )));
            }
        }

        Ok(descriptors)
    }
}

fn parse_bool(value: &str) -> bool {
    let lower = value.to_lowercase();
    matches!(lower.as_str(), "true" | "1" | "yes" | "on")
}

fn parse_port(value: &str) -> Result<i64, ConfigError> {
    value.parse::<i64>().map_err(|e| {
        ConfigError::Message(format!(
            "Invalid port value '{}': {}. Port must be a number between 1 and 65535.",
            value, e
        ))
    })
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("log.level", "info")?
            .set_default("log.format", "pretty")?
            .set_default("sources.urls", DEFAULT_SOURCE_URLS.to_vec())?
            .set_default("client.max_attempts", i64::from(DEFAULT_MAX_ATTEMPTS))?
            .set_default("client.timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .set_default("cache.enabled", true)?
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.host", env::var("APP_SERVER__HOST").ok())?
            .set_override_option(
                "server.port",
                env::var("APP_SERVER__PORT")
                    .ok()
                    .map(|v| parse_port(&v))
                    .transpose()?,
            )?
            .set_override_option(
                "sources.urls",
                env::var("APP_SOURCES__URLS").ok().map(|v| parse_list(&v)),
            )?
            .set_override_option(
                "cache.enabled",
                env::var("APP_CACHE__ENABLED").ok().map(|v| parse_bool(&v)),
            )?
            .build()?;

        let config: AppConfig = s.try_deserialize()?;

        if let Err(e) = config.validate() {
            return Err(ConfigError::Message(format!("Validation error: {}", e)));
        }

        config.sources.descriptors()?;

        Ok(config)
    }

    /// Source descriptors in configured order. Already checked by `new`.
    pub fn source_descriptors(&self) -> Result<Vec<SourceDescriptor>, ConfigError> {
        self.sources.descriptors()
    }
}
