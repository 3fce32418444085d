//! Config providers: where the aggregation engine reads sources and rules from.
//!
//! The engine asks for sources and rules again on every refresh cycle, so a
//! provider must never cache them across reloads.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::de::DeserializeOwned;
use tracing::error;

use crate::config::server::{DEFAULT_FETCH_TIMEOUT, DEFAULT_REFRESH_INTERVAL, ServerConfig};
use crate::config::source::CalendarSource;
use crate::error::{CalApiError, CalApiResult};
use crate::rules::Rule;

const ENV_PREFIX: &str = "CALAPI";
const CONFIG_DIR_NAME: &str = "calendarapi";
const CONFIG_EXTENSIONS: [&str; 4] = ["yaml", "yml", "toml", "json"];

/// Supplies the ordered source list, the ordered rule list and timing settings.
pub trait ConfigProvider: Send + Sync {
    fn calendars(&self) -> Vec<CalendarSource>;
    fn rules(&self) -> Vec<Rule>;
    fn refresh_interval(&self) -> Duration;
    fn fetch_timeout(&self) -> Duration;
}

/// Reads the config file (plus `CALAPI_*` environment overrides) on every call.
#[derive(Debug, Clone)]
pub struct FileConfigProvider {
    path: PathBuf,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileConfigProvider { path: path.into() }
    }

    /// Use `explicit` if given, otherwise search the default locations.
    pub fn discover(explicit: Option<&Path>) -> CalApiResult<Self> {
        match explicit {
            Some(path) => Ok(Self::new(path)),
            None => find_config_file().map(Self::new).ok_or_else(|| {
                CalApiError::Config(
                    "No config file found. Pass --config or create ./config.yaml".into(),
                )
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> CalApiResult<Config> {
        Config::builder()
            .add_source(File::from(self.path.as_path()).required(true))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| CalApiError::Config(e.to_string()))
    }

    /// Deserialize one section, falling back to its default on any error.
    fn section<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let config = match self.load() {
            Ok(config) => config,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to read config file");
                return T::default();
            }
        };

        match config.get::<T>(key) {
            Ok(value) => value,
            Err(ConfigError::NotFound(_)) => T::default(),
            Err(e) => {
                error!(key, error = %e, "Failed to parse config section, using default");
                T::default()
            }
        }
    }

    /// The `server` section. Unlike the other sections, a broken file is an
    /// error here so that startup fails loudly.
    pub fn server(&self) -> CalApiResult<ServerConfig> {
        match self.load()?.get::<ServerConfig>("server") {
            Ok(server) => Ok(server),
            Err(ConfigError::NotFound(_)) => Ok(ServerConfig::default()),
            Err(e) => Err(CalApiError::Config(e.to_string())),
        }
    }
}

impl ConfigProvider for FileConfigProvider {
    fn calendars(&self) -> Vec<CalendarSource> {
        self.section("calendars")
    }

    fn rules(&self) -> Vec<Rule> {
        self.section("rules")
    }

    fn refresh_interval(&self) -> Duration {
        self.section::<ServerConfig>("server").refresh_interval()
    }

    fn fetch_timeout(&self) -> Duration {
        self.section::<ServerConfig>("server").fetch_timeout()
    }
}

/// In-memory configuration, for embedding the engine without a config file.
#[derive(Debug, Clone)]
pub struct StaticConfig {
    pub calendars: Vec<CalendarSource>,
    pub rules: Vec<Rule>,
    pub refresh_interval: Duration,
    pub fetch_timeout: Duration,
}

impl StaticConfig {
    pub fn new(calendars: Vec<CalendarSource>, rules: Vec<Rule>) -> Self {
        StaticConfig {
            calendars,
            rules,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl ConfigProvider for StaticConfig {
    fn calendars(&self) -> Vec<CalendarSource> {
        self.calendars.clone()
    }

    fn rules(&self) -> Vec<Rule> {
        self.rules.clone()
    }

    fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }
}

/// Search `.`, the user config dir and `/data` for `config.{yaml,yml,toml,json}`.
pub fn find_config_file() -> Option<PathBuf> {
    let mut dirs = vec![PathBuf::from(".")];
    if let Some(config_dir) = dirs::config_dir() {
        dirs.push(config_dir.join(CONFIG_DIR_NAME));
    }
    dirs.push(PathBuf::from("/data"));

    dirs.into_iter()
        .flat_map(|dir| {
            CONFIG_EXTENSIONS
                .iter()
                .map(move |ext| dir.join(format!("config.{ext}")))
        })
        .find(|candidate| candidate.is_file())
}
