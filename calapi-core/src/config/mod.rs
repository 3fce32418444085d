//! Configuration types for calapi.

mod provider;
mod server;
mod source;

pub use provider::{ConfigProvider, FileConfigProvider, StaticConfig, find_config_file};
pub use server::{DEFAULT_FETCH_TIMEOUT, DEFAULT_REFRESH_INTERVAL, ServerConfig};
pub use source::{CalendarSource, SourceKind};
