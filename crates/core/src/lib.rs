//! Weather Search Core Library
//!
//! Shared pieces used by the search server:
//! - Configuration file discovery and loading (XDG-compliant)
//! - Filesystem helpers
//! - Application-wide defaults

mod config;
pub mod fs;

pub use config::{find_config_file, get_xdg_data_dir, load_config, ConfigError, ConfigSource};
pub use fs::{ensure_dir_exists, path_exists};

/// Application name used for XDG paths
pub const APP_NAME: &str = "weather-search";

/// Default HTTP port for the search server
pub const DEFAULT_PORT: u16 = 5000;

/// Default lifetime of a cached weather reading (1 hour)
pub const DEFAULT_WEATHER_TTL_SECS: u64 = 3600;
