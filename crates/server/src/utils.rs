use clap::Parser;
use fern::{
    colors::{Color, ColoredLevelConfig},
    Dispatch,
};
use log::LevelFilter;
use std::{env, time::Duration};
use time::{format_description::well_known::Iso8601, OffsetDateTime};
use weather_search_core::{
    find_config_file, get_xdg_data_dir, load_config, ConfigSource, DEFAULT_PORT,
    DEFAULT_WEATHER_TTL_SECS,
};

use crate::{
    MissingWeather, SearchSettings, DEFAULT_BATCH_CONCURRENCY, DEFAULT_CACHE_CAPACITY,
    DEFAULT_FETCH_TIMEOUT, OPEN_METEO_URL,
};

#[derive(Parser, Clone, Debug, serde::Deserialize, Default)]
#[command(
    author,
    version,
    about = "Weather Search - property search filtered by live weather"
)]
pub struct Cli {
    /// Path to config file (TOML format)
    /// Searched in order: this flag, $WEATHER_SEARCH_CONFIG, ./weather-search.toml,
    /// $XDG_CONFIG_HOME/weather-search/weather-search.toml, /etc/weather-search/weather-search.toml
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "WEATHER_SEARCH_LEVEL")]
    pub level: Option<String>,

    /// Host to listen on (use 0.0.0.0 for all interfaces)
    #[arg(long, env = "WEATHER_SEARCH_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "WEATHER_SEARCH_PORT")]
    pub port: Option<u16>,

    /// Browser origin allowed by CORS, any origin when unset
    #[arg(short, long, env = "WEATHER_SEARCH_FRONTEND_URL")]
    pub frontend_url: Option<String>,

    /// Directory holding the property database
    #[arg(short, long, env = "WEATHER_SEARCH_DB_DIR")]
    pub db_dir: Option<String>,

    /// JSON array of properties loaded when the database is empty
    #[arg(short, long, env = "WEATHER_SEARCH_SEED_FILE")]
    pub seed_file: Option<String>,

    /// Base url of the Open-Meteo forecast endpoint
    #[arg(long, env = "WEATHER_SEARCH_WEATHER_URL")]
    pub weather_url: Option<String>,

    /// Seconds a fetched reading stays cached
    #[arg(long, env = "WEATHER_SEARCH_WEATHER_TTL_SECS")]
    pub weather_ttl_secs: Option<u64>,

    /// Seconds before an upstream weather request is abandoned
    #[arg(long, env = "WEATHER_SEARCH_WEATHER_TIMEOUT_SECS")]
    pub weather_timeout_secs: Option<u64>,

    /// Upstream weather requests allowed in flight per batch
    #[arg(long, env = "WEATHER_SEARCH_WEATHER_CONCURRENCY")]
    pub weather_concurrency: Option<usize>,

    /// Most readings held in the weather cache
    #[arg(long, env = "WEATHER_SEARCH_WEATHER_CACHE_CAPACITY")]
    pub weather_cache_capacity: Option<usize>,

    /// Keep (include) or drop (exclude) properties whose weather is unknown
    #[arg(long, env = "WEATHER_SEARCH_ON_MISSING_WEATHER")]
    pub on_missing_weather: Option<MissingWeather>,
}

impl Cli {
    /// Get the effective configuration value with defaults
    pub fn host(&self) -> String {
        self.host.clone().unwrap_or_else(|| "127.0.0.1".to_string())
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn db_dir(&self) -> String {
        self.db_dir.clone().unwrap_or_else(|| {
            get_xdg_data_dir()
                .join("data")
                .to_string_lossy()
                .into_owned()
        })
    }

    pub fn weather_url(&self) -> String {
        self.weather_url
            .clone()
            .unwrap_or_else(|| OPEN_METEO_URL.to_string())
    }

    pub fn weather_ttl(&self) -> time::Duration {
        let secs = self.weather_ttl_secs.unwrap_or(DEFAULT_WEATHER_TTL_SECS);
        time::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
    }

    pub fn weather_timeout(&self) -> Duration {
        self.weather_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_FETCH_TIMEOUT)
    }

    pub fn weather_concurrency(&self) -> usize {
        self.weather_concurrency
            .unwrap_or(DEFAULT_BATCH_CONCURRENCY)
            .max(1)
    }

    pub fn weather_cache_capacity(&self) -> usize {
        self.weather_cache_capacity
            .unwrap_or(DEFAULT_CACHE_CAPACITY)
            .max(1)
    }

    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            on_missing_weather: self.on_missing_weather.unwrap_or_default(),
            ..Default::default()
        }
    }
}

/// Load configuration from CLI args, config file, and environment
pub fn get_config_info() -> Cli {
    let cli_args = Cli::parse();

    let source = if let Some(ref path) = cli_args.config {
        ConfigSource::Explicit(path.into())
    } else {
        find_config_file("WEATHER_SEARCH_CONFIG", "weather-search.toml")
    };

    let file_config: Cli = match load_config(&source) {
        Ok(config) => config,
        Err(e) => {
            // logger is not up yet
            eprintln!("ignoring config file: {}", e);
            Cli::default()
        }
    };

    merge_config(cli_args, file_config)
}

/// CLI args (and env vars, handled by clap) win over the config file
pub fn merge_config(cli_args: Cli, file_config: Cli) -> Cli {
    Cli {
        config: cli_args.config,
        level: cli_args.level.or(file_config.level),
        host: cli_args.host.or(file_config.host),
        port: cli_args.port.or(file_config.port),
        frontend_url: cli_args.frontend_url.or(file_config.frontend_url),
        db_dir: cli_args.db_dir.or(file_config.db_dir),
        seed_file: cli_args.seed_file.or(file_config.seed_file),
        weather_url: cli_args.weather_url.or(file_config.weather_url),
        weather_ttl_secs: cli_args.weather_ttl_secs.or(file_config.weather_ttl_secs),
        weather_timeout_secs: cli_args
            .weather_timeout_secs
            .or(file_config.weather_timeout_secs),
        weather_concurrency: cli_args
            .weather_concurrency
            .or(file_config.weather_concurrency),
        weather_cache_capacity: cli_args
            .weather_cache_capacity
            .or(file_config.weather_cache_capacity),
        on_missing_weather: cli_args
            .on_missing_weather
            .or(file_config.on_missing_weather),
    }
}

pub fn get_log_level(cli: &Cli) -> LevelFilter {
    let level_str = cli
        .level
        .clone()
        .or_else(|| env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());

    match level_str.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

pub fn setup_logger() -> Dispatch {
    let colors = ColoredLevelConfig::new()
        .trace(Color::White)
        .debug(Color::Cyan)
        .info(Color::Blue)
        .warn(Color::Yellow)
        .error(Color::Magenta);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            let now = OffsetDateTime::now_utc()
                .format(&Iso8601::DEFAULT)
                .unwrap_or_default();
            out.finish(format_args!(
                "[{} {}] {}: {}",
                now,
                colors.color(record.level()),
                record.target(),
                message
            ));
        })
        .chain(std::io::stdout())
}
