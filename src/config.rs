use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use config::{Config, File};
use serde::Deserialize;
use url::Url;

use crate::weather::OpenWeatherSettings;

const DEFAULT_CONFIG_PATH: &str = "settings.yml";
const APP_PORT_ENV: &str = "APP_PORT";
const DATABASE_URL_ENV: &str = "DATABASE_URL";
const REDIS_URL_ENV: &str = "REDIS_URL";
const WEATHER_API_KEY_ENV: &str = "WEATHER_API_KEY";

const DEFAULT_WEATHER_API_URL: &str = "https://api.openweathermap.org";

pub struct Settings {
    pub port: u16,
    /// Absent means records live in process memory
    pub database_url: Option<Url>,
    /// Absent means the cache lives in process memory
    pub redis_url: Option<Url>,
    pub weather: OpenWeatherSettings,
    pub cache_timeout: Duration,
    pub rate_limit: RateLimitSettings,
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitSettings {
    pub window: Duration,
    pub max_requests: u32,
}

#[derive(Deserialize)]
struct DefaultConfig {
    app_port: u16,
    db_name: Option<String>,
    db_host: Option<String>,
    db_port: Option<u16>,
    db_user: Option<String>,
    db_pass: Option<String>,
    redis_url: Option<String>,
    weather_api_url: String,
    weather_api_key: Option<String>,
    weather_units: String,
    weather_timeout_secs: u64,
    cache_timeout_ms: u64,
    rate_limit_window_secs: u64,
    rate_limit_max_requests: u32,
}

impl DefaultConfig {
    fn database_url(&self) -> Result<Option<Url>> {
        let (Some(name), Some(host), Some(port), Some(user), Some(pass)) = (
            &self.db_name,
            &self.db_host,
            self.db_port,
            &self.db_user,
            &self.db_pass,
        ) else {
            return Ok(None);
        };

        let url_str = format!("postgres://{user}:{pass}@{host}:{port}/{name}");
        Ok(Some(Url::parse(&url_str)?))
    }
}

fn load_default_config(path: &str) -> Result<DefaultConfig> {
    let settings = Config::builder()
        .set_default("app_port", 3033)?
        .set_default("weather_api_url", DEFAULT_WEATHER_API_URL)?
        .set_default("weather_units", "metric")?
        .set_default("weather_timeout_secs", 10)?
        .set_default("cache_timeout_ms", 500)?
        .set_default("rate_limit_window_secs", 15 * 60)?
        .set_default("rate_limit_max_requests", 3)?
        .add_source(File::with_name(path).required(false))
        .build()
        .map_err(|_| anyhow!("Failed to read config file"))?;

    settings
        .try_deserialize::<DefaultConfig>()
        .map_err(|_| anyhow!("Failed to deserialize config file"))
}

/// Try to parse env variable. If it's not set, return None. If it's invalid, treat it as an error.
fn try_from_env<T, F>(env_var: &str, f: F) -> Result<Option<T>>
where
    F: FnOnce(String) -> Result<T>,
{
    match std::env::var(env_var) {
        Ok(raw) => {
            let val = f(raw).map_err(|_| anyhow!("Failed to parse {}", env_var))?;
            Ok(Some(val))
        }
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(_) => bail!("Could not read {env_var} from env"),
    }
}

fn parse_url(raw: String) -> Result<Url> {
    Url::parse(&raw).map_err(|e| e.into())
}

/// Load configuration from env with fallback to the default config file
pub fn load() -> Result<Settings> {
    load_from(DEFAULT_CONFIG_PATH)
}

pub fn load_from(path: &str) -> Result<Settings> {
    let port_opt: Option<u16> = try_from_env(APP_PORT_ENV, |env_str| {
        env_str.parse::<u16>().map_err(|e| e.into())
    })?;
    let database_url_opt = try_from_env(DATABASE_URL_ENV, parse_url)?;
    let redis_url_opt = try_from_env(REDIS_URL_ENV, parse_url)?;
    let api_key_opt = try_from_env(WEATHER_API_KEY_ENV, Ok)?;

    let config = load_default_config(path)?;

    let port = match port_opt {
        Some(val) => val,
        None => {
            tracing::warn!("{APP_PORT_ENV} is not set, using value from {path}");
            config.app_port
        }
    };

    let database_url = match database_url_opt {
        Some(url) => Some(url),
        None => {
            let url = config.database_url()?;
            if url.is_some() {
                tracing::warn!("{DATABASE_URL_ENV} is not set, using value from {path}");
            } else {
                tracing::warn!("no database configured, records are kept in memory");
            }
            url
        }
    };

    let redis_url = match redis_url_opt {
        Some(url) => Some(url),
        None => config
            .redis_url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .context("Failed to parse redis_url")?,
    };

    let api_key = match api_key_opt {
        Some(key) => key,
        None => {
            tracing::warn!("{WEATHER_API_KEY_ENV} is not set, using value from {path}");
            config
                .weather_api_key
                .clone()
                .with_context(|| format!("{WEATHER_API_KEY_ENV} is not set"))?
        }
    };

    let weather = OpenWeatherSettings {
        base_url: Url::parse(&config.weather_api_url).context("Failed to parse weather_api_url")?,
        api_key,
        units: config.weather_units.clone(),
        timeout: Duration::from_secs(config.weather_timeout_secs),
    };

    Ok(Settings {
        port,
        database_url,
        redis_url,
        weather,
        cache_timeout: Duration::from_millis(config.cache_timeout_ms),
        rate_limit: RateLimitSettings {
            window: Duration::from_secs(config.rate_limit_window_secs),
            max_requests: config.rate_limit_max_requests,
        },
    })
}
