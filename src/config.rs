use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::forecast::MAX_HORIZON_DAYS;

/// Default fiat currency for prices.
pub const DEFAULT_CURRENCY: &str = "usd";

/// Trailing window, in days, used for every trend view.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;

/// Longest trailing window a trend view may request.
pub const MAX_LOOKBACK_DAYS: u32 = 365;

/// Number of days the projector extrapolates past the lookback window.
pub const DEFAULT_HORIZON_DAYS: usize = 30;

/// File name used in the XDG config directory.
pub const CONFIG_FILE_NAME: &str = "coindash.toml";

/// Application configuration loaded from `$XDG_CONFIG_HOME/coindash.toml`
/// or `~/.config/coindash.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub defaults: DefaultsConfig,
    pub coingecko: CoinGeckoConfig,
    /// Coins shown on the portfolio view, in display order.
    ///
    /// When empty the built-in coin list is used.
    pub holdings: Vec<HoldingConfig>,
}

/// General defaults used when CLI flags are not provided.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub currency: Option<String>,
    pub lookback_days: Option<u32>,
    pub horizon_days: Option<usize>,
}

/// CoinGecko client configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CoinGeckoConfig {
    /// Demo API key, sent as `x-cg-demo-api-key`.
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Expiry for the memoized coin list and top-coins lookups.
    /// Unset means the values live for the whole process.
    pub reference_ttl_secs: Option<i64>,
}

/// One `[[holdings]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct HoldingConfig {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub amount: f64,
}

impl AppConfig {
    pub fn lookback_days(&self) -> u32 {
        self.defaults
            .lookback_days
            .unwrap_or(DEFAULT_LOOKBACK_DAYS)
    }

    pub fn horizon_days(&self) -> usize {
        self.defaults.horizon_days.unwrap_or(DEFAULT_HORIZON_DAYS)
    }

    /// Reject windows the CLI flags would not accept either.
    pub fn validate(&self) -> Result<()> {
        if let Some(days) = self.defaults.lookback_days
            && !(1..=MAX_LOOKBACK_DAYS).contains(&days)
        {
            return Err(Error::Config(format!(
                "defaults.lookback_days must be between 1 and {MAX_LOOKBACK_DAYS}, got {days}"
            )));
        }

        if let Some(days) = self.defaults.horizon_days
            && !(1..=MAX_HORIZON_DAYS).contains(&days)
        {
            return Err(Error::Config(format!(
                "defaults.horizon_days must be between 1 and {MAX_HORIZON_DAYS}, got {days}"
            )));
        }

        Ok(())
    }
}

/// Resolve the configuration file path based on XDG conventions.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config_home.trim().is_empty()
    {
        return Some(PathBuf::from(xdg_config_home).join(CONFIG_FILE_NAME));
    }

    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".config").join(CONFIG_FILE_NAME))
}

/// Load config from disk. Returns defaults when the file does not exist.
pub fn load() -> Result<AppConfig> {
    let Some(path) = config_path() else {
        return Ok(AppConfig::default());
    };

    match fs::read_to_string(&path) {
        Ok(raw) => from_file_contents(&path, &raw),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(err) => Err(read_config_error(&path, err)),
    }
}

/// Load config from an explicit path.
///
/// Unlike [`load`], this returns an error when the file is missing.
pub fn load_from_path(path: &Path) -> Result<AppConfig> {
    let raw = fs::read_to_string(path).map_err(|err| read_config_error(path, err))?;
    from_file_contents(path, &raw)
}

fn from_file_contents(path: &Path, raw: &str) -> Result<AppConfig> {
    let config = parse(raw).map_err(|err| parse_config_error(path, err))?;
    config.validate()?;
    Ok(config)
}

fn parse(raw: &str) -> std::result::Result<AppConfig, toml::de::Error> {
    toml::from_str(raw)
}

fn read_config_error(path: &Path, err: std::io::Error) -> Error {
    Error::Config(format!(
        "failed to read config file '{}': {}",
        path.display(),
        err
    ))
}

fn parse_config_error(path: &Path, err: toml::de::Error) -> Error {
    Error::Config(format!(
        "failed to parse config file '{}': {}",
        path.display(),
        err
    ))
}
