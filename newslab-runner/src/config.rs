//! Pipeline configuration.
//!
//! Everything a run needs is a field of `PipelineConfig`. A TOML file may set
//! any subset of it; the defaults reproduce the stock acquisition settings
//! (50 pages × 50 items, 0.3 s between requests, 3 retries, `hs300`, 3000
//! daily bars, 1-bar horizon, 15:00 close, 30 min latency).

use chrono::{NaiveTime, TimeDelta};
use newslab_core::align::AlignParams;
use newslab_core::data::{IndexListing, ProxySettings, RetryPolicy, TransportConfig};
use newslab_core::news::ChainSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::store::DataLayout;

/// Upper bound on `align.delay_minutes`: one week.
pub const MAX_DELAY_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub fetch: FetchConfig,
    pub proxy: ProxySettings,
    pub universe: UniverseConfig,
    pub prices: PricesConfig,
    pub align: AlignConfig,
}

/// News paging and the shared retry/checkpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    pub max_pages: u32,
    pub page_size: u32,
    /// Pause after each non-empty page; also the retry backoff base.
    pub sleep_secs: f64,
    pub retries: u32,
    /// Refetch tickers whose per-ticker file already exists.
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UniverseConfig {
    pub node: String,
    pub page_size: u32,
    pub page_pause_secs: f64,
    pub retry_pause_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PricesConfig {
    pub datalen: u32,
    /// Pause between tickers.
    pub sleep_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlignConfig {
    pub horizon: usize,
    /// `HH:MM`, exchange local time.
    pub session_close: String,
    pub delay_minutes: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            fetch: FetchConfig::default(),
            proxy: ProxySettings::default(),
            universe: UniverseConfig::default(),
            prices: PricesConfig::default(),
            align: AlignConfig::default(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_pages: 50,
            page_size: 50,
            sleep_secs: 0.3,
            retries: 3,
            force: false,
        }
    }
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            node: "hs300".into(),
            page_size: 80,
            page_pause_secs: 0.2,
            retry_pause_secs: 1.0,
        }
    }
}

impl Default for PricesConfig {
    fn default() -> Self {
        Self {
            datalen: 3000,
            sleep_secs: 0.25,
        }
    }
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            horizon: 1,
            session_close: "15:00".into(),
            delay_minutes: 30,
        }
    }
}

fn seconds(field: &'static str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|e| ConfigError::Invalid {
        field,
        reason: format!("{value}: {e}"),
    })
}

/// `HH:MM` or `HH:MM:SS`.
pub fn parse_session_close(raw: &str) -> Result<NaiveTime, ConfigError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|e| ConfigError::Invalid {
            field: "align.session_close",
            reason: format!("{raw:?}: {e}"),
        })
}

impl PipelineConfig {
    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse from a TOML string and validate.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "fetch.page_size",
                reason: "must be positive".into(),
            });
        }
        if self.universe.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "universe.page_size",
                reason: "must be positive".into(),
            });
        }
        if self.universe.node.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "universe.node",
                reason: "must not be blank".into(),
            });
        }
        if self.align.horizon == 0 {
            return Err(ConfigError::Invalid {
                field: "align.horizon",
                reason: "must be at least one bar".into(),
            });
        }
        if !(0..=MAX_DELAY_MINUTES).contains(&self.align.delay_minutes) {
            return Err(ConfigError::Invalid {
                field: "align.delay_minutes",
                reason: format!("must be between 0 and {MAX_DELAY_MINUTES}"),
            });
        }
        seconds("fetch.sleep_secs", self.fetch.sleep_secs)?;
        seconds("prices.sleep_secs", self.prices.sleep_secs)?;
        seconds("universe.page_pause_secs", self.universe.page_pause_secs)?;
        seconds("universe.retry_pause_secs", self.universe.retry_pause_secs)?;
        parse_session_close(&self.align.session_close)?;
        Ok(())
    }

    pub fn layout(&self) -> DataLayout {
        DataLayout::new(&self.data_dir)
    }

    /// Transport for this run; the proxy falls back to the environment.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig::new(self.proxy.clone())
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy, ConfigError> {
        Ok(RetryPolicy::new(
            self.fetch.retries,
            seconds("fetch.sleep_secs", self.fetch.sleep_secs)?,
        ))
    }

    pub fn chain_settings(&self) -> Result<ChainSettings, ConfigError> {
        Ok(ChainSettings {
            max_pages: self.fetch.max_pages,
            page_sleep: seconds("fetch.sleep_secs", self.fetch.sleep_secs)?,
            retry: self.retry_policy()?,
        })
    }

    pub fn index_listing(&self) -> Result<IndexListing, ConfigError> {
        Ok(IndexListing {
            node: self.universe.node.trim().to_string(),
            page_size: self.universe.page_size,
            page_pause: seconds("universe.page_pause_secs", self.universe.page_pause_secs)?,
            retry_pause: seconds("universe.retry_pause_secs", self.universe.retry_pause_secs)?,
        })
    }

    pub fn ticker_pause(&self) -> Result<Duration, ConfigError> {
        seconds("prices.sleep_secs", self.prices.sleep_secs)
    }

    pub fn session_close(&self) -> Result<NaiveTime, ConfigError> {
        parse_session_close(&self.align.session_close)
    }

    pub fn align_params(&self) -> Result<AlignParams, ConfigError> {
        let latency = TimeDelta::try_minutes(self.align.delay_minutes).ok_or_else(|| {
            ConfigError::Invalid {
                field: "align.delay_minutes",
                reason: "out of range".into(),
            }
        })?;
        Ok(AlignParams {
            horizon: self.align.horizon,
            session_close: self.session_close()?,
            latency,
        })
    }
}
