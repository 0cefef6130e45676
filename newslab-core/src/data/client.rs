//! Document fetch over HTTP.
//!
//! `SourceClient` is the seam every source sits on: production code uses
//! `HttpSourceClient`, tests swap in scripted fakes. The transport is
//! described once by a `TransportConfig` built at start-up and handed to the
//! client by reference; nothing about it changes afterwards.

use super::error::FetchError;
use rand::seq::SliceRandom;
use reqwest::header::{CONNECTION, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Desktop browser user agents, one picked at random per request.
pub const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 12_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.4 Safari/605.1.15",
];

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Proxy endpoints per scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
}

impl ProxySettings {
    pub fn is_empty(&self) -> bool {
        self.http.is_none() && self.https.is_none()
    }

    /// Explicit settings win; with none given, fall back to the environment.
    pub fn resolve(explicit: ProxySettings) -> Self {
        if explicit.is_empty() {
            Self::from_vars(std::env::vars())
        } else {
            explicit
        }
    }

    /// Pick `HTTP_PROXY` / `HTTPS_PROXY` (any case) out of a variable list.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut settings = Self::default();
        for (key, value) in vars {
            if value.trim().is_empty() {
                continue;
            }
            match key.to_ascii_uppercase().as_str() {
                "HTTP_PROXY" => settings.http = Some(value),
                "HTTPS_PROXY" => settings.https = Some(value),
                _ => {}
            }
        }
        settings
    }
}

/// Process-wide transport description.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub proxy: ProxySettings,
    pub timeout: Duration,
    /// Certificate checks are off by default: the target networks sit behind
    /// intercepting proxies that re-sign TLS traffic.
    pub accept_invalid_certs: bool,
    pub user_agents: Vec<String>,
}

impl TransportConfig {
    /// Transport with the given explicit proxy (environment fallback applied).
    pub fn new(explicit_proxy: ProxySettings) -> Self {
        Self {
            proxy: ProxySettings::resolve(explicit_proxy),
            ..Self::default()
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            proxy: ProxySettings::default(),
            timeout: REQUEST_TIMEOUT,
            accept_invalid_certs: true,
            user_agents: USER_AGENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Fetches a document and hands back its decoded text or parsed JSON.
pub trait SourceClient {
    fn get_text(&self, url: &Url) -> Result<String, FetchError>;

    fn get_json(&self, url: &Url) -> Result<Value, FetchError> {
        let text = self.get_text(url)?;
        serde_json::from_str(text.trim()).map_err(|e| {
            FetchError::ResponseFormatChanged(format!("invalid JSON from {url}: {e}"))
        })
    }
}

/// Blocking HTTP client: one connection per request, randomized user agent.
pub struct HttpSourceClient {
    client: reqwest::blocking::Client,
    user_agents: Vec<String>,
}

impl HttpSourceClient {
    pub fn new(config: &TransportConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(0)
            .danger_accept_invalid_certs(config.accept_invalid_certs);

        // The environment was already consulted when the config was resolved.
        builder = builder.no_proxy();
        if let Some(http) = &config.proxy.http {
            builder = builder.proxy(reqwest::Proxy::http(http)?);
        }
        if let Some(https) = &config.proxy.https {
            builder = builder.proxy(reqwest::Proxy::https(https)?);
        }
        if !config.proxy.is_empty() {
            info!(proxy = ?config.proxy, "using proxy");
        }

        let user_agents = if config.user_agents.is_empty() {
            USER_AGENTS.iter().map(|s| s.to_string()).collect()
        } else {
            config.user_agents.clone()
        };

        Ok(Self {
            client: builder.build()?,
            user_agents,
        })
    }

    fn pick_user_agent(&self) -> &str {
        self.user_agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(USER_AGENTS[0])
    }
}

impl SourceClient for HttpSourceClient {
    fn get_text(&self, url: &Url) -> Result<String, FetchError> {
        debug!(%url, "GET");
        let resp = self
            .client
            .get(url.clone())
            .header(USER_AGENT, self.pick_user_agent())
            .header(CONNECTION, "close")
            .send()?
            .error_for_status()?;
        let body = resp.bytes()?;
        Ok(decode_lossy(&body))
    }
}

/// UTF-8 decode that drops invalid sequences instead of failing.
pub fn decode_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).replace(char::REPLACEMENT_CHARACTER, "")
}
