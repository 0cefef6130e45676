//! Structured fetch errors.
//!
//! Every source call funnels its failure into a `FetchError`. The retry
//! policy only looks at `is_transient()`: connection, protocol, TLS, timeout
//! and OS I/O failures are worth another attempt, a response whose shape we
//! do not recognise is not.

use std::error::Error as StdError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("TLS failure: {0}")]
    Tls(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    /// Whether another attempt at the same request may succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            FetchError::ResponseFormatChanged(_) | FetchError::InvalidRequest(_)
        )
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            return FetchError::Status {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            };
        }
        if e.is_builder() {
            return FetchError::InvalidRequest(e.to_string());
        }
        if e.is_timeout() {
            return FetchError::Timeout(e.to_string());
        }
        if mentions_tls(&e) {
            return FetchError::Tls(e.to_string());
        }
        if e.is_connect() {
            return FetchError::Connect(e.to_string());
        }
        if has_io_source(&e) {
            return FetchError::Io(e.to_string());
        }
        FetchError::Protocol(e.to_string())
    }
}

impl From<url::ParseError> for FetchError {
    fn from(e: url::ParseError) -> Self {
        FetchError::InvalidRequest(e.to_string())
    }
}

/// reqwest does not expose TLS failures as a kind, so inspect the chain.
fn mentions_tls(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        let msg = err.to_string().to_ascii_lowercase();
        if msg.contains("certificate") || msg.contains("tls") || msg.contains("ssl") {
            return true;
        }
        cur = err.source();
    }
    false
}

fn has_io_source(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.downcast_ref::<std::io::Error>().is_some() {
            return true;
        }
        cur = err.source();
    }
    false
}
