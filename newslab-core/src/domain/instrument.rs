use serde::{Deserialize, Serialize};

/// Exchange an A-share instrument is listed on.
///
/// Tickers carry the exchange as a suffix (`600036.SS`), while the Sina
/// endpoints address the same instrument by a lower-case prefix (`sh600036`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exchange {
    Shanghai,
    Shenzhen,
}

impl Exchange {
    /// Ticker suffix, including the dot.
    pub fn suffix(self) -> &'static str {
        match self {
            Exchange::Shanghai => ".SS",
            Exchange::Shenzhen => ".SZ",
        }
    }

    /// Native symbol prefix used by Sina.
    pub fn prefix(self) -> &'static str {
        match self {
            Exchange::Shanghai => "sh",
            Exchange::Shenzhen => "sz",
        }
    }

    /// Exchange of an exchange-qualified ticker. Anything not listed in
    /// Shanghai is addressed as Shenzhen.
    pub fn of_ticker(ticker: &str) -> Self {
        if ticker.ends_with(Exchange::Shanghai.suffix()) {
            Exchange::Shanghai
        } else {
            Exchange::Shenzhen
        }
    }

    /// Exchange for a native prefix; unknown prefixes yield `None`.
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix.to_ascii_lowercase().as_str() {
            "sh" => Some(Exchange::Shanghai),
            "sz" => Some(Exchange::Shenzhen),
            _ => None,
        }
    }
}

/// Numeric code of a ticker (the part before the first dot).
pub fn ticker_code(ticker: &str) -> &str {
    ticker.split('.').next().unwrap_or(ticker)
}

/// Normalize a native symbol (`sh600000`) into an exchange-qualified ticker
/// (`600000.SS`). Returns `None` for unknown prefixes or too-short symbols.
pub fn ticker_from_native(symbol: &str) -> Option<String> {
    if symbol.len() < 3 || !symbol.is_char_boundary(2) {
        return None;
    }
    let (prefix, code) = symbol.split_at(2);
    let exchange = Exchange::from_prefix(prefix)?;
    Some(format!("{code}{}", exchange.suffix()))
}

/// A listed equity: exchange-qualified ticker plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    pub ticker: String,
    pub name: String,
}

impl Instrument {
    pub fn new(ticker: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            name: name.into(),
        }
    }

    pub fn code(&self) -> &str {
        ticker_code(&self.ticker)
    }

    pub fn exchange(&self) -> Exchange {
        Exchange::of_ticker(&self.ticker)
    }

    /// Native symbol reconstructed from the ticker suffix (`sz000001`).
    pub fn native_symbol(&self) -> String {
        format!("{}{}", self.exchange().prefix(), self.code())
    }
}
