//! PriceBar: one daily bar per (ticker, trading date).

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Daily bar for a single ticker.
///
/// `close_time` is the trading date at the exchange's session close; it is
/// the wall time the alignment engine matches decision times against.
/// Only `close` is mandatory, sources routinely omit the other fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub ticker: String,
    pub date: NaiveDate,
    pub close_time: NaiveDateTime,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<u64>,
}

impl PriceBar {
    /// Bar with only a close, stamped at `session_close` on `date`.
    pub fn at_close(
        ticker: impl Into<String>,
        date: NaiveDate,
        session_close: NaiveTime,
        close: f64,
    ) -> Self {
        Self {
            ticker: ticker.into(),
            date,
            close_time: date.and_time(session_close),
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }

    pub fn with_ohlv(mut self, open: f64, high: f64, low: f64, volume: u64) -> Self {
        self.open = Some(open);
        self.high = Some(high);
        self.low = Some(low);
        self.volume = Some(volume);
        self
    }
}
