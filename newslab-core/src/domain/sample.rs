use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A headline labeled with the forward return of its ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSample {
    pub title: String,
    pub ticker: String,
    /// Publish time plus distribution latency.
    pub decision_time: NaiveDateTime,
    pub forward_return: f64,
    /// 1 when the forward return is strictly positive.
    pub label: u8,
    /// Close time of the bar the forward-return window starts from.
    pub anchor_time: NaiveDateTime,
}
