use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A headline attributed to one ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub published: NaiveDateTime,
    pub ticker: String,
    pub title: String,
    pub source: String,
}

impl NewsItem {
    pub fn new(
        published: NaiveDateTime,
        ticker: impl Into<String>,
        title: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            published,
            ticker: ticker.into(),
            title: title.into(),
            source: source.into(),
        }
    }

    /// Identity key: two items with the same publish time and headline are
    /// the same story, whichever source or page delivered them.
    pub fn key(&self) -> (NaiveDateTime, &str) {
        (self.published, self.title.as_str())
    }
}
