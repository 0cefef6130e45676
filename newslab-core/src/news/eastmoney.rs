//! Eastmoney search API, the primary structured news source.

use super::{clean_title, NewsSource};
use crate::data::fields::first_str;
use crate::data::{FetchError, SourceClient};
use crate::domain::{parse_datetime, Instrument, NewsItem};
use serde_json::{json, Value};
use url::Url;

const SEARCH_URL: &str = "https://search-api-web.eastmoney.com/search/jsonv2";

pub const TITLE_FIELDS: &[&str] = &["Title", "title"];
pub const TIME_FIELDS: &[&str] = &["ShowTime", "showtime", "PublishTime"];
pub const SOURCE_FIELDS: &[&str] = &["MediaName", "mediaName"];
pub const DEFAULT_SOURCE: &str = "eastmoney";

pub struct EastmoneySearch<'a> {
    client: &'a dyn SourceClient,
    pub page_size: u32,
}

impl<'a> EastmoneySearch<'a> {
    pub fn new(client: &'a dyn SourceClient, page_size: u32) -> Self {
        Self { client, page_size }
    }

    pub fn search_url(&self, keyword: &str, page: u32) -> Result<Url, FetchError> {
        let param = json!({
            "pageindex": page,
            "pagesize": self.page_size,
            "keyword": keyword,
            "type": [1],
        });
        Ok(Url::parse_with_params(SEARCH_URL, &[("param", param.to_string())])?)
    }
}

impl NewsSource for EastmoneySearch<'_> {
    fn tag(&self) -> &str {
        DEFAULT_SOURCE
    }

    /// Bare numeric code first, then the company name.
    fn queries(&self, instrument: &Instrument) -> Vec<String> {
        [instrument.code(), instrument.name.trim()]
            .into_iter()
            .filter(|q| !q.is_empty())
            .map(String::from)
            .collect()
    }

    fn fetch_page(
        &self,
        query: &str,
        page: u32,
        ticker: &str,
    ) -> Result<Vec<NewsItem>, FetchError> {
        let body = self.client.get_json(&self.search_url(query, page)?)?;
        Ok(parse_search_response(&body, ticker))
    }
}

/// Extract items from a search response. A response without `Data.List`
/// has no items; entries lacking a title or a parseable time are skipped.
pub fn parse_search_response(body: &Value, ticker: &str) -> Vec<NewsItem> {
    let Some(list) = body
        .get("Data")
        .and_then(|d| d.get("List"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    list.iter()
        .filter_map(|entry| {
            let title = clean_title(&first_str(entry, TITLE_FIELDS)?);
            if title.is_empty() {
                return None;
            }
            let published = normalize_show_time(&first_str(entry, TIME_FIELDS)?)?;
            let source = first_str(entry, SOURCE_FIELDS).unwrap_or_else(|| DEFAULT_SOURCE.into());
            Some(NewsItem::new(published, ticker, title, source))
        })
        .collect()
}

/// `2024-01-02T09:30:00.000Z` → `2024-01-02 09:30:00`.
fn normalize_show_time(raw: &str) -> Option<chrono::NaiveDateTime> {
    let cleaned = raw.replace('T', " ").replace('Z', "");
    let no_fraction = cleaned.split('.').next().unwrap_or_default();
    parse_datetime(no_fraction)
}
