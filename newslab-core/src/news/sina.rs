//! Sina company news pages, the semi-structured fallback source.
//!
//! The page lists entries as `[YYYY-MM-DD HH:MM]` followed (after optional
//! whitespace or `&nbsp;`) by an anchor holding the headline. Only that
//! pattern is recognised; anything else on the page is ignored.

use super::{clean_title, NewsSource};
use crate::data::{FetchError, SourceClient};
use crate::domain::{parse_datetime, Instrument, NewsItem};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

const NEWS_PAGE_URL: &str = "https://vip.stock.finance.sina.com.cn/corp/view/vCB_AllNewsStock.php";

pub const SOURCE_TAG: &str = "sina";

fn entry_pattern() -> &'static Regex {
    static ENTRY: OnceLock<Regex> = OnceLock::new();
    ENTRY.get_or_init(|| {
        Regex::new(r"(?is)\[(\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2})\](?:\s|&nbsp;)*<a[^>]*?>(.*?)</a>")
            .expect("entry pattern is valid")
    })
}

pub struct SinaCompanyNews<'a> {
    client: &'a dyn SourceClient,
}

impl<'a> SinaCompanyNews<'a> {
    pub fn new(client: &'a dyn SourceClient) -> Self {
        Self { client }
    }

    pub fn page_url(&self, native_symbol: &str, page: u32) -> Result<Url, FetchError> {
        Ok(Url::parse_with_params(
            NEWS_PAGE_URL,
            &[("symbol", native_symbol.to_string()), ("Page", page.to_string())],
        )?)
    }
}

impl NewsSource for SinaCompanyNews<'_> {
    fn tag(&self) -> &str {
        SOURCE_TAG
    }

    fn queries(&self, instrument: &Instrument) -> Vec<String> {
        vec![instrument.native_symbol()]
    }

    fn fetch_page(
        &self,
        query: &str,
        page: u32,
        ticker: &str,
    ) -> Result<Vec<NewsItem>, FetchError> {
        let html = self.client.get_text(&self.page_url(query, page)?)?;
        Ok(extract_headlines(&html, ticker))
    }
}

/// Pull `(timestamp, headline)` pairs out of a news page.
pub fn extract_headlines(html: &str, ticker: &str) -> Vec<NewsItem> {
    entry_pattern()
        .captures_iter(html)
        .filter_map(|cap| {
            let published = parse_datetime(&cap[1])?;
            let title = clean_title(&cap[2]);
            (!title.is_empty()).then(|| NewsItem::new(published, ticker, title, SOURCE_TAG))
        })
        .collect()
}
