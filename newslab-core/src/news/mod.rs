//! News sources and the per-ticker fallback chain.
//!
//! Every source, structured or scraped, sits behind `NewsSource`, so the
//! chain (and everything downstream of it) never knows which one produced
//! an item.

pub mod chain;
pub mod eastmoney;
pub mod sina;

pub use chain::{ChainSettings, NewsSourceChain};
pub use eastmoney::EastmoneySearch;
pub use sina::SinaCompanyNews;

use crate::data::FetchError;
use crate::domain::{Instrument, NewsItem};
use regex::Regex;
use std::sync::OnceLock;

/// A pageable news source.
pub trait NewsSource {
    /// Source tag used in logs.
    fn tag(&self) -> &str;

    /// Queries to page through for one instrument, in order.
    fn queries(&self, instrument: &Instrument) -> Vec<String>;

    /// One page (1-based) of items for `query`, attributed to `ticker`.
    /// An empty page means the query is exhausted.
    fn fetch_page(&self, query: &str, page: u32, ticker: &str)
        -> Result<Vec<NewsItem>, FetchError>;
}

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"(?s)<.*?>").expect("tag pattern is valid"))
}

/// Strip markup, decode entities, fold non-breaking spaces, trim.
pub fn clean_title(raw: &str) -> String {
    let stripped = tag_pattern().replace_all(raw, "");
    html_escape::decode_html_entities(&stripped)
        .replace('\u{a0}', " ")
        .trim()
        .to_string()
}
