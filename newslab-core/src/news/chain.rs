//! Per-ticker orchestration across news sources.
//!
//! Sources are tried in order. Each query is paged from 1 up to `max_pages`
//! and stops at the first empty page. Every page goes through the retry
//! policy; a page that still fails is skipped and paging continues with the
//! next one. A later source is only consulted when every earlier one came
//! back with nothing.

use super::NewsSource;
use crate::data::{merge_news, RetryPolicy};
use crate::domain::{Instrument, NewsItem};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct ChainSettings {
    pub max_pages: u32,
    /// Pause after every successful non-empty page.
    pub page_sleep: Duration,
    pub retry: RetryPolicy,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            max_pages: 50,
            page_sleep: Duration::from_millis(300),
            retry: RetryPolicy::default(),
        }
    }
}

pub struct NewsSourceChain<'a> {
    sources: Vec<&'a dyn NewsSource>,
    settings: ChainSettings,
}

impl<'a> NewsSourceChain<'a> {
    pub fn new(sources: Vec<&'a dyn NewsSource>, settings: ChainSettings) -> Self {
        Self { sources, settings }
    }

    /// Deduplicated, chronologically sorted news for one instrument. An empty
    /// result is a normal outcome.
    pub fn fetch(&self, instrument: &Instrument) -> Vec<NewsItem> {
        for (rank, source) in self.sources.iter().enumerate() {
            let items = self.collect_from(*source, instrument);
            if !items.is_empty() {
                if rank > 0 {
                    info!(ticker = %instrument.ticker, source = source.tag(), "fallback source used");
                }
                return merge_news(items);
            }
            debug!(ticker = %instrument.ticker, source = source.tag(), "source yielded nothing");
        }
        Vec::new()
    }

    fn collect_from(&self, source: &dyn NewsSource, instrument: &Instrument) -> Vec<NewsItem> {
        let mut rows = Vec::new();
        for query in source.queries(instrument) {
            if query.trim().is_empty() {
                continue;
            }
            for page in 1..=self.settings.max_pages {
                let unit = format!("{} {} q={query} p={page}", instrument.ticker, source.tag());
                let result = self
                    .settings
                    .retry
                    .run(&unit, || source.fetch_page(&query, page, &instrument.ticker));
                match result {
                    Ok(items) if items.is_empty() => break,
                    Ok(items) => {
                        rows.extend(items);
                        std::thread::sleep(self.settings.page_sleep);
                    }
                    // Retries exhausted: this page is lost, the next may still work.
                    Err(e) if e.is_transient() => continue,
                    Err(e) => {
                        warn!(unit = %unit, error = %e, "unrecognised response, treating page as empty");
                        break;
                    }
                }
            }
        }
        rows
    }
}
