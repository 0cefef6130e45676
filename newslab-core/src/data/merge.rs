//! Dedupe and chronological ordering across pages, sources and tickers.

use crate::domain::{NewsItem, PriceBar};
use std::collections::HashSet;

/// Collapse items sharing (timestamp, headline), keeping the first seen, then
/// sort by publish time. The sort is stable, so same-minute items keep their
/// arrival order.
pub fn merge_news(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    let mut out: Vec<NewsItem> = items
        .into_iter()
        .filter(|item| {
            let (published, title) = item.key();
            seen.insert((published, title.to_owned()))
        })
        .collect();
    out.sort_by_key(|item| item.published);
    out
}

/// Aggregate across tickers. The same headline on two tickers is two rows.
pub fn merge_aggregate_news(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    let mut out: Vec<NewsItem> = items
        .into_iter()
        .filter(|item| {
            let (published, title) = item.key();
            seen.insert((item.ticker.clone(), published, title.to_owned()))
        })
        .collect();
    out.sort_by_key(|item| item.published);
    out
}

/// One bar per (ticker, date), first wins; ordered by close time then ticker.
pub fn merge_bars(bars: Vec<PriceBar>) -> Vec<PriceBar> {
    let mut seen = HashSet::new();
    let mut out: Vec<PriceBar> = bars
        .into_iter()
        .filter(|bar| seen.insert((bar.ticker.clone(), bar.date)))
        .collect();
    out.sort_by(|a, b| {
        a.close_time
            .cmp(&b.close_time)
            .then_with(|| a.ticker.cmp(&b.ticker))
    });
    out
}
