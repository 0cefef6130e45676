//! News-to-bar alignment.
//!
//! Steps, in this order:
//! 1. effective date per news item (after-close items roll to the next
//!    business day);
//! 2. keep only items whose (ticker, effective date) has a bar;
//! 3. forward return per bar, within each ticker's sorted series;
//! 4. decision time = publish time + latency;
//! 5. match each item to the earliest bar closing at or after its decision
//!    time (never an earlier bar);
//! 6. drop matches without a forward return;
//! 7. label = 1 when the return is strictly positive.
//!
//! Filtering happens before returns are computed. Swapping the two changes
//! which items near series boundaries survive.

use super::calendar::effective_date;
use super::forward_return::forward_returns;
use crate::domain::{LabeledSample, NewsItem, PriceBar};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignParams {
    /// Bars ahead defining the forward-return window.
    pub horizon: usize,
    pub session_close: NaiveTime,
    /// Publication-to-decision latency.
    pub latency: TimeDelta,
}

impl Default for AlignParams {
    fn default() -> Self {
        Self {
            horizon: 1,
            session_close: NaiveTime::from_hms_opt(15, 0, 0).unwrap_or(NaiveTime::MIN),
            latency: TimeDelta::minutes(30),
        }
    }
}

/// Where news items went.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignStats {
    pub news_in: usize,
    /// Items whose effective date has a bar for their ticker.
    pub on_trading_day: usize,
    /// Retained items with no bar at or after their decision time.
    pub no_forward_bar: usize,
    /// Retained items whose anchor bar sits in the series tail.
    pub no_forward_return: usize,
    pub samples: usize,
}

#[derive(Debug, Clone)]
pub struct Alignment {
    /// Ordered by ticker, then decision time.
    pub samples: Vec<LabeledSample>,
    pub stats: AlignStats,
}

/// One ticker's bars in time order with their forward returns.
struct BarSeries<'a> {
    bars: Vec<&'a PriceBar>,
    forward: Vec<Option<f64>>,
}

impl<'a> BarSeries<'a> {
    fn new(mut bars: Vec<&'a PriceBar>, horizon: usize) -> Self {
        bars.sort_by_key(|b| b.close_time);
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let forward = forward_returns(&closes, horizon);
        Self { bars, forward }
    }

    /// Index of the first bar closing at or after `t`.
    fn first_at_or_after(&self, t: NaiveDateTime) -> Option<usize> {
        let idx = self.bars.partition_point(|b| b.close_time < t);
        (idx < self.bars.len()).then_some(idx)
    }
}

pub fn align(news: &[NewsItem], bars: &[PriceBar], params: &AlignParams) -> Alignment {
    let mut stats = AlignStats {
        news_in: news.len(),
        ..AlignStats::default()
    };

    let trading_days: HashSet<(&str, NaiveDate)> =
        bars.iter().map(|b| (b.ticker.as_str(), b.date)).collect();

    // Bucket retained news by ticker, ordered by decision time.
    let mut events: BTreeMap<&str, Vec<(NaiveDateTime, &NewsItem)>> = BTreeMap::new();
    for item in news {
        let eff = effective_date(item.published, params.session_close);
        if !trading_days.contains(&(item.ticker.as_str(), eff)) {
            continue;
        }
        stats.on_trading_day += 1;
        // A decision time past the calendar's end can never meet a bar.
        let Some(t0) = item.published.checked_add_signed(params.latency) else {
            stats.no_forward_bar += 1;
            continue;
        };
        events.entry(item.ticker.as_str()).or_default().push((t0, item));
    }

    let mut by_ticker: BTreeMap<&str, Vec<&PriceBar>> = BTreeMap::new();
    for bar in bars {
        by_ticker.entry(bar.ticker.as_str()).or_default().push(bar);
    }

    let mut samples = Vec::new();
    for (ticker, mut queue) in events {
        let Some(ticker_bars) = by_ticker.remove(ticker) else {
            continue;
        };
        let series = BarSeries::new(ticker_bars, params.horizon);
        queue.sort_by_key(|(t0, _)| *t0);

        for (t0, item) in queue {
            let Some(idx) = series.first_at_or_after(t0) else {
                stats.no_forward_bar += 1;
                continue;
            };
            let Some(ret) = series.forward[idx] else {
                stats.no_forward_return += 1;
                continue;
            };
            samples.push(LabeledSample {
                title: item.title.clone(),
                ticker: item.ticker.clone(),
                decision_time: t0,
                forward_return: ret,
                label: u8::from(ret > 0.0),
                anchor_time: series.bars[idx].close_time,
            });
        }
    }

    stats.samples = samples.len();
    Alignment { samples, stats }
}
