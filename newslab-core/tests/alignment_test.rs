//! Alignment invariants.
//!
//! Uses proptest to verify:
//! 1. No look-ahead: every anchor bar closes at or after the decision time
//! 2. Earliest match: no earlier bar of the same ticker would also qualify
//! 3. Label consistency: label is 1 exactly when the return is positive
//! 4. Merge dedup: (timestamp, headline) keys are unique and time-ordered

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday};
use proptest::prelude::*;
use std::collections::HashSet;
use newslab_core::align::{align, effective_date, forward_returns, AlignParams};
use newslab_core::data::{merge_bars, merge_news};
use newslab_core::domain::{NewsItem, PriceBar};

// ── Helpers ──────────────────────────────────────────────────────────

fn three_pm() -> NaiveTime {
    NaiveTime::from_hms_opt(15, 0, 0).unwrap()
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

/// `closes.len()` consecutive weekday bars starting Monday 2024-01-01.
fn weekday_bars(ticker: &str, closes: &[f64]) -> Vec<PriceBar> {
    let mut date = day("2024-01-01");
    let mut bars = Vec::with_capacity(closes.len());
    for &close in closes {
        while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            date = date + Days::new(1);
        }
        bars.push(PriceBar::at_close(ticker, date, three_pm(), close));
        date = date + Days::new(1);
    }
    bars
}

// ── Fixed scenarios ──────────────────────────────────────────────────

#[test]
fn monday_cutoff_boundary() {
    assert_eq!(effective_date(at("2024-01-08 14:59"), three_pm()), day("2024-01-08"));
    assert_eq!(effective_date(at("2024-01-08 15:01"), three_pm()), day("2024-01-09"));
}

#[test]
fn forward_returns_reference_series() {
    let r = forward_returns(&[10.0, 11.0, 9.0, 12.0], 1);
    assert!((r[0].unwrap() - 0.10).abs() < 1e-9);
    assert!((r[1].unwrap() + 0.181_818_181_8).abs() < 1e-9);
    assert!((r[2].unwrap() - 0.333_333_333_3).abs() < 1e-9);
    assert!(r[3].is_none());
}

#[test]
fn single_sample_end_to_end() {
    let bars = vec![
        PriceBar::at_close("000001.SZ", day("2024-01-02"), three_pm(), 10.0),
        PriceBar::at_close("000001.SZ", day("2024-01-03"), three_pm(), 11.0),
    ];
    let news = vec![NewsItem::new(at("2024-01-02 09:00"), "000001.SZ", "headline1", "eastmoney")];
    let out = align(&news, &bars, &AlignParams::default());

    assert_eq!(out.samples.len(), 1);
    let s = &out.samples[0];
    assert_eq!(s.title, "headline1");
    assert_eq!(s.ticker, "000001.SZ");
    assert_eq!(s.decision_time, at("2024-01-02 09:30"));
    assert!((s.forward_return - 0.10).abs() < 1e-9);
    assert_eq!(s.label, 1);
    assert_eq!(out.stats.news_in, 1);
    assert_eq!(out.stats.samples, 1);
}

#[test]
fn filter_runs_before_returns() {
    // News on a day with no bar for its own ticker is dropped even though
    // a later bar exists and has a forward return.
    let mut bars = weekday_bars("A", &[10.0, 11.0, 12.0]);
    bars.remove(1); // drop Tuesday 2024-01-02
    let news = vec![NewsItem::new(at("2024-01-02 10:00"), "A", "gap day", "t")];
    let out = align(&news, &bars, &AlignParams::default());
    assert!(out.samples.is_empty());
    assert_eq!(out.stats.on_trading_day, 0);
}

#[test]
fn output_is_ordered_by_ticker_then_decision_time() {
    let mut bars = weekday_bars("B", &[10.0, 11.0, 12.0]);
    bars.extend(weekday_bars("A", &[20.0, 19.0, 18.0]));
    let news = vec![
        NewsItem::new(at("2024-01-02 11:00"), "B", "b late", "t"),
        NewsItem::new(at("2024-01-01 09:00"), "B", "b early", "t"),
        NewsItem::new(at("2024-01-02 09:00"), "A", "a", "t"),
    ];
    let out = align(&news, &bars, &AlignParams::default());
    let order: Vec<&str> = out.samples.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(order, ["a", "b early", "b late"]);
}

// ── Properties ───────────────────────────────────────────────────────

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((1.0..100.0_f64).prop_map(|c| (c * 100.0).round() / 100.0), 2..40)
}

/// Minutes offset from 2024-01-01 00:00 spanning roughly eight weeks.
fn arb_news_offsets() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(0..(56 * 24 * 60_i64), 0..60)
}

proptest! {
    /// Every sample's anchor bar closes at or after its decision time, and
    /// it is the earliest such bar for that ticker.
    #[test]
    fn no_lookahead_and_earliest_match(
        closes in arb_closes(),
        offsets in arb_news_offsets(),
        latency_min in 0..(3 * 24 * 60_i64),
        horizon in 1..4_usize,
    ) {
        let bars = weekday_bars("A", &closes);
        let origin = at("2024-01-01 00:00");
        let news: Vec<NewsItem> = offsets
            .iter()
            .enumerate()
            .map(|(i, m)| NewsItem::new(origin + TimeDelta::minutes(*m), "A", format!("n{i}"), "t"))
            .collect();
        let params = AlignParams {
            horizon,
            session_close: three_pm(),
            latency: TimeDelta::minutes(latency_min),
        };
        let out = align(&news, &bars, &params);

        for s in &out.samples {
            prop_assert!(s.anchor_time >= s.decision_time);
            let earlier_qualifies = bars
                .iter()
                .any(|b| b.close_time >= s.decision_time && b.close_time < s.anchor_time);
            prop_assert!(!earlier_qualifies);
        }
        prop_assert_eq!(
            out.stats.samples + out.stats.no_forward_bar + out.stats.no_forward_return,
            out.stats.on_trading_day
        );
    }

    /// The label is a pure function of the return sign, and the return is
    /// the close ratio over exactly `horizon` bars from the anchor.
    #[test]
    fn label_and_return_match_anchor(closes in arb_closes(), offsets in arb_news_offsets()) {
        let bars = weekday_bars("A", &closes);
        let origin = at("2024-01-01 00:00");
        let news: Vec<NewsItem> = offsets
            .iter()
            .map(|m| NewsItem::new(origin + TimeDelta::minutes(*m), "A", format!("n{m}"), "t"))
            .collect();
        let out = align(&news, &bars, &AlignParams::default());

        for s in &out.samples {
            prop_assert_eq!(s.label == 1, s.forward_return > 0.0);
            let idx = bars.iter().position(|b| b.close_time == s.anchor_time).unwrap();
            let expected = bars[idx + 1].close / bars[idx].close - 1.0;
            prop_assert!((s.forward_return - expected).abs() < 1e-12);
        }
    }

    /// Merged news has unique (timestamp, headline) keys in time order and
    /// loses no distinct key.
    #[test]
    fn merge_news_dedupes_on_key(
        raw in prop::collection::vec((0..200_i64, 0..5_u8, 0..3_u8), 0..80)
    ) {
        let origin = at("2024-01-01 00:00");
        let items: Vec<NewsItem> = raw
            .iter()
            .map(|(m, t, s)| {
                NewsItem::new(origin + TimeDelta::minutes(*m), "A", format!("title {t}"), format!("src{s}"))
            })
            .collect();
        let distinct: HashSet<(NaiveDateTime, String)> =
            items.iter().map(|i| (i.published, i.title.clone())).collect();

        let merged = merge_news(items);
        prop_assert_eq!(merged.len(), distinct.len());
        prop_assert!(merged.windows(2).all(|w| w[0].published <= w[1].published));
        let seen: HashSet<(NaiveDateTime, String)> =
            merged.iter().map(|i| (i.published, i.title.clone())).collect();
        prop_assert_eq!(seen, distinct);
    }

    /// One bar per (ticker, date) after merging, first occurrence kept.
    #[test]
    fn merge_bars_one_per_ticker_day(closes in arb_closes()) {
        let first = weekday_bars("A", &closes);
        let doubled: Vec<PriceBar> = first
            .iter()
            .cloned()
            .chain(first.iter().map(|b| PriceBar { close: b.close + 1.0, ..b.clone() }))
            .collect();
        let merged = merge_bars(doubled);
        prop_assert_eq!(merged.len(), first.len());
        for (m, f) in merged.iter().zip(&first) {
            prop_assert_eq!(m.close, f.close);
        }
    }
}
