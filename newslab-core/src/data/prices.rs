//! Sina daily k-line provider.
//!
//! Fetches the most recent daily bars for a ticker from the
//! `CN_MarketDataService.getKLineData` endpoint (`scale=240` is the daily
//! scale). There is no retry at this layer: a failed request is returned
//! to the caller, which records the ticker as failed for this run.

use super::client::SourceClient;
use super::error::FetchError;
use super::fields::{first_f64, first_str, first_u64};
use crate::domain::{Instrument, PriceBar};
use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;
use url::Url;

const KLINE_URL: &str =
    "https://money.finance.sina.com.cn/quotes_service/api/json_v2.php/CN_MarketDataService.getKLineData";

/// Daily scale in minutes.
const DAILY_SCALE: u32 = 240;

const DAY_FIELDS: &[&str] = &["day"];
const OPEN_FIELDS: &[&str] = &["open"];
const HIGH_FIELDS: &[&str] = &["high"];
const LOW_FIELDS: &[&str] = &["low"];
const CLOSE_FIELDS: &[&str] = &["close"];
const VOLUME_FIELDS: &[&str] = &["volume"];

/// Sina daily bar provider.
pub struct DailyBarFetcher<'a> {
    client: &'a dyn SourceClient,
    /// Maximum number of most-recent bars requested.
    pub datalen: u32,
    pub session_close: NaiveTime,
}

impl<'a> DailyBarFetcher<'a> {
    pub fn new(client: &'a dyn SourceClient, datalen: u32, session_close: NaiveTime) -> Self {
        Self {
            client,
            datalen,
            session_close,
        }
    }

    pub fn kline_url(&self, native_symbol: &str) -> Result<Url, FetchError> {
        Ok(Url::parse_with_params(
            KLINE_URL,
            &[
                ("symbol", native_symbol.to_string()),
                ("scale", DAILY_SCALE.to_string()),
                ("ma", "no".to_string()),
                ("datalen", self.datalen.to_string()),
            ],
        )?)
    }

    /// Fetch and parse bars. A request failure is returned, not retried; an
    /// unrecognised body is an empty result.
    pub fn fetch(&self, instrument: &Instrument) -> Result<Vec<PriceBar>, FetchError> {
        let url = self.kline_url(&instrument.native_symbol())?;
        let text = self.client.get_text(&url)?;
        Ok(parse_kline(&text, &instrument.ticker, self.session_close))
    }
}

/// Parse a k-line response body.
///
/// Anything that is not a JSON array is "no data". Rows without a `day` or
/// without a `close` are dropped.
pub fn parse_kline(body: &str, ticker: &str, session_close: NaiveTime) -> Vec<PriceBar> {
    let body = body.trim();
    if !body.starts_with('[') {
        return Vec::new();
    }
    let rows = match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(rows)) => rows,
        _ => return Vec::new(),
    };

    rows.iter()
        .filter_map(|row| {
            let day = first_str(row, DAY_FIELDS)?;
            let date = NaiveDate::parse_from_str(day.trim(), "%Y-%m-%d").ok()?;
            let close = first_f64(row, CLOSE_FIELDS)?;
            Some(PriceBar {
                ticker: ticker.to_string(),
                date,
                close_time: date.and_time(session_close),
                open: first_f64(row, OPEN_FIELDS),
                high: first_f64(row, HIGH_FIELDS),
                low: first_f64(row, LOW_FIELDS),
                close,
                volume: first_u64(row, VOLUME_FIELDS),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close_at_three() -> NaiveTime {
        NaiveTime::from_hms_opt(15, 0, 0).unwrap()
    }

    #[test]
    fn parses_string_encoded_rows() {
        let body = r#"[
            {"day":"2024-01-02","open":"9.39","high":"9.42","low":"9.21","close":"9.21","volume":"115357653"},
            {"day":"2024-01-03","open":"9.19","high":"9.22","low":"9.15","close":"9.20","volume":"84654971"}
        ]"#;
        let bars = parse_kline(body, "000001.SZ", close_at_three());
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].ticker, "000001.SZ");
        assert_eq!(bars[0].close, 9.21);
        assert_eq!(bars[0].open, Some(9.39));
        assert_eq!(bars[1].volume, Some(84_654_971));
        assert_eq!(bars[1].close_time.to_string(), "2024-01-03 15:00:00");
    }

    #[test]
    fn rows_without_close_or_day_are_dropped() {
        let body = r#"[
            {"day":"2024-01-02","open":"9.39"},
            {"open":"9.19","close":"9.20"},
            {"day":"2024-01-04","close":"9.30"}
        ]"#;
        let bars = parse_kline(body, "000001.SZ", close_at_three());
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date.to_string(), "2024-01-04");
        assert!(bars[0].volume.is_none());
    }

    #[test]
    fn non_array_body_is_no_data() {
        assert!(parse_kline("null", "000001.SZ", close_at_three()).is_empty());
        assert!(parse_kline("<html>busy</html>", "000001.SZ", close_at_three()).is_empty());
        assert!(parse_kline("[{broken", "000001.SZ", close_at_three()).is_empty());
    }

    struct Canned(Result<&'static str, ()>);

    impl SourceClient for Canned {
        fn get_text(&self, url: &Url) -> Result<String, FetchError> {
            self.0
                .map(str::to_string)
                .map_err(|_| FetchError::Connect(url.to_string()))
        }
    }

    #[test]
    fn fetch_requests_native_symbol_and_surfaces_failures() {
        let ok = Canned(Ok(r#"[{"day":"2024-01-02","close":"33.10"}]"#));
        let fetcher = DailyBarFetcher::new(&ok, 3000, close_at_three());
        let url = fetcher.kline_url("sh600036").unwrap();
        assert!(url.query().unwrap().contains("symbol=sh600036"));
        assert!(url.query().unwrap().contains("datalen=3000"));

        let bars = fetcher.fetch(&Instrument::new("600036.SS", "招商银行")).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].ticker, "600036.SS");

        let down = Canned(Err(()));
        let fetcher = DailyBarFetcher::new(&down, 3000, close_at_three());
        let instrument = Instrument::new("600036.SS", "招商银行");
        assert!(matches!(fetcher.fetch(&instrument), Err(FetchError::Connect(_))));
    }
}
