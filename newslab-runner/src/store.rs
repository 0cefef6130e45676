//! CSV tables under the data directory.
//!
//! Layout (relative to the data dir):
//! - `universe.csv`: ticker, name
//! - `news_multi/{TICKER}_news.csv` and `news_all.csv`: dt, ticker, title, source
//! - `prices_multi/{TICKER}_prices.csv`: dt, ticker, open, high, low, close, volume
//! - `prices_all.csv`: dt, open, high, low, close, volume, ticker
//! - `labels_joined.csv`: title, y, ret, ticker, t0
//!
//! Files are written with a UTF-8 BOM and a single header row. A BOM is
//! tolerated on read. Writes go to a `.tmp` sibling and are renamed into
//! place, so a per-ticker file that exists is always complete.

use chrono::{NaiveDateTime, NaiveTime};
use newslab_core::domain::{
    format_datetime, parse_datetime, Instrument, LabeledSample, NewsItem, PriceBar,
};
use newslab_core::news::eastmoney::DEFAULT_SOURCE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const BOM: &[u8] = "\u{feff}".as_bytes();

const NEWS_DIR: &str = "news_multi";
const PRICES_DIR: &str = "prices_multi";
const NEWS_SUFFIX: &str = "_news.csv";
const PRICES_SUFFIX: &str = "_prices.csv";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}, record {record}: {reason}", .path.display())]
    BadRow {
        path: PathBuf,
        record: usize,
        reason: String,
    },

    #[error("manifest serialization: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn csv(path: &Path, source: csv::Error) -> Self {
        StoreError::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Paths of every table under one data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn universe(&self) -> PathBuf {
        self.root.join("universe.csv")
    }

    pub fn news_dir(&self) -> PathBuf {
        self.root.join(NEWS_DIR)
    }

    pub fn news_file(&self, ticker: &str) -> PathBuf {
        self.news_dir().join(format!("{ticker}{NEWS_SUFFIX}"))
    }

    pub fn news_all(&self) -> PathBuf {
        self.root.join("news_all.csv")
    }

    pub fn prices_dir(&self) -> PathBuf {
        self.root.join(PRICES_DIR)
    }

    pub fn prices_file(&self, ticker: &str) -> PathBuf {
        self.prices_dir().join(format!("{ticker}{PRICES_SUFFIX}"))
    }

    pub fn prices_all(&self) -> PathBuf {
        self.root.join("prices_all.csv")
    }

    pub fn labels(&self) -> PathBuf {
        self.root.join("labels_joined.csv")
    }

    /// Sidecar next to a labeled output file: `x.csv` → `x.meta.json`.
    pub fn manifest_for(output: &Path) -> PathBuf {
        output.with_extension("meta.json")
    }
}

// ── Rows ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct UniverseRow {
    ticker: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct NewsRow {
    dt: String,
    #[serde(default)]
    ticker: String,
    title: String,
    #[serde(default)]
    source: String,
}

#[derive(Debug, Serialize)]
struct TickerPriceRow<'a> {
    dt: String,
    ticker: &'a str,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: f64,
    volume: Option<u64>,
}

#[derive(Debug, Serialize)]
struct AggregatePriceRow<'a> {
    dt: String,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: f64,
    volume: Option<u64>,
    ticker: &'a str,
}

/// Reads either price layout; columns are matched by header name.
#[derive(Debug, Deserialize)]
struct StoredPriceRow {
    dt: String,
    #[serde(default)]
    ticker: String,
    #[serde(default)]
    open: Option<f64>,
    #[serde(default)]
    high: Option<f64>,
    #[serde(default)]
    low: Option<f64>,
    close: Option<f64>,
    /// Tolerates float-formatted volumes from other tools.
    #[serde(default)]
    volume: Option<f64>,
}

#[derive(Debug, Serialize)]
struct SampleRow<'a> {
    title: &'a str,
    y: u8,
    ret: f64,
    ticker: &'a str,
    t0: String,
}

// ── Encoding ─────────────────────────────────────────────────────────

/// Serialize rows to BOM-prefixed CSV bytes with a header.
fn encode_rows<S: Serialize>(rows: impl IntoIterator<Item = S>) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::Writer::from_writer(BOM.to_vec());
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))
}

/// Header-only table for an empty row set.
fn encode_header(columns: &[&str]) -> Result<Vec<u8>, csv::Error> {
    let mut wtr = csv::Writer::from_writer(BOM.to_vec());
    wtr.write_record(columns)?;
    wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))
}

/// Atomic write: `.tmp` sibling, then rename. Parent dirs are created.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes).map_err(|e| StoreError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        StoreError::io(path, e)
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "table written");
    Ok(())
}

fn write_table<S: Serialize>(
    path: &Path,
    columns: &[&str],
    rows: Vec<S>,
) -> Result<Vec<u8>, StoreError> {
    let bytes = if rows.is_empty() {
        encode_header(columns)
    } else {
        encode_rows(rows)
    }
    .map_err(|e| StoreError::csv(path, e))?;
    write_atomic(path, &bytes)?;
    Ok(bytes)
}

fn read_table<R: DeserializeOwned>(path: &Path) -> Result<Vec<R>, StoreError> {
    let bytes = fs::read(path).map_err(|e| StoreError::io(path, e))?;
    let body = bytes.strip_prefix(BOM).unwrap_or(&bytes);
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(body);
    rdr.deserialize()
        .collect::<Result<Vec<R>, _>>()
        .map_err(|e| StoreError::csv(path, e))
}

/// Ticker encoded in a per-ticker file name: the stem before the first `_`.
pub fn ticker_from_file_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let ticker = stem.split('_').next()?.trim();
    (!ticker.is_empty()).then(|| ticker.to_string())
}

fn csv_files(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let entries = fs::read_dir(dir).map_err(|e| StoreError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| StoreError::io(dir, e))?.path();
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

// ── Universe ─────────────────────────────────────────────────────────

pub fn write_universe(path: &Path, instruments: &[Instrument]) -> Result<(), StoreError> {
    let rows: Vec<UniverseRow> = instruments
        .iter()
        .map(|i| UniverseRow {
            ticker: i.ticker.clone(),
            name: i.name.clone(),
        })
        .collect();
    write_table(path, &["ticker", "name"], rows).map(|_| ())
}

pub fn read_universe(path: &Path) -> Result<Vec<Instrument>, StoreError> {
    let rows: Vec<UniverseRow> = read_table(path)?;
    Ok(rows
        .into_iter()
        .map(|r| (r.ticker.trim().to_string(), r.name.trim().to_string()))
        .filter(|(ticker, _)| !ticker.is_empty())
        .map(|(ticker, name)| {
            let name = if name.is_empty() { ticker.clone() } else { name };
            Instrument::new(ticker, name)
        })
        .collect())
}

// ── News ─────────────────────────────────────────────────────────────

const NEWS_COLUMNS: [&str; 4] = ["dt", "ticker", "title", "source"];

pub fn write_news(path: &Path, items: &[NewsItem]) -> Result<(), StoreError> {
    let rows: Vec<NewsRow> = items
        .iter()
        .map(|n| NewsRow {
            dt: format_datetime(n.published),
            ticker: n.ticker.clone(),
            title: n.title.clone(),
            source: n.source.clone(),
        })
        .collect();
    write_table(path, &NEWS_COLUMNS, rows).map(|_| ())
}

/// Read one news table. Rows without a ticker take `default_ticker`; rows
/// without a source are tagged `eastmoney`.
pub fn read_news(path: &Path, default_ticker: Option<&str>) -> Result<Vec<NewsItem>, StoreError> {
    let rows: Vec<NewsRow> = read_table(path)?;
    let mut items = Vec::with_capacity(rows.len());
    for (record, row) in rows.into_iter().enumerate() {
        let published = parse_datetime(&row.dt).ok_or_else(|| StoreError::BadRow {
            path: path.to_path_buf(),
            record,
            reason: format!("unparseable dt {:?}", row.dt),
        })?;
        let ticker = match (row.ticker.trim(), default_ticker) {
            ("", Some(fallback)) => fallback.to_string(),
            ("", None) => {
                return Err(StoreError::BadRow {
                    path: path.to_path_buf(),
                    record,
                    reason: "no ticker".into(),
                })
            }
            (t, _) => t.to_string(),
        };
        let source = if row.source.trim().is_empty() {
            DEFAULT_SOURCE.to_string()
        } else {
            row.source
        };
        items.push(NewsItem::new(published, ticker, row.title, source));
    }
    Ok(items)
}

/// News from an aggregate file or from a directory of per-ticker files.
pub fn load_news(path: &Path) -> Result<Vec<NewsItem>, StoreError> {
    if !path.is_dir() {
        return read_news(path, None);
    }
    let mut items = Vec::new();
    for file in csv_files(path)? {
        let ticker = ticker_from_file_name(&file);
        items.extend(read_news(&file, ticker.as_deref())?);
    }
    Ok(items)
}

// ── Prices ───────────────────────────────────────────────────────────

const TICKER_PRICE_COLUMNS: [&str; 7] = ["dt", "ticker", "open", "high", "low", "close", "volume"];
const AGGREGATE_PRICE_COLUMNS: [&str; 7] = ["dt", "open", "high", "low", "close", "volume", "ticker"];

pub fn write_ticker_prices(path: &Path, bars: &[PriceBar]) -> Result<(), StoreError> {
    let rows: Vec<TickerPriceRow> = bars
        .iter()
        .map(|b| TickerPriceRow {
            dt: format_datetime(b.close_time),
            ticker: &b.ticker,
            open: b.open,
            high: b.high,
            low: b.low,
            close: b.close,
            volume: b.volume,
        })
        .collect();
    write_table(path, &TICKER_PRICE_COLUMNS, rows).map(|_| ())
}

pub fn write_aggregate_prices(path: &Path, bars: &[PriceBar]) -> Result<(), StoreError> {
    let rows: Vec<AggregatePriceRow> = bars
        .iter()
        .map(|b| AggregatePriceRow {
            dt: format_datetime(b.close_time),
            open: b.open,
            high: b.high,
            low: b.low,
            close: b.close,
            volume: b.volume,
            ticker: &b.ticker,
        })
        .collect();
    write_table(path, &AGGREGATE_PRICE_COLUMNS, rows).map(|_| ())
}

/// Bar close time from a stored `dt`. A bare date is stamped with
/// `session_close`.
fn bar_close_time(raw: &str, session_close: NaiveTime) -> Option<NaiveDateTime> {
    let dt = parse_datetime(raw)?;
    if raw.trim().len() <= 10 {
        Some(dt.date().and_time(session_close))
    } else {
        Some(dt)
    }
}

/// Read one price table (either layout). Rows without a close are dropped.
pub fn read_prices(
    path: &Path,
    default_ticker: Option<&str>,
    session_close: NaiveTime,
) -> Result<Vec<PriceBar>, StoreError> {
    let rows: Vec<StoredPriceRow> = read_table(path)?;
    let mut bars = Vec::with_capacity(rows.len());
    for (record, row) in rows.into_iter().enumerate() {
        let Some(close) = row.close else { continue };
        let close_time = bar_close_time(&row.dt, session_close).ok_or_else(|| StoreError::BadRow {
            path: path.to_path_buf(),
            record,
            reason: format!("unparseable dt {:?}", row.dt),
        })?;
        let ticker = match (row.ticker.trim(), default_ticker) {
            ("", Some(fallback)) => fallback.to_string(),
            ("", None) => {
                return Err(StoreError::BadRow {
                    path: path.to_path_buf(),
                    record,
                    reason: "no ticker".into(),
                })
            }
            (t, _) => t.to_string(),
        };
        bars.push(PriceBar {
            ticker,
            date: close_time.date(),
            close_time,
            open: row.open,
            high: row.high,
            low: row.low,
            close,
            volume: row
                .volume
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v.round() as u64),
        });
    }
    Ok(bars)
}

/// Prices from an aggregate file or from a directory of per-ticker files.
pub fn load_prices(path: &Path, session_close: NaiveTime) -> Result<Vec<PriceBar>, StoreError> {
    if !path.is_dir() {
        return read_prices(path, None, session_close);
    }
    let mut bars = Vec::new();
    for file in csv_files(path)? {
        let ticker = ticker_from_file_name(&file);
        bars.extend(read_prices(&file, ticker.as_deref(), session_close)?);
    }
    Ok(bars)
}

// ── Labels ───────────────────────────────────────────────────────────

const SAMPLE_COLUMNS: [&str; 5] = ["title", "y", "ret", "ticker", "t0"];

/// Write labeled samples and return the exact bytes written.
pub fn write_samples(path: &Path, samples: &[LabeledSample]) -> Result<Vec<u8>, StoreError> {
    let rows: Vec<SampleRow> = samples
        .iter()
        .map(|s| SampleRow {
            title: &s.title,
            y: s.label,
            ret: s.forward_return,
            ticker: &s.ticker,
            t0: format_datetime(s.decision_time),
        })
        .collect();
    write_table(path, &SAMPLE_COLUMNS, rows)
}
