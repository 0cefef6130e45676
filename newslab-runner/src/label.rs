//! Label stage: join stored news with stored prices and write the labeled
//! dataset plus a JSON manifest describing how it was produced.

use chrono::{Local, NaiveDateTime};
use newslab_core::align::{align, AlignParams, AlignStats};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::StageError;
use crate::store::{self, DataLayout, StoreError};

/// Inputs and output of one label run.
#[derive(Debug, Clone)]
pub struct LabelJob {
    /// Aggregate news file or a directory of per-ticker files.
    pub news: PathBuf,
    /// Aggregate price file or a directory of per-ticker files.
    pub prices: PathBuf,
    pub out: PathBuf,
    pub params: AlignParams,
}

impl LabelJob {
    /// Default wiring: per-ticker directories in, `labels_joined.csv` out.
    pub fn from_layout(layout: &DataLayout, params: AlignParams) -> Self {
        Self {
            news: layout.news_dir(),
            prices: layout.prices_dir(),
            out: layout.labels(),
            params,
        }
    }
}

/// Sidecar written next to the labeled output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelManifest {
    pub news_input: String,
    pub prices_input: String,
    pub horizon: usize,
    pub session_close: String,
    pub delay_minutes: i64,
    pub news_rows: usize,
    pub price_rows: usize,
    pub retained: usize,
    pub no_forward_bar: usize,
    pub no_forward_return: usize,
    pub samples: usize,
    pub positive: usize,
    /// BLAKE3 over the exact bytes of the labeled CSV.
    pub content_hash: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct LabelReport {
    pub stats: AlignStats,
    pub out: PathBuf,
    pub manifest: LabelManifest,
}

fn require_rows<T>(rows: &[T], table: &'static str, path: &Path) -> Result<(), StageError> {
    if rows.is_empty() {
        return Err(StageError::NoInput {
            table,
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

pub fn run_label_stage(job: &LabelJob) -> Result<LabelReport, StageError> {
    for (table, path) in [("news", &job.news), ("price", &job.prices)] {
        if !path.exists() {
            return Err(StageError::NoInput {
                table,
                path: path.clone(),
            });
        }
    }

    let news = store::load_news(&job.news)?;
    require_rows(&news, "news", &job.news)?;
    let bars = store::load_prices(&job.prices, job.params.session_close)?;
    require_rows(&bars, "price", &job.prices)?;

    let alignment = align(&news, &bars, &job.params);
    let bytes = store::write_samples(&job.out, &alignment.samples)?;

    let stats = alignment.stats;
    let manifest = LabelManifest {
        news_input: job.news.display().to_string(),
        prices_input: job.prices.display().to_string(),
        horizon: job.params.horizon,
        session_close: job.params.session_close.format("%H:%M").to_string(),
        delay_minutes: job.params.latency.num_minutes(),
        news_rows: news.len(),
        price_rows: bars.len(),
        retained: stats.on_trading_day,
        no_forward_bar: stats.no_forward_bar,
        no_forward_return: stats.no_forward_return,
        samples: stats.samples,
        positive: alignment.samples.iter().filter(|s| s.label == 1).count(),
        content_hash: blake3::hash(&bytes).to_hex().to_string(),
        created_at: Local::now().naive_local(),
    };
    let manifest_path = DataLayout::manifest_for(&job.out);
    let json = serde_json::to_string_pretty(&manifest).map_err(StoreError::from)?;
    store::write_atomic(&manifest_path, json.as_bytes())?;

    info!(
        news = news.len(),
        bars = bars.len(),
        retained = stats.on_trading_day,
        samples = stats.samples,
        positive = manifest.positive,
        out = %job.out.display(),
        "labels written"
    );

    Ok(LabelReport {
        stats,
        out: job.out.clone(),
        manifest,
    })
}
