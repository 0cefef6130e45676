//! Acquisition stages: universe listing, news, daily prices.
//!
//! Each ticker's output file is its checkpoint. Unless `force` is set, a
//! ticker whose file exists is read back instead of fetched, so an
//! interrupted run can simply be started again. Tickers that end up with no
//! data get no file and are retried on the next run.

use newslab_core::data::{
    merge_aggregate_news, merge_bars, DailyBarFetcher, SourceClient, Universe, UniversePager,
};
use newslab_core::domain::{Instrument, NewsItem, PriceBar};
use newslab_core::news::{EastmoneySearch, NewsSource, NewsSourceChain, SinaCompanyNews};
use std::path::Path;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::StageError;
use crate::progress::{Stage, StageProgress, StageSummary, TickerOutcome};
use crate::store::{self, DataLayout, StoreError};

/// List the index constituents and write `universe.csv`.
pub fn run_universe_stage(
    client: &dyn SourceClient,
    config: &PipelineConfig,
) -> Result<Universe, StageError> {
    let layout = config.layout();
    let universe = UniversePager::new(client, config.index_listing()?).enumerate();
    store::write_universe(&layout.universe(), &universe.instruments)?;
    info!(
        node = %config.universe.node,
        instruments = universe.len(),
        seeded = universe.from_seed,
        path = %layout.universe().display(),
        "universe written"
    );
    Ok(universe)
}

/// Instruments from `universe.csv`; missing or empty is fatal.
pub fn load_universe(layout: &DataLayout) -> Result<Vec<Instrument>, StageError> {
    let path = layout.universe();
    if !path.is_file() {
        return Err(StageError::NoUniverse { path });
    }
    let instruments = store::read_universe(&path)?;
    if instruments.is_empty() {
        return Err(StageError::NoUniverse { path });
    }
    Ok(instruments)
}

/// Read an existing checkpoint unless `force`. An unreadable checkpoint is
/// treated as absent.
fn reuse_checkpoint<T>(
    path: &Path,
    force: bool,
    read: impl FnOnce(&Path) -> Result<Vec<T>, StoreError>,
) -> Option<Vec<T>> {
    if force || !path.is_file() {
        return None;
    }
    match read(path) {
        Ok(rows) => Some(rows),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable checkpoint, refetching");
            None
        }
    }
}

/// Fetch news per ticker through the source chain and write the per-ticker
/// files plus `news_all.csv`.
pub fn run_news_stage(
    client: &dyn SourceClient,
    config: &PipelineConfig,
    progress: &dyn StageProgress,
) -> Result<StageSummary, StageError> {
    let layout = config.layout();
    let instruments = load_universe(&layout)?;
    let total = instruments.len();

    let eastmoney = EastmoneySearch::new(client, config.fetch.page_size);
    let sina = SinaCompanyNews::new(client);
    let sources: Vec<&dyn NewsSource> = vec![&eastmoney, &sina];
    let chain = NewsSourceChain::new(sources, config.chain_settings()?);

    let mut summary = StageSummary::new(Stage::News, total);
    let mut all: Vec<NewsItem> = Vec::new();

    for (index, instrument) in instruments.iter().enumerate() {
        let ticker = instrument.ticker.as_str();
        let path = layout.news_file(ticker);

        let outcome = if let Some(items) =
            reuse_checkpoint(&path, config.fetch.force, |p| store::read_news(p, Some(ticker)))
        {
            let rows = items.len();
            all.extend(items);
            TickerOutcome::Reused { rows }
        } else {
            progress.on_start(Stage::News, ticker, index, total);
            let items = chain.fetch(instrument);
            if items.is_empty() {
                TickerOutcome::Empty
            } else {
                store::write_news(&path, &items)?;
                let rows = items.len();
                all.extend(items);
                TickerOutcome::Fetched { rows }
            }
        };

        progress.on_complete(Stage::News, ticker, index, total, &outcome);
        summary.record(ticker, &outcome);
    }

    let merged = merge_aggregate_news(all);
    summary.rows = merged.len();
    if !merged.is_empty() {
        store::write_news(&layout.news_all(), &merged)?;
    }
    progress.on_stage_complete(&summary);
    Ok(summary)
}

/// Fetch daily bars per ticker and write the per-ticker files plus
/// `prices_all.csv`. Requests are not retried; a failure costs that ticker
/// its bars for this run.
pub fn run_prices_stage(
    client: &dyn SourceClient,
    config: &PipelineConfig,
    progress: &dyn StageProgress,
) -> Result<StageSummary, StageError> {
    let layout = config.layout();
    let instruments = load_universe(&layout)?;
    let total = instruments.len();
    let session_close = config.session_close()?;
    let pause = config.ticker_pause()?;
    let fetcher = DailyBarFetcher::new(client, config.prices.datalen, session_close);

    let mut summary = StageSummary::new(Stage::Prices, total);
    let mut all: Vec<PriceBar> = Vec::new();

    for (index, instrument) in instruments.iter().enumerate() {
        let ticker = instrument.ticker.as_str();
        let path = layout.prices_file(ticker);

        let outcome = if let Some(bars) = reuse_checkpoint(&path, config.fetch.force, |p| {
            store::read_prices(p, Some(ticker), session_close)
        }) {
            let rows = bars.len();
            all.extend(bars);
            TickerOutcome::Reused { rows }
        } else {
            progress.on_start(Stage::Prices, ticker, index, total);
            let outcome = match fetcher.fetch(instrument) {
                Ok(bars) if bars.is_empty() => TickerOutcome::Empty,
                Ok(bars) => {
                    let bars = merge_bars(bars);
                    store::write_ticker_prices(&path, &bars)?;
                    let rows = bars.len();
                    all.extend(bars);
                    TickerOutcome::Fetched { rows }
                }
                Err(e) => TickerOutcome::Failed(e.to_string()),
            };
            std::thread::sleep(pause);
            outcome
        };

        progress.on_complete(Stage::Prices, ticker, index, total, &outcome);
        summary.record(ticker, &outcome);
    }

    let merged = merge_bars(all);
    summary.rows = merged.len();
    if !merged.is_empty() {
        store::write_aggregate_prices(&layout.prices_all(), &merged)?;
    }
    progress.on_stage_complete(&summary);
    Ok(summary)
}
