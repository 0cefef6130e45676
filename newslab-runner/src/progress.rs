//! Per-ticker progress reporting for the acquisition stages.

use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    News,
    Prices,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::News => "news",
            Stage::Prices => "prices",
        };
        f.write_str(name)
    }
}

/// What happened to one ticker in a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickerOutcome {
    /// Fetched and checkpointed.
    Fetched { rows: usize },
    /// Checkpoint already present; reused without any request.
    Reused { rows: usize },
    /// Sources answered but had nothing.
    Empty,
    /// The request failed; nothing was written.
    Failed(String),
}

/// Receives per-ticker progress from a stage.
pub trait StageProgress {
    fn on_start(&self, stage: Stage, ticker: &str, index: usize, total: usize);

    fn on_complete(&self, stage: Stage, ticker: &str, index: usize, total: usize, outcome: &TickerOutcome);

    fn on_stage_complete(&self, summary: &StageSummary);
}

/// Reports through `tracing`.
pub struct TracingProgress;

impl StageProgress for TracingProgress {
    fn on_start(&self, stage: Stage, ticker: &str, index: usize, total: usize) {
        info!(%stage, ticker, "[{}/{}] fetching", index + 1, total);
    }

    fn on_complete(&self, stage: Stage, ticker: &str, _index: usize, _total: usize, outcome: &TickerOutcome) {
        match outcome {
            TickerOutcome::Fetched { rows } => info!(%stage, ticker, rows, "saved"),
            TickerOutcome::Reused { rows } => info!(%stage, ticker, rows, "checkpoint exists, skipped (force refetches)"),
            TickerOutcome::Empty => warn!(%stage, ticker, "no data from any source"),
            TickerOutcome::Failed(reason) => warn!(%stage, ticker, reason = %reason, "failed"),
        }
    }

    fn on_stage_complete(&self, s: &StageSummary) {
        if s.rows == 0 {
            warn!(stage = %s.stage, total = s.total, "stage produced no rows; check network or proxy settings");
        }
        info!(
            stage = %s.stage,
            total = s.total,
            fetched = s.fetched,
            reused = s.reused,
            empty = s.empty,
            failed = s.failed.len(),
            rows = s.rows,
            "stage complete"
        );
    }
}

/// Reports nothing.
pub struct SilentProgress;

impl StageProgress for SilentProgress {
    fn on_start(&self, _: Stage, _: &str, _: usize, _: usize) {}
    fn on_complete(&self, _: Stage, _: &str, _: usize, _: usize, _: &TickerOutcome) {}
    fn on_stage_complete(&self, _: &StageSummary) {}
}

/// Tally of one stage run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSummary {
    pub stage: Stage,
    pub total: usize,
    pub fetched: usize,
    pub reused: usize,
    pub empty: usize,
    pub failed: Vec<(String, String)>,
    /// Rows in the aggregate table.
    pub rows: usize,
}

impl StageSummary {
    pub fn new(stage: Stage, total: usize) -> Self {
        Self {
            stage,
            total,
            fetched: 0,
            reused: 0,
            empty: 0,
            failed: Vec::new(),
            rows: 0,
        }
    }

    pub fn record(&mut self, ticker: &str, outcome: &TickerOutcome) {
        match outcome {
            TickerOutcome::Fetched { .. } => self.fetched += 1,
            TickerOutcome::Reused { .. } => self.reused += 1,
            TickerOutcome::Empty => self.empty += 1,
            TickerOutcome::Failed(reason) => self.failed.push((ticker.to_string(), reason.clone())),
        }
    }

    /// Every ticker has data, fresh or reused.
    pub fn complete(&self) -> bool {
        self.empty == 0 && self.failed.is_empty()
    }
}
