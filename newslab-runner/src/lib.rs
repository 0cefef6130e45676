//! Newslab Runner: pipeline stages on top of `newslab-core`.
//!
//! This crate provides:
//! - TOML pipeline configuration with validated defaults
//! - CSV table store (BOM-tolerant, atomic writes, per-ticker and aggregate)
//! - Acquisition stages with per-ticker checkpoints (universe, news, prices)
//! - Label stage with a hashed manifest sidecar

pub mod acquire;
pub mod config;
pub mod error;
pub mod label;
pub mod progress;
pub mod store;

pub use acquire::{load_universe, run_news_stage, run_prices_stage, run_universe_stage};
pub use config::{ConfigError, PipelineConfig};
pub use error::StageError;
pub use label::{run_label_stage, LabelJob, LabelManifest, LabelReport};
pub use progress::{SilentProgress, Stage, StageProgress, StageSummary, TickerOutcome, TracingProgress};
pub use store::{DataLayout, StoreError};
