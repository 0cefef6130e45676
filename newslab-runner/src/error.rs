use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;
use newslab_core::data::FetchError;

/// Failures that stop a stage outright.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("universe is empty or missing at {} (run the universe stage first)", .path.display())]
    NoUniverse { path: PathBuf },

    #[error("no {table} rows at {} (run the fetch stages first)", .path.display())]
    NoInput { table: &'static str, path: PathBuf },

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("transport setup failed: {0}")]
    Transport(#[from] FetchError),
}
