//! Data acquisition: transport, retry, universe listing, daily bars, merging.

pub mod client;
pub mod error;
pub mod fields;
pub mod merge;
pub mod prices;
pub mod retry;
pub mod universe;

pub use client::{HttpSourceClient, ProxySettings, SourceClient, TransportConfig};
pub use error::FetchError;
pub use merge::{merge_aggregate_news, merge_bars, merge_news};
pub use prices::DailyBarFetcher;
pub use retry::RetryPolicy;
pub use universe::{IndexListing, Universe, UniversePager};
