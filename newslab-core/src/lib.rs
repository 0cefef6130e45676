//! Newslab Core: domain types, data sources, merging, and news/price alignment.
//!
//! This crate contains everything that does not touch the filesystem:
//! - Domain types (instruments, news items, price bars, labeled samples)
//! - Blocking HTTP transport behind the `SourceClient` seam
//! - Bounded retry with exponential backoff and jitter
//! - Universe pager, daily bar fetcher, and the news source fallback chain
//! - Merging/deduplication and the look-ahead-free alignment engine

pub mod align;
pub mod data;
pub mod domain;
pub mod news;
