//! Domain types for newslab

pub mod bar;
pub mod instrument;
pub mod news;
pub mod sample;
pub mod timestamp;

pub use bar::PriceBar;
pub use instrument::{ticker_code, ticker_from_native, Exchange, Instrument};
pub use news::NewsItem;
pub use sample::LabeledSample;
pub use timestamp::{format_datetime, parse_datetime, DATETIME_FORMAT};
