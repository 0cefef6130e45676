//! Labeling: attach forward returns to news items without look-ahead.

pub mod calendar;
pub mod engine;
pub mod forward_return;

pub use calendar::{effective_date, next_business_day};
pub use engine::{align, AlignParams, AlignStats, Alignment};
pub use forward_return::forward_returns;
