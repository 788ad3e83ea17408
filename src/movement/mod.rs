//! Odds time-series aggregation: main-line selection, per-game series,
//! open/current/movement summaries and slate-wide insights.

pub mod board;
pub mod insights;
pub mod line_selector;
pub mod series;
pub mod summary;

pub use board::{assemble, Slate, SlateReadings};
