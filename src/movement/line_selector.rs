use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::config::ODDS_DECIMALS;
use crate::types::round_to;

/// One handicap/threshold quoted at one instant, with whichever sides are priced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineQuote {
    pub line: f64,
    pub side_a: Option<f64>,
    pub side_b: Option<f64>,
}

/// The line picked as "main" at one instant. Both sides are always priced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MainLine {
    pub line: f64,
    pub side_a: f64,
    pub side_b: f64,
}

impl MainLine {
    /// Absolute price imbalance between the two sides, at odds precision.
    pub fn juice(&self) -> f64 {
        round_to((self.side_a - self.side_b).abs(), ODDS_DECIMALS)
    }
}

/// Least-juiced line among the candidates; exact ties go to the lowest line.
/// Candidates with a side missing are dropped before comparison.
pub fn select_main_line<I>(quotes: I) -> Option<MainLine>
where
    I: IntoIterator<Item = LineQuote>,
{
    quotes
        .into_iter()
        .filter_map(|q| {
            Some(MainLine {
                line: q.line,
                side_a: q.side_a?,
                side_b: q.side_b?,
            })
        })
        .min_by(|x, y| {
            x.juice()
                .total_cmp(&y.juice())
                .then_with(|| x.line.total_cmp(&y.line))
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteSide {
    A,
    B,
}

/// Candidate lines grouped by instant, for two-sided markets.
///
/// Lines are keyed as `(line * 10).round()`: NBA handicaps and totals move in
/// half points, so tenths are exact and avoid float map keys.
#[derive(Debug, Default)]
pub struct QuoteGrid {
    by_time: BTreeMap<DateTime<Utc>, BTreeMap<i64, LineQuote>>,
}

impl QuoteGrid {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn line_key(line: f64) -> i64 {
        (line * 10.0).round() as i64
    }

    /// Record one side's price for `line` at `at`. A later quote for the same
    /// (instant, line, side) replaces the earlier one.
    pub fn quote(&mut self, at: DateTime<Utc>, line: f64, side: QuoteSide, price: f64) {
        let quote = self
            .by_time
            .entry(at)
            .or_default()
            .entry(Self::line_key(line))
            .or_insert(LineQuote { line, side_a: None, side_b: None });
        match side {
            QuoteSide::A => quote.side_a = Some(price),
            QuoteSide::B => quote.side_b = Some(price),
        }
    }

    /// Main line at every instant that has one, in ascending time order.
    /// The selection is re-run per instant, so the main line may change identity.
    pub fn main_lines(self) -> Vec<(DateTime<Utc>, MainLine)> {
        self.by_time
            .into_iter()
            .filter_map(|(at, lines)| select_main_line(lines.into_values()).map(|m| (at, m)))
            .collect()
    }
}
