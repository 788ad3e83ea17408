use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::movement::line_selector::{MainLine, QuoteGrid, QuoteSide};
use crate::types::{Game, Line, Odds, OddsReading, OverUnder, Side};

// ---------------------------------------------------------------------------
// Points
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoneylinePoint {
    pub timestamp: DateTime<Utc>,
    pub away: Odds,
    pub home: Odds,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpreadPoint {
    pub timestamp: DateTime<Utc>,
    /// Absolute handicap.
    pub line: Line,
    /// Side giving points. None on a pick'em.
    pub favorite: Option<Side>,
    pub away: Odds,
    pub home: Odds,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TotalPoint {
    pub timestamp: DateTime<Utc>,
    pub line: Line,
    pub over: Odds,
    pub under: Odds,
}

/// Independent per-family series for one game.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameSeries {
    pub moneyline: Vec<MoneylinePoint>,
    pub spread: Vec<SpreadPoint>,
    pub total: Vec<TotalPoint>,
}

impl GameSeries {
    pub fn build(game: &Game, moneyline: &[OddsReading], spread: &[OddsReading], total: &[OddsReading]) -> Self {
        Self {
            moneyline: build_moneyline(game, moneyline),
            spread: build_spread(game, spread),
            total: build_total(total),
        }
    }

    pub fn data_points(&self) -> usize {
        self.moneyline.len() + self.spread.len() + self.total.len()
    }
}

/// Over/under line history for one player stat.
#[derive(Debug, Clone, PartialEq)]
pub struct PropSeries {
    pub player: String,
    pub stat: String,
    pub points: Vec<TotalPoint>,
    /// Raw readings that fed this series.
    pub readings: usize,
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// One point per instant at which both sides are priced. Partial instants are dropped.
pub fn build_moneyline(game: &Game, readings: &[OddsReading]) -> Vec<MoneylinePoint> {
    let mut by_time: BTreeMap<DateTime<Utc>, (Option<f64>, Option<f64>)> = BTreeMap::new();

    for r in readings {
        let Some(side) = game.side_of(&r.selection) else {
            debug!(game_id = %game.id, selection = %r.selection, "moneyline selection matches neither team");
            continue;
        };
        let slot = by_time.entry(r.recorded_at).or_default();
        match side {
            Side::Away => slot.0 = Some(r.price),
            Side::Home => slot.1 = Some(r.price),
        }
    }

    by_time
        .into_iter()
        .filter_map(|(timestamp, prices)| match prices {
            (Some(away), Some(home)) => Some(MoneylinePoint {
                timestamp,
                away: Odds(away),
                home: Odds(home),
            }),
            _ => None,
        })
        .collect()
}

/// Spread candidates are keyed by the home handicap; an away quote at `h`
/// prices the same line as a home quote at `-h`.
pub fn build_spread(game: &Game, readings: &[OddsReading]) -> Vec<SpreadPoint> {
    let mut grid = QuoteGrid::new();

    for r in readings {
        let Some(handicap) = r.line else {
            continue;
        };
        match game.side_of(&r.selection) {
            Some(Side::Away) => grid.quote(r.recorded_at, -handicap, QuoteSide::A, r.price),
            Some(Side::Home) => grid.quote(r.recorded_at, handicap, QuoteSide::B, r.price),
            None => {
                debug!(game_id = %game.id, selection = %r.selection, "spread selection matches neither team");
            }
        }
    }

    grid.main_lines()
        .into_iter()
        .map(|(timestamp, main)| {
            let home_handicap = main.line;
            let favorite = if home_handicap < 0.0 {
                Some(Side::Home)
            } else if home_handicap > 0.0 {
                Some(Side::Away)
            } else {
                None
            };
            SpreadPoint {
                timestamp,
                line: Line(home_handicap.abs()),
                favorite,
                away: Odds(main.side_a),
                home: Odds(main.side_b),
            }
        })
        .collect()
}

pub fn build_total(readings: &[OddsReading]) -> Vec<TotalPoint> {
    let mut grid = QuoteGrid::new();
    for r in readings {
        if let (Some(line), Some(side)) = (r.line, OverUnder::parse(&r.selection)) {
            grid.quote(r.recorded_at, line, over_under_side(side), r.price);
        }
    }
    grid.main_lines().into_iter().map(total_point).collect()
}

/// Props grouped per (player, stat), ordered by player then stat.
pub fn build_props(readings: &[OddsReading]) -> Vec<PropSeries> {
    let mut grids: BTreeMap<(String, String), (QuoteGrid, usize)> = BTreeMap::new();

    for r in readings {
        let side = r.side.as_deref().and_then(OverUnder::parse);
        let (Some(line), Some(side), Some(stat)) = (r.line, side, r.stat.as_deref()) else {
            continue;
        };
        let (grid, count) = grids
            .entry((r.selection.clone(), stat.to_string()))
            .or_default();
        grid.quote(r.recorded_at, line, over_under_side(side), r.price);
        *count += 1;
    }

    grids
        .into_iter()
        .map(|((player, stat), (grid, readings))| PropSeries {
            player,
            stat,
            points: grid.main_lines().into_iter().map(total_point).collect(),
            readings,
        })
        .collect()
}

fn over_under_side(side: OverUnder) -> QuoteSide {
    match side {
        OverUnder::Over => QuoteSide::A,
        OverUnder::Under => QuoteSide::B,
    }
}

fn total_point((timestamp, main): (DateTime<Utc>, MainLine)) -> TotalPoint {
    TotalPoint {
        timestamp,
        line: Line(main.line),
        over: Odds(main.side_a),
        under: Odds(main.side_b),
    }
}
