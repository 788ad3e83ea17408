use serde::Serialize;

use crate::movement::series::{MoneylinePoint, SpreadPoint, TotalPoint};
use crate::types::{Line, Odds, Side};

/// A series point reduced to the values a summary compares.
pub trait SeriesPoint {
    type Values: Clone;
    type Delta;

    fn values(&self) -> Self::Values;

    /// `current - open`, componentwise, at each field's precision.
    fn delta(open: &Self::Values, current: &Self::Values) -> Self::Delta;
}

/// First/last values of a series and the change between them.
/// All three are None for an empty series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementSummary<V, D> {
    pub open: Option<V>,
    pub current: Option<V>,
    pub movement: Option<D>,
}

impl<V, D> MovementSummary<V, D> {
    pub fn empty() -> Self {
        Self { open: None, current: None, movement: None }
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_none()
    }
}

pub fn summarize<P: SeriesPoint>(series: &[P]) -> MovementSummary<P::Values, P::Delta> {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return MovementSummary::empty();
    };
    let open = first.values();
    let current = last.values();
    let movement = P::delta(&open, &current);
    MovementSummary {
        open: Some(open),
        current: Some(current),
        movement: Some(movement),
    }
}

// ---------------------------------------------------------------------------
// Per-family values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MoneylineValues {
    pub away: Odds,
    pub home: Odds,
}

impl MoneylineValues {
    pub fn side(&self, side: Side) -> Odds {
        match side {
            Side::Away => self.away,
            Side::Home => self.home,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadValues {
    pub line: Line,
    pub favorite: Option<Side>,
    pub away_odds: Odds,
    pub home_odds: Odds,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadDelta {
    pub line: Line,
    pub away_odds: Odds,
    pub home_odds: Odds,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalValues {
    pub line: Line,
    pub over_odds: Odds,
    pub under_odds: Odds,
}

pub type MoneylineSummary = MovementSummary<MoneylineValues, MoneylineValues>;
pub type SpreadSummary = MovementSummary<SpreadValues, SpreadDelta>;
pub type TotalSummary = MovementSummary<TotalValues, TotalValues>;

impl SeriesPoint for MoneylinePoint {
    type Values = MoneylineValues;
    type Delta = MoneylineValues;

    fn values(&self) -> MoneylineValues {
        MoneylineValues { away: self.away, home: self.home }
    }

    fn delta(open: &MoneylineValues, current: &MoneylineValues) -> MoneylineValues {
        MoneylineValues {
            away: current.away.minus(open.away),
            home: current.home.minus(open.home),
        }
    }
}

impl SeriesPoint for SpreadPoint {
    type Values = SpreadValues;
    type Delta = SpreadDelta;

    fn values(&self) -> SpreadValues {
        SpreadValues {
            line: self.line,
            favorite: self.favorite,
            away_odds: self.away,
            home_odds: self.home,
        }
    }

    fn delta(open: &SpreadValues, current: &SpreadValues) -> SpreadDelta {
        SpreadDelta {
            line: current.line.minus(open.line),
            away_odds: current.away_odds.minus(open.away_odds),
            home_odds: current.home_odds.minus(open.home_odds),
        }
    }
}

impl SeriesPoint for TotalPoint {
    type Values = TotalValues;
    type Delta = TotalValues;

    fn values(&self) -> TotalValues {
        TotalValues {
            line: self.line,
            over_odds: self.over,
            under_odds: self.under,
        }
    }

    fn delta(open: &TotalValues, current: &TotalValues) -> TotalValues {
        TotalValues {
            line: current.line.minus(open.line),
            over_odds: current.over_odds.minus(open.over_odds),
            under_odds: current.under_odds.minus(open.under_odds),
        }
    }
}
