use serde::Serialize;

use crate::config::{LINE_DECIMALS, MOVER_NOISE_THRESHOLD, TOP_MOVERS};
use crate::movement::board::{GameBoard, PropBoard};
use crate::movement::summary::{MoneylineSummary, TotalSummary};
use crate::types::{round_to, Game, Side};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mover {
    pub game_id: String,
    /// "AWY @ HOM"
    pub game: String,
    /// Team abbreviation for moneyline movers, None for totals.
    pub team: Option<String>,
    pub movement: f64,
}

/// Direction of every game's total-line movement on the slate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalTrend {
    AllUnder,
    AllOver,
    Mixed,
}

impl std::fmt::Display for TotalTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TotalTrend::AllUnder => "all_under",
            TotalTrend::AllOver => "all_over",
            TotalTrend::Mixed => "mixed",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsightSet {
    pub ml_movers: Vec<Mover>,
    pub total_movers: Vec<Mover>,
    pub total_trend: TotalTrend,
    /// Sum of every game's total-line movement. Informational only.
    pub net_total_movement: f64,
    pub props_with_movement: usize,
}

pub fn rank(boards: &[GameBoard], props: &[PropBoard]) -> InsightSet {
    let total_moves: Vec<f64> = boards
        .iter()
        .filter_map(|b| b.summary.total.movement.map(|m| m.line.value()))
        .collect();

    InsightSet {
        ml_movers: biggest_ml_movers(boards.iter().map(|b| (&b.game, &b.summary.moneyline))),
        total_movers: biggest_total_movers(boards.iter().map(|b| (&b.game, &b.summary.total))),
        total_trend: classify_trend(&total_moves),
        net_total_movement: net_total_movement(&total_moves),
        props_with_movement: props
            .iter()
            .filter(|p| p.summary.movement.is_some_and(|m| m.line.value() != 0.0))
            .count(),
    }
}

/// Per team side, strictly above the noise threshold, largest |movement| first, top 5.
pub fn biggest_ml_movers<'a, I>(games: I) -> Vec<Mover>
where
    I: IntoIterator<Item = (&'a Game, &'a MoneylineSummary)>,
{
    let mut movers: Vec<Mover> = games
        .into_iter()
        .filter_map(|(game, summary)| summary.movement.map(|m| (game, m)))
        .flat_map(|(game, m)| {
            [Side::Away, Side::Home].into_iter().map(move |side| Mover {
                game_id: game.id.clone(),
                game: game.matchup(),
                team: Some(game.team(side).abbr.clone()),
                movement: m.side(side).value(),
            })
        })
        .filter(|m| m.movement.abs() > MOVER_NOISE_THRESHOLD)
        .collect();
    top_by_magnitude(&mut movers);
    movers
}

/// Per game, largest |line movement| first, top 5. Games without totals are skipped.
pub fn biggest_total_movers<'a, I>(games: I) -> Vec<Mover>
where
    I: IntoIterator<Item = (&'a Game, &'a TotalSummary)>,
{
    let mut movers: Vec<Mover> = games
        .into_iter()
        .filter_map(|(game, summary)| {
            summary.movement.map(|m| Mover {
                game_id: game.id.clone(),
                game: game.matchup(),
                team: None,
                movement: m.line.value(),
            })
        })
        .collect();
    top_by_magnitude(&mut movers);
    movers
}

/// A zero satisfies neither direction, so it forces `Mixed`. So does an empty slate.
pub fn classify_trend(movements: &[f64]) -> TotalTrend {
    if movements.is_empty() {
        TotalTrend::Mixed
    } else if movements.iter().all(|m| *m < 0.0) {
        TotalTrend::AllUnder
    } else if movements.iter().all(|m| *m > 0.0) {
        TotalTrend::AllOver
    } else {
        TotalTrend::Mixed
    }
}

pub fn net_total_movement(movements: &[f64]) -> f64 {
    round_to(movements.iter().sum(), LINE_DECIMALS)
}

// Stable: equal magnitudes keep game order, away before home.
fn top_by_magnitude(movers: &mut Vec<Mover>) {
    movers.sort_by(|a, b| b.movement.abs().total_cmp(&a.movement.abs()));
    movers.truncate(TOP_MOVERS);
}
