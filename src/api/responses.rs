//! JSON views for the two dashboards. Built from an assembled [`Slate`];
//! no aggregation happens here, only reshaping.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::movement::board::{GameBoard, PropBoard};
use crate::movement::insights::{Mover, TotalTrend};
use crate::movement::series::{MoneylinePoint, SpreadPoint, TotalPoint};
use crate::movement::summary::{MoneylineValues, SpreadDelta, SpreadValues, TotalValues};
use crate::movement::Slate;
use crate::types::{Line, Odds, Side};

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn clock(at: &DateTime<Utc>) -> String {
    at.format("%H:%M").to_string()
}

// ---------------------------------------------------------------------------
// /odds-movement
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementResponse {
    pub fetched_at: String,
    pub games: Vec<MovementGame>,
    pub insights: MovementInsights,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementGame {
    pub game_id: String,
    pub matchup: String,
    pub away_team: String,
    pub home_team: String,
    pub game_date: String,
    pub game_status: String,
    pub moneyline: Vec<MoneylineRow>,
    pub spread: Vec<SpreadRow>,
    pub total: Vec<TotalRow>,
    pub summary: MovementGameSummary,
}

#[derive(Debug, Serialize)]
pub struct MoneylineRow {
    pub timestamp: String,
    pub time: String,
    pub away: Odds,
    pub home: Odds,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadRow {
    pub timestamp: String,
    pub time: String,
    pub line: Line,
    pub favorite: Option<Side>,
    pub away_odds: Odds,
    pub home_odds: Odds,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalRow {
    pub timestamp: String,
    pub time: String,
    pub line: Line,
    pub over_odds: Odds,
    pub under_odds: Odds,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementGameSummary {
    pub ml_open: Option<MoneylineValues>,
    pub ml_current: Option<MoneylineValues>,
    pub ml_movement: Option<MoneylineValues>,
    pub spread_open: Option<SpreadValues>,
    pub spread_current: Option<SpreadValues>,
    pub spread_movement: Option<SpreadDelta>,
    pub total_open: Option<TotalValues>,
    pub total_current: Option<TotalValues>,
    pub total_movement: Option<TotalValues>,
    pub data_points: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementInsights {
    pub total_games: usize,
    pub total_data_points: usize,
    #[serde(rename = "biggestMLMovers")]
    pub biggest_ml_movers: Vec<Mover>,
    pub biggest_total_movers: Vec<Mover>,
    pub overall_total_trend: TotalTrend,
}

impl From<&MoneylinePoint> for MoneylineRow {
    fn from(p: &MoneylinePoint) -> Self {
        Self { timestamp: timestamp(&p.timestamp), time: clock(&p.timestamp), away: p.away, home: p.home }
    }
}

impl From<&SpreadPoint> for SpreadRow {
    fn from(p: &SpreadPoint) -> Self {
        Self {
            timestamp: timestamp(&p.timestamp),
            time: clock(&p.timestamp),
            line: p.line,
            favorite: p.favorite,
            away_odds: p.away,
            home_odds: p.home,
        }
    }
}

impl From<&TotalPoint> for TotalRow {
    fn from(p: &TotalPoint) -> Self {
        Self {
            timestamp: timestamp(&p.timestamp),
            time: clock(&p.timestamp),
            line: p.line,
            over_odds: p.over,
            under_odds: p.under,
        }
    }
}

impl MovementGame {
    fn from_board(board: &GameBoard) -> Self {
        let game = &board.game;
        let s = &board.summary;
        Self {
            game_id: game.id.clone(),
            matchup: game.matchup(),
            away_team: game.away.abbr.clone(),
            home_team: game.home.abbr.clone(),
            game_date: game.game_date.to_string(),
            game_status: game.status.clone(),
            moneyline: board.series.moneyline.iter().map(MoneylineRow::from).collect(),
            spread: board.series.spread.iter().map(SpreadRow::from).collect(),
            total: board.series.total.iter().map(TotalRow::from).collect(),
            summary: MovementGameSummary {
                ml_open: s.moneyline.open,
                ml_current: s.moneyline.current,
                ml_movement: s.moneyline.movement,
                spread_open: s.spread.open,
                spread_current: s.spread.current,
                spread_movement: s.spread.movement,
                total_open: s.total.open,
                total_current: s.total.current,
                total_movement: s.total.movement,
                data_points: s.data_points,
            },
        }
    }
}

impl MovementResponse {
    pub fn from_slate(slate: &Slate, fetched_at: DateTime<Utc>) -> Self {
        Self {
            fetched_at: timestamp(&fetched_at),
            games: slate.boards.iter().map(MovementGame::from_board).collect(),
            insights: MovementInsights {
                total_games: slate.boards.len(),
                total_data_points: slate.total_data_points(),
                biggest_ml_movers: slate.insights.ml_movers.clone(),
                biggest_total_movers: slate.insights.total_movers.clone(),
                overall_total_trend: slate.insights.total_trend,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// /odds-terminal
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalResponse {
    pub fetched_at: String,
    pub all_games: Vec<TerminalGame>,
    pub moneylines: Vec<MoneylineMove>,
    pub totals: Vec<TotalMove>,
    pub player_props: Vec<PropMove>,
    pub insights: TerminalInsights,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalGame {
    pub game_id: String,
    pub game: String,
    pub game_date: String,
    pub game_status: String,
    pub away_score: Option<i64>,
    pub home_score: Option<i64>,
    pub away_team: TeamLine,
    pub home_team: TeamLine,
    pub total: Option<TotalLine>,
    pub has_odds: bool,
    pub readings: usize,
}

/// One team's moneyline on the terminal board. Odds are None without a moneyline series.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamLine {
    pub abbr: String,
    pub name: String,
    pub open_odds: Option<Odds>,
    pub current_odds: Option<Odds>,
    pub movement: Option<Odds>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalLine {
    pub open_line: Line,
    pub current_line: Line,
    pub movement: Line,
    pub over_odds: Odds,
    pub under_odds: Odds,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneylineMove {
    pub game_id: String,
    pub game: String,
    pub team: String,
    pub side: Side,
    pub open_odds: Odds,
    pub current_odds: Odds,
    pub movement: Odds,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalMove {
    pub game_id: String,
    pub game: String,
    #[serde(flatten)]
    pub line: TotalLine,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropMove {
    pub game_id: String,
    pub game: String,
    pub player: String,
    pub stat: String,
    #[serde(flatten)]
    pub line: TotalLine,
    pub readings: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalInsights {
    #[serde(rename = "biggestMLMovers")]
    pub biggest_ml_movers: Vec<Mover>,
    pub totals_trend: TotalTrend,
    pub total_points_dropped: f64,
    pub props_with_movement: usize,
}

fn total_line(open: Option<TotalValues>, current: Option<TotalValues>, movement: Option<TotalValues>) -> Option<TotalLine> {
    let (open, current, movement) = (open?, current?, movement?);
    Some(TotalLine {
        open_line: open.line,
        current_line: current.line,
        movement: movement.line,
        over_odds: current.over_odds,
        under_odds: current.under_odds,
    })
}

fn team_line(board: &GameBoard, side: Side) -> TeamLine {
    let team = board.game.team(side);
    let ml = &board.summary.moneyline;
    TeamLine {
        abbr: team.abbr.clone(),
        name: team.name.clone(),
        open_odds: ml.open.map(|v| v.side(side)),
        current_odds: ml.current.map(|v| v.side(side)),
        movement: ml.movement.map(|v| v.side(side)),
    }
}

fn moneyline_moves(board: &GameBoard) -> Vec<MoneylineMove> {
    let ml = &board.summary.moneyline;
    let (Some(open), Some(current), Some(movement)) = (ml.open, ml.current, ml.movement) else {
        return Vec::new();
    };
    [Side::Away, Side::Home]
        .into_iter()
        .map(|side| MoneylineMove {
            game_id: board.game.id.clone(),
            game: board.game.matchup(),
            team: board.game.team(side).abbr.clone(),
            side,
            open_odds: open.side(side),
            current_odds: current.side(side),
            movement: movement.side(side),
        })
        .collect()
}

fn prop_move(prop: &PropBoard) -> Option<PropMove> {
    let s = &prop.summary;
    Some(PropMove {
        game_id: prop.game_id.clone(),
        game: prop.game.clone(),
        player: prop.player.clone(),
        stat: prop.stat.clone(),
        line: total_line(s.open, s.current, s.movement)?,
        readings: prop.readings,
    })
}

impl TerminalGame {
    fn from_board(board: &GameBoard) -> Self {
        let game = &board.game;
        let total = &board.summary.total;
        Self {
            game_id: game.id.clone(),
            game: game.matchup(),
            game_date: game.game_date.to_string(),
            game_status: game.status.clone(),
            away_score: game.away_score,
            home_score: game.home_score,
            away_team: team_line(board, Side::Away),
            home_team: team_line(board, Side::Home),
            total: total_line(total.open, total.current, total.movement),
            has_odds: board.has_odds(),
            readings: board.readings,
        }
    }
}

impl TerminalResponse {
    pub fn from_slate(slate: &Slate, fetched_at: DateTime<Utc>) -> Self {
        let totals = slate
            .boards
            .iter()
            .filter_map(|b| {
                let t = &b.summary.total;
                Some(TotalMove {
                    game_id: b.game.id.clone(),
                    game: b.game.matchup(),
                    line: total_line(t.open, t.current, t.movement)?,
                })
            })
            .collect();

        Self {
            fetched_at: timestamp(&fetched_at),
            all_games: slate.boards.iter().map(TerminalGame::from_board).collect(),
            moneylines: slate.boards.iter().flat_map(moneyline_moves).collect(),
            totals,
            player_props: slate.props.iter().filter_map(prop_move).collect(),
            insights: TerminalInsights {
                biggest_ml_movers: slate.insights.ml_movers.clone(),
                totals_trend: slate.insights.total_trend,
                total_points_dropped: slate.insights.net_total_movement,
                props_with_movement: slate.insights.props_with_movement,
            },
        }
    }
}
