use std::collections::HashMap;

use crate::movement::insights::{self, InsightSet};
use crate::movement::series::{build_props, GameSeries};
use crate::movement::summary::{summarize, MoneylineSummary, SpreadSummary, TotalSummary};
use crate::types::{Game, OddsReading};

#[derive(Debug, Clone, PartialEq)]
pub struct GameSummary {
    pub moneyline: MoneylineSummary,
    pub spread: SpreadSummary,
    pub total: TotalSummary,
    pub data_points: usize,
}

impl GameSummary {
    pub fn from_series(series: &GameSeries) -> Self {
        Self {
            moneyline: summarize(&series.moneyline),
            spread: summarize(&series.spread),
            total: summarize(&series.total),
            data_points: series.data_points(),
        }
    }

    /// No family produced a point.
    pub fn is_empty(&self) -> bool {
        self.moneyline.is_empty() && self.spread.is_empty() && self.total.is_empty()
    }
}

/// Everything the dashboards show for one game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameBoard {
    pub game: Game,
    pub series: GameSeries,
    pub summary: GameSummary,
    /// Raw moneyline/spread/total readings for the game.
    pub readings: usize,
}

impl GameBoard {
    pub fn has_odds(&self) -> bool {
        !self.summary.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropBoard {
    pub game_id: String,
    pub game: String,
    pub player: String,
    pub stat: String,
    pub summary: TotalSummary,
    pub readings: usize,
}

/// One request's worth of aggregated odds.
#[derive(Debug, Clone, PartialEq)]
pub struct Slate {
    pub boards: Vec<GameBoard>,
    pub props: Vec<PropBoard>,
    pub insights: InsightSet,
}

impl Slate {
    pub fn total_data_points(&self) -> usize {
        self.boards.iter().map(|b| b.summary.data_points).sum()
    }
}

/// Raw readings for one slate, one vec per market family, as the reader returns them.
#[derive(Debug, Clone, Default)]
pub struct SlateReadings {
    pub moneyline: Vec<OddsReading>,
    pub spread: Vec<OddsReading>,
    pub total: Vec<OddsReading>,
    pub props: Vec<OddsReading>,
}

/// Run series → summary → insights over every game. Pure: same input, same output.
/// Readings for games not in `games` are ignored. Game order is preserved.
pub fn assemble(games: Vec<Game>, readings: SlateReadings) -> Slate {
    let mut moneyline = group_by_game(readings.moneyline);
    let mut spread = group_by_game(readings.spread);
    let mut total = group_by_game(readings.total);
    let mut props = group_by_game(readings.props);

    let mut boards = Vec::with_capacity(games.len());
    let mut prop_boards = Vec::new();

    for game in games {
        let ml = moneyline.remove(&game.id).unwrap_or_default();
        let sp = spread.remove(&game.id).unwrap_or_default();
        let tot = total.remove(&game.id).unwrap_or_default();

        let series = GameSeries::build(&game, &ml, &sp, &tot);
        let summary = GameSummary::from_series(&series);

        if let Some(game_props) = props.remove(&game.id) {
            let matchup = game.matchup();
            prop_boards.extend(build_props(&game_props).into_iter().map(|p| PropBoard {
                game_id: game.id.clone(),
                game: matchup.clone(),
                summary: summarize(&p.points),
                player: p.player,
                stat: p.stat,
                readings: p.readings,
            }));
        }

        boards.push(GameBoard {
            game,
            series,
            summary,
            readings: ml.len() + sp.len() + tot.len(),
        });
    }

    let insights = insights::rank(&boards, &prop_boards);
    Slate { boards, props: prop_boards, insights }
}

fn group_by_game(readings: Vec<OddsReading>) -> HashMap<String, Vec<OddsReading>> {
    let mut grouped: HashMap<String, Vec<OddsReading>> = HashMap::new();
    for r in readings {
        grouped.entry(r.game_id.clone()).or_default().push(r);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::insights::TotalTrend;
    use crate::types::{MarketFamily, Odds, Team};
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    fn game(id: &str, away: &str, home: &str) -> Game {
        Game {
            id: id.to_string(),
            game_date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
            status: "scheduled".to_string(),
            home: Team { abbr: home.to_string(), name: home.to_string() },
            away: Team { abbr: away.to_string(), name: away.to_string() },
            home_score: None,
            away_score: None,
        }
    }

    fn t(min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 17, min, 0).unwrap()
    }

    fn r(game_id: &str, family: MarketFamily, selection: &str, line: Option<f64>, price: f64, at: DateTime<Utc>) -> OddsReading {
        OddsReading {
            game_id: game_id.to_string(),
            family,
            selection: selection.to_string(),
            stat: None,
            side: None,
            line,
            price,
            recorded_at: at,
        }
    }

    fn slate_readings() -> SlateReadings {
        use MarketFamily::*;
        SlateReadings {
            moneyline: vec![
                r("g1", Moneyline, "BOS", None, 2.10, t(0)),
                r("g1", Moneyline, "BOS", None, 2.05, t(10)),
                r("g1", Moneyline, "BOS", None, 2.00, t(20)),
                r("g1", Moneyline, "NYK", None, 1.80, t(0)),
                r("g1", Moneyline, "NYK", None, 1.75, t(10)),
                r("g1", Moneyline, "NYK", None, 1.90, t(20)),
                r("gX", Moneyline, "LAL", None, 1.90, t(20)),
            ],
            spread: vec![],
            total: vec![
                r("g1", Total, "Over", Some(225.5), 1.91, t(0)),
                r("g1", Total, "Over", Some(224.5), 1.91, t(30)),
                r("g1", Total, "Under", Some(225.5), 1.91, t(0)),
                r("g1", Total, "Under", Some(224.5), 1.91, t(30)),
            ],
            props: vec![
                OddsReading {
                    stat: Some("points".to_string()),
                    side: Some("over".to_string()),
                    ..r("g1", Prop, "Jayson Tatum", Some(27.5), 1.91, t(0))
                },
                OddsReading {
                    stat: Some("points".to_string()),
                    side: Some("under".to_string()),
                    ..r("g1", Prop, "Jayson Tatum", Some(27.5), 1.91, t(0))
                },
            ],
        }
    }

    #[test]
    fn assembles_boards_in_game_order() {
        let games = vec![game("g1", "NYK", "BOS"), game("g2", "LAL", "DEN")];
        let slate = assemble(games, slate_readings());

        assert_eq!(slate.boards.len(), 2);
        let g1 = &slate.boards[0];
        assert_eq!(g1.series.moneyline.len(), 3);
        let ml = g1.summary.moneyline.movement.unwrap();
        assert_eq!(ml.away, Odds(0.1));
        assert_eq!(ml.home, Odds(-0.1));
        assert_eq!(g1.summary.data_points, 5);
        assert_eq!(g1.readings, 10);
        assert!(g1.has_odds());

        let g2 = &slate.boards[1];
        assert!(!g2.has_odds());
        assert!(g2.summary.moneyline.is_empty());
        assert_eq!(g2.readings, 0);

        assert_eq!(slate.total_data_points(), 5);
        assert_eq!(slate.props.len(), 1);
        assert_eq!(slate.props[0].game, "NYK @ BOS");
    }

    #[test]
    fn insights_skip_games_without_data() {
        let games = vec![game("g1", "NYK", "BOS"), game("g2", "LAL", "DEN")];
        let slate = assemble(games, slate_readings());
        let insights = &slate.insights;

        assert_eq!(insights.ml_movers.len(), 2);
        assert_eq!(insights.total_movers.len(), 1);
        assert_eq!(insights.total_movers[0].movement, -1.0);
        assert_eq!(insights.total_trend, TotalTrend::AllUnder);
        assert_eq!(insights.net_total_movement, -1.0);
        assert_eq!(insights.props_with_movement, 0);
    }

    #[test]
    fn total_only_game_has_odds() {
        use MarketFamily::*;
        let readings = SlateReadings {
            total: vec![
                r("g2", Total, "Over", Some(231.5), 1.91, t(0)),
                r("g2", Total, "Under", Some(231.5), 1.91, t(0)),
            ],
            ..SlateReadings::default()
        };
        let slate = assemble(vec![game("g2", "LAL", "DEN")], readings);
        let g2 = &slate.boards[0];
        assert!(g2.summary.moneyline.is_empty());
        assert!(!g2.summary.total.is_empty());
        assert!(!g2.summary.is_empty());
        assert!(g2.has_odds());
    }

    #[test]
    fn aggregation_is_deterministic() {
        let a = assemble(vec![game("g1", "NYK", "BOS")], slate_readings());
        let b = assemble(vec![game("g1", "NYK", "BOS")], slate_readings());
        assert_eq!(a, b);
    }

    #[test]
    fn empty_slate_is_valid() {
        let slate = assemble(Vec::new(), SlateReadings::default());
        assert!(slate.boards.is_empty());
        assert!(slate.insights.ml_movers.is_empty());
        assert_eq!(slate.insights.total_trend, TotalTrend::Mixed);
    }
}
