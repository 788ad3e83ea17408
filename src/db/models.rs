//! Row types for the odds-history schema in migrations/0001_odds_history.sql.
//! Used by sqlx for typed queries.
use chrono::{DateTime, NaiveDate, Utc};

use crate::types::{Game, MarketFamily, OddsReading, Team};

#[derive(Debug, sqlx::FromRow)]
pub struct GameRow {
    pub id: String,
    pub game_date: String,
    pub game_status: String,
    pub home_abbr: String,
    pub home_name: String,
    pub away_abbr: String,
    pub away_name: String,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct OddsRow {
    pub game_id: String,
    pub market: String,
    pub selection: String,
    pub stat: Option<String>,
    pub side: Option<String>,
    pub line: Option<f64>,
    pub price_decimal: f64,
    /// Milliseconds since the Unix epoch.
    pub recorded_at: i64,
}

pub const DATE_FORMAT: &str = "%Y-%m-%d";

fn decode_error(msg: String) -> sqlx::Error {
    sqlx::Error::Decode(msg.into())
}

impl TryFrom<GameRow> for Game {
    type Error = sqlx::Error;

    fn try_from(r: GameRow) -> Result<Self, Self::Error> {
        let game_date = NaiveDate::parse_from_str(&r.game_date, DATE_FORMAT)
            .map_err(|e| decode_error(format!("game {} has bad game_date {:?}: {e}", r.id, r.game_date)))?;
        Ok(Game {
            id: r.id,
            game_date,
            status: r.game_status,
            home: Team { abbr: r.home_abbr, name: r.home_name },
            away: Team { abbr: r.away_abbr, name: r.away_name },
            home_score: r.home_score,
            away_score: r.away_score,
        })
    }
}

impl TryFrom<OddsRow> for OddsReading {
    type Error = sqlx::Error;

    fn try_from(r: OddsRow) -> Result<Self, Self::Error> {
        let family = MarketFamily::parse(&r.market)
            .ok_or_else(|| decode_error(format!("unknown market {:?}", r.market)))?;
        let recorded_at = DateTime::<Utc>::from_timestamp_millis(r.recorded_at)
            .ok_or_else(|| decode_error(format!("recorded_at out of range: {}", r.recorded_at)))?;
        Ok(OddsReading {
            game_id: r.game_id,
            family,
            selection: r.selection,
            stat: r.stat,
            side: r.side,
            line: r.line,
            price: r.price_decimal,
            recorded_at,
        })
    }
}
