use tracing::debug;

use crate::db::models::{GameRow, OddsRow, DATE_FORMAT};
use crate::error::Result;
use crate::types::{Game, GameWindow, MarketFamily, OddsReading};

/// Read side of the odds-history store. Every query is parameterized and
/// read-only; failures surface as `AppError::DataSourceUnavailable`.
#[derive(Clone)]
pub struct OddsReader {
    pool: sqlx::SqlitePool,
}

impl OddsReader {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    /// Games dated inside `window`, ordered by (game_date, id).
    /// With `with_odds_only`, games with no moneyline/spread/total readings are left out.
    pub async fn games_in_window(&self, window: &GameWindow, with_odds_only: bool) -> Result<Vec<Game>> {
        let rows = sqlx::query_as::<_, GameRow>(
            r#"
            SELECT g.id, g.game_date, g.game_status,
                   h.abbreviation AS home_abbr, h.name AS home_name,
                   a.abbreviation AS away_abbr, a.name AS away_name,
                   g.home_score, g.away_score
            FROM games g
            JOIN teams h ON h.id = g.home_team_id
            JOIN teams a ON a.id = g.away_team_id
            WHERE g.game_date BETWEEN ? AND ?
              AND (? = 0 OR EXISTS (
                    SELECT 1 FROM odds_history o
                    WHERE o.game_id = g.id AND o.market IN ('moneyline', 'spread', 'total')
                  ))
            ORDER BY g.game_date, g.id
            "#,
        )
        .bind(window.start.format(DATE_FORMAT).to_string())
        .bind(window.end.format(DATE_FORMAT).to_string())
        .bind(with_odds_only)
        .fetch_all(&self.pool)
        .await?;

        let games = rows
            .into_iter()
            .map(Game::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(start = %window.start, end = %window.end, games = games.len(), "games in window");
        Ok(games)
    }

    /// All readings of one market family for games in `window`,
    /// ordered by (game_id, selection, recorded_at ASC).
    pub async fn readings(&self, window: &GameWindow, family: MarketFamily) -> Result<Vec<OddsReading>> {
        let rows = sqlx::query_as::<_, OddsRow>(
            r#"
            SELECT o.game_id, o.market, o.selection, o.stat, o.side, o.line,
                   o.price_decimal, o.recorded_at
            FROM odds_history o
            JOIN games g ON g.id = o.game_id
            WHERE g.game_date BETWEEN ? AND ?
              AND o.market = ?
            ORDER BY o.game_id, o.selection, o.recorded_at ASC, o.id ASC
            "#,
        )
        .bind(window.start.format(DATE_FORMAT).to_string())
        .bind(window.end.format(DATE_FORMAT).to_string())
        .bind(family.as_str())
        .fetch_all(&self.pool)
        .await?;

        let readings = rows
            .into_iter()
            .map(OddsReading::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(market = %family, readings = readings.len(), "readings in window");
        Ok(readings)
    }

    /// Connectivity probe for /health.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
