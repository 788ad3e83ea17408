use std::path::Path;

use chrono::{Days, NaiveDate};
use serde::Deserialize;
use tracing::{info, warn};

use crate::db::models::DATE_FORMAT;
use crate::error::{AppError, Result};
use crate::types::{Game, OddsReading, Team};

/// Append-only writer for the odds-history store.
/// Games and teams are upserted; odds readings are only ever inserted.
#[derive(Clone)]
pub struct OddsRecorder {
    pool: sqlx::SqlitePool,
}

impl OddsRecorder {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or rename a team, returning its row id.
    pub async fn ensure_team(&self, team: &Team) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO teams (abbreviation, name) VALUES (?, ?)
            ON CONFLICT(abbreviation) DO UPDATE SET name = excluded.name
            RETURNING id
            "#,
        )
        .bind(&team.abbr)
        .bind(&team.name)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Insert a game, or refresh its status and score if it already exists.
    pub async fn upsert_game(&self, game: &Game) -> Result<()> {
        let home_id = self.ensure_team(&game.home).await?;
        let away_id = self.ensure_team(&game.away).await?;
        let game_date = game.game_date.format(DATE_FORMAT).to_string();

        sqlx::query(
            r#"
            INSERT INTO games (id, game_date, game_status, home_team_id, away_team_id, home_score, away_score)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                game_date = excluded.game_date,
                game_status = excluded.game_status,
                home_score = excluded.home_score,
                away_score = excluded.away_score
            "#,
        )
        .bind(&game.id)
        .bind(game_date)
        .bind(&game.status)
        .bind(home_id)
        .bind(away_id)
        .bind(game.home_score)
        .bind(game.away_score)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Append readings in one transaction. Readings priced below 1.0 are skipped.
    /// Returns the number of rows inserted.
    pub async fn record(&self, readings: &[OddsReading]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for r in readings {
            if !r.price.is_finite() || r.price < 1.0 {
                warn!(
                    game_id = %r.game_id,
                    market = %r.family,
                    selection = %r.selection,
                    price = r.price,
                    "skipping reading with invalid decimal price"
                );
                continue;
            }

            sqlx::query(
                r#"
                INSERT INTO odds_history (game_id, market, selection, stat, side, line, price_decimal, recorded_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&r.game_id)
            .bind(r.family.as_str())
            .bind(&r.selection)
            .bind(&r.stat)
            .bind(&r.side)
            .bind(r.line)
            .bind(r.price)
            .bind(r.recorded_at.timestamp_millis())
            .execute(&mut *tx)
            .await?;
            inserted += 1;
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Load a JSON slate (see fixtures/sample_slate.json) into the store.
    /// Games may give `dayOffset` instead of `gameDate`; it is resolved against `today`.
    pub async fn seed_from_file(&self, path: &Path, today: NaiveDate) -> Result<(usize, u64)> {
        let raw = tokio::fs::read_to_string(path).await?;
        let seed: SeedFile = serde_json::from_str(&raw)?;

        for g in &seed.games {
            self.upsert_game(&g.resolve(today)?).await?;
        }
        let inserted = self.record(&seed.readings).await?;

        info!(
            games = seed.games.len(),
            readings = inserted,
            "Seeded odds store from {}",
            path.display()
        );
        Ok((seed.games.len(), inserted))
    }
}

// ---------------------------------------------------------------------------
// Seed file
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SeedFile {
    games: Vec<SeedGame>,
    #[serde(default)]
    readings: Vec<OddsReading>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedGame {
    id: String,
    #[serde(default)]
    game_date: Option<NaiveDate>,
    #[serde(default)]
    day_offset: Option<i64>,
    #[serde(default = "default_status")]
    game_status: String,
    home: SeedTeam,
    away: SeedTeam,
    #[serde(default)]
    home_score: Option<i64>,
    #[serde(default)]
    away_score: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SeedTeam {
    abbr: String,
    name: String,
}

fn default_status() -> String {
    "scheduled".to_string()
}

impl SeedGame {
    fn resolve(&self, today: NaiveDate) -> Result<Game> {
        let game_date = match (self.game_date, self.day_offset) {
            (Some(d), _) => Some(d),
            (None, Some(offset)) if offset >= 0 => today.checked_add_days(Days::new(offset as u64)),
            (None, Some(offset)) => today.checked_sub_days(Days::new(offset.unsigned_abs())),
            (None, None) => None,
        }
        .ok_or_else(|| AppError::Config(format!("seed game {} needs gameDate or dayOffset", self.id)))?;

        Ok(Game {
            id: self.id.clone(),
            game_date,
            status: self.game_status.clone(),
            home: Team { abbr: self.home.abbr.clone(), name: self.home.name.clone() },
            away: Team { abbr: self.away.abbr.clone(), name: self.away.name.clone() },
            home_score: self.home_score,
            away_score: self.away_score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{test_pool, OddsReader};
    use crate::types::{GameWindow, MarketFamily};
    use chrono::{TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn celtics(name: &str) -> Team {
        Team { abbr: "BOS".to_string(), name: name.to_string() }
    }

    fn reading(price: f64) -> OddsReading {
        OddsReading {
            game_id: "g1".to_string(),
            family: MarketFamily::Moneyline,
            selection: "BOS".to_string(),
            stat: None,
            side: None,
            line: None,
            price,
            recorded_at: Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn ensure_team_is_idempotent_and_renames() {
        let recorder = OddsRecorder::new(test_pool().await);
        let a = recorder.ensure_team(&celtics("Boston")).await.unwrap();
        let b = recorder.ensure_team(&celtics("Boston Celtics")).await.unwrap();
        assert_eq!(a, b);
    }

    fn game() -> Game {
        Game {
            id: "g1".to_string(),
            game_date: today(),
            status: "scheduled".to_string(),
            home: celtics("Boston Celtics"),
            away: Team { abbr: "NYK".to_string(), name: "New York Knicks".to_string() },
            home_score: None,
            away_score: None,
        }
    }

    #[tokio::test]
    async fn upsert_game_refreshes_status_and_score() {
        let pool = test_pool().await;
        let recorder = OddsRecorder::new(pool.clone());
        let mut game = game();
        recorder.upsert_game(&game).await.unwrap();
        game.status = "final".to_string();
        game.home_score = Some(110);
        game.away_score = Some(104);
        recorder.upsert_game(&game).await.unwrap();

        let games = OddsReader::new(pool)
            .games_in_window(&GameWindow::around(today(), 0, 0), false)
            .await
            .unwrap();
        assert_eq!(games, vec![game]);
    }

    #[tokio::test]
    async fn record_skips_non_finite_and_sub_even_prices() {
        let pool = test_pool().await;
        let recorder = OddsRecorder::new(pool.clone());
        recorder.upsert_game(&game()).await.unwrap();
        let inserted = recorder
            .record(&[reading(1.91), reading(0.5), reading(f64::NAN), reading(1.0)])
            .await
            .unwrap();
        assert_eq!(inserted, 2);

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM odds_history")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 2);
    }

    #[tokio::test]
    async fn seeds_sample_slate_relative_to_today() {
        let pool = test_pool().await;
        let recorder = OddsRecorder::new(pool.clone());
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/sample_slate.json");
        let (games, readings) = recorder.seed_from_file(&path, today()).await.unwrap();
        assert_eq!(games, 4);
        assert_eq!(readings, 40);

        let reader = OddsReader::new(pool);
        let window = GameWindow::around(today(), 1, 2);
        let all = reader.games_in_window(&window, false).await.unwrap();
        let dates: Vec<String> = all.iter().map(|g| g.game_date.to_string()).collect();
        assert_eq!(dates, vec!["2026-10-18", "2026-10-19", "2026-10-19", "2026-10-20"]);
        assert_eq!(all[0].home_score, Some(112));

        let with_odds = reader.games_in_window(&window, true).await.unwrap();
        assert_eq!(with_odds.len(), 3);
    }

    #[tokio::test]
    async fn seed_game_without_date_is_rejected() {
        let path = std::env::temp_dir().join(format!("odds-seed-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"games":[{"id":"g1","home":{"abbr":"BOS","name":"Boston"},"away":{"abbr":"NYK","name":"New York"}}]}"#,
        )
        .unwrap();
        let recorder = OddsRecorder::new(test_pool().await);
        let err = recorder.seed_from_file(&path, today()).await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
