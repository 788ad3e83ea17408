use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::agent::{AgentBridge, AnalysisDepth, Recommendation};
use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::api::responses::{MovementResponse, TerminalResponse};
use crate::config::Config;
use crate::db::OddsReader;
use crate::error::{AppError, Result};
use crate::movement::{assemble, Slate, SlateReadings};
use crate::types::{GameWindow, MarketFamily};

/// Day offsets around "today" (UTC) for each dashboard.
#[derive(Debug, Clone, Copy)]
pub struct Windows {
    pub movement_lookahead_days: i64,
    pub terminal_lookback_days: i64,
    pub terminal_lookahead_days: i64,
}

impl Windows {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            movement_lookahead_days: cfg.movement_lookahead_days,
            terminal_lookback_days: cfg.terminal_lookback_days,
            terminal_lookahead_days: cfg.terminal_lookahead_days,
        }
    }
}

#[derive(Clone)]
pub struct ApiState {
    pub reader: OddsReader,
    pub windows: Windows,
    pub health: Arc<HealthState>,
    pub latency: Arc<LatencyStats>,
    pub agent: Arc<dyn AgentBridge>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/odds-movement", get(get_odds_movement))
        .route("/odds-terminal", get(get_odds_terminal))
        .route("/betting-agent", post(post_betting_agent))
        .route("/health", get(get_health))
        .route("/stats/latency", get(get_stats_latency))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct AgentRequest {
    pub query: String,
    #[serde(default)]
    pub depth: AnalysisDepth,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub requests_served: u64,
    pub requests_failed: u64,
    pub last_success_at: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyResponse {
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
    pub sample_count: u64,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Fetch every family for `window` concurrently, then aggregate.
async fn load_slate(state: &ApiState, window: &GameWindow, with_odds_only: bool, with_props: bool) -> Result<Slate> {
    let reader = &state.reader;
    let props = async {
        if with_props {
            reader.readings(window, MarketFamily::Prop).await
        } else {
            Ok(Vec::new())
        }
    };

    let (games, moneyline, spread, total, props) = tokio::try_join!(
        reader.games_in_window(window, with_odds_only),
        reader.readings(window, MarketFamily::Moneyline),
        reader.readings(window, MarketFamily::Spread),
        reader.readings(window, MarketFamily::Total),
        props,
    )?;
    let readings = moneyline.len() + spread.len() + total.len() + props.len();

    let started = Instant::now();
    let slate = assemble(games, SlateReadings { moneyline, spread, total, props });
    let elapsed = started.elapsed();
    state.latency.record_slate(elapsed);

    info!(
        games = slate.boards.len(),
        readings,
        elapsed_us = elapsed.as_micros() as u64,
        "Slate assembled for {}..={}",
        window.start,
        window.end,
    );
    Ok(slate)
}

/// Count the outcome and log failures at the request boundary.
fn track<T>(state: &ApiState, endpoint: &str, result: Result<T>) -> Result<T> {
    match &result {
        Ok(_) => state.health.record_success(Utc::now().timestamp_millis()),
        Err(e) => {
            state.health.record_failure();
            error!(endpoint, "{e}");
        }
    }
    result
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_odds_movement(State(state): State<ApiState>) -> Result<Json<MovementResponse>> {
    let now = Utc::now();
    let window = GameWindow::around(now.date_naive(), 0, state.windows.movement_lookahead_days);
    let result = load_slate(&state, &window, true, false)
        .await
        .map(|slate| Json(MovementResponse::from_slate(&slate, now)));
    track(&state, "/odds-movement", result)
}

async fn get_odds_terminal(State(state): State<ApiState>) -> Result<Json<TerminalResponse>> {
    let now = Utc::now();
    let window = GameWindow::around(
        now.date_naive(),
        state.windows.terminal_lookback_days,
        state.windows.terminal_lookahead_days,
    );
    let result = load_slate(&state, &window, false, true)
        .await
        .map(|slate| Json(TerminalResponse::from_slate(&slate, now)));
    track(&state, "/odds-terminal", result)
}

async fn post_betting_agent(
    State(state): State<ApiState>,
    payload: std::result::Result<Json<AgentRequest>, JsonRejection>,
) -> Result<Json<Recommendation>> {
    let Json(req) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    let query = req.query.trim();
    if query.is_empty() {
        return Err(AppError::InvalidRequest("query must not be empty".to_string()));
    }

    match state.agent.submit(query, req.depth).await {
        Ok(rec) => {
            info!(depth = %req.depth, "Betting agent answered");
            Ok(Json(rec))
        }
        Err(e) => {
            error!(depth = %req.depth, "Betting agent failed: {e}");
            Err(e.into())
        }
    }
}

async fn get_health(State(state): State<ApiState>) -> (StatusCode, Json<HealthResponse>) {
    let db_ok = match state.reader.ping().await {
        Ok(()) => true,
        Err(e) => {
            error!("Health probe failed: {e}");
            false
        }
    };
    let body = HealthResponse {
        status: if db_ok { "ok" } else { "degraded" },
        database: if db_ok { "ok" } else { "unavailable" },
        requests_served: state.health.requests_served(),
        requests_failed: state.health.requests_failed(),
        last_success_at: state
            .health
            .last_success_at_ms()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true)),
    };
    let status = if db_ok { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(body))
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<LatencyResponse> {
    let snap = state.latency.snapshot();
    Json(LatencyResponse {
        p50_ms: snap.p50_ms,
        p95_ms: snap.p95_ms,
        p99_ms: snap.p99_ms,
        sample_count: snap.samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentError;
    use crate::db::{test_pool, OddsRecorder};
    use crate::types::{Game, OddsReading, Team};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;
    use axum::response::IntoResponse;
    use chrono::{Days, Duration, NaiveDate, SubsecRound};
    use std::time::Duration as StdDuration;

    enum FakeAgent {
        Answer(Recommendation),
        TimesOut,
        Fails,
    }

    #[async_trait]
    impl AgentBridge for FakeAgent {
        async fn submit(&self, query: &str, depth: AnalysisDepth) -> std::result::Result<Recommendation, AgentError> {
            match self {
                FakeAgent::Answer(rec) => Ok(Recommendation {
                    recommendation: format!("{} ({query}, {depth})", rec.recommendation),
                    ..rec.clone()
                }),
                FakeAgent::TimesOut => Err(AgentError::Timeout(StdDuration::from_secs(30))),
                FakeAgent::Fails => Err(AgentError::NoOutput),
            }
        }
    }

    fn answer() -> FakeAgent {
        FakeAgent::Answer(Recommendation {
            recommendation: "BOS ML".to_string(),
            confidence: Some(0.7),
            reasoning: None,
        })
    }

    fn windows() -> Windows {
        Windows {
            movement_lookahead_days: 1,
            terminal_lookback_days: 1,
            terminal_lookahead_days: 2,
        }
    }

    fn state_with(pool: sqlx::SqlitePool, agent: FakeAgent) -> ApiState {
        ApiState {
            reader: OddsReader::new(pool),
            windows: windows(),
            health: Arc::new(HealthState::new()),
            latency: Arc::new(LatencyStats::new()),
            agent: Arc::new(agent),
        }
    }

    fn game(id: &str, date: NaiveDate, away: &str, home: &str) -> Game {
        Game {
            id: id.to_string(),
            game_date: date,
            status: "scheduled".to_string(),
            home: Team { abbr: home.to_string(), name: home.to_string() },
            away: Team { abbr: away.to_string(), name: away.to_string() },
            home_score: None,
            away_score: None,
        }
    }

    fn reading(
        now: DateTime<Utc>,
        game_id: &str,
        family: MarketFamily,
        selection: &str,
        line: Option<f64>,
        price: f64,
        ago_min: i64,
    ) -> OddsReading {
        OddsReading {
            game_id: game_id.to_string(),
            family,
            selection: selection.to_string(),
            stat: None,
            side: None,
            line,
            price,
            recorded_at: now - Duration::minutes(ago_min),
        }
    }

    /// Today: g1 with odds, g2 without. Yesterday: g0 with odds. Next week: g9 with odds.
    async fn seeded_state() -> ApiState {
        use MarketFamily::*;
        let pool = test_pool().await;
        let recorder = OddsRecorder::new(pool.clone());
        // Whole seconds so every reading lands on the same millisecond grid.
        let now = Utc::now().trunc_subsecs(0);
        let today = now.date_naive();
        let yesterday = today.checked_sub_days(Days::new(1)).unwrap();
        let next_week = today.checked_add_days(Days::new(7)).unwrap();

        recorder.upsert_game(&game("g0", yesterday, "MIA", "CHI")).await.unwrap();
        recorder.upsert_game(&game("g1", today, "NYK", "BOS")).await.unwrap();
        recorder.upsert_game(&game("g2", today, "LAL", "DEN")).await.unwrap();
        recorder.upsert_game(&game("g9", next_week, "PHX", "DAL")).await.unwrap();

        recorder
            .record(&[
                reading(now, "g1", Moneyline, "BOS", None, 1.80, 60),
                reading(now, "g1", Moneyline, "NYK", None, 2.10, 60),
                reading(now, "g1", Moneyline, "BOS", None, 1.75, 30),
                reading(now, "g1", Moneyline, "NYK", None, 2.20, 30),
                reading(now, "g1", Moneyline, "BOS", None, 1.90, 5),
                reading(now, "g1", Moneyline, "NYK", None, 2.00, 5),
                reading(now, "g1", Total, "Over", Some(226.5), 1.91, 60),
                reading(now, "g1", Total, "Under", Some(226.5), 1.91, 60),
                reading(now, "g1", Total, "Over", Some(224.5), 1.91, 5),
                reading(now, "g1", Total, "Under", Some(224.5), 1.91, 5),
                OddsReading {
                    stat: Some("points".to_string()),
                    side: Some("over".to_string()),
                    ..reading(now, "g1", Prop, "Jayson Tatum", Some(27.5), 1.91, 60)
                },
                OddsReading {
                    stat: Some("points".to_string()),
                    side: Some("under".to_string()),
                    ..reading(now, "g1", Prop, "Jayson Tatum", Some(27.5), 1.91, 60)
                },
                OddsReading {
                    stat: Some("points".to_string()),
                    side: Some("over".to_string()),
                    ..reading(now, "g1", Prop, "Jayson Tatum", Some(28.5), 1.91, 5)
                },
                OddsReading {
                    stat: Some("points".to_string()),
                    side: Some("under".to_string()),
                    ..reading(now, "g1", Prop, "Jayson Tatum", Some(28.5), 1.91, 5)
                },
                reading(now, "g0", Moneyline, "CHI", None, 1.50, 600),
                reading(now, "g0", Moneyline, "MIA", None, 2.60, 600),
                reading(now, "g9", Moneyline, "DAL", None, 1.50, 60),
                reading(now, "g9", Moneyline, "PHX", None, 2.60, 60),
            ])
            .await
            .unwrap();

        state_with(pool, answer())
    }

    fn json_of<T: Serialize>(value: &T) -> serde_json::Value {
        serde_json::to_value(value).unwrap()
    }

    #[tokio::test]
    async fn movement_lists_only_todays_games_with_odds() {
        let state = seeded_state().await;
        let Json(resp) = get_odds_movement(State(state.clone())).await.unwrap();
        let v = json_of(&resp);

        let games = v["games"].as_array().unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0]["gameId"], "g1");
        assert_eq!(games[0]["summary"]["mlOpen"]["home"], 1.8);
        assert_eq!(games[0]["summary"]["mlMovement"]["home"], 0.1);
        assert_eq!(games[0]["summary"]["totalMovement"]["line"], -2.0);
        assert_eq!(games[0]["summary"]["dataPoints"], 5);
        assert_eq!(v["insights"]["totalGames"], 1);
        assert_eq!(v["insights"]["overallTotalTrend"], "all_under");
        assert_eq!(v["insights"]["biggestMLMovers"][0]["movement"], -0.1);

        assert_eq!(state.health.requests_served(), 1);
        assert!(state.health.last_success_at_ms().is_some());
        assert_eq!(state.latency.snapshot().samples, 1);
    }

    #[tokio::test]
    async fn terminal_covers_wider_window_and_props() {
        let state = seeded_state().await;
        let Json(resp) = get_odds_terminal(State(state)).await.unwrap();
        let v = json_of(&resp);

        let ids: Vec<&str> = v["allGames"]
            .as_array()
            .unwrap()
            .iter()
            .map(|g| g["gameId"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["g0", "g1", "g2"]);

        let g2 = &v["allGames"][2];
        assert_eq!(g2["hasOdds"], false);
        assert!(g2["total"].is_null());
        // Moneyline only: has odds, but no total.
        let g0 = &v["allGames"][0];
        assert_eq!(g0["hasOdds"], true);
        assert!(g0["total"].is_null());
        assert_eq!(v["allGames"][1]["readings"], 10);

        assert_eq!(v["moneylines"].as_array().unwrap().len(), 4);
        assert_eq!(v["totals"].as_array().unwrap().len(), 1);

        let prop = &v["playerProps"][0];
        assert_eq!(prop["player"], "Jayson Tatum");
        assert_eq!(prop["openLine"], 27.5);
        assert_eq!(prop["currentLine"], 28.5);
        assert_eq!(prop["readings"], 4);
        assert_eq!(v["insights"]["propsWithMovement"], 1);
        assert_eq!(v["insights"]["totalPointsDropped"], -2.0);
    }

    #[tokio::test]
    async fn empty_store_is_not_an_error() {
        let state = state_with(test_pool().await, answer());
        let Json(resp) = get_odds_movement(State(state.clone())).await.unwrap();
        let v = json_of(&resp);
        assert_eq!(v["games"], serde_json::json!([]));
        assert_eq!(v["insights"]["overallTotalTrend"], "mixed");
        assert_eq!(state.health.requests_failed(), 0);
    }

    #[tokio::test]
    async fn closed_pool_is_500_with_error_body() {
        let pool = test_pool().await;
        let state = state_with(pool.clone(), answer());
        pool.close().await;

        let err = get_odds_terminal(State(state.clone())).await.unwrap_err();
        assert!(matches!(err, AppError::DataSourceUnavailable(_)));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(state.health.requests_failed(), 1);

        let (status, Json(health)) = get_health(State(state)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(health.database, "unavailable");
    }

    #[tokio::test]
    async fn health_reports_counters() {
        let state = seeded_state().await;
        let _ = get_odds_movement(State(state.clone())).await.unwrap();
        let (status, Json(health)) = get_health(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        let v = json_of(&health);
        assert_eq!(v["status"], "ok");
        assert_eq!(v["requestsServed"], 1);
        assert_eq!(v["requestsFailed"], 0);
        assert!(v["lastSuccessAt"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn latency_is_empty_before_first_request() {
        let state = state_with(test_pool().await, answer());
        let Json(resp) = get_stats_latency(State(state.clone())).await;
        assert!(resp.p50_ms.is_none());
        assert_eq!(resp.sample_count, 0);

        let _ = get_odds_terminal(State(state.clone())).await.unwrap();
        let Json(resp) = get_stats_latency(State(state)).await;
        assert_eq!(resp.sample_count, 1);
        assert!(resp.p99_ms.is_some());
    }

    #[tokio::test]
    async fn betting_agent_passes_query_and_depth() {
        let state = state_with(test_pool().await, answer());
        let req = AgentRequest { query: "  best ML tonight ".to_string(), depth: AnalysisDepth::Deep };
        let Json(rec) = post_betting_agent(State(state), Ok(Json(req))).await.unwrap();
        assert_eq!(rec.recommendation, "BOS ML (best ML tonight, deep)");
        assert_eq!(rec.confidence, Some(0.7));
    }

    #[tokio::test]
    async fn betting_agent_errors_map_to_gateway_statuses() {
        let timeout = state_with(test_pool().await, FakeAgent::TimesOut);
        let req = AgentRequest { query: "x".to_string(), depth: AnalysisDepth::Quick };
        let err = post_betting_agent(State(timeout), Ok(Json(req))).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::GATEWAY_TIMEOUT);

        let failed = state_with(test_pool().await, FakeAgent::Fails);
        let req = AgentRequest { query: "x".to_string(), depth: AnalysisDepth::Quick };
        let err = post_betting_agent(State(failed), Ok(Json(req))).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn betting_agent_rejects_blank_query() {
        let state = state_with(test_pool().await, answer());
        let req = AgentRequest { query: "   ".to_string(), depth: AnalysisDepth::Quick };
        let err = post_betting_agent(State(state), Ok(Json(req))).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    async fn extract_agent_request(body: &'static str) -> std::result::Result<Json<AgentRequest>, JsonRejection> {
        let req = Request::builder()
            .method("POST")
            .uri("/betting-agent")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        Json::<AgentRequest>::from_request(req, &()).await
    }

    #[tokio::test]
    async fn betting_agent_bad_body_is_400_with_error_body() {
        for body in [r#"{"query":"x","depth":"medium"}"#, r#"{"depth":"deep"}"#, "{"] {
            let state = state_with(test_pool().await, answer());
            let payload = extract_agent_request(body).await;
            assert!(payload.is_err(), "{body} should not deserialize");

            let err = post_betting_agent(State(state), payload).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidRequest(_)));
            let resp = err.into_response();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
            let v: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert!(v["error"].is_string());
            assert!(v["details"].is_string());
        }
    }

    #[test]
    fn agent_request_depth_defaults_to_quick() {
        let req: AgentRequest = serde_json::from_str(r#"{"query":"who covers"}"#).unwrap();
        assert_eq!(req.depth, AnalysisDepth::Quick);
        let req: AgentRequest = serde_json::from_str(r#"{"query":"q","depth":"deep"}"#).unwrap();
        assert_eq!(req.depth, AnalysisDepth::Deep);
    }
}
