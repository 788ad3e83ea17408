use serde::Deserialize;

// ---------------------------------------------------------------------------
// API response types (mirror api/responses.rs terminal shapes)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TerminalBoard {
    pub fetched_at: String,
    pub all_games: Vec<BoardGame>,
    #[serde(default)]
    pub player_props: Vec<PropRow>,
    pub insights: BoardInsights,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct BoardGame {
    pub game_id: String,
    pub game: String,
    pub game_date: String,
    pub game_status: String,
    pub away_score: Option<i64>,
    pub home_score: Option<i64>,
    pub away_team: TeamOdds,
    pub home_team: TeamOdds,
    pub total: Option<TotalOdds>,
    pub has_odds: bool,
    pub readings: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct TeamOdds {
    pub abbr: String,
    pub name: String,
    pub open_odds: Option<f64>,
    pub current_odds: Option<f64>,
    pub movement: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalOdds {
    pub open_line: f64,
    pub current_line: f64,
    pub movement: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct PropRow {
    pub game: String,
    pub player: String,
    pub stat: String,
    pub open_line: f64,
    pub current_line: f64,
    pub movement: f64,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BoardInsights {
    #[serde(rename = "biggestMLMovers", default)]
    pub biggest_ml_movers: Vec<MoverRow>,
    #[serde(default)]
    pub totals_trend: String,
    #[serde(default)]
    pub total_points_dropped: f64,
    #[serde(default)]
    pub props_with_movement: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoverRow {
    pub game: String,
    pub team: Option<String>,
    pub movement: f64,
}

/// `{error, details}` body returned by the server on failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub details: Option<String>,
}

// ---------------------------------------------------------------------------
// App state
// ---------------------------------------------------------------------------

/// What the board shows. A failed load offers a retry; a successful load
/// with no games says so instead of drawing empty tables.
#[derive(Debug, Clone)]
pub enum BoardView {
    Loading,
    Failed(String),
    NoGames,
    Loaded(TerminalBoard),
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub view: BoardView,
    pub base_url: String,
}

impl AppState {
    pub fn new(base_url: String) -> Self {
        Self {
            view: BoardView::Loading,
            base_url,
        }
    }

    pub fn games(&self) -> &[BoardGame] {
        match &self.view {
            BoardView::Loaded(board) => &board.all_games,
            _ => &[],
        }
    }

    pub async fn refresh(&mut self, client: &reqwest::Client) {
        let url = format!("{}/odds-terminal", self.base_url);
        let view = match client.get(&url).send().await {
            Ok(resp) => {
                let status = resp.status().as_u16();
                match resp.text().await {
                    Ok(body) => classify(status, &body),
                    Err(e) => BoardView::Failed(format!("read error: {e}")),
                }
            }
            Err(e) => BoardView::Failed(format!("{e}")),
        };
        // A failed refresh replaces the board.
        self.view = view;
    }
}

/// Map an HTTP status and body to the board view.
pub fn classify(status: u16, body: &str) -> BoardView {
    if !(200..300).contains(&status) {
        let reason = serde_json::from_str::<ErrorBody>(body)
            .map(|e| match e.details {
                Some(d) => format!("{}: {d}", e.error),
                None => e.error,
            })
            .unwrap_or_else(|_| format!("HTTP {status}"));
        return BoardView::Failed(reason);
    }
    match serde_json::from_str::<TerminalBoard>(body) {
        Ok(board) if board.all_games.is_empty() => BoardView::NoGames,
        Ok(board) => BoardView::Loaded(board),
        Err(e) => BoardView::Failed(format!("parse error: {e}")),
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

pub fn format_odds(v: Option<f64>) -> String {
    v.map_or("—".to_string(), |o| format!("{o:.3}"))
}

pub fn format_odds_move(v: Option<f64>) -> String {
    v.map_or("—".to_string(), |m| format!("{m:+.3}"))
}

pub fn format_line_move(v: f64) -> String {
    format!("{v:+.1}")
}

pub fn format_score(away: Option<i64>, home: Option<i64>) -> String {
    match (away, home) {
        (Some(a), Some(h)) => format!("{a}-{h}"),
        _ => "—".to_string(),
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}
