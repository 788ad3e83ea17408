use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::config::{LINE_DECIMALS, ODDS_DECIMALS};

// ---------------------------------------------------------------------------
// Markets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketFamily {
    Moneyline,
    Spread,
    Total,
    Prop,
}

impl MarketFamily {
    /// Value stored in `odds_history.market`.
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketFamily::Moneyline => "moneyline",
            MarketFamily::Spread => "spread",
            MarketFamily::Total => "total",
            MarketFamily::Prop => "prop",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "moneyline" | "h2h" => Some(MarketFamily::Moneyline),
            "spread" | "spreads" => Some(MarketFamily::Spread),
            "total" | "totals" => Some(MarketFamily::Total),
            "prop" | "props" => Some(MarketFamily::Prop),
            _ => None,
        }
    }
}

impl std::fmt::Display for MarketFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Home/away side of a two-team market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Away,
    Home,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Away => write!(f, "away"),
            Side::Home => write!(f, "home"),
        }
    }
}

/// Over/under side of a total or player prop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverUnder {
    Over,
    Under,
}

impl OverUnder {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "over" | "o" => Some(OverUnder::Over),
            "under" | "u" => Some(OverUnder::Under),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// One quoted price at one instant. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OddsReading {
    pub game_id: String,
    #[serde(rename = "market")]
    pub family: MarketFamily,
    /// Team abbreviation (moneyline/spread), "Over"/"Under" (total), player name (prop).
    pub selection: String,
    /// Prop stat, e.g. "points". None outside props.
    #[serde(default)]
    pub stat: Option<String>,
    /// "over"/"under" for props. None outside props.
    #[serde(default)]
    pub side: Option<String>,
    /// Handicap or threshold. None for moneyline.
    #[serde(default)]
    pub line: Option<f64>,
    #[serde(rename = "priceDecimal")]
    pub price: f64,
    pub recorded_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Games
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub abbr: String,
    pub name: String,
}

impl Team {
    fn matches(&self, selection: &str) -> bool {
        let s = selection.trim();
        s.eq_ignore_ascii_case(&self.abbr) || s.eq_ignore_ascii_case(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub id: String,
    pub game_date: NaiveDate,
    pub status: String,
    pub home: Team,
    pub away: Team,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
}

impl Game {
    /// "AWY @ HOM"
    pub fn matchup(&self) -> String {
        format!("{} @ {}", self.away.abbr, self.home.abbr)
    }

    /// Resolve a moneyline/spread selection to the side it prices.
    pub fn side_of(&self, selection: &str) -> Option<Side> {
        if self.home.matches(selection) {
            Some(Side::Home)
        } else if self.away.matches(selection) {
            Some(Side::Away)
        } else {
            None
        }
    }

    pub fn team(&self, side: Side) -> &Team {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }
}

/// Inclusive range of game dates. Supplied by the caller; the reader never computes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl GameWindow {
    pub fn around(today: NaiveDate, days_back: i64, days_ahead: i64) -> Self {
        let start = today
            .checked_sub_days(Days::new(days_back.max(0) as u64))
            .unwrap_or(today);
        let end = today
            .checked_add_days(Days::new(days_ahead.max(0) as u64))
            .unwrap_or(today);
        Self { start, end }
    }
}

// ---------------------------------------------------------------------------
// Rendered numbers
// ---------------------------------------------------------------------------

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Decimal odds, or a movement in decimal odds. Always rendered to 3 places.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Odds(pub f64);

impl Odds {
    /// `self - open`, at odds precision.
    pub fn minus(self, open: Odds) -> Odds {
        Odds(round_to(self.0 - open.0, ODDS_DECIMALS))
    }

    pub fn value(self) -> f64 {
        round_to(self.0, ODDS_DECIMALS)
    }
}

impl Serialize for Odds {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.value())
    }
}

impl std::fmt::Display for Odds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.*}", ODDS_DECIMALS as usize, self.value())
    }
}

/// Spread handicap or total threshold, or a movement in one. Always rendered to 1 place.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Line(pub f64);

impl Line {
    pub fn minus(self, open: Line) -> Line {
        Line(round_to(self.0 - open.0, LINE_DECIMALS))
    }

    pub fn value(self) -> f64 {
        round_to(self.0, LINE_DECIMALS)
    }
}

impl Serialize for Line {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.value())
    }
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.*}", LINE_DECIMALS as usize, self.value())
    }
}
