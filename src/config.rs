use crate::error::{AppError, Result};

/// Moneyline moves at or below this size (decimal odds) are price noise, not a move.
pub const MOVER_NOISE_THRESHOLD: f64 = 0.05;

/// Number of entries kept in each "biggest movers" list.
pub const TOP_MOVERS: usize = 5;

/// Decimal places for rendered odds and odds movement.
pub const ODDS_DECIMALS: u32 = 3;

/// Decimal places for rendered spread/total lines and line movement.
pub const LINE_DECIMALS: u32 = 1;

/// Agent budget for `depth=quick` requests (seconds).
pub const AGENT_QUICK_TIMEOUT_SECS: u64 = 30;

/// Agent budget for `depth=deep` requests (seconds).
pub const AGENT_DEEP_TIMEOUT_SECS: u64 = 60;

/// Time a timed-out agent gets to exit after SIGTERM before it is killed (seconds).
pub const AGENT_KILL_GRACE_SECS: u64 = 2;

pub const AGENT_SCRIPT: &str = "scripts/betting_agent.py";

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Days after today covered by /odds-movement (MOVEMENT_LOOKAHEAD_DAYS)
    pub movement_lookahead_days: i64,
    /// Days before today covered by /odds-terminal (TERMINAL_LOOKBACK_DAYS)
    pub terminal_lookback_days: i64,
    /// Days after today covered by /odds-terminal (TERMINAL_LOOKAHEAD_DAYS)
    pub terminal_lookahead_days: i64,
    /// Interpreter used to launch the betting agent (AGENT_PYTHON)
    pub agent_python: String,
    /// Betting agent entry point (AGENT_SCRIPT)
    pub agent_script: String,
    /// Optional JSON slate loaded into the store at startup (SEED_FILE).
    pub seed_file: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "odds.db".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            movement_lookahead_days: parse_days("MOVEMENT_LOOKAHEAD_DAYS", 1)?,
            terminal_lookback_days: parse_days("TERMINAL_LOOKBACK_DAYS", 1)?,
            terminal_lookahead_days: parse_days("TERMINAL_LOOKAHEAD_DAYS", 2)?,
            agent_python: std::env::var("AGENT_PYTHON").unwrap_or_else(|_| "python3".to_string()),
            agent_script: std::env::var("AGENT_SCRIPT").unwrap_or_else(|_| AGENT_SCRIPT.to_string()),
            seed_file: std::env::var("SEED_FILE").ok().filter(|s| !s.trim().is_empty()),
        })
    }
}

fn parse_days(var: &str, default: i64) -> Result<i64> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|d| *d >= 0)
            .ok_or_else(|| AppError::Config(format!("{var} must be a non-negative number of days"))),
        Err(_) => Ok(default),
    }
}
