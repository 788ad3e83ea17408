mod app;

use std::io;
use std::time::Duration;

use app::{
    format_line_move, format_odds, format_odds_move, format_score, truncate, AppState, BoardInsights, BoardView,
    TerminalBoard,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> io::Result<()> {
    let base_url = std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(io::Error::other)?;

    let mut app = AppState::new(base_url);

    // Initial fetch before rendering
    app.refresh(&client).await;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut games_state = TableState::default();

    let result = run_loop(&mut terminal, &mut app, &client, &mut games_state).await;

    // Restore terminal regardless of result
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    client: &reqwest::Client,
    games_state: &mut TableState,
) -> io::Result<()> {
    let refresh_interval = Duration::from_secs(30);
    let mut last_tick = std::time::Instant::now();

    loop {
        terminal.draw(|f| render(f, app, games_state))?;

        let timeout = refresh_interval
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char('r') | KeyCode::Char('R') => {
                            app.view = BoardView::Loading;
                            terminal.draw(|f| render(f, app, games_state))?;
                            app.refresh(client).await;
                            last_tick = std::time::Instant::now();
                        }
                        KeyCode::Down | KeyCode::Char('j') => {
                            let max = app.games().len().saturating_sub(1);
                            let next = games_state.selected().map_or(0, |i| (i + 1).min(max));
                            games_state.select(Some(next));
                        }
                        KeyCode::Up | KeyCode::Char('k') => {
                            let prev = games_state.selected().map_or(0, |i| i.saturating_sub(1));
                            games_state.select(Some(prev));
                        }
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= refresh_interval {
            app.refresh(client).await;
            last_tick = std::time::Instant::now();
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(f: &mut Frame, app: &AppState, games_state: &mut TableState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(0),    // body
            Constraint::Length(1), // footer
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    match &app.view {
        BoardView::Loaded(board) => render_board(f, board, games_state, chunks[1]),
        BoardView::Loading => render_message(f, "Loading odds…", Color::Yellow, chunks[1]),
        BoardView::NoGames => render_message(f, "No games today", Color::White, chunks[1]),
        BoardView::Failed(reason) => render_message(
            f,
            &format!("Failed to load odds: {}\npress [r] to retry", truncate(reason, 120)),
            Color::Red,
            chunks[1],
        ),
    }
    render_footer(f, chunks[2]);
}

fn render_header(f: &mut Frame, app: &AppState, area: Rect) {
    let (status_text, status_color) = match &app.view {
        BoardView::Loaded(_) | BoardView::NoGames => ("● connected", Color::Green),
        BoardView::Loading => ("◌ loading", Color::Yellow),
        BoardView::Failed(_) => ("✗ error", Color::Red),
    };

    let mut spans = vec![
        Span::styled(
            " NBA Odds Board  ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(status_text, Style::default().fg(status_color)),
    ];
    if let BoardView::Loaded(board) = &app.view {
        spans.extend([
            Span::raw("  │  "),
            Span::styled(format!("{} games", board.all_games.len()), Style::default().fg(Color::White)),
            Span::raw("  │  "),
            Span::styled(
                format!("totals {}", board.insights.totals_trend),
                Style::default().fg(trend_color(&board.insights.totals_trend)),
            ),
            Span::raw("  │  "),
            Span::styled(
                format!("fetched {}", truncate(&board.fetched_at, 19)),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
    f.render_widget(paragraph, area);
}

fn render_message(f: &mut Frame, text: &str, color: Color, area: Rect) {
    let paragraph = Paragraph::new(text.to_string())
        .alignment(Alignment::Center)
        .style(Style::default().fg(color))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::DarkGray)));
    f.render_widget(paragraph, area);
}

fn render_board(f: &mut Frame, board: &TerminalBoard, games_state: &mut TableState, area: Rect) {
    // Horizontal split: games (65%) | insights + props (35%)
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    render_games_table(f, board, games_state, halves[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(0)])
        .split(halves[1]);
    render_insights(f, &board.insights, right[0]);
    render_props_table(f, board, right[1]);
}

fn header_row(labels: &[&'static str]) -> Row<'static> {
    let cells = labels
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    Row::new(cells).height(1)
}

fn titled_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(title, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)))
}

fn render_games_table(f: &mut Frame, board: &TerminalBoard, state: &mut TableState, area: Rect) {
    let header = header_row(&["Game", "Score", "Away", "Δ", "Home", "Δ", "Total", "Δ"]);

    let rows: Vec<Row> = board
        .all_games
        .iter()
        .map(|g| {
            let (total, total_move, total_color) = match &g.total {
                Some(t) => (
                    format!("{:.1}→{:.1}", t.open_line, t.current_line),
                    format_line_move(t.movement),
                    move_color(t.movement),
                ),
                None => ("—".to_string(), "—".to_string(), Color::DarkGray),
            };
            let game_style = if g.has_odds {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            Row::new(vec![
                Cell::from(truncate(&g.game, 12)).style(game_style),
                Cell::from(format_score(g.away_score, g.home_score)).style(Style::default().fg(Color::DarkGray)),
                Cell::from(format_odds(g.away_team.current_odds)),
                Cell::from(format_odds_move(g.away_team.movement))
                    .style(Style::default().fg(g.away_team.movement.map_or(Color::DarkGray, move_color))),
                Cell::from(format_odds(g.home_team.current_odds)),
                Cell::from(format_odds_move(g.home_team.movement))
                    .style(Style::default().fg(g.home_team.movement.map_or(Color::DarkGray, move_color))),
                Cell::from(total),
                Cell::from(total_move).style(Style::default().fg(total_color)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(12),
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(12),
            Constraint::Length(5),
        ],
    )
    .header(header)
    .block(titled_block(" GAMES "))
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    f.render_stateful_widget(table, area, state);
}

fn render_insights(f: &mut Frame, insights: &BoardInsights, area: Rect) {
    let mut lines = vec![Line::from(vec![
        Span::raw(" totals "),
        Span::styled(insights.totals_trend.clone(), Style::default().fg(trend_color(&insights.totals_trend))),
        Span::raw(format!("  net {}", format_line_move(insights.total_points_dropped))),
        Span::raw(format!("  props moved {}", insights.props_with_movement)),
    ])];
    if insights.biggest_ml_movers.is_empty() {
        lines.push(Line::from(Span::styled(" no moneyline moves", Style::default().fg(Color::DarkGray))));
    }
    for m in &insights.biggest_ml_movers {
        lines.push(Line::from(vec![
            Span::raw(format!(" {:<12}", truncate(&m.game, 12))),
            Span::raw(format!("{:<4}", m.team.as_deref().unwrap_or("—"))),
            Span::styled(format_odds_move(Some(m.movement)), Style::default().fg(move_color(m.movement))),
        ]));
    }

    f.render_widget(Paragraph::new(lines).block(titled_block(" BIGGEST ML MOVERS ")), area);
}

fn render_props_table(f: &mut Frame, board: &TerminalBoard, area: Rect) {
    let header = header_row(&["Player", "Stat", "Line", "Δ"]);
    let rows: Vec<Row> = board
        .player_props
        .iter()
        .map(|p| {
            Row::new(vec![
                Cell::from(truncate(&p.player, 16)),
                Cell::from(truncate(&p.stat, 8)).style(Style::default().fg(Color::DarkGray)),
                Cell::from(format!("{:.1}→{:.1}", p.open_line, p.current_line)),
                Cell::from(format_line_move(p.movement)).style(Style::default().fg(move_color(p.movement))),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [Constraint::Min(10), Constraint::Length(8), Constraint::Length(11), Constraint::Length(5)],
    )
    .header(header)
    .block(titled_block(" PLAYER PROPS "));
    f.render_widget(table, area);
}

fn render_footer(f: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled(" [q] ", Style::default().fg(Color::Yellow)),
        Span::raw("quit  "),
        Span::styled("[r] ", Style::default().fg(Color::Yellow)),
        Span::raw("refresh  "),
        Span::styled("[↑↓ / j k] ", Style::default().fg(Color::Yellow)),
        Span::raw("scroll games  "),
        Span::styled("auto-refresh: 30s", Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(line).style(Style::default().fg(Color::White)), area);
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn move_color(movement: f64) -> Color {
    if movement > 0.0 {
        Color::Green
    } else if movement < 0.0 {
        Color::Red
    } else {
        Color::DarkGray
    }
}

fn trend_color(trend: &str) -> Color {
    match trend {
        "all_under" => Color::Red,
        "all_over" => Color::Green,
        _ => Color::Yellow,
    }
}
