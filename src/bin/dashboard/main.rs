mod app;

use std::io;
use std::path::Path;
use std::time::Duration;

use app::{
    format_count, format_last_run, format_percent, parse_hex_color, truncate_text, AppState,
    Banner, ConnectionStatus,
};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};

const SUBJECT_PREVIEW_CHARS: usize = 30;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> io::Result<()> {
    let base_url = std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

    // No client-side deadline: the server enforces the analysis timeout.
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .build()
        .expect("failed to build HTTP client");

    let mut app = AppState::new(base_url);

    // Initial fetch before rendering
    app.refresh(&client).await;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut table_state = TableState::default();
    table_state.select(None);

    let result = run_loop(&mut terminal, &mut app, &client, &mut table_state).await;

    // Restore terminal regardless of result
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
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
    table_state: &mut TableState,
) -> io::Result<()> {
    let refresh_interval = Duration::from_secs(2);
    let input_poll = Duration::from_millis(250);
    let mut last_tick = std::time::Instant::now();

    loop {
        terminal.draw(|f| render(f, app, table_state))?;

        let timeout = refresh_interval
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO)
            .min(input_poll);

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if app.search_mode {
                        match key.code {
                            KeyCode::Enter | KeyCode::Esc => app.search_mode = false,
                            KeyCode::Backspace => {
                                app.search.pop();
                                app.refresh_table(client).await;
                                table_state.select(None);
                            }
                            KeyCode::Char(c) => {
                                app.search.push(c);
                                app.refresh_table(client).await;
                                table_state.select(None);
                            }
                            _ => {}
                        }
                        continue;
                    }

                    match key.code {
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char('r') | KeyCode::Char('R') => {
                            app.refresh(client).await;
                            last_tick = std::time::Instant::now();
                        }
                        KeyCode::Char('a') | KeyCode::Char('A') => app.start_run(client),
                        KeyCode::Char('e') | KeyCode::Char('E') => {
                            app.banner = Some(match app.export(client, Path::new(".")).await {
                                Ok(name) => Banner::Success(format!("Exported {name}")),
                                Err(e) => Banner::Error(format!("Export failed: {e}")),
                            });
                        }
                        KeyCode::Char('/') => app.search_mode = true,
                        KeyCode::Esc => app.banner = None,
                        KeyCode::Down | KeyCode::Char('j') => {
                            let max = app.campaigns.campaigns.len().saturating_sub(1);
                            let next = table_state.selected().map_or(0, |i| (i + 1).min(max));
                            table_state.select(Some(next));
                        }
                        KeyCode::Up | KeyCode::Char('k') => {
                            let prev = table_state
                                .selected()
                                .map_or(0, |i| i.saturating_sub(1));
                            table_state.select(Some(prev));
                        }
                        _ => {}
                    }
                }
            }
        }

        if app.poll_run() {
            app.refresh(client).await;
            last_tick = std::time::Instant::now();
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

fn render(f: &mut Frame, app: &AppState, table_state: &mut TableState) {
    let area = f.area();

    // Outer vertical split: header | cards | body | status line | footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(4), // summary cards
            Constraint::Min(0),    // body
            Constraint::Length(1), // search / banner
            Constraint::Length(1), // footer
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    render_cards(f, app, chunks[1]);
    render_body(f, app, table_state, chunks[2]);
    render_status_line(f, app, chunks[3]);
    render_footer(f, app, chunks[4]);
}

fn render_header(f: &mut Frame, app: &AppState, area: Rect) {
    let (status_text, status_color) = match &app.status {
        ConnectionStatus::Connected => ("● connected".to_string(), Color::Green),
        ConnectionStatus::Connecting => ("◌ connecting".to_string(), Color::Yellow),
        ConnectionStatus::Error(e) => (format!("✗ {}", truncate_text(e, 40)), Color::Red),
    };

    let run_text = if app.is_running() {
        Span::styled("◌ analysis running", Style::default().fg(Color::Yellow))
    } else {
        Span::styled("idle", Style::default().fg(Color::DarkGray))
    };

    let last_run = app
        .analysis
        .as_ref()
        .map_or("never".to_string(), |a| format_last_run(a.last_run));

    let title_spans = vec![
        Span::styled(
            " Campaign Analysis  ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::raw("  │  "),
        run_text,
        Span::raw("  │  "),
        Span::styled(format!("last run: {last_run}"), Style::default().fg(Color::White)),
    ];

    let paragraph = Paragraph::new(Line::from(title_spans))
        .block(Block::default().borders(Borders::ALL).border_style(
            Style::default().fg(Color::DarkGray),
        ));

    f.render_widget(paragraph, area);
}

fn render_cards(f: &mut Frame, app: &AppState, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let cards = match &app.analysis {
        Some(a) => [
            ("TOTAL CAMPAIGNS", format_count(a.total_campaigns), format!("{} variants tested", a.total_variants)),
            ("AVG OPEN RATE", format_percent(a.average_open_rate), "across all variants".to_string()),
            ("AVG REPLY RATE", format_percent(a.average_reply_rate), "response rate".to_string()),
            ("TOTAL SENT", format_count(a.total_sent), "emails delivered".to_string()),
        ],
        None => [
            ("TOTAL CAMPAIGNS", "—".to_string(), String::new()),
            ("AVG OPEN RATE", "—".to_string(), String::new()),
            ("AVG REPLY RATE", "—".to_string(), String::new()),
            ("TOTAL SENT", "—".to_string(), String::new()),
        ],
    };

    for (i, (title, value, caption)) in cards.into_iter().enumerate() {
        let lines = vec![
            Line::from(Span::styled(
                value,
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(caption, Style::default().fg(Color::DarkGray))),
        ];
        let card = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(Span::styled(
                    format!(" {title} "),
                    Style::default().fg(Color::Cyan),
                )),
        );
        f.render_widget(card, cols[i]);
    }
}

fn render_body(f: &mut Frame, app: &AppState, table_state: &mut TableState, area: Rect) {
    // Horizontal split: campaigns (75%) | verdicts (25%)
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(75), Constraint::Percentage(25)])
        .split(area);

    render_campaigns_table(f, app, table_state, halves[0]);
    render_verdicts(f, app, halves[1]);
}

fn verdict_color(app: &AppState, verdict: &str) -> Color {
    app.verdicts
        .iter()
        .find(|v| v.verdict == verdict)
        .and_then(|v| parse_hex_color(&v.color))
        .map_or(Color::Gray, |(r, g, b)| Color::Rgb(r, g, b))
}

fn render_campaigns_table(f: &mut Frame, app: &AppState, state: &mut TableState, area: Rect) {
    let header_cells = [
        "Campaign", "Variant", "Subject Line", "Sent", "Open Rate", "Reply Rate", "Verdict", "Action",
    ]
    .iter()
    .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .campaigns
        .campaigns
        .iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(r.campaign.clone()),
                Cell::from(r.variant.clone()).style(Style::default().fg(Color::Cyan)),
                Cell::from(truncate_text(&r.subject_line, SUBJECT_PREVIEW_CHARS)),
                Cell::from(format_count(r.sent)),
                Cell::from(format_percent(r.open_rate)),
                Cell::from(format_percent(r.reply_rate)),
                Cell::from(r.verdict.clone())
                    .style(Style::default().fg(verdict_color(app, &r.verdict))),
                Cell::from(r.action.clone()).style(Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    let title = if app.search.is_empty() {
        " CAMPAIGNS ".to_string()
    } else {
        format!(
            " CAMPAIGNS ({} of {}) ",
            app.campaigns.matched, app.campaigns.total
        )
    };

    let table = Table::new(
        rows,
        [
            Constraint::Min(10),
            Constraint::Length(8),
            Constraint::Length(34),
            Constraint::Length(7),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(16),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(
                title,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
    )
    .row_highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    );

    f.render_stateful_widget(table, area, state);
}

fn render_verdicts(f: &mut Frame, app: &AppState, area: Rect) {
    let total: usize = app.verdicts.iter().map(|v| v.count).sum();

    let lines: Vec<Line> = if app.verdicts.is_empty() {
        vec![Line::from(Span::styled(
            "No data. Press [a] to run an analysis.",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        app.verdicts
            .iter()
            .map(|v| {
                let color = parse_hex_color(&v.color)
                    .map_or(Color::Gray, |(r, g, b)| Color::Rgb(r, g, b));
                let share = if total > 0 { v.count * 100 / total } else { 0 };
                Line::from(vec![
                    Span::styled("■ ", Style::default().fg(color)),
                    Span::raw(format!("{:<16}", v.label)),
                    Span::styled(
                        format!("{:>3} ({share}%)", v.count),
                        Style::default().fg(Color::White),
                    ),
                ])
            })
            .collect()
    };

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(
                " VERDICTS ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
    );
    f.render_widget(paragraph, area);
}

fn render_status_line(f: &mut Frame, app: &AppState, area: Rect) {
    let line = if app.search_mode || !app.search.is_empty() {
        let cursor = if app.search_mode { "▏" } else { "" };
        Line::from(vec![
            Span::styled(" search: ", Style::default().fg(Color::Yellow)),
            Span::raw(format!("{}{cursor}", app.search)),
        ])
    } else {
        match &app.banner {
            Some(Banner::Success(m)) => Line::from(Span::styled(format!(" ✓ {m}"), Style::default().fg(Color::Green))),
            Some(Banner::Info(m)) => Line::from(Span::styled(format!(" • {m}"), Style::default().fg(Color::Cyan))),
            Some(Banner::Error(m)) => Line::from(vec![
                Span::styled(format!(" ✗ {m} "), Style::default().fg(Color::Red)),
                Span::styled("[a] retry", Style::default().fg(Color::Yellow)),
            ]),
            None => Line::default(),
        }
    };
    f.render_widget(Paragraph::new(line), area);
}

fn render_footer(f: &mut Frame, app: &AppState, area: Rect) {
    let run_style = if app.is_running() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Yellow)
    };
    let line = Line::from(vec![
        Span::styled(" [q] ", Style::default().fg(Color::Yellow)),
        Span::raw("quit  "),
        Span::styled("[a] ", run_style),
        Span::raw("run analysis  "),
        Span::styled("[e] ", Style::default().fg(Color::Yellow)),
        Span::raw("export csv  "),
        Span::styled("[/] ", Style::default().fg(Color::Yellow)),
        Span::raw("search  "),
        Span::styled("[r] ", Style::default().fg(Color::Yellow)),
        Span::raw("refresh  "),
        Span::styled("[↑↓ / j k] ", Style::default().fg(Color::Yellow)),
        Span::raw("scroll  "),
        Span::styled("auto-refresh: 2s", Style::default().fg(Color::DarkGray)),
    ]);
    let paragraph = Paragraph::new(line).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}
