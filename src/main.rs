use std::io;
use std::sync::mpsc;
use std::time::Duration;

use chrono::Utc;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState};

use props_terminal::models::{StatKey, TableRow};
use props_terminal::state::{AppState, Delta, ProviderCommand, SortDir, SortKey, apply_delta};
use props_terminal::{fake_feed, provider};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<ProviderCommand>,
}

impl App {
    fn new(cmd_tx: mpsc::Sender<ProviderCommand>) -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.change_stat(StatKey::Points),
            KeyCode::Char('2') => self.change_stat(StatKey::Rebounds),
            KeyCode::Char('3') => self.change_stat(StatKey::Assists),
            KeyCode::Char('s') | KeyCode::Tab => {
                self.state.cycle_stat();
                self.request_ranks();
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('h') | KeyCode::Left => self.state.cycle_sort_prev(),
            KeyCode::Char('l') | KeyCode::Right => self.state.cycle_sort_next(),
            KeyCode::Char('d') | KeyCode::Enter => {
                self.state.sort_dir = self.state.sort_dir.flip();
            }
            KeyCode::Char('r') => self.request_refresh(),
            KeyCode::Char('e') => self.request_export(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn change_stat(&mut self, stat: StatKey) {
        self.state.set_stat(stat);
        self.request_ranks();
    }

    fn request_refresh(&mut self) {
        self.state.sources_loading = true;
        if self.cmd_tx.send(ProviderCommand::FetchSources).is_err() {
            self.state.push_log("[WARN] Refresh request failed");
        }
    }

    fn request_ranks(&mut self) {
        let teams = self.state.needed_rank_teams();
        if teams.is_empty() {
            return;
        }
        if self
            .cmd_tx
            .send(ProviderCommand::FetchDvp { teams })
            .is_err()
        {
            self.state.push_log("[WARN] Rank request failed");
        }
    }

    fn request_export(&mut self) {
        let rows = self.state.visible_rows();
        if rows.is_empty() {
            self.state.push_log("[INFO] Nothing to export");
            return;
        }
        let path = format!(
            "props_{}_{}.xlsx",
            self.state.stat.wire_key(),
            Utc::now().format("%Y%m%d_%H%M%S")
        );
        if self
            .cmd_tx
            .send(ProviderCommand::Export {
                path: path.clone(),
                rows,
            })
            .is_err()
        {
            self.state.push_log("[WARN] Export request failed");
        } else {
            self.state.push_log(format!("[INFO] Exporting to {path}"));
        }
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    if demo_mode() {
        fake_feed::spawn_fake_provider(tx, cmd_rx);
    } else {
        provider::spawn_provider(tx, cmd_rx);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, rx, cmd_tx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn demo_mode() -> bool {
    if std::env::args().any(|arg| arg == "--demo") {
        return true;
    }
    std::env::var("DEMO_FEED")
        .map(|v| {
            let t = v.trim().to_ascii_lowercase();
            !(t.is_empty() || t == "0" || t == "false" || t == "off")
        })
        .unwrap_or(false)
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    rx: mpsc::Receiver<Delta>,
    cmd_tx: mpsc::Sender<ProviderCommand>,
) -> anyhow::Result<()> {
    let mut app = App::new(cmd_tx);
    app.state.sources_loading = true;

    loop {
        let mut sources_arrived = false;
        while let Ok(delta) = rx.try_recv() {
            if matches!(delta, Delta::SetSources(_)) {
                sources_arrived = true;
            }
            apply_delta(&mut app.state, delta);
        }
        if sources_arrived {
            app.request_ranks();
        }

        terminal.draw(|frame| draw(frame, &app.state))?;

        if event::poll(Duration::from_millis(150))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }
        if app.should_quit {
            return Ok(());
        }
    }
}

fn draw(frame: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(7),
        ])
        .split(frame.size());

    draw_header(frame, state, chunks[0]);
    draw_table(frame, state, chunks[1]);
    draw_console(frame, state, chunks[2]);

    if state.help_overlay {
        draw_help(frame);
    }
}

fn draw_header(frame: &mut Frame, state: &AppState, area: Rect) {
    let rows = state.visible_rows();
    let mut spans = vec![
        Span::styled(
            " WNBA PROPS ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
    ];
    for stat in StatKey::DISPLAY {
        let style = if stat == state.stat {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(stat.label(), style));
        spans.push(Span::raw("  "));
    }
    spans.push(Span::raw(format!(
        "| sort {} {}  | {} rows",
        state.sort_key.label(),
        match state.sort_dir {
            SortDir::Asc => "↑",
            SortDir::Desc => "↓",
        },
        rows.len(),
    )));
    if state.sources_loading {
        spans.push(Span::styled(
            "  fetching…",
            Style::default().fg(Color::Magenta),
        ));
    }
    if let Some(status) = &state.export_status {
        spans.push(Span::styled(
            format!("  {status}"),
            Style::default().fg(Color::Green),
        ));
    }

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("props.cash"));
    frame.render_widget(header, area);
}

fn draw_table(frame: &mut Frame, state: &AppState, area: Rect) {
    let rows = state.visible_rows();

    let header_cells: Vec<Cell> = SortKey::ALL
        .iter()
        .map(|key| {
            let style = if *key == state.sort_key {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            Cell::from(key.label()).style(style)
        })
        .collect();
    let header = Row::new(header_cells).height(1);

    let body: Vec<Row> = rows.iter().map(table_row).collect();

    let widths = [
        Constraint::Length(26),
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(4),
        Constraint::Length(5),
        Constraint::Length(5),
        Constraint::Length(5),
        Constraint::Length(5),
        Constraint::Length(5),
        Constraint::Length(5),
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(5),
        Constraint::Length(12),
    ];

    let table = Table::new(body, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(format!(
            " {} | j/k select · h/l sort col · d flip · 1/2/3 stat · r refresh · e export · ? help ",
            state.stat.label()
        )))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut table_state = TableState::default();
    if !rows.is_empty() {
        table_state.select(Some(state.selected.min(rows.len() - 1)));
    }
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn table_row(row: &TableRow) -> Row<'static> {
    let mut player = row.player.clone();
    if let Some(inj) = &row.inj {
        player.push_str(&format!(" [{inj}]"));
    }
    if row.has_alt {
        player.push_str(" +alt");
    }
    let meta = format!(
        "{} {} v {}",
        row.team,
        row.position,
        row.opponent.as_deref().unwrap_or("?")
    );

    let player_style = if matches!(row.inj.as_deref(), Some("OUT") | Some("OFS")) {
        Style::default().fg(Color::Red)
    } else if row.inj.is_some() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    Row::new(vec![
        Cell::from(format!("{player}  {meta}")).style(player_style),
        Cell::from(fmt_num(row.line, 1)),
        Cell::from(fmt_num(row.over, 0)),
        Cell::from(fmt_num(row.under, 0)),
        Cell::from(row.stk.to_string()),
        pct_cell(row.pct_season),
        pct_cell(row.pct_h2h),
        pct_cell(row.pct_l5),
        pct_cell(row.pct_l10),
        pct_cell(row.pct_l20),
        pct_cell(row.pct_prev),
        Cell::from(fmt_num(row.proj, 1)),
        diff_cell(row.diff),
        dvp_cell(row.dvp),
        Cell::from(row.game_time.clone().unwrap_or_else(dash)),
    ])
    .height(1)
}

fn pct_cell(value: Option<f64>) -> Cell<'static> {
    match value {
        Some(p) => Cell::from(format!("{p:.0}%")).style(Style::default().bg(heat_pct(p)).fg(Color::Black)),
        None => Cell::from(dash()),
    }
}

fn diff_cell(value: Option<f64>) -> Cell<'static> {
    match value {
        Some(d) => {
            Cell::from(format!("{d:+.1}")).style(Style::default().bg(heat_diff(d)).fg(Color::Black))
        }
        None => Cell::from(dash()),
    }
}

fn dvp_cell(rank: Option<u32>) -> Cell<'static> {
    match rank {
        Some(r) => Cell::from(ordinal(r)).style(Style::default().bg(heat_dvp(r)).fg(Color::Black)),
        None => Cell::from(dash()),
    }
}

fn draw_console(frame: &mut Frame, state: &AppState, area: Rect) {
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = state
        .logs
        .iter()
        .rev()
        .take(visible)
        .rev()
        .map(|entry| {
            let style = if entry.starts_with("[WARN]") {
                Style::default().fg(Color::Yellow)
            } else if entry.starts_with("[ALERT]") {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Gray)
            };
            Line::from(Span::styled(entry.clone(), style))
        })
        .collect();
    let console =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("console"));
    frame.render_widget(console, area);
}

fn draw_help(frame: &mut Frame) {
    let area = centered_rect(52, 14, frame.size());
    let text = vec![
        Line::from("q        quit"),
        Line::from("1/2/3    points / rebounds / assists"),
        Line::from("s, Tab   cycle stat"),
        Line::from("j/k      move selection"),
        Line::from("h/l      move sort column"),
        Line::from("d, Enter flip sort direction"),
        Line::from("r        refresh sources"),
        Line::from("e        export visible table to xlsx"),
        Line::from("?        toggle this help"),
    ];
    let help = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title(" keys "));
    frame.render_widget(Clear, area);
    frame.render_widget(help, area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

fn fmt_num(value: Option<f64>, digits: usize) -> String {
    match value {
        Some(v) => format!("{v:.digits$}"),
        None => dash(),
    }
}

fn dash() -> String {
    "\u{2014}".to_string()
}

fn ordinal(rank: u32) -> String {
    let suffix = match (rank % 10, rank % 100) {
        (1, 11) | (2, 12) | (3, 13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{rank}{suffix}")
}

// Heat ramps mirror the web table: hue runs red (0) to green (120) with
// lightness dipping toward the extremes.
fn heat_pct(pct: f64) -> Color {
    let pct = pct.clamp(0.0, 100.0);
    ramp_color(pct / 100.0)
}

fn heat_diff(diff: f64) -> Color {
    let clamped = diff.clamp(-5.0, 5.0);
    ramp_color((clamped + 5.0) / 10.0)
}

fn heat_dvp(rank: u32) -> Color {
    let clamped = rank.clamp(1, 13) as f64;
    ramp_color((clamped - 1.0) / 12.0)
}

fn ramp_color(t: f64) -> Color {
    let hue = 120.0 * t.clamp(0.0, 1.0);
    let dist = (t - 0.5).abs() * 2.0;
    let light = 0.92 - dist * 0.12;
    hsl_to_color(hue, 0.58, light)
}

fn hsl_to_color(hue: f64, sat: f64, light: f64) -> Color {
    let c = (1.0 - (2.0 * light - 1.0).abs()) * sat;
    let h = hue / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r1, g1, b1) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = light - c / 2.0;
    Color::Rgb(
        ((r1 + m) * 255.0).round() as u8,
        ((g1 + m) * 255.0).round() as u8,
        ((b1 + m) * 255.0).round() as u8,
    )
}
