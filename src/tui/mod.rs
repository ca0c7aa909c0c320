mod charts;
mod clipboard;
mod help;

use crate::client::BacktestClient;
use crate::form::Field;
use crate::notify::Severity;
use crate::orchestrator::{self, App, AppEvent, RequestPhase, UiCommand};
use crate::tabs::Tab;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Terminal,
};
use std::path::PathBuf;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

struct UiState {
    app: App,
    focus: Field,
    bench_cursor: usize,
    show_help: bool,
    info: String,
    export_dir: PathBuf,
    last_exported_path: Option<String>,
}

impl UiState {
    fn new(app: App, export_dir: PathBuf) -> Self {
        Self {
            app,
            focus: Field::Fund,
            bench_cursor: 0,
            show_help: false,
            info: String::new(),
            export_dir,
            last_exported_path: None,
        }
    }
}

/// What the loop should do after a key press.
#[derive(Debug)]
enum KeyAction {
    None,
    Send(UiCommand),
    Quit,
}

pub async fn run(app: App, client: BacktestClient, export_dir: PathBuf) -> Result<()> {
    // Unbounded channels avoid backpressure between the UI thread and the runtime.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<AppEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_handle = std::thread::spawn(move || run_threaded(app, export_dir, event_rx, cmd_tx));

    let res = orchestrator::run_controller(client, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    app: App,
    export_dir: PathBuf,
    mut event_rx: UnboundedReceiver<AppEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState::new(app, export_dir);

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain completions without blocking; each is applied to completion before the next.
        while let Ok(ev) = event_rx.try_recv() {
            apply_event(&mut state, ev, Instant::now());
        }

        if last_tick.elapsed() >= tick_rate {
            state.app.tick(Instant::now());
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match handle_key(&mut state, k, Instant::now()) {
                    KeyAction::None => {}
                    KeyAction::Send(cmd) => {
                        if cmd_tx.send(cmd).is_err() {
                            break Err(anyhow::anyhow!("controller stopped"));
                        }
                    }
                    KeyAction::Quit => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn apply_event(state: &mut UiState, ev: AppEvent, now: Instant) {
    match ev {
        AppEvent::BacktestSettled { id, outcome } => {
            state.app.settle(id, outcome, now);
            state.info.clear();
        }
        AppEvent::CacheCleared => state.app.cache_cleared(now),
        AppEvent::Notice(severity, message) => {
            state.app.notices.push(severity, message, now);
        }
    }
}

fn handle_key(state: &mut UiState, k: KeyEvent, now: Instant) -> KeyAction {
    match (k.modifiers, k.code) {
        (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
            return KeyAction::Quit
        }
        (_, KeyCode::Char('?')) => state.show_help = !state.show_help,
        (_, KeyCode::Enter) => {
            let (id, request) = state.app.submit();
            return KeyAction::Send(UiCommand::Submit { id, request });
        }
        (_, KeyCode::Char('c')) => {
            state.info = "Clearing cache…".into();
            return KeyAction::Send(UiCommand::ClearCache);
        }
        (_, KeyCode::Char('e')) => export_csv(state),
        (_, KeyCode::Char('y')) => copy_exported_path(state),
        (_, KeyCode::Tab) => {
            state.app.tabs.next();
        }
        (_, KeyCode::Up) | (_, KeyCode::Char('k')) => state.focus = state.focus.prev(),
        (_, KeyCode::Down) | (_, KeyCode::Char('j')) => state.focus = state.focus.next(),
        (_, KeyCode::Left) => step_field(state, false),
        (_, KeyCode::Right) => step_field(state, true),
        (_, KeyCode::Char(' ')) => match state.focus {
            Field::FeeToggle => {
                let enabled = !state.app.form.fee_enabled;
                state.app.set_fee_enabled(enabled);
            }
            Field::Benchmarks => state.app.toggle_benchmark(state.bench_cursor, now),
            _ => {}
        },
        (_, KeyCode::Backspace) => {
            state.app.form.pop_char(state.focus);
        }
        (_, KeyCode::Char(c)) if c.is_ascii_digit() || c == '.' || c == '-' => {
            state.app.form.push_char(state.focus, c);
        }
        _ => {}
    }
    KeyAction::None
}

/// Left/right on the focused field.
fn step_field(state: &mut UiState, forward: bool) {
    match state.focus {
        Field::Fund => state.app.cycle_fund(forward),
        Field::Currency | Field::Rebalance => state.app.form.cycle_option(state.focus, forward),
        Field::FeeToggle => {
            let enabled = !state.app.form.fee_enabled;
            state.app.set_fee_enabled(enabled);
        }
        Field::Benchmarks => {
            let len = state.app.form.benchmarks.len();
            if len > 0 {
                state.bench_cursor = if forward {
                    (state.bench_cursor + 1) % len
                } else {
                    (state.bench_cursor + len - 1) % len
                };
            }
        }
        _ => {}
    }
}

fn export_csv(state: &mut UiState) {
    // No cached result: nothing to do and nothing to report.
    let Some(artifact) = state.app.export_csv() else {
        return;
    };
    match artifact.write_to_dir(&state.export_dir) {
        Ok(p) => {
            state.last_exported_path = Some(p.to_string_lossy().to_string());
            state.info = format!("Exported CSV: {} (press 'y' to copy path)", p.display());
        }
        Err(e) => {
            state.info = format!("CSV export failed: {e:#}");
        }
    }
}

fn copy_exported_path(state: &mut UiState) {
    let Some(path) = state.last_exported_path.clone() else {
        state.info = "No exported file path to copy. Export a file first (e)".into();
        return;
    };
    match clipboard::copy_to_clipboard(&path) {
        Ok(_) => {
            let display_path = if path.chars().count() > 60 {
                format!("{}...", path.chars().take(57).collect::<String>())
            } else {
                path
            };
            state.info = format!("✓ Copied to clipboard: {}", display_path);
        }
        Err(e) => {
            state.info = format!("Clipboard copy failed: {e:#}");
        }
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Info => Color::Cyan,
        Severity::Warning => Color::Yellow,
        Severity::Error => Color::Red,
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let tabs = Tabs::new(Tab::ALL.iter().map(|t| Line::from(t.title())).collect::<Vec<_>>())
        .select(state.app.tabs.active().index())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("backtest-console"),
        )
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(44), Constraint::Min(0)])
        .split(chunks[1]);

    draw_form(body[0], f, state);
    if state.show_help {
        help::draw_help(body[1], f);
    } else {
        draw_results(body[1], f, state);
    }
    draw_status(chunks[2], f, state);
}

fn draw_form(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let form = &state.app.form;
    let mut lines: Vec<Line> = Vec::new();

    for field in Field::ALL {
        let focused = field == state.focus;
        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let marker = if focused { "▶ " } else { "  " };

        if field == Field::Benchmarks {
            lines.push(Line::from(vec![
                Span::raw(marker),
                Span::styled(field.label(), label_style),
                Span::raw(format!(" ({} selected)", form.benchmarks.checked_count())),
            ]));
            for (i, choice) in form.benchmarks.choices().iter().enumerate() {
                let mark = if choice.checked { "[x]" } else { "[ ]" };
                let style = if focused && i == state.bench_cursor {
                    Style::default().fg(Color::Black).bg(Color::Yellow)
                } else if choice.checked {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default()
                };
                lines.push(Line::from(vec![
                    Span::raw("    "),
                    Span::styled(format!("{mark} {}", choice.name), style),
                ]));
            }
            continue;
        }

        let value = match field {
            Field::Fund => {
                let name = state
                    .app
                    .funds
                    .get(&form.fund_id)
                    .map(|m| m.name.as_str())
                    .unwrap_or("unknown fund");
                format!("{} — {}", form.fund_id, name)
            }
            Field::StartDate => form.start_date.clone(),
            Field::EndDate => form.end_date.clone(),
            Field::StartAmount => form.start_amount.clone(),
            Field::Currency => form.currency.clone(),
            Field::Rebalance => form.rebalance.clone(),
            Field::FeeToggle => (if form.fee_enabled { "[x] on" } else { "[ ] off" }).to_string(),
            Field::FeeValue => form.fee_value.clone(),
            Field::RfRate => form.rf_rate.clone(),
            Field::Benchmarks => String::new(),
        };
        let value_style = if form.is_editable(field) {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(format!("{:<16}", field.label()), label_style),
            Span::styled(value, value_style),
        ]));
    }

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Backtest"));
    f.render_widget(p, area);
}

fn draw_results(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let notices: Vec<Line> = state
        .app
        .notices
        .iter()
        .map(|n| {
            Line::from(Span::styled(
                n.message.as_str(),
                Style::default().fg(severity_color(n.severity)),
            ))
        })
        .collect();

    let notice_height = if notices.is_empty() {
        0
    } else {
        notices.len() as u16 + 2
    };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(notice_height), Constraint::Min(0)])
        .split(area);

    if !notices.is_empty() {
        let p = Paragraph::new(notices)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Notifications"));
        f.render_widget(p, rows[0]);
    }

    let content = rows[1];
    match &state.app.phase {
        RequestPhase::Idle => {
            let p = Paragraph::new("Press Enter to run a backtest.")
                .block(Block::default().borders(Borders::ALL).title("Results"));
            f.render_widget(p, content);
        }
        RequestPhase::Loading => {
            let p = Paragraph::new(Span::styled(
                "Running backtest…",
                Style::default().fg(Color::Yellow),
            ))
            .block(Block::default().borders(Borders::ALL).title("Results"));
            f.render_widget(p, content);
        }
        RequestPhase::Failed(message) => {
            let p = Paragraph::new(Span::styled(
                message.as_str(),
                Style::default().fg(Color::Red),
            ))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red))
                    .title("Error"),
            );
            f.render_widget(p, content);
        }
        RequestPhase::Success => {
            if let Some(view) = state.app.view.as_ref() {
                draw_view(content, f, state, view);
            }
        }
    }
}

fn draw_view(area: Rect, f: &mut ratatui::Frame, state: &UiState, view: &crate::render::ResultView) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 5); 5])
        .split(rows[0]);
    for (card, slot) in view.kpi_cards.iter().zip(cards.iter()) {
        let p = Paragraph::new(Line::from(Span::styled(
            card.value.as_str(),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )))
        .block(Block::default().borders(Borders::ALL).title(card.label));
        f.render_widget(p, *slot);
    }

    match state.app.tabs.active() {
        Tab::Equity => charts::draw_equity(rows[1], f, &view.equity),
        Tab::Analytics => charts::draw_analytics(rows[1], f, &view.analytics),
        Tab::Assumptions => {
            let lines: Vec<Line> = view
                .assumptions
                .iter()
                .map(|l| Line::from(l.as_str()))
                .collect();
            let p = Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title("Assumptions"));
            f.render_widget(p, rows[1]);
        }
    }
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut spans = Vec::new();
    if state.app.loading_indicator() {
        let in_flight = state.app.in_flight();
        let label = if in_flight > 1 {
            format!(" ⏳ Loading… ({in_flight} requests) ")
        } else {
            " ⏳ Loading… ".to_string()
        };
        spans.push(Span::styled(
            label,
            Style::default().fg(Color::Black).bg(Color::Yellow),
        ));
        spans.push(Span::raw(" "));
    }
    if !state.info.is_empty() {
        spans.push(Span::raw(state.info.as_str()));
    } else {
        spans.push(Span::styled(
            "enter run · c clear cache · e export · ? help · q quit",
            Style::default().fg(Color::DarkGray),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
