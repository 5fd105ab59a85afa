use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    prelude::{Backend, Frame, text},
    style::{Color, Style},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};
use tracing::warn;

use crate::app::summary::RunSummary;
use crate::error::AppResult;
use crate::session::{CancelledBatch, SessionController};

use super::model::{RunPhase, UiModel};

const UI_MARGIN: u16 = 1;
const HEADER_HEIGHT: u16 = 3;
const GAUGE_HEIGHT: u16 = 3;
const RESULTS_MIN_HEIGHT: u16 = 5;
const FOOTER_HEIGHT: u16 = 1;

const PANEL_BG_RGB: (u8, u8, u8) = (0x0a, 0x0a, 0x0a);
const PANEL_BORDER_RGB: (u8, u8, u8) = (0xe5, 0xe7, 0xeb);
const PANEL_TEXT_RGB: (u8, u8, u8) = (0xff, 0xff, 0xff);
const PANEL_MUTED_RGB: (u8, u8, u8) = (0xd1, 0xd5, 0xdb);
const ACCENT_PROGRESS_RGB: (u8, u8, u8) = (0x22, 0xd3, 0xee);

pub(crate) trait UiActions {
    /// Initializes the terminal for UI rendering.
    ///
    /// # Errors
    ///
    /// Returns an error when terminal setup fails.
    fn setup_terminal() -> AppResult<Terminal<CrosstermBackend<io::Stdout>>>;
    fn cleanup();
    fn render<B: Backend>(terminal: &mut Terminal<B>, model: &UiModel);
}

pub(crate) struct Ui;

impl UiActions for Ui {
    fn setup_terminal() -> AppResult<Terminal<CrosstermBackend<io::Stdout>>> {
        enable_raw_mode()?;
        if let Err(err) = execute!(io::stdout(), EnterAlternateScreen) {
            disable_raw_mode().ok();
            return Err(err.into());
        }

        let backend = CrosstermBackend::new(io::stdout());
        match Terminal::new(backend) {
            Ok(mut terminal) => {
                if let Err(err) = terminal.clear() {
                    Self::cleanup();
                    return Err(err.into());
                }
                Ok(terminal)
            }
            Err(err) => {
                Self::cleanup();
                Err(err.into())
            }
        }
    }

    fn cleanup() {
        disable_raw_mode().ok();
        execute!(std::io::stdout(), LeaveAlternateScreen).ok();
    }

    fn render<B: Backend>(terminal: &mut Terminal<B>, model: &UiModel) {
        if let Err(err) = terminal.draw(|f| draw_frame(f, model)) {
            eprintln!("Failed to render UI: {}", err);
        }
    }
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        Ui::cleanup();
    }
}

enum KeyIntent {
    Toggle,
    Quit,
}

/// Interactive loop on the calling thread. One tick per refresh interval:
/// poll a key, drain at most one progress value, poll completion, redraw.
/// `Enter` mirrors the original submit/cancel toggle; `q`, `Esc` and
/// `Ctrl+C` leave (cancelling a running batch first).
pub(crate) fn run_ui(
    session: &mut SessionController,
    target: &str,
    requested: u64,
    refresh: Duration,
    no_color: bool,
) -> AppResult<()> {
    let mut terminal = Ui::setup_terminal()?;
    let _guard = TerminalGuard;

    let mut model = UiModel::new(target.to_owned(), requested, no_color);
    let mut pending_cancel: Option<CancelledBatch> = None;

    loop {
        match poll_key(refresh)? {
            Some(KeyIntent::Quit) => {
                if let Some(cancelled) = session.cancel() {
                    drop(cancelled);
                }
                break;
            }
            Some(KeyIntent::Toggle) => {
                handle_toggle(session, &mut model, &mut pending_cancel);
            }
            None => {}
        }

        if let Some(percent) = session.try_progress() {
            model.percent = percent;
        }
        if let Some(report) = session.try_complete() {
            model.phase =
                RunPhase::Finished(RunSummary::from_report(target, requested, false, &report));
        }
        if let Some(mut cancelled) = pending_cancel.take() {
            if let Some(report) = cancelled.try_report() {
                model.phase = RunPhase::Cancelled(Some(RunSummary::from_report(
                    target, requested, true, &report,
                )));
            } else {
                pending_cancel = Some(cancelled);
            }
        }

        Ui::render(&mut terminal, &model);
    }
    Ok(())
}

fn poll_key(timeout: Duration) -> AppResult<Option<KeyIntent>> {
    if event::poll(timeout)?
        && let Event::Key(key) = event::read()?
    {
        return Ok(key_intent(&key));
    }
    Ok(None)
}

fn key_intent(key: &KeyEvent) -> Option<KeyIntent> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(KeyIntent::Quit);
    }
    if key.code == KeyCode::Char('q') || key.code == KeyCode::Char('Q') || key.code == KeyCode::Esc
    {
        return Some(KeyIntent::Quit);
    }
    if key.code == KeyCode::Enter {
        return Some(KeyIntent::Toggle);
    }
    None
}

fn handle_toggle(
    session: &mut SessionController,
    model: &mut UiModel,
    pending_cancel: &mut Option<CancelledBatch>,
) {
    if session.is_running() {
        if let Some(cancelled) = session.cancel() {
            *pending_cancel = Some(cancelled);
            model.phase = RunPhase::Cancelled(None);
        }
        return;
    }

    // Restart with the same target and count. The target was validated on
    // the first start, so failures here are client-build problems.
    match session.start(&model.target, model.requested) {
        Ok(()) => {
            model.percent = 0;
            model.phase = RunPhase::Running;
            *pending_cancel = None;
        }
        Err(err) => {
            warn!("restart failed: {}", err);
        }
    }
}

fn draw_frame<B: Backend>(f: &mut Frame<'_, B>, model: &UiModel) {
    let size = f.size();
    f.render_widget(
        Block::default().style(app_background_style(model.no_color)),
        size,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(UI_MARGIN)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Length(GAUGE_HEIGHT),
            Constraint::Min(RESULTS_MIN_HEIGHT),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(size);

    let (header_chunk, gauge_chunk, results_chunk, footer_chunk) = match chunks.as_ref() {
        [a, b, c, d] => (a, b, c, d),
        _ => return,
    };

    render_header(f, model, *header_chunk);
    render_gauge(f, model, *gauge_chunk);
    render_results(f, model, *results_chunk);
    render_footer(f, model, *footer_chunk);
}

fn render_header<B: Backend>(f: &mut Frame<'_, B>, model: &UiModel, chunk: Rect) {
    let block = Block::default()
        .title("volley")
        .borders(Borders::ALL)
        .style(panel_block_style(model.no_color))
        .border_style(panel_border_style(model.no_color));
    let header = Paragraph::new(model.status_line())
        .block(block)
        .wrap(Wrap { trim: true });
    f.render_widget(header, chunk);
}

fn render_gauge<B: Backend>(f: &mut Frame<'_, B>, model: &UiModel, chunk: Rect) {
    let block = Block::default()
        .title("Progress")
        .borders(Borders::ALL)
        .style(panel_block_style(model.no_color))
        .border_style(panel_border_style(model.no_color));
    let percent = model.gauge_percent();
    let gauge = Gauge::default()
        .block(block)
        .gauge_style(style_color(model.no_color, rgb(ACCENT_PROGRESS_RGB)))
        .percent(u16::from(percent))
        .label(format!("{}%", percent));
    f.render_widget(gauge, chunk);
}

fn render_results<B: Backend>(f: &mut Frame<'_, B>, model: &UiModel, chunk: Rect) {
    let block = Block::default()
        .title("Results")
        .borders(Borders::ALL)
        .style(panel_block_style(model.no_color))
        .border_style(panel_border_style(model.no_color));
    let lines: Vec<text::Line<'_>> = model
        .result_lines()
        .into_iter()
        .map(text::Line::from)
        .collect();
    let results = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    f.render_widget(results, chunk);
}

fn render_footer<B: Backend>(f: &mut Frame<'_, B>, model: &UiModel, chunk: Rect) {
    let footer = Paragraph::new(model.footer_line())
        .style(style_color(model.no_color, rgb(PANEL_MUTED_RGB)));
    f.render_widget(footer, chunk);
}

fn style_color(no_color: bool, color: Color) -> Style {
    if no_color {
        Style::default()
    } else {
        Style::default().fg(color)
    }
}

const fn rgb(rgb: (u8, u8, u8)) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

fn panel_block_style(no_color: bool) -> Style {
    if no_color {
        Style::default()
    } else {
        Style::default()
            .bg(rgb(PANEL_BG_RGB))
            .fg(rgb(PANEL_TEXT_RGB))
    }
}

fn panel_border_style(no_color: bool) -> Style {
    if no_color {
        Style::default()
    } else {
        Style::default().fg(rgb(PANEL_BORDER_RGB))
    }
}

fn app_background_style(no_color: bool) -> Style {
    if no_color {
        Style::default()
    } else {
        Style::default().bg(rgb(PANEL_BG_RGB))
    }
}
