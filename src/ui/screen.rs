use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Wrap},
    Frame,
};

use crate::{App, AppState};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// A UI Screen boundary: responsible for rendering one view of the app
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

/// Spinner while a quote is on its way, plus the last fetch error if any
pub struct LoadingScreen;

impl Screen for LoadingScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let area = f.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(45),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(area);

        let frame = SPINNER[app.spinner_frame % SPINNER.len()];
        f.render_widget(
            Paragraph::new(Span::styled(
                format!("{frame} fetching a quote"),
                Style::default().add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
            chunks[1],
        );

        if let Some(error) = &app.fetch_error {
            f.render_widget(
                Paragraph::new(Span::styled(
                    format!("{error} - (ctrl+n) retry / (esc) quit, or run with --offline"),
                    Style::default().fg(Color::Red),
                ))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
                chunks[2],
            );
        }
    }
}

/// Typing screen - renders the quote, clock and history via the App widget
pub struct TypingScreen;

impl Screen for TypingScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(app, f.area());
    }
}

/// Side panel toggling the persisted settings
pub struct SettingsScreen;

impl Screen for SettingsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        let area = panel_area(f.area());
        let settings = app.prefs.settings();
        let checkbox = |on: bool| if on { "[x]" } else { "[ ]" };

        let lines = vec![
            Line::from(""),
            Line::from(format!("{} Enable Hard Mode  (h)", checkbox(settings.hard_mode))),
            Line::from(""),
            Line::from(format!("{} Show Time  (t)", checkbox(settings.show_time))),
            Line::from(""),
            Line::from(Span::styled(
                "(esc) close",
                Style::default().add_modifier(Modifier::ITALIC),
            )),
        ];

        f.render_widget(Clear, area);
        f.render_widget(
            Paragraph::new(lines).block(
                Block::bordered()
                    .title(" Settings ")
                    .title_alignment(Alignment::Center)
                    .style(Style::default().bg(Color::DarkGray).fg(Color::White)),
            ),
            area,
        );
    }
}

/// Left-hand panel, at most 40 columns wide.
fn panel_area(area: Rect) -> Rect {
    let width = (area.width * 4 / 5).min(40);
    Rect { width, ..area }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(app: &App) -> Box<dyn Screen> {
    match app.state {
        AppState::Loading => Box::new(LoadingScreen),
        AppState::Typing => Box::new(TypingScreen),
    }
}
