pub mod charting;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Gauge, Paragraph, Widget, Wrap},
    Frame,
};
use std::time::Instant;
use unicode_width::UnicodeWidthStr;

use crate::{
    ui::screen::{current_screen, Screen},
    App,
};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;
const ORANGE: Color = Color::Rgb(251, 146, 60);

/// Draw whatever the app is showing, settings panel on top.
pub fn draw(app: &App, f: &mut Frame) {
    current_screen(app).render(app, f);
    if app.settings_open {
        screen::SettingsScreen.render(app, f);
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(sentence) = self.sentence.as_ref() else {
            return;
        };
        let settings = self.prefs.settings();
        let completed = sentence.is_completed();

        // styles
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
        let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
        let dim_bold_style = Style::default()
            .patch(bold_style)
            .add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let content = &sentence.quote().content;
        let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
        let prompt_occupied_lines = if content.width() <= max_chars_per_line as usize {
            1
        } else {
            ((content.width() as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(2),                     // clock
                Constraint::Length(1),                     // progress
                Constraint::Length(1),                     // padding
                Constraint::Length(prompt_occupied_lines), // quote
                Constraint::Length(if completed { 2 } else { 0 }), // author
                Constraint::Min(0),
                Constraint::Length(if completed { charting::HISTORY_HEIGHT } else { 0 }),
                Constraint::Length(if completed { 0 } else { 3 }), // input box
                Constraint::Length(1),                              // legend
            ])
            .split(area);

        // clock
        if let Some(secs) = self.clock.get() {
            if settings.show_time || completed {
                let lines = vec![
                    Line::from(Span::styled(format!("{secs}s"), bold_style)),
                    Line::from(Span::styled(
                        format!("{} chars/minute", charting::format_cpm(sentence.live_cpm())),
                        dim_bold_style,
                    )),
                ];
                Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .render(chunks[0], buf);
            }
        }

        // progress
        if sentence.correct_char_count() == 0 && !completed {
            Paragraph::new(Span::styled(
                "↓ Type this ↓",
                Style::default().fg(ORANGE).add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);
        } else {
            let ratio = sentence.progress().clamp(0.0, 1.0);
            Gauge::default()
                .gauge_style(Style::default().fg(Color::White).bg(Color::DarkGray))
                .ratio(ratio)
                .label(format!("{}%", (ratio * 100.0).round()))
                .render(chunks[1], buf);
        }

        // quote
        let shake = self
            .shake_started
            .map(|started| charting::shake_offset(Instant::now().saturating_duration_since(started)));
        let segments = sentence.segments();
        let spans = if shake.is_some() {
            vec![Span::styled(content.clone(), red_bold_style)]
        } else {
            vec![
                Span::styled(segments.done, green_bold_style),
                Span::styled(
                    segments.matched,
                    green_bold_style.add_modifier(Modifier::UNDERLINED),
                ),
                Span::styled(
                    segments.mismatched,
                    red_bold_style.add_modifier(Modifier::UNDERLINED),
                ),
                Span::styled(segments.remaining, dim_bold_style),
            ]
        };

        let quote_area = match shake {
            Some(offset) => shift(chunks[3], offset),
            None => chunks[3],
        };
        Paragraph::new(Line::from(spans))
            .alignment(if prompt_occupied_lines == 1 {
                // when the prompt is small enough to fit on one line
                // centering the text gives a nice zen feeling
                Alignment::Center
            } else {
                Alignment::Left
            })
            .wrap(Wrap { trim: true })
            .render(quote_area, buf);

        if completed {
            Paragraph::new(Span::styled(
                format!("- {}", sentence.quote().author),
                italic_style,
            ))
            .alignment(Alignment::Right)
            .render(chunks[4], buf);

            charting::history_chart(self.prefs.history()).render(chunks[6], buf);
        } else {
            let border = if sentence.mismatch_len() > 0 {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Gray)
            };
            Paragraph::new(sentence.current_input())
                .alignment(Alignment::Center)
                .block(Block::bordered().border_style(border))
                .render(chunks[7], buf);
        }

        let legend = if completed {
            if self.can_share() {
                "(r)estart / (n)ew quote / (s)hare / (q)uit"
            } else {
                "(r)estart / (n)ew quote / (q)uit"
            }
        } else {
            "(tab) restart / (ctrl+n) new quote / (ctrl+s) settings / (esc) quit"
        };
        Paragraph::new(Span::styled(legend, italic_style)).render(chunks[8], buf);
    }
}

/// Move a rect sideways without leaving the frame.
fn shift(area: Rect, offset: i16) -> Rect {
    let x = (area.x as i32 + offset as i32).max(0) as u16;
    let width = area.width.saturating_sub(offset.max(0) as u16);
    Rect { x, width, ..area }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_clamps_at_zero() {
        let area = Rect::new(1, 0, 10, 1);
        assert_eq!(shift(area, -2).x, 0);
        assert_eq!(shift(area, 2).x, 3);
        assert_eq!(shift(area, 2).width, 8);
        assert_eq!(shift(area, -1).width, 10);
    }
}
