use std::time::Duration;

use ratatui::{
    style::{Color, Style},
    text::Line,
    widgets::{Bar, BarChart, BarGroup, Block},
};
use typur::history::History;

/// Rows taken by the past performances chart, borders included.
pub const HISTORY_HEIGHT: u16 = 9;

/// Height of the best bar.
pub const BAR_SCALE: f64 = 90.0;

/// (bar height, label) per history entry, oldest first.
pub fn bar_data(history: &History) -> Vec<(u64, String)> {
    history
        .bar_heights(BAR_SCALE)
        .into_iter()
        .zip(history.values())
        .map(|(height, cpm)| (height.round() as u64, format_cpm(Some(cpm))))
        .collect()
}

pub fn history_chart(history: &History) -> BarChart<'static> {
    let bars: Vec<Bar<'static>> = bar_data(history)
        .into_iter()
        .map(|(height, label)| {
            Bar::default()
                .value(height)
                .text_value(label)
                .style(Style::default().fg(Color::Gray))
                .value_style(Style::default().fg(Color::Black).bg(Color::Gray))
        })
        .collect();

    BarChart::default()
        .block(
            Block::bordered()
                .title(chart_title(history))
                .title_bottom(Line::from("chars/minute").right_aligned()),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(6)
        .bar_gap(2)
        .max(BAR_SCALE as u64)
}

/// Chart heading with the mean of the listed results.
pub fn chart_title(history: &History) -> String {
    match history.average() {
        Some(avg) => format!("Past Performances (avg {})", format_cpm(Some(avg))),
        None => "Past Performances".to_string(),
    }
}

/// Rounded speed, or a dash while there is nothing to show.
pub fn format_cpm(cpm: Option<f64>) -> String {
    match cpm {
        Some(v) => format!("{}", v.round()),
        None => "-".to_string(),
    }
}

/// Horizontal jolt for the hard-mode restart, in cells.
pub fn shake_offset(elapsed: Duration) -> i16 {
    match (elapsed.as_millis() / 75) % 4 {
        0 => 0,
        1 => -2,
        2 => 2,
        _ => -2,
    }
}
