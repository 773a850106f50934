use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::models::{RsvpCounts, RsvpEntry, RsvpStatus};

/// Column width reserved for player names in the roster list.
const NAME_WIDTH: usize = 24;
/// Column width reserved for phone numbers.
const PHONE_WIDTH: usize = 16;

pub(crate) fn status_style(status: RsvpStatus) -> Style {
    let color = match status {
        RsvpStatus::Yes => Color::Green,
        RsvpStatus::Maybe => Color::Yellow,
        RsvpStatus::No => Color::Red,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Pad or cut `text` to exactly `width` terminal columns. A wide glyph that
/// would straddle the edge is dropped and replaced by padding.
pub(crate) fn fit(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(width);
    let mut used = 0;
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if used + ch_width > width {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

/// One roster row: a status badge followed by name, phone and email.
pub(crate) fn entry_line(entry: &RsvpEntry) -> Line<'static> {
    let badge = format!("[{:^5}]", entry.status.label());
    let mut spans = vec![
        Span::styled(badge, status_style(entry.status)),
        Span::raw(" "),
        Span::raw(fit(&entry.player.name, NAME_WIDTH)),
        Span::raw(" "),
        Span::styled(
            fit(&entry.player.phone, PHONE_WIDTH),
            Style::default().fg(Color::Gray),
        ),
    ];
    if let Some(email) = &entry.player.email {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            email.clone(),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

pub(crate) fn counts_line(counts: RsvpCounts) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("Total: {}   ", counts.total)),
        Span::styled(
            format!("Confirmed: {}", counts.confirmed),
            status_style(RsvpStatus::Yes),
        ),
        Span::raw("   "),
        Span::styled(
            format!("Declined: {}", counts.declined),
            status_style(RsvpStatus::No),
        ),
    ])
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Player;

    #[test]
    fn fit_pads_and_truncates_by_columns() {
        assert_eq!(fit("ab", 4), "ab  ");
        assert_eq!(fit("Zoë Smith", 3), "Zoë");
        assert_eq!(fit("", 0), "");
    }

    #[test]
    fn fit_keeps_wide_glyphs_inside_the_column() {
        let cut = fit("日本語", 5);
        assert_eq!(cut, "日本 ");
        assert_eq!(cut.width(), 5);
        assert_eq!(fit("日本", 4).width(), 4);
    }

    #[test]
    fn entry_line_shows_email_only_when_present() {
        let plain = RsvpEntry::new(Player::new("1", "Al", "5"), RsvpStatus::No);
        assert_eq!(entry_line(&plain).spans.len(), 5);

        let mailed = RsvpEntry::new(
            Player::new("2", "Bo", "6").with_email("bo@x"),
            RsvpStatus::Yes,
        );
        let line = entry_line(&mailed);
        assert_eq!(line.spans.len(), 7);
        assert_eq!(line.spans[6].content, "bo@x");
    }

    #[test]
    fn surface_error_prefers_root_cause() {
        let err = anyhow::anyhow!("disk full").context("failed to save");
        assert_eq!(surface_error(&err), "disk full");
    }
}
