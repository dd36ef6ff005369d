//! Chat history display component

use crate::store::{Conversation, Message, Sender};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Renders the active conversation's messages, bottom-anchored.
pub struct ChatHistory<'a> {
    conversation: Option<&'a Conversation>,
    busy: bool,
}

impl<'a> ChatHistory<'a> {
    pub fn new(conversation: Option<&'a Conversation>, busy: bool) -> Self {
        Self { conversation, busy }
    }
}

impl Widget for ChatHistory<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = self
            .conversation
            .map(|c| format!("💬 {}", c.title))
            .unwrap_or_else(|| "💬 Briefr".to_string());

        let block = Block::default().borders(Borders::ALL).title(title);
        let inner_area = block.inner(area);
        block.render(area, buf);

        let Some(conversation) = self.conversation else {
            let lines = [
                Line::from(Span::styled(
                    "No conversation yet.",
                    Style::default().fg(Color::Gray),
                )),
                Line::from(Span::styled(
                    "Press Ctrl+N (or /new) to start one.",
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            for (i, line) in lines.iter().enumerate() {
                if i < inner_area.height as usize {
                    buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
                }
            }
            return;
        };

        if conversation.messages.is_empty() {
            let line = Line::from(Span::styled(
                "Ready to start?",
                Style::default().fg(Color::Gray),
            ));
            buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
            return;
        }

        let mut all_lines: Vec<Line> = Vec::new();
        for message in &conversation.messages {
            all_lines.extend(render_message(message, inner_area.width));
            all_lines.push(Line::from(Span::raw("")));
        }

        if self.busy {
            all_lines.push(Line::from(Span::styled(
                "🛰  analyst is thinking...",
                Style::default().fg(Color::DarkGray),
            )));
        } else if conversation.is_confirming {
            all_lines.push(Line::from(Span::styled(
                "⚠ Awaiting your approval — y approve · n reject",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
        }

        // Show the newest lines, anchored to the bottom.
        let height = inner_area.height as usize;
        let start = all_lines.len().saturating_sub(height);
        for (i, line) in all_lines[start..].iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

/// Render a single message into lines
fn render_message(message: &Message, width: u16) -> Vec<Line<'static>> {
    let (icon, style) = match message.sender {
        Sender::User => ("👤", Style::default().fg(Color::Blue)),
        Sender::System => ("🛰", Style::default().fg(Color::Green)),
    };

    let mut lines = Vec::new();
    let header = format!("{} {}", icon, "─".repeat(20));
    lines.push(Line::from(Span::styled(
        header,
        Style::default().fg(Color::DarkGray),
    )));

    for content_line in wrap_text(&message.text, width.saturating_sub(2) as usize) {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(content_line, style),
        ]));
    }

    lines
}

/// Wrap text to fit within the given width
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_width = 0;

    for word in text.split_whitespace() {
        // Widths in characters, not bytes; multibyte text must not wrap early.
        let word_width = word.chars().count();
        if current_width + word_width + 1 <= width {
            if !current_line.is_empty() {
                current_line.push(' ');
                current_width += 1;
            }
            current_line.push_str(word);
            current_width += word_width;
        } else {
            if !current_line.is_empty() {
                lines.push(current_line);
                current_line = String::new();
            }
            current_line.push_str(word);
            current_width = word_width;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_splits_on_word_boundaries() {
        let wrapped = wrap_text("alpha bravo charlie delta", 11);
        assert_eq!(wrapped, vec!["alpha bravo", "charlie", "delta"]);
    }

    #[test]
    fn wrap_keeps_short_text_on_one_line() {
        assert_eq!(wrap_text("short", 40), vec!["short"]);
    }

    #[test]
    fn wrap_handles_zero_width() {
        assert_eq!(wrap_text("anything", 0), vec!["anything"]);
    }

    #[test]
    fn wrap_measures_chars_not_bytes() {
        // "naïve café" is 10 chars but 12 bytes; it must fill one line.
        let wrapped = wrap_text("naïve café déjà", 10);
        assert_eq!(wrapped, vec!["naïve café", "déjà"]);
    }
}
