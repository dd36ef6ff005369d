use crate::ui::commands::{parse_slash_command, ParsedCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted(String),
    Command(ParsedCommand),
    None,
}

/// Why the composer currently refuses input, if it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerGate {
    Open,
    /// A dialogue call is outstanding for this conversation.
    Busy,
    /// The conversation awaits approval; only approve/reject are legal.
    Confirming,
}

/// Single-line input box at the bottom of the chat pane.
pub struct Composer {
    content: String,
    cursor: usize,
    has_focus: bool,
    gate: ComposerGate,
}

impl Composer {
    pub fn new() -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            has_focus: false,
            gate: ComposerGate::Open,
        }
    }

    pub fn set_focus(&mut self, has_focus: bool) {
        self.has_focus = has_focus;
    }

    /// Update the input gate for this frame; while gated, keystrokes are
    /// swallowed instead of edited into the buffer.
    pub fn set_gate(&mut self, gate: ComposerGate) {
        self.gate = gate;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }
        if self.gate != ComposerGate::Open {
            return ComposerResult::None;
        }

        match key.code {
            KeyCode::Enter => {
                if self.content.trim().is_empty() {
                    return ComposerResult::None;
                }
                let content = std::mem::take(&mut self.content);
                self.cursor = 0;
                if let Some(command) = parse_slash_command(&content) {
                    ComposerResult::Command(command)
                } else {
                    ComposerResult::Submitted(content)
                }
            }
            KeyCode::Char(c) => {
                self.content.insert(self.byte_cursor(), c);
                self.cursor += 1;
                ComposerResult::None
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_cursor();
                    self.content.remove(at);
                }
                ComposerResult::None
            }
            KeyCode::Delete => {
                if self.cursor < self.content.chars().count() {
                    let at = self.byte_cursor();
                    self.content.remove(at);
                }
                ComposerResult::None
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                ComposerResult::None
            }
            KeyCode::Right => {
                if self.cursor < self.content.chars().count() {
                    self.cursor += 1;
                }
                ComposerResult::None
            }
            KeyCode::Home => {
                self.cursor = 0;
                ComposerResult::None
            }
            KeyCode::End => {
                self.cursor = self.content.chars().count();
                ComposerResult::None
            }
            _ => ComposerResult::None,
        }
    }

    /// Byte offset of the character cursor, safe for multi-byte input.
    fn byte_cursor(&self) -> usize {
        self.content
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    fn placeholder(&self) -> &'static str {
        match self.gate {
            ComposerGate::Open => "Describe what to investigate... (/ for commands)",
            ComposerGate::Busy => "Waiting for the analyst to reply...",
            ComposerGate::Confirming => "Awaiting approval — press y to approve, n to reject",
        }
    }

    fn title(&self) -> &'static str {
        match self.gate {
            ComposerGate::Open => "Message",
            ComposerGate::Busy => "Message (waiting)",
            ComposerGate::Confirming => "Approval required",
        }
    }
}

impl Widget for &Composer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_color = match (self.gate, self.has_focus) {
            (ComposerGate::Confirming, _) => Color::Yellow,
            (ComposerGate::Busy, _) => Color::DarkGray,
            (ComposerGate::Open, true) => Color::Green,
            (ComposerGate::Open, false) => Color::Gray,
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.title())
            .style(Style::default().fg(border_color));

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.content.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                self.placeholder(),
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
        } else {
            let mut content = self.content.clone();
            if self.has_focus && self.gate == ComposerGate::Open {
                let at = self.byte_cursor();
                content.insert(at.min(content.len()), '▌');
            }
            let line = Line::from(vec![Span::raw(content)]);
            buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::commands::SlashCommand;
    use crossterm::event::KeyModifiers;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(composer: &mut Composer, text: &str) {
        for c in text.chars() {
            composer.handle_key(press(KeyCode::Char(c)));
        }
    }

    #[test]
    fn enter_submits_typed_text() {
        let mut composer = Composer::new();
        type_text(&mut composer, "hello there");
        assert_eq!(
            composer.handle_key(press(KeyCode::Enter)),
            ComposerResult::Submitted("hello there".to_string())
        );
        assert!(composer.content.is_empty());
    }

    #[test]
    fn enter_on_blank_input_does_nothing() {
        let mut composer = Composer::new();
        type_text(&mut composer, "   ");
        assert_eq!(composer.handle_key(press(KeyCode::Enter)), ComposerResult::None);
    }

    #[test]
    fn slash_input_becomes_a_command() {
        let mut composer = Composer::new();
        type_text(&mut composer, "/new");
        match composer.handle_key(press(KeyCode::Enter)) {
            ComposerResult::Command(parsed) => assert_eq!(parsed.command, SlashCommand::New),
            other => panic!("expected command, got {:?}", other),
        }
    }

    #[test]
    fn gated_composer_swallows_keystrokes() {
        let mut composer = Composer::new();
        composer.set_gate(ComposerGate::Confirming);
        type_text(&mut composer, "ignored");
        assert!(composer.content.is_empty());

        composer.set_gate(ComposerGate::Busy);
        assert_eq!(composer.handle_key(press(KeyCode::Enter)), ComposerResult::None);
    }

    #[test]
    fn backspace_handles_multibyte_input() {
        let mut composer = Composer::new();
        type_text(&mut composer, "naïve");
        composer.handle_key(press(KeyCode::Backspace));
        composer.handle_key(press(KeyCode::Backspace));
        assert_eq!(composer.content, "naï");
    }
}
