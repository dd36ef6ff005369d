//! Perspective picker modal

use crate::store::Perspective;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};
use strum::IntoEnumIterator;

/// Result of a key press routed to the picker
#[derive(Debug, PartialEq)]
pub enum PickerResult {
    /// User confirmed; apply this selection to the active conversation.
    Applied(Vec<Perspective>),
    /// User dismissed the picker without changes.
    Cancelled,
    None,
}

/// Modal toggle list over the closed perspective vocabulary. Toggling never
/// talks to the store; the selection is applied as a whole on Enter.
pub struct PerspectivePicker {
    cursor: usize,
    selected: Vec<Perspective>,
}

impl PerspectivePicker {
    pub fn new(current: &[Perspective]) -> Self {
        Self {
            cursor: 0,
            selected: current.to_vec(),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PickerResult {
        if key.kind != KeyEventKind::Press {
            return PickerResult::None;
        }

        let entries: Vec<Perspective> = Perspective::iter().collect();
        match key.code {
            KeyCode::Up => {
                self.cursor = self.cursor.checked_sub(1).unwrap_or(entries.len() - 1);
                PickerResult::None
            }
            KeyCode::Down => {
                self.cursor = (self.cursor + 1) % entries.len();
                PickerResult::None
            }
            KeyCode::Char(' ') => {
                self.toggle(entries[self.cursor]);
                PickerResult::None
            }
            KeyCode::Enter => PickerResult::Applied(self.selection()),
            KeyCode::Esc => PickerResult::Cancelled,
            _ => PickerResult::None,
        }
    }

    fn toggle(&mut self, perspective: Perspective) {
        if let Some(index) = self.selected.iter().position(|p| *p == perspective) {
            self.selected.remove(index);
        } else {
            self.selected.push(perspective);
        }
    }

    /// Final selection; an empty one falls back to NEUTRAL so a conversation
    /// is never sent without a perspective.
    fn selection(&self) -> Vec<Perspective> {
        if self.selected.is_empty() {
            vec![Perspective::Neutral]
        } else {
            self.selected.clone()
        }
    }
}

impl Widget for &PerspectivePicker {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let entries: Vec<Perspective> = Perspective::iter().collect();
        let height = (entries.len() + 2) as u16;
        let width = 34u16.min(area.width);

        let modal = Rect {
            x: area.x + (area.width.saturating_sub(width)) / 2,
            y: area.y + (area.height.saturating_sub(height)) / 2,
            width,
            height: height.min(area.height),
        };

        Clear.render(modal, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Perspectives — space toggle, enter apply")
            .style(Style::default().fg(Color::Blue));
        let inner = block.inner(modal);
        block.render(modal, buf);

        for (i, perspective) in entries.iter().enumerate() {
            if i >= inner.height as usize {
                break;
            }

            let checked = self.selected.contains(perspective);
            let marker = if checked { "[x]" } else { "[ ]" };
            let style = if i == self.cursor {
                Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else if checked {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::Gray)
            };

            let line = Line::from(Span::styled(
                format!("{} {} ({})", marker, perspective.label(), perspective.as_ref()),
                style,
            ));
            buf.set_line(inner.x, inner.y + i as u16, &line, inner.width);
        }
    }
}
