//! Saved-conversation sidebar

use crate::store::ConversationStore;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Lists conversations most-recently-updated first and highlights the
/// active one. Selection moves the active pointer directly.
pub struct Sidebar<'a> {
    store: &'a ConversationStore,
    focused: bool,
}

impl<'a> Sidebar<'a> {
    pub fn new(store: &'a ConversationStore, focused: bool) -> Self {
        Self { store, focused }
    }
}

/// Move the active conversation up or down the display order. Used by the
/// sidebar key bindings; a no-op when there is nothing to move to.
pub fn step_active(store: &mut ConversationStore, delta: isize) {
    let order: Vec<String> = store.sorted().iter().map(|c| c.id.clone()).collect();
    if order.is_empty() {
        return;
    }

    let current = store
        .active_conversation_id
        .as_ref()
        .and_then(|id| order.iter().position(|o| o == id));

    let next = match current {
        Some(index) => {
            let len = order.len() as isize;
            ((index as isize + delta).rem_euclid(len)) as usize
        }
        None => 0,
    };

    store.switch_active(&order[next]);
}

impl Widget for Sidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_color = if self.focused { Color::Green } else { Color::Gray };
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Conversations")
            .style(Style::default().fg(border_color));

        let inner_area = block.inner(area);
        block.render(area, buf);

        let conversations = self.store.sorted();
        if conversations.is_empty() {
            let line = Line::from(Span::styled(
                "Ctrl+N — new",
                Style::default().fg(Color::DarkGray),
            ));
            buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
            return;
        }

        let active_id = self.store.active_conversation_id.as_deref();
        for (i, conversation) in conversations.iter().enumerate() {
            if i >= inner_area.height as usize {
                break;
            }

            let is_active = Some(conversation.id.as_str()) == active_id;
            let marker = if is_active { "▸ " } else { "  " };
            let style = if is_active {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };

            let line = Line::from(vec![
                Span::styled(format!("{}{}", marker, conversation.title), style),
                Span::styled(
                    format!(" ({})", conversation.messages.len()),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);
            buf.set_line(inner_area.x, inner_area.y + i as u16, &line, inner_area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_moves_through_display_order() {
        let mut store = ConversationStore::default();
        let a = store.create(None);
        let b = store.create(None);
        let c = store.create(None);
        // Display order: c, b, a (updated_at descending by creation order).
        store
            .conversations
            .iter_mut()
            .for_each(|conv| {
                conv.updated_at = match &conv.id {
                    id if *id == a => 100,
                    id if *id == b => 200,
                    _ => 300,
                };
            });

        store.switch_active(&c);
        step_active(&mut store, 1);
        assert_eq!(store.active_conversation_id, Some(b.clone()));
        step_active(&mut store, 1);
        assert_eq!(store.active_conversation_id, Some(a.clone()));
        // Wraps around.
        step_active(&mut store, 1);
        assert_eq!(store.active_conversation_id, Some(c.clone()));
        step_active(&mut store, -1);
        assert_eq!(store.active_conversation_id, Some(a));
    }

    #[test]
    fn step_on_empty_store_is_a_noop() {
        let mut store = ConversationStore::default();
        step_active(&mut store, 1);
        assert_eq!(store.active_conversation_id, None);
    }
}
