//! Chat session controller.
//!
//! Drives one conversation's dialogue protocol on top of the conversation
//! store and a [`DialogueService`]. The protocol has two phases, tracked by
//! the conversation's `is_confirming` flag:
//!
//! - **Gathering**: free text accepted. A submitted message is appended,
//!   sent to the service, and the reply question appended as a system
//!   message. The reply's `is_final` decides whether we enter confirming.
//! - **Confirming**: free text refused; the only legal moves are approve
//!   (one more service call with `approved=true`) and reject (purely local).
//!
//! Network calls run on a spawned task and come back through a oneshot
//! channel polled from the event loop, so every store mutation happens on
//! the caller's thread. While a call is in flight, further sends are no-ops.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::warn;

use crate::dialogue::{DialogueReply, DialogueService};
use crate::store::{ConversationStore, Message};

/// System message appended locally when the user rejects a proposed summary.
pub const REJECT_PROMPT: &str = "What would you like to change?";

/// What a completed turn means for the caller (shown on the status line).
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The service replied and the store was updated.
    Reply { is_final: bool },
    /// The call failed; no message was appended and the phase is unchanged.
    Failed(String),
}

struct PendingTurn {
    conversation_id: String,
    rx: oneshot::Receiver<Result<DialogueReply>>,
}

/// Per-application dialogue driver. One turn may be outstanding at a time.
pub struct ChatController<S: DialogueService + 'static> {
    service: Arc<S>,
    pending: Option<PendingTurn>,
}

impl<S: DialogueService + 'static> ChatController<S> {
    pub fn new(service: S) -> Self {
        Self {
            service: Arc::new(service),
            pending: None,
        }
    }

    /// Whether a dialogue call is currently outstanding.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Submit free text for the active conversation. Returns true when a
    /// turn was started. Refused (no-op) while confirming, while another
    /// call is in flight, when the text is blank, or with no active
    /// conversation.
    pub fn submit(&mut self, store: &mut ConversationStore, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() || self.pending.is_some() {
            return false;
        }
        let Some(conversation) = store.active() else {
            return false;
        };
        if conversation.is_confirming {
            return false;
        }

        let conversation_id = conversation.id.clone();
        store.append_message(&conversation_id, Message::user(text));
        self.dispatch(store, conversation_id, text.to_string(), None);
        true
    }

    /// Approve the proposed summary. Sends the fixed message "approve" with
    /// `approved=true`; the service decides whether the conversation stays
    /// in confirming (`is_final` of the new reply). No user message is shown
    /// for the approval itself.
    pub fn approve(&mut self, store: &mut ConversationStore) -> bool {
        if self.pending.is_some() {
            return false;
        }
        let Some(conversation) = store.active() else {
            return false;
        };
        if !conversation.is_confirming {
            return false;
        }

        let conversation_id = conversation.id.clone();
        self.dispatch(store, conversation_id, "approve".to_string(), Some(true));
        true
    }

    /// Reject the proposed summary. Purely local: appends a fixed prompt and
    /// returns to gathering so the user can type corrections.
    pub fn reject(&mut self, store: &mut ConversationStore) -> bool {
        if self.pending.is_some() {
            return false;
        }
        let Some(conversation) = store.active() else {
            return false;
        };
        if !conversation.is_confirming {
            return false;
        }

        let conversation_id = conversation.id.clone();
        store.append_message(&conversation_id, Message::system(REJECT_PROMPT));
        store.set_confirming(false);
        true
    }

    /// Poll the outstanding call, applying its result to the store when it
    /// has completed. Called from the event loop every tick.
    pub fn poll(&mut self, store: &mut ConversationStore) -> Option<TurnOutcome> {
        let mut pending = self.pending.take()?;

        let result = match pending.rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => {
                self.pending = Some(pending);
                return None;
            }
            Err(oneshot::error::TryRecvError::Closed) => {
                return Some(TurnOutcome::Failed("dialogue task vanished".to_string()));
            }
        };

        match result {
            Ok(reply) => {
                // Target the originating conversation, not the active one;
                // the two can differ if the selection moved mid-flight.
                store.append_message(&pending.conversation_id, Message::system(&reply.question));
                store.set_confirming_for(&pending.conversation_id, reply.is_final);
                Some(TurnOutcome::Reply { is_final: reply.is_final })
            }
            Err(err) => {
                // Leave the conversation exactly as it was so the user can
                // retry the same action.
                warn!(conversation_id = %pending.conversation_id, %err, "dialogue turn failed");
                Some(TurnOutcome::Failed(err.to_string()))
            }
        }
    }

    /// Kick off the network call. Session id and perspectives are read from
    /// the store at call time, never cached in the controller.
    fn dispatch(
        &mut self,
        store: &ConversationStore,
        conversation_id: String,
        message: String,
        approved: Option<bool>,
    ) {
        let Some(conversation) = store.get(&conversation_id) else {
            return;
        };
        let session_id = conversation.session_id.clone();
        let perspectives = conversation.perspectives.clone();

        let service = Arc::clone(&self.service);
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let result = service
                .send(&message, &session_id, &perspectives, approved)
                .await;
            let _ = tx.send(result);
        });

        self.pending = Some(PendingTurn { conversation_id, rx });
    }
}
