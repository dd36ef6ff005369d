//! Conversation data model and reducer.
//!
//! The [`ConversationStore`] is the single source of truth for every saved
//! conversation and the active selection. All mutation flows through
//! [`ConversationStore::apply`] with a tagged [`StoreAction`], so the
//! transition logic stays in one place and is easy to test.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

/// Title a conversation starts with until the first user message names it.
pub const DEFAULT_TITLE: &str = "New conversation";

/// Titles derived from the first user message are cut at this many characters.
const TITLE_MAX_CHARS: usize = 50;

/// Current time as epoch milliseconds, the unit used for all store timestamps.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    System,
}

/// Geopolitical viewpoint tags sent verbatim to the dialogue service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
    Display, EnumString, EnumIter, AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Perspective {
    Us,
    Eu,
    Norway,
    China,
    Russia,
    Neutral,
}

impl Perspective {
    /// Human-readable label shown in the perspective picker.
    pub fn label(&self) -> &'static str {
        match self {
            Perspective::Us => "United States",
            Perspective::Eu => "European Union",
            Perspective::Norway => "Norway",
            Perspective::China => "China",
            Perspective::Russia => "Russia",
            Perspective::Neutral => "Neutral",
        }
    }
}

/// A single chat message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            sender: Sender::User,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            sender: Sender::System,
        }
    }
}

/// One ongoing exchange with the dialogue service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub perspectives: Vec<Perspective>,
    /// Opaque correlator sent with every dialogue request so the service can
    /// keep per-conversation context. Generated once, stable for the lifetime.
    pub session_id: String,
    /// True while the dialogue awaits explicit approval of a proposed summary.
    pub is_confirming: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Conversation {
    pub fn new(perspectives: Option<Vec<Perspective>>) -> Self {
        let now = now_millis();
        Self {
            id: Uuid::new_v4().to_string(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            perspectives: perspectives.unwrap_or_else(|| vec![Perspective::Neutral]),
            session_id: Uuid::new_v4().to_string(),
            is_confirming: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Tagged mutation set for the store. Timestamps and ids are generated by the
/// caller so that `apply` itself is a deterministic transition function.
#[derive(Debug, Clone)]
pub enum StoreAction {
    Create { conversation: Conversation },
    Switch { id: String },
    Delete { id: String },
    Rename { id: String, title: String, at: i64 },
    Append { conversation_id: String, message: Message, at: i64 },
    SetConfirming { conversation_id: String, value: bool, at: i64 },
    SetPerspectives { perspectives: Vec<Perspective>, at: i64 },
}

/// All conversations plus the active selection. Serialized as a single JSON
/// blob; field names stay camelCase to match the persisted layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationStore {
    pub conversations: Vec<Conversation>,
    pub active_conversation_id: Option<String>,
}

impl ConversationStore {
    /// Apply a single action. Unknown ids are a no-op; the store is returned
    /// unchanged rather than left with a dangling active reference.
    pub fn apply(&mut self, action: StoreAction) {
        match action {
            StoreAction::Create { conversation } => {
                self.active_conversation_id = Some(conversation.id.clone());
                self.conversations.push(conversation);
            }
            StoreAction::Switch { id } => {
                if self.conversations.iter().any(|c| c.id == id) {
                    self.active_conversation_id = Some(id);
                }
            }
            StoreAction::Delete { id } => {
                let before = self.conversations.len();
                self.conversations.retain(|c| c.id != id);
                if self.conversations.len() == before {
                    return;
                }
                if self.active_conversation_id.as_deref() == Some(id.as_str()) {
                    // Re-target to the most recently updated survivor.
                    self.active_conversation_id = self
                        .conversations
                        .iter()
                        .max_by_key(|c| c.updated_at)
                        .map(|c| c.id.clone());
                }
            }
            StoreAction::Rename { id, title, at } => {
                if let Some(conversation) = self.get_mut(&id) {
                    conversation.title = title;
                    conversation.updated_at = at;
                }
            }
            StoreAction::Append { conversation_id, message, at } => {
                if let Some(conversation) = self.get_mut(&conversation_id) {
                    // The first user message names the conversation, once.
                    if message.sender == Sender::User && conversation.title == DEFAULT_TITLE {
                        conversation.title = derive_title(&message.text);
                    }
                    conversation.messages.push(message);
                    conversation.updated_at = at;
                }
            }
            StoreAction::SetConfirming { conversation_id, value, at } => {
                if let Some(conversation) = self.get_mut(&conversation_id) {
                    conversation.is_confirming = value;
                    conversation.updated_at = at;
                }
            }
            StoreAction::SetPerspectives { perspectives, at } => {
                if let Some(conversation) = self.active_mut() {
                    conversation.perspectives = perspectives;
                    conversation.updated_at = at;
                }
            }
        }
    }

    /// Create a new conversation, make it active, and return its id.
    pub fn create(&mut self, perspectives: Option<Vec<Perspective>>) -> String {
        let conversation = Conversation::new(perspectives);
        let id = conversation.id.clone();
        self.apply(StoreAction::Create { conversation });
        id
    }

    pub fn switch_active(&mut self, id: &str) {
        self.apply(StoreAction::Switch { id: id.to_string() });
    }

    pub fn delete(&mut self, id: &str) {
        self.apply(StoreAction::Delete { id: id.to_string() });
    }

    pub fn rename(&mut self, id: &str, title: impl Into<String>) {
        self.apply(StoreAction::Rename {
            id: id.to_string(),
            title: title.into(),
            at: now_millis(),
        });
    }

    pub fn append_message(&mut self, conversation_id: &str, message: Message) {
        self.apply(StoreAction::Append {
            conversation_id: conversation_id.to_string(),
            message,
            at: now_millis(),
        });
    }

    /// Set the confirming flag on the active conversation.
    pub fn set_confirming(&mut self, value: bool) {
        if let Some(id) = self.active_conversation_id.clone() {
            self.set_confirming_for(&id, value);
        }
    }

    /// Set the confirming flag on a specific conversation. Used when a reply
    /// arrives for a conversation that may no longer be active.
    pub fn set_confirming_for(&mut self, conversation_id: &str, value: bool) {
        self.apply(StoreAction::SetConfirming {
            conversation_id: conversation_id.to_string(),
            value,
            at: now_millis(),
        });
    }

    pub fn set_perspectives(&mut self, perspectives: Vec<Perspective>) {
        self.apply(StoreAction::SetPerspectives { perspectives, at: now_millis() });
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    pub fn active(&self) -> Option<&Conversation> {
        let id = self.active_conversation_id.as_deref()?;
        self.get(id)
    }

    fn active_mut(&mut self) -> Option<&mut Conversation> {
        let id = self.active_conversation_id.clone()?;
        self.get_mut(&id)
    }

    /// Conversations in display order: most recently updated first.
    pub fn sorted(&self) -> Vec<&Conversation> {
        let mut list: Vec<&Conversation> = self.conversations.iter().collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        list
    }
}

/// Truncate the first user message into a conversation title.
fn derive_title(text: &str) -> String {
    if text.chars().count() > TITLE_MAX_CHARS {
        let truncated: String = text.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}
