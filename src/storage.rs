//! Durable persistence for the conversation store.
//!
//! The whole [`ConversationStore`] is written as one JSON blob. Loading never
//! fails: a missing or corrupted file yields the empty default store so a bad
//! disk state can't keep the app from starting.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::store::ConversationStore;

/// Read the store from disk, falling back to an empty store when the file is
/// absent (first run) or its contents do not parse.
pub fn load_store(path: &Path) -> ConversationStore {
    match fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
            tracing::warn!(?path, %err, "conversation store corrupted, starting empty");
            ConversationStore::default()
        }),
        Err(_) => ConversationStore::default(),
    }
}

/// Persist the full store. Called after every mutation so nothing is lost if
/// the process dies between turns.
pub fn save_store(path: &Path, store: &ConversationStore) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .context("Failed to create conversation store directory")?;
    }

    let content = serde_json::to_string_pretty(store)
        .context("Failed to serialize conversation store")?;
    fs::write(path, content)
        .context("Failed to write conversation store")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Message, Perspective};

    #[test]
    fn round_trip_preserves_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conversations.json");

        let mut store = ConversationStore::default();
        let id = store.create(Some(vec![Perspective::Us, Perspective::Neutral]));
        store.append_message(&id, Message::user("Investigate APT29"));
        store.append_message(&id, Message::system("Which timeframe?"));
        store.set_confirming(true);

        save_store(&path, &store).unwrap();
        let loaded = load_store(&path);
        assert_eq!(loaded, store);
    }

    #[test]
    fn missing_file_loads_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_store(&dir.path().join("nope.json"));
        assert_eq!(loaded, ConversationStore::default());
    }

    #[test]
    fn corrupted_file_loads_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conversations.json");
        fs::write(&path, "{not json at all").unwrap();

        let loaded = load_store(&path);
        assert_eq!(loaded, ConversationStore::default());
    }

    #[test]
    fn persisted_layout_uses_camel_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conversations.json");

        let mut store = ConversationStore::default();
        store.create(None);
        save_store(&path, &store).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"activeConversationId\""));
        assert!(raw.contains("\"sessionId\""));
        assert!(raw.contains("\"isConfirming\""));
        assert!(raw.contains("\"createdAt\""));
        assert!(raw.contains("\"updatedAt\""));
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep").join("conversations.json");
        save_store(&path, &ConversationStore::default()).unwrap();
        assert!(path.exists());
    }
}
