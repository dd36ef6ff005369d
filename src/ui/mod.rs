//! Terminal UI components for the chat interface

pub mod app;
pub mod commands;
pub mod composer;
pub mod history;
pub mod perspectives;
pub mod sidebar;
