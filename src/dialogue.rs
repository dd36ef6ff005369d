//! Dialogue service client.
//!
//! Stateless translation of a local chat turn into one HTTP call against the
//! external dialogue endpoint. The service itself (scope negotiation,
//! summarization, final-answer decision) is a black box behind this contract.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Duration;
use tracing::debug;

use crate::store::Perspective;

/// Seam between the chat controller and the network. Lets tests script the
/// service without a server.
#[async_trait]
pub trait DialogueService: Send + Sync {
    /// Send one turn. Exactly one call per invocation, no retry; any
    /// transport or non-2xx failure propagates to the caller.
    ///
    /// `approved` is omitted from the request for ordinary turns and set
    /// `true` for the explicit approval action.
    async fn send(
        &self,
        message: &str,
        session_id: &str,
        perspectives: &[Perspective],
        approved: Option<bool>,
    ) -> Result<DialogueReply>;
}

/// Structured reply from the dialogue endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DialogueReply {
    /// Next clarifying question, or the proposed summary text.
    pub question: String,
    /// Reply category reported by the service ("question", "summary", ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// True when the service proposes a summary and wants explicit approval.
    pub is_final: bool,
}

#[derive(Debug, Serialize)]
struct DialogueRequest<'a> {
    message: &'a str,
    session_id: &'a str,
    perspectives: &'a [Perspective],
    #[serde(skip_serializing_if = "Option::is_none")]
    approved: Option<bool>,
}

/// HTTP client for the dialogue endpoint.
#[derive(Clone)]
pub struct HttpDialogueClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpDialogueClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into(),
            client,
        }
    }
}

#[async_trait]
impl DialogueService for HttpDialogueClient {
    async fn send(
        &self,
        message: &str,
        session_id: &str,
        perspectives: &[Perspective],
        approved: Option<bool>,
    ) -> Result<DialogueReply> {
        let url = format!("{}/api/dialogue/message", self.base_url);
        let payload = DialogueRequest {
            message,
            session_id,
            perspectives,
            approved,
        };

        debug!(session_id, ?approved, "sending dialogue turn");

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("Dialogue request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Dialogue service error ({}): {}",
                status,
                error_text
            ));
        }

        response
            .json::<DialogueReply>()
            .await
            .context("Failed to parse dialogue reply")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_turn_omits_approved_field() {
        let payload = DialogueRequest {
            message: "Investigate APT29",
            session_id: "abc-123",
            perspectives: &[Perspective::Neutral],
            approved: None,
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(
            json,
            r#"{"message":"Investigate APT29","session_id":"abc-123","perspectives":["NEUTRAL"]}"#
        );
    }

    #[test]
    fn approval_turn_carries_approved_true() {
        let payload = DialogueRequest {
            message: "approve",
            session_id: "abc-123",
            perspectives: &[Perspective::Us, Perspective::Eu],
            approved: Some(true),
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(
            json,
            r#"{"message":"approve","session_id":"abc-123","perspectives":["US","EU"],"approved":true}"#
        );
    }

    #[test]
    fn reply_parses_wire_type_field() {
        let reply: DialogueReply = serde_json::from_str(
            r#"{"question":"Do you approve?","type":"summary","is_final":true}"#,
        )
        .unwrap();
        assert_eq!(reply.question, "Do you approve?");
        assert_eq!(reply.kind, "summary");
        assert!(reply.is_final);
    }
}
