//! File upload client for the import endpoint.

use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::Path;
use tokio::time::Duration;
use tracing::debug;

/// File types the import endpoint accepts. Checked locally before any
/// network call so an unsupported file never leaves the machine.
const ALLOWED_EXTENSIONS: [&str; 4] = ["txt", "pdf", "json", "csv"];

/// Whether a filename carries an accepted extension.
pub fn is_allowed_file(filename: &str) -> bool {
    let Some((_, extension)) = filename.rsplit_once('.') else {
        return false;
    };
    ALLOWED_EXTENSIONS.contains(&extension.to_lowercase().as_str())
}

/// Receipt returned by the import endpoint. Only success/failure matters to
/// the client; the fields are kept for the status line.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadReceipt {
    pub status: String,
    pub filename: String,
    #[allow(dead_code)]
    pub path: String,
}

/// HTTP client for the import endpoint.
#[derive(Clone)]
pub struct UploadClient {
    base_url: String,
    client: reqwest::Client,
}

impl UploadClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Upload a single file as a multipart form. One call, no retry.
    pub async fn upload(&self, path: &Path) -> Result<UploadReceipt> {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .context("Upload path has no usable file name")?
            .to_string();

        if !is_allowed_file(&filename) {
            anyhow::bail!(
                "Unsupported file type '{}' (accepted: {})",
                filename,
                ALLOWED_EXTENSIONS.join(", ")
            );
        }

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        debug!(%filename, size = bytes.len(), "uploading file");

        let form = Form::new().part("file", Part::bytes(bytes).file_name(filename));
        let url = format!("{}/api/import/upload", self.base_url);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .context("Upload request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "Upload service error ({}): {}",
                status,
                error_text
            ));
        }

        response
            .json::<UploadReceipt>()
            .await
            .context("Failed to parse upload receipt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_listed_extensions() {
        assert!(is_allowed_file("report.txt"));
        assert!(is_allowed_file("feed.json"));
        assert!(is_allowed_file("indicators.csv"));
        assert!(is_allowed_file("briefing.pdf"));
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(is_allowed_file("REPORT.TXT"));
        assert!(is_allowed_file("Feed.Json"));
    }

    #[test]
    fn rejects_other_extensions_and_bare_names() {
        assert!(!is_allowed_file("payload.exe"));
        assert!(!is_allowed_file("archive.tar.gz"));
        assert!(!is_allowed_file("noextension"));
    }

    #[tokio::test]
    async fn upload_refuses_disallowed_file_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("malware.exe");
        std::fs::write(&path, b"nope").unwrap();

        // Port 9 is the discard protocol; nothing listens there, so reaching
        // the network at all would fail differently than the allowlist error.
        let client = UploadClient::new("http://127.0.0.1:9");
        let err = client.upload(&path).await.unwrap_err();
        assert!(err.to_string().contains("Unsupported file type"));
    }
}
