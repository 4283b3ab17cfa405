use std::path::Path;

use anyhow::{Context, Result};
use shared::domain::SelectedFile;

pub mod config;
pub mod controller;
pub mod login;
pub mod notice;
pub mod report;
pub mod transport;

pub use config::{ClientSettings, ConfigError};
pub use controller::{LifecycleError, SubmitOutcome, UploadController, UploadPhase, UploadState};
pub use login::CredentialGate;
pub use notice::{Notice, NoticeBoard, NoticeKind};
pub use report::{Insight, ResultRow, ResultView};
pub use transport::{HttpUploadTransport, UploadTransport};

/// Reads a file from disk into a selection, named after its final path component.
pub async fn load_file(path: &Path) -> Result<SelectedFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();
    Ok(SelectedFile::new(name, bytes))
}

/// Builds the HTTP transport described by `settings`.
pub fn http_transport(settings: &ClientSettings) -> Result<HttpUploadTransport> {
    HttpUploadTransport::with_timeout(settings.upload_url.clone(), settings.request_timeout)
        .context("failed to build HTTP client")
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
