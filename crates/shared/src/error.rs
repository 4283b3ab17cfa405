use thiserror::Error;

/// Why a submission failed. Every variant is recoverable: the user may resubmit or pick another
/// file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// The request never produced a response.
    #[error("{0}")]
    Network(String),
    /// The service answered with a non-success status.
    #[error("Upload failed (HTTP {status})")]
    Status { status: u16 },
    /// The body was not a JSON array of parameter rows.
    #[error("invalid response body: {0}")]
    Decode(String),
    /// The selected file could not be packed into a request; nothing was sent.
    #[error("invalid content type '{mime_type}'")]
    ContentType { mime_type: String },
}

impl UploadError {
    /// Text shown to the user when a submission fails.
    pub fn user_message(&self) -> String {
        format!("Upload error: {self}")
    }
}
