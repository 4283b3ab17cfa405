use crate::{domain::HealthParameter, error::UploadError};

pub const DEFAULT_UPLOAD_URL: &str = "http://localhost:8000/api/v1/upload";

/// Multipart field carrying the document.
pub const UPLOAD_FIELD_NAME: &str = "file";

/// Extensions the file picker suggests. Not enforced.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["pdf", "jpg", "png"];

/// Decodes the analysis service response: a JSON array of parameter rows. An empty array is a
/// valid result.
pub fn decode_upload_response(body: &[u8]) -> Result<Vec<HealthParameter>, UploadError> {
    serde_json::from_slice(body).map_err(|err| UploadError::Decode(err.to_string()))
}
