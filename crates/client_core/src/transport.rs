use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use shared::{
    domain::{HealthParameter, SelectedFile},
    error::UploadError,
    protocol::{decode_upload_response, UPLOAD_FIELD_NAME},
};
use tracing::{info, warn};

/// The analysis service boundary: one file in, parameter rows out.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    async fn upload(&self, file: &SelectedFile) -> Result<Vec<HealthParameter>, UploadError>;
}

#[async_trait]
impl<T: UploadTransport + ?Sized> UploadTransport for Arc<T> {
    async fn upload(&self, file: &SelectedFile) -> Result<Vec<HealthParameter>, UploadError> {
        (**self).upload(file).await
    }
}

/// Posts the file as a single multipart part. One attempt, no retry.
pub struct HttpUploadTransport {
    http: Client,
    upload_url: String,
}

impl HttpUploadTransport {
    pub fn new(upload_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            upload_url: upload_url.into(),
        }
    }

    pub fn with_timeout(
        upload_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
            upload_url: upload_url.into(),
        })
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }
}

#[async_trait]
impl UploadTransport for HttpUploadTransport {
    async fn upload(&self, file: &SelectedFile) -> Result<Vec<HealthParameter>, UploadError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(|err| {
                warn!(
                    file = %file.name,
                    mime = %file.mime_type,
                    error = %err,
                    "unusable content type"
                );
                UploadError::ContentType {
                    mime_type: file.mime_type.clone(),
                }
            })?;
        let form = Form::new().part(UPLOAD_FIELD_NAME, part);

        let response = self
            .http
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| UploadError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.upload_url, %status, "analysis service rejected upload");
            return Err(UploadError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| UploadError::Network(err.to_string()))?;
        let rows = decode_upload_response(&body)?;
        info!(url = %self.upload_url, rows = rows.len(), "analysis service responded");
        Ok(rows)
    }
}
