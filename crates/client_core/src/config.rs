use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use shared::protocol::DEFAULT_UPLOAD_URL;
use thiserror::Error;
use url::Url;

use crate::{
    login::{DEFAULT_PASSWORD, DEFAULT_USERNAME},
    notice::{LOGIN_NOTICE_DELAY, UPLOAD_NOTICE_DELAY},
};

pub const SETTINGS_FILE: &str = "healthify.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid upload url '{url}': {reason}")]
    UploadUrl { url: String, reason: String },
    #[error("request timeout must be at least one second")]
    ZeroRequestTimeout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub upload_url: String,
    pub request_timeout: Duration,
    pub upload_notice_delay: Duration,
    pub login_notice_delay: Duration,
    pub username: String,
    pub password: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            upload_url: DEFAULT_UPLOAD_URL.into(),
            request_timeout: Duration::from_secs(120),
            upload_notice_delay: UPLOAD_NOTICE_DELAY,
            login_notice_delay: LOGIN_NOTICE_DELAY,
            username: DEFAULT_USERNAME.into(),
            password: DEFAULT_PASSWORD.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    upload_url: Option<String>,
    request_timeout_secs: Option<u64>,
    upload_notice_delay_ms: Option<u64>,
    login_notice_delay_ms: Option<u64>,
    username: Option<String>,
    password: Option<String>,
}

impl ClientSettings {
    /// Defaults overlaid with the settings file (when present) and then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Same as [`ClientSettings::load`], reading overrides through `lookup`.
    pub fn load_with_env(
        path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let path = path.unwrap_or_else(|| Path::new(SETTINGS_FILE));
        let mut settings = match fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        settings.apply_env_overrides(lookup);
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let file: SettingsFile = toml::from_str(raw)?;
        let mut settings = Self::default();
        if let Some(v) = file.upload_url {
            settings.upload_url = v;
        }
        if let Some(v) = file.request_timeout_secs {
            settings.request_timeout = Duration::from_secs(v);
        }
        if let Some(v) = file.upload_notice_delay_ms {
            settings.upload_notice_delay = Duration::from_millis(v);
        }
        if let Some(v) = file.login_notice_delay_ms {
            settings.login_notice_delay = Duration::from_millis(v);
        }
        if let Some(v) = file.username {
            settings.username = v;
        }
        if let Some(v) = file.password {
            settings.password = v;
        }
        Ok(settings)
    }

    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("HEALTHIFY_UPLOAD_URL") {
            self.upload_url = v;
        }
        if let Some(v) = lookup("APP__UPLOAD_URL") {
            self.upload_url = v;
        }
        if let Some(secs) = lookup("APP__REQUEST_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(v) = lookup("APP__USERNAME") {
            self.username = v;
        }
        if let Some(v) = lookup("APP__PASSWORD") {
            self.password = v;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::UploadUrl {
            url: self.upload_url.clone(),
            reason,
        };
        let url = Url::parse(&self.upload_url).map_err(|err| invalid(err.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroRequestTimeout);
        }
        Ok(())
    }
}
