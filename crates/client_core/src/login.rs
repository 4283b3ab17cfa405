use std::time::Duration;

use tracing::{info, warn};

use crate::notice::{Notice, NoticeBoard, LOGIN_NOTICE_DELAY};

pub const DEFAULT_USERNAME: &str = "user";
pub const DEFAULT_PASSWORD: &str = "pass";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials";

/// Static credential check guarding the upload screen.
pub struct CredentialGate {
    username: String,
    password: String,
    notices: NoticeBoard,
    notice_delay: Duration,
}

impl CredentialGate {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        notices: NoticeBoard,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            notices,
            notice_delay: LOGIN_NOTICE_DELAY,
        }
    }

    pub fn with_notice_delay(mut self, notice_delay: Duration) -> Self {
        self.notice_delay = notice_delay;
        self
    }

    pub fn attempt(&self, username: &str, password: &str) -> bool {
        if username == self.username && password == self.password {
            info!(username, "signed in");
            return true;
        }
        warn!(username, "sign-in rejected");
        self.notices
            .show(Notice::error(INVALID_CREDENTIALS_MESSAGE), self.notice_delay);
        false
    }
}

impl Default for CredentialGate {
    fn default() -> Self {
        Self::new(DEFAULT_USERNAME, DEFAULT_PASSWORD, NoticeBoard::new())
    }
}
