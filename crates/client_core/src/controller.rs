//! Upload lifecycle: file selection, single-flight submission and result bookkeeping.

use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use shared::{
    domain::{HealthParameter, SelectedFile},
    error::UploadError,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    notice::{Notice, NoticeBoard, UPLOAD_NOTICE_DELAY},
    report::ResultView,
    transport::UploadTransport,
};

pub const UPLOAD_SUCCESS_MESSAGE: &str = "Upload successful!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Ready {
        file: SelectedFile,
    },
    Submitting {
        file: SelectedFile,
    },
    Succeeded {
        results: Vec<HealthParameter>,
    },
    /// The file stays selected so the user can retry without picking it again.
    Failed {
        file: SelectedFile,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPhase {
    Idle,
    Ready,
    Submitting,
    Succeeded,
    Failed,
}

impl UploadState {
    pub fn phase(&self) -> UploadPhase {
        match self {
            UploadState::Idle => UploadPhase::Idle,
            UploadState::Ready { .. } => UploadPhase::Ready,
            UploadState::Submitting { .. } => UploadPhase::Submitting,
            UploadState::Succeeded { .. } => UploadPhase::Succeeded,
            UploadState::Failed { .. } => UploadPhase::Failed,
        }
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        match self {
            UploadState::Ready { file }
            | UploadState::Submitting { file }
            | UploadState::Failed { file, .. } => Some(file),
            UploadState::Idle | UploadState::Succeeded { .. } => None,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, UploadState::Submitting { .. })
    }

    pub fn results(&self) -> Option<&[HealthParameter]> {
        match self {
            UploadState::Succeeded { results } => Some(results),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            UploadState::Failed { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Whether the submit affordance is enabled.
    pub fn can_submit(&self) -> bool {
        !self.is_in_flight() && self.selected_file().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("an upload is already in flight")]
    InFlight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Succeeded { rows: usize },
    Failed(UploadError),
    NothingSelected,
    AlreadyInFlight,
}

struct Session {
    state: UploadState,
    drag_active: bool,
}

impl Session {
    fn transition(&mut self, next: UploadState) {
        debug!(from = ?self.state.phase(), to = ?next.phase(), "upload state transition");
        self.state = next;
    }
}

pub struct UploadController<T: UploadTransport> {
    transport: T,
    session: Mutex<Session>,
    notices: NoticeBoard,
    notice_delay: Duration,
}

impl<T: UploadTransport> UploadController<T> {
    pub fn new(transport: T, notices: NoticeBoard) -> Self {
        Self::with_notice_delay(transport, notices, UPLOAD_NOTICE_DELAY)
    }

    pub fn with_notice_delay(transport: T, notices: NoticeBoard, notice_delay: Duration) -> Self {
        Self {
            transport,
            session: Mutex::new(Session {
                state: UploadState::Idle,
                drag_active: false,
            }),
            notices,
            notice_delay,
        }
    }

    pub fn state(&self) -> UploadState {
        self.lock().state.clone()
    }

    pub fn phase(&self) -> UploadPhase {
        self.lock().state.phase()
    }

    pub fn drag_active(&self) -> bool {
        self.lock().drag_active
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn result_view(&self) -> ResultView {
        ResultView::from_results(self.lock().state.results())
    }

    /// Picks `file` from the file picker. Replaces any previous selection and discards prior
    /// results, errors and the live notice.
    pub fn select_file(&self, file: SelectedFile) -> Result<(), LifecycleError> {
        let mut session = self.lock();
        if session.state.is_in_flight() {
            warn!(file = %file.name, "file selection refused while an upload is in flight");
            return Err(LifecycleError::InFlight);
        }
        if !file.has_accepted_extension() {
            warn!(file = %file.name, "selected file does not have a suggested extension");
        }
        info!(file = %file.name, mime = %file.mime_type, bytes = file.bytes.len(), "file selected");
        session.transition(UploadState::Ready { file });
        self.notices.dismiss();
        Ok(())
    }

    /// Handles a drop on the drop target. Only the first file is taken; a drop without files
    /// leaves the selection untouched.
    pub fn drop_files(&self, files: Vec<SelectedFile>) -> Result<(), LifecycleError> {
        self.set_drag_active(false);
        match files.into_iter().next() {
            Some(file) => self.select_file(file),
            None => Ok(()),
        }
    }

    pub fn clear_file(&self) -> Result<(), LifecycleError> {
        let mut session = self.lock();
        if session.state.is_in_flight() {
            warn!("clearing the selection refused while an upload is in flight");
            return Err(LifecycleError::InFlight);
        }
        session.transition(UploadState::Idle);
        self.notices.dismiss();
        Ok(())
    }

    pub fn set_drag_active(&self, active: bool) {
        let mut session = self.lock();
        if session.drag_active != active {
            debug!(active, "drag hover changed");
            session.drag_active = active;
        }
    }

    /// Submits the selected file. A no-op without a selection or while another submission is
    /// in flight; concurrent calls are dropped, not queued.
    pub async fn submit(&self) -> SubmitOutcome {
        let file = {
            let mut session = self.lock();
            let file = match &session.state {
                UploadState::Submitting { .. } => {
                    warn!("submit ignored: an upload is already in flight");
                    return SubmitOutcome::AlreadyInFlight;
                }
                UploadState::Idle | UploadState::Succeeded { .. } => {
                    debug!("submit ignored: no file selected");
                    return SubmitOutcome::NothingSelected;
                }
                UploadState::Ready { file } | UploadState::Failed { file, .. } => file.clone(),
            };
            session.transition(UploadState::Submitting { file: file.clone() });
            self.notices.dismiss();
            file
        };

        info!(file = %file.name, bytes = file.bytes.len(), "submitting report for analysis");
        let mut in_flight = InFlight {
            session: &self.session,
            armed: true,
        };
        let result = self.transport.upload(&file).await;

        let (outcome, notice) = {
            let mut session = self.lock();
            in_flight.armed = false;
            match result {
                Ok(results) => {
                    let rows = results.len();
                    info!(file = %file.name, rows, "upload succeeded");
                    session.transition(UploadState::Succeeded { results });
                    (
                        SubmitOutcome::Succeeded { rows },
                        Notice::success(UPLOAD_SUCCESS_MESSAGE),
                    )
                }
                Err(err) => {
                    let message = err.user_message();
                    warn!(file = %file.name, error = %err, "upload failed");
                    session.transition(UploadState::Failed {
                        file,
                        message: message.clone(),
                    });
                    (SubmitOutcome::Failed(err), Notice::error(message))
                }
            }
        };

        self.notices.show(notice, self.notice_delay);
        outcome
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        lock_session(&self.session)
    }
}

/// Puts an abandoned submission back to `Ready` when the submit future is dropped before the
/// transport settles.
struct InFlight<'a> {
    session: &'a Mutex<Session>,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut session = lock_session(self.session);
        if let UploadState::Submitting { file } = &session.state {
            let file = file.clone();
            warn!(file = %file.name, "submission abandoned before it settled");
            session.transition(UploadState::Ready { file });
        }
    }
}

fn lock_session(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
