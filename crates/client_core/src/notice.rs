//! Transient user-facing notices with a self-cancelling dismiss timer.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::task::JoinHandle;
use tracing::debug;

pub const UPLOAD_NOTICE_DELAY: Duration = Duration::from_millis(2500);
pub const LOGIN_NOTICE_DELAY: Duration = Duration::from_millis(2200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Default)]
struct BoardState {
    live: Option<Notice>,
    generation: u64,
    dismiss_task: Option<JoinHandle<()>>,
}

/// Holds at most one live notice. Posting a notice aborts the pending dismissal of the previous
/// one before scheduling its own, so at most one dismissal is ever pending.
#[derive(Clone, Default)]
pub struct NoticeBoard {
    state: Arc<Mutex<BoardState>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Must be called from within a tokio runtime.
    pub fn show(&self, notice: Notice, dismiss_after: Duration) {
        let mut state = lock(&self.state);
        if let Some(previous) = state.dismiss_task.take() {
            previous.abort();
        }
        state.generation += 1;
        let generation = state.generation;
        debug!(kind = ?notice.kind, message = %notice.message, ?dismiss_after, "notice posted");
        state.live = Some(notice);

        let board = Arc::clone(&self.state);
        state.dismiss_task = Some(tokio::spawn(async move {
            tokio::time::sleep(dismiss_after).await;
            let mut state = lock(&board);
            // A newer notice may have replaced this one after the timer fired.
            if state.generation == generation {
                state.live = None;
                state.dismiss_task = None;
            }
        }));
    }

    pub fn dismiss(&self) {
        let mut state = lock(&self.state);
        if let Some(task) = state.dismiss_task.take() {
            task.abort();
        }
        state.generation += 1;
        state.live = None;
    }

    pub fn current(&self) -> Option<Notice> {
        lock(&self.state).live.clone()
    }

}

fn lock(state: &Mutex<BoardState>) -> MutexGuard<'_, BoardState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
