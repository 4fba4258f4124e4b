//! Headless page controllers
//!
//! Each controller drives one screen. They return what happened and where to
//! go next; rendering and navigation belong to the caller.

pub mod detail;
pub mod editor;
pub mod feed;
pub mod login;
pub mod profile;
pub mod register;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use common::ApiError;

use crate::optimistic::MutationOutcome;
use crate::models::PostId;

pub use detail::PostDetailController;
pub use editor::{EditorMode, PostDraft, PostEditorController};
pub use feed::{FeedController, FeedLoad};
pub use login::LoginController;
pub use profile::ProfileController;
pub use register::RegisterController;

/// Shown when a mutation could not be brought back in line with the server
const REPAIR_FAILED: &str = "Failed to process the like.";

/// Form field a message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Email,
    Password,
    Nickname,
    CurrentPassword,
    NewPassword,
    Title,
    Content,
    Comment,
    Image,
}

/// Message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// Transient notification
    Notice(String),
    /// Inline message on one form field
    Field { field: Field, message: String },
    /// The action needs a logged-in user
    LoginRequired,
    /// The session ended; the user has to log in again
    SessionEnded(String),
}

impl Feedback {
    pub fn field(field: Field, message: impl Into<String>) -> Self {
        Feedback::Field {
            field,
            message: message.into(),
        }
    }

    /// Where the caller should go after showing this, if anywhere
    pub fn navigation(&self) -> Option<Navigation> {
        match self {
            Feedback::LoginRequired | Feedback::SessionEnded(_) => Some(Navigation::Login),
            _ => None,
        }
    }
}

impl From<&ApiError> for Feedback {
    fn from(error: &ApiError) -> Self {
        match error {
            ApiError::AuthenticationExpired => Feedback::SessionEnded(error.user_message()),
            _ => Feedback::Notice(error.user_message()),
        }
    }
}

/// Screen to show next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Feed,
    PostDetail(PostId),
    Login,
    Reload,
}

/// Result of a user-triggered action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission<T> {
    Completed(T),
    Rejected(Feedback),
    /// A previous submission was still pending
    Ignored,
}

impl<T> Submission<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Submission::Completed(_))
    }

    pub(crate) fn from_error(error: &ApiError) -> Self {
        Submission::Rejected(error.into())
    }

    /// Map an optimistic mutation outcome; `Reconciled` is reported with
    /// `reconciled` as a notice
    pub(crate) fn from_outcome(outcome: MutationOutcome, value: T, reconciled: &str) -> Self {
        match outcome {
            MutationOutcome::Applied | MutationOutcome::Repaired => Submission::Completed(value),
            MutationOutcome::Reconciled => Submission::Rejected(Feedback::Notice(reconciled.to_string())),
            MutationOutcome::RolledBack(e) => Submission::from_error(&e),
            MutationOutcome::RepairFailed(ApiError::AuthenticationExpired) => {
                Submission::from_error(&ApiError::AuthenticationExpired)
            }
            MutationOutcome::RepairFailed(_) => {
                Submission::Rejected(Feedback::Notice(REPAIR_FAILED.to_string()))
            }
            MutationOutcome::Ignored => Submission::Ignored,
        }
    }
}

/// Duplicate-submit guard for a form
#[derive(Debug, Clone, Default)]
pub(crate) struct SubmitGuard {
    busy: Arc<AtomicBool>,
}

/// Held while a submission runs; releases the guard on drop
#[derive(Debug)]
pub(crate) struct SubmitTicket {
    busy: Arc<AtomicBool>,
}

impl SubmitGuard {
    pub fn try_begin(&self) -> Option<SubmitTicket> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SubmitTicket {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for SubmitTicket {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
