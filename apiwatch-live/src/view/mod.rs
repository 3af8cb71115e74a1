//! Per-view state owners
//!
//! A view is constructed when the user opens it and owns everything that
//! feeds it: the held collection, the connection or poller, and the UI flags.
//! Closing (or dropping) the view tears all of it down.

pub mod jobs;
pub mod logs;

pub use jobs::{JobBoard, JobsView};
pub use logs::{LogFrame, LogsView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// One-shot notification for a user-initiated action
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

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}
