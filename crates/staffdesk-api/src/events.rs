//! User-facing notices emitted by the session monitor

use serde::{Deserialize, Serialize};
use std::fmt;

/// Notice kinds the presentation layer knows how to render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Session is about to expire
    Warning,
    /// Session has expired and will be logged out
    Expired,
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeKind::Warning => write!(f, "warning"),
            NoticeKind::Expired => write!(f, "expired"),
        }
    }
}

/// A notification destined for a toast or banner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionNotice {
    pub kind: NoticeKind,
    pub message: String,
}

impl SessionNotice {
    /// Warning shown on entering the warning window
    pub fn expiring_in(minutes: u64) -> Self {
        let unit = if minutes == 1 { "minute" } else { "minutes" };
        Self {
            kind: NoticeKind::Warning,
            message: format!(
                "Your session will expire in {} {} due to inactivity",
                minutes, unit
            ),
        }
    }

    /// One-time notice shown when the timeout is reached
    pub fn expired() -> Self {
        Self {
            kind: NoticeKind::Expired,
            message: "Your session has expired due to inactivity. Please log in again.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_message_pluralizes() {
        assert!(SessionNotice::expiring_in(1).message.contains("1 minute "));
        assert!(SessionNotice::expiring_in(2).message.contains("2 minutes"));
    }

    #[test]
    fn expired_notice_kind() {
        assert_eq!(SessionNotice::expired().kind, NoticeKind::Expired);
    }
}
