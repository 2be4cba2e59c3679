//! Session-related types.
//!
//! Types stored in the session between requests: the visitor's key-value
//! storage and a one-shot notice carried across a redirect.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

/// How a notice is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Error,
}

impl NoticeKind {
    /// CSS modifier class for the notice banner.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "notice--success",
            Self::Error => "notice--error",
        }
    }
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    /// Store this notice for the next page render.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn flash(self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(keys::NOTICE, self).await
    }

    /// Remove and return the pending notice, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    pub async fn take(session: &Session) -> Result<Option<Self>, tower_sessions::session::Error> {
        session.remove(keys::NOTICE).await
    }
}

/// Session keys.
pub mod keys {
    /// Key for the visitor's key-value storage (`cartData`, `favouriteCart`).
    pub const LOCAL_STORAGE: &str = "local_storage";

    /// Key for the pending one-shot notice.
    pub const NOTICE: &str = "notice";
}
