use serde::{Deserialize, Serialize};

use crate::mvi::UiState;

/// The authenticated actor's own identity snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub username: String,
    pub display_name: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl SessionUser {
    pub fn new(username: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            display_name: display_name.into(),
            image: None,
        }
    }
}

/// Current session contents. `user` is `None` while signed out.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub user: Option<SessionUser>,
}

impl UiState for SessionSnapshot {}

impl SessionSnapshot {
    pub fn username(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.username.as_str())
    }

    /// True when a user is signed in under `username`.
    pub fn is(&self, username: &str) -> bool {
        self.username() == Some(username)
    }
}
