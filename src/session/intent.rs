use crate::mvi::Intent;

use super::state::SessionUser;

#[derive(Debug, Clone)]
pub enum SessionIntent {
    SignedIn { user: SessionUser },
    SignedOut,
    /// Mirror of a main-photo change. Ignored unless `username` is signed in.
    ImageChanged {
        username: String,
        image: Option<String>,
    },
    /// Mirror of a display name edit. Ignored unless `username` is signed in.
    DisplayNameChanged {
        username: String,
        display_name: String,
    },
}

impl Intent for SessionIntent {}
