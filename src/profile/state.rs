use crate::model::{Profile, UserActivity};
use crate::mvi::UiState;
use crate::session::{SessionSnapshot, SessionUser};

/// In-flight flags, one per class of action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OperationFlags {
    pub loading_profile: bool,
    pub uploading_photo: bool,
    pub loading_activities: bool,
    /// Follow, unfollow, set-main and delete-photo.
    pub loading: bool,
    /// Legacy full profile edit.
    pub submitting: bool,
    /// Partial profile edit.
    pub updating_profile: bool,
    pub loading_followings: bool,
}

impl OperationFlags {
    pub fn any(&self) -> bool {
        self.loading_profile
            || self.uploading_photo
            || self.loading_activities
            || self.loading
            || self.submitting
            || self.updating_profile
            || self.loading_followings
    }
}

/// Everything the profile store owns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileState {
    pub profile: Option<Profile>,
    pub followings: Vec<Profile>,
    pub activities: Vec<UserActivity>,
    pub active_tab: usize,
    pub flags: OperationFlags,
}

impl UiState for ProfileState {}

impl ProfileState {
    pub fn username(&self) -> Option<&str> {
        self.profile.as_ref().map(|p| p.username.as_str())
    }

    /// True when the held profile belongs to `username`.
    pub fn holds(&self, username: &str) -> bool {
        self.username() == Some(username)
    }
}

/// What the view renders: store state plus the session it is compared to.
///
/// Published as one value, so a subscriber never sees the profile and the
/// session user out of step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileSnapshot {
    pub state: ProfileState,
    pub session_user: Option<SessionUser>,
    pub is_current_user: bool,
}

impl ProfileSnapshot {
    pub(crate) fn new(state: &ProfileState, session: &SessionSnapshot) -> Self {
        Self {
            state: state.clone(),
            session_user: session.user.clone(),
            is_current_user: is_current_user(state, session),
        }
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.state.profile.as_ref()
    }

    pub fn flags(&self) -> OperationFlags {
        self.state.flags
    }
}

/// Session identity equals the loaded profile identity.
pub(crate) fn is_current_user(state: &ProfileState, session: &SessionSnapshot) -> bool {
    state.username().is_some_and(|username| session.is(username))
}
