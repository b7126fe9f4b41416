use crate::model::{Photo, Profile, ProfileUpdate, UserActivity};
use crate::mvi::Intent;

use super::operation::Operation;

/// Transitions of the profile store.
///
/// Mutations carrying an `owner` only touch the held profile when it still
/// belongs to that username; a profile swapped in while the request was in
/// flight is left alone. Their operation flag is cleared either way.
#[derive(Debug, Clone)]
pub enum ProfileIntent {
    Started(Operation),
    Failed(Operation),
    /// Completion with nothing to apply (superseded or aborted request).
    Settled(Operation),

    ProfileLoaded { profile: Profile },
    ProfileCleared,

    PhotoUploaded { owner: String, photo: Photo },
    MainPhotoSet { owner: String, photo_id: String },
    PhotoDeleted { owner: String, photo_id: String },

    /// Legacy full edit confirmed. Both fields replace the held values.
    ProfileEdited {
        owner: String,
        display_name: String,
        bio: Option<String>,
    },
    /// Partial edit confirmed.
    ProfileUpdated { owner: String, update: ProfileUpdate },

    Followed { username: String },
    Unfollowed { username: String },

    ActivitiesLoaded { activities: Vec<UserActivity> },
    FollowingsLoaded { profiles: Vec<Profile> },
    FollowingsCleared,

    TabSelected { index: usize },
}

impl Intent for ProfileIntent {}
