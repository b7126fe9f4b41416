use crate::model::Profile;
use crate::mvi::Reducer;

use super::intent::ProfileIntent;
use super::state::ProfileState;

/// Reducer for profile store transitions.
pub struct ProfileReducer;

impl Reducer for ProfileReducer {
    type State = ProfileState;
    type Intent = ProfileIntent;

    fn reduce(mut state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            ProfileIntent::Started(operation) => {
                *operation.flag_mut(&mut state.flags) = true;
            }

            ProfileIntent::Failed(operation) | ProfileIntent::Settled(operation) => {
                *operation.flag_mut(&mut state.flags) = false;
            }

            ProfileIntent::ProfileLoaded { profile } => {
                state.profile = Some(profile);
                state.flags.loading_profile = false;
            }

            ProfileIntent::ProfileCleared => {
                state.profile = None;
                state.followings.clear();
                state.activities.clear();
                state.flags.loading_profile = false;
                state.flags.loading_followings = false;
            }

            ProfileIntent::PhotoUploaded { owner, photo } => {
                state.flags.uploading_photo = false;
                if let Some(profile) = held_mut(&mut state, &owner) {
                    if photo.is_main {
                        for existing in &mut profile.photos {
                            existing.is_main = false;
                        }
                        profile.image = Some(photo.url.clone());
                    }
                    profile.photos.push(photo);
                }
            }

            ProfileIntent::MainPhotoSet { owner, photo_id } => {
                state.flags.loading = false;
                if let Some(profile) = held_mut(&mut state, &owner) {
                    if !profile.promote_photo(&photo_id) {
                        tracing::warn!(
                            username = %owner,
                            photo_id = %photo_id,
                            "Main photo not in collection, skipping local update"
                        );
                    }
                }
            }

            ProfileIntent::PhotoDeleted { owner, photo_id } => {
                state.flags.loading = false;
                if let Some(profile) = held_mut(&mut state, &owner) {
                    profile.remove_photo(&photo_id);
                }
            }

            ProfileIntent::ProfileEdited {
                owner,
                display_name,
                bio,
            } => {
                state.flags.submitting = false;
                if let Some(profile) = held_mut(&mut state, &owner) {
                    profile.display_name = display_name;
                    profile.bio = bio;
                }
            }

            ProfileIntent::ProfileUpdated { owner, update } => {
                state.flags.updating_profile = false;
                if let Some(profile) = held_mut(&mut state, &owner) {
                    update.apply_to(profile);
                }
            }

            ProfileIntent::Followed { username } => {
                state.flags.loading = false;
                if let Some(profile) = state.profile.as_mut().filter(|p| p.username == username) {
                    profile.following = true;
                    profile.followers_count = profile.followers_count.saturating_add(1);
                    if !state.followings.iter().any(|p| p.username == username) {
                        state.followings.push(profile.clone());
                    }
                } else if let Some(entry) = find_following(&mut state.followings, &username) {
                    entry.following = true;
                    entry.followers_count = entry.followers_count.saturating_add(1);
                }
            }

            ProfileIntent::Unfollowed { username } => {
                state.flags.loading = false;
                if let Some(profile) = state.profile.as_mut().filter(|p| p.username == username) {
                    profile.following = false;
                    profile.followers_count = profile.followers_count.saturating_sub(1);
                }
                state.followings.retain(|p| p.username != username);
            }

            ProfileIntent::ActivitiesLoaded { activities } => {
                state.activities = activities;
                state.flags.loading_activities = false;
            }

            ProfileIntent::FollowingsLoaded { profiles } => {
                state.followings = profiles;
                state.flags.loading_followings = false;
            }

            ProfileIntent::FollowingsCleared => {
                state.followings.clear();
                state.flags.loading_followings = false;
            }

            ProfileIntent::TabSelected { index } => {
                state.active_tab = index;
            }
        }
        state
    }
}

fn held_mut<'a>(state: &'a mut ProfileState, owner: &str) -> Option<&'a mut Profile> {
    if state.holds(owner) {
        state.profile.as_mut()
    } else {
        None
    }
}

fn find_following<'a>(followings: &'a mut [Profile], username: &str) -> Option<&'a mut Profile> {
    followings.iter_mut().find(|p| p.username == username)
}
