//! Remote profiles API.
//!
//! [`ProfilesApi`] is the seam the profile store talks through;
//! [`HttpProfilesApi`] implements it over HTTP.

mod error;
mod http;

use async_trait::async_trait;

use crate::model::{
    ActivityPredicate, FollowPredicate, Photo, PhotoUpload, Profile, ProfileUpdate, UserActivity,
};

pub use error::ApiError;
pub use http::HttpProfilesApi;

/// Asynchronous access to the profiles backend.
///
/// Every call either returns the typed result or an [`ApiError`]; no call
/// has local side effects.
#[async_trait]
pub trait ProfilesApi: Send + Sync {
    async fn get(&self, username: &str) -> Result<Profile, ApiError>;

    async fn upload_photo(&self, upload: PhotoUpload) -> Result<Photo, ApiError>;

    async fn set_main_photo(&self, photo_id: &str) -> Result<(), ApiError>;

    async fn delete_photo(&self, photo_id: &str) -> Result<(), ApiError>;

    /// Full profile edit.
    async fn update(&self, profile: &Profile) -> Result<(), ApiError>;

    /// Partial profile edit; absent fields stay unchanged server-side.
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ApiError>;

    async fn follow(&self, username: &str) -> Result<(), ApiError>;

    async fn unfollow(&self, username: &str) -> Result<(), ApiError>;

    async fn list_followings(
        &self,
        username: &str,
        predicate: FollowPredicate,
    ) -> Result<Vec<Profile>, ApiError>;

    async fn list_activities(
        &self,
        username: &str,
        predicate: Option<ActivityPredicate>,
    ) -> Result<Vec<UserActivity>, ApiError>;
}
