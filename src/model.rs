//! Profile domain types as exchanged with the profiles API.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A photo owned by a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub is_main: bool,
}

/// The viewable identity record for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub username: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// Mirrors the URL of the main photo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub followers_count: u32,
    #[serde(default)]
    pub following_count: u32,
    /// Whether the signed-in user follows this profile.
    #[serde(default)]
    pub following: bool,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

impl Profile {
    pub fn new(username: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            display_name: display_name.into(),
            bio: None,
            image: None,
            followers_count: 0,
            following_count: 0,
            following: false,
            photos: Vec::new(),
        }
    }

    pub fn main_photo(&self) -> Option<&Photo> {
        self.photos.iter().find(|p| p.is_main)
    }

    pub fn photo(&self, photo_id: &str) -> Option<&Photo> {
        self.photos.iter().find(|p| p.id == photo_id)
    }

    /// Makes `photo_id` the only main photo and points `image` at it.
    ///
    /// Returns false (and leaves the profile untouched) when the photo is
    /// not part of the collection.
    pub fn promote_photo(&mut self, photo_id: &str) -> bool {
        let Some(url) = self.photo(photo_id).map(|p| p.url.clone()) else {
            return false;
        };
        for photo in &mut self.photos {
            photo.is_main = photo.id == photo_id;
        }
        self.image = Some(url);
        true
    }

    /// Removes a photo by id, returning it if it was present.
    ///
    /// Removing the main photo clears `image`.
    pub fn remove_photo(&mut self, photo_id: &str) -> Option<Photo> {
        let index = self.photos.iter().position(|p| p.id == photo_id)?;
        let removed = self.photos.remove(index);
        if removed.is_main {
            self.image = None;
        }
        Some(removed)
    }
}

/// Partial profile edit. Absent fields are left unchanged and omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.bio.is_none()
    }

    pub fn apply_to(&self, profile: &mut Profile) {
        if let Some(display_name) = &self.display_name {
            profile.display_name = display_name.clone();
        }
        if let Some(bio) = &self.bio {
            profile.bio = Some(bio.clone());
        }
    }
}

/// One entry of a user's activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActivity {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: String,
    pub date: DateTime<Utc>,
}

/// Binary payload for a photo upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePredicateError {
    kind: &'static str,
    value: String,
}

impl fmt::Display for ParsePredicateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} predicate '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParsePredicateError {}

/// Which side of the follow relationship to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FollowPredicate {
    Followers,
    Following,
}

impl FollowPredicate {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowPredicate::Followers => "followers",
            FollowPredicate::Following => "following",
        }
    }
}

impl fmt::Display for FollowPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FollowPredicate {
    type Err = ParsePredicateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "followers" => Ok(FollowPredicate::Followers),
            "following" => Ok(FollowPredicate::Following),
            other => Err(ParsePredicateError {
                kind: "follow",
                value: other.to_string(),
            }),
        }
    }
}

/// Filter for the activity feed. No predicate means the server default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityPredicate {
    Past,
    Future,
    Hosting,
}

impl ActivityPredicate {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityPredicate::Past => "past",
            ActivityPredicate::Future => "future",
            ActivityPredicate::Hosting => "hosting",
        }
    }
}

impl fmt::Display for ActivityPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityPredicate {
    type Err = ParsePredicateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "past" => Ok(ActivityPredicate::Past),
            "future" => Ok(ActivityPredicate::Future),
            "hosting" => Ok(ActivityPredicate::Hosting),
            other => Err(ParsePredicateError {
                kind: "activity",
                value: other.to_string(),
            }),
        }
    }
}
