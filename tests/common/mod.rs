//! Shared test utilities and mock infrastructure.

#![allow(dead_code, unused_imports)]

pub mod mock_server;

use std::collections::VecDeque;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use profile_sync::api::{ApiError, ProfilesApi};
use profile_sync::config::TabLayout;
use profile_sync::model::{
    ActivityPredicate, FollowPredicate, Photo, PhotoUpload, Profile, ProfileUpdate, UserActivity,
};
use profile_sync::notify::{notice_channel, Notice};
use profile_sync::profile::ProfileStore;
use profile_sync::session::{SessionState, SessionUser};

pub type Reply<T> = Result<T, ApiError>;

/// Find an available port for testing.
pub fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to free port");
    listener.local_addr().unwrap().port()
}

/// Poll `condition` until it holds, failing the test after two seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not met within 2s");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Give spawned tasks a chance to run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

pub fn server_error() -> ApiError {
    ApiError::Status {
        status: 500,
        message: "Internal Server Error".to_string(),
    }
}

// -- Fixtures -----------------------------------------------------------------

pub fn photo(id: &str, is_main: bool) -> Photo {
    Photo {
        id: id.to_string(),
        url: format!("https://img.example.com/{}.jpg", id),
        is_main,
    }
}

pub fn profile(username: &str) -> Profile {
    let mut display_name = username.to_string();
    if let Some(first) = display_name.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    Profile::new(username, display_name)
}

/// A profile with photos `p1` (main) and `p2`.
pub fn profile_with_photos(username: &str) -> Profile {
    let mut profile = profile(username);
    profile.photos = vec![photo("p1", true), photo("p2", false)];
    profile.image = Some(photo("p1", true).url);
    profile.followers_count = 10;
    profile.following_count = 2;
    profile
}

pub fn activity(id: &str, title: &str) -> UserActivity {
    UserActivity {
        id: id.to_string(),
        title: title.to_string(),
        category: "music".to_string(),
        date: Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap(),
    }
}

pub fn signed_in(username: &str) -> SessionState {
    SessionState::signed_in(SessionUser::new(username, profile(username).display_name))
}

/// Build a store over `api` with the default tab layout.
pub fn store_with(
    api: Arc<MockApi>,
    session: SessionState,
) -> (ProfileStore, mpsc::UnboundedReceiver<Notice>) {
    let (notifier, notices) = notice_channel();
    let store = ProfileStore::new(api, session, Arc::new(notifier), TabLayout::default());
    (store, notices)
}

pub fn drain(notices: &mut mpsc::UnboundedReceiver<Notice>) -> Vec<String> {
    let mut messages = Vec::new();
    while let Ok(notice) = notices.try_recv() {
        messages.push(notice.message);
    }
    messages
}

// -- Scripted API -------------------------------------------------------------

/// A recorded call to [`MockApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Get(String),
    UploadPhoto(String),
    SetMainPhoto(String),
    DeletePhoto(String),
    Update(String),
    UpdateProfile(ProfileUpdate),
    Follow(String),
    Unfollow(String),
    ListFollowings(String, FollowPredicate),
    ListActivities(String, Option<ActivityPredicate>),
}

enum Step<T> {
    Now(Reply<T>),
    Gate(oneshot::Receiver<Reply<T>>),
}

struct Script<T>(Mutex<VecDeque<Step<T>>>);

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self(Mutex::new(VecDeque::new()))
    }
}

impl<T> Script<T> {
    fn reply(&self, reply: Reply<T>) {
        self.0.lock().push_back(Step::Now(reply));
    }

    fn gate(&self) -> oneshot::Sender<Reply<T>> {
        let (tx, rx) = oneshot::channel();
        self.0.lock().push_back(Step::Gate(rx));
        tx
    }

    async fn next(&self, fallback: impl FnOnce() -> Reply<T>) -> Reply<T> {
        let step = self.0.lock().pop_front();
        match step {
            Some(Step::Now(reply)) => reply,
            Some(Step::Gate(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(ApiError::InvalidRequest("gate dropped".to_string()))),
            None => fallback(),
        }
    }
}

/// In-memory [`ProfilesApi`] with scripted replies.
///
/// Replies are consumed in call order per endpoint group. Gated replies
/// stay pending until the test sends through the returned sender.
/// Unscripted calls fall back to: 404 for `get`, 500 for uploads, success
/// for writes and empty lists.
#[derive(Default)]
pub struct MockApi {
    calls: Mutex<Vec<Call>>,
    profiles: Script<Profile>,
    photos: Script<Photo>,
    writes: Script<()>,
    followings: Script<Vec<Profile>>,
    activities: Script<Vec<UserActivity>>,
}

impl MockApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply_profile(&self, reply: Reply<Profile>) {
        self.profiles.reply(reply);
    }

    pub fn gate_profile(&self) -> oneshot::Sender<Reply<Profile>> {
        self.profiles.gate()
    }

    pub fn reply_photo(&self, reply: Reply<Photo>) {
        self.photos.reply(reply);
    }

    /// Script the next set-main/delete/update/follow/unfollow call.
    pub fn reply_write(&self, reply: Reply<()>) {
        self.writes.reply(reply);
    }

    pub fn reply_followings(&self, reply: Reply<Vec<Profile>>) {
        self.followings.reply(reply);
    }

    pub fn gate_followings(&self) -> oneshot::Sender<Reply<Vec<Profile>>> {
        self.followings.gate()
    }

    pub fn reply_activities(&self, reply: Reply<Vec<UserActivity>>) {
        self.activities.reply(reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn following_calls(&self) -> Vec<(String, FollowPredicate)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::ListFollowings(username, predicate) => Some((username.clone(), *predicate)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl ProfilesApi for MockApi {
    async fn get(&self, username: &str) -> Result<Profile, ApiError> {
        self.record(Call::Get(username.to_string()));
        self.profiles
            .next(|| {
                Err(ApiError::Status {
                    status: 404,
                    message: "Not Found".to_string(),
                })
            })
            .await
    }

    async fn upload_photo(&self, upload: PhotoUpload) -> Result<Photo, ApiError> {
        self.record(Call::UploadPhoto(upload.file_name));
        self.photos.next(|| Err(server_error())).await
    }

    async fn set_main_photo(&self, photo_id: &str) -> Result<(), ApiError> {
        self.record(Call::SetMainPhoto(photo_id.to_string()));
        self.writes.next(|| Ok(())).await
    }

    async fn delete_photo(&self, photo_id: &str) -> Result<(), ApiError> {
        self.record(Call::DeletePhoto(photo_id.to_string()));
        self.writes.next(|| Ok(())).await
    }

    async fn update(&self, profile: &Profile) -> Result<(), ApiError> {
        self.record(Call::Update(profile.username.clone()));
        self.writes.next(|| Ok(())).await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ApiError> {
        self.record(Call::UpdateProfile(update.clone()));
        self.writes.next(|| Ok(())).await
    }

    async fn follow(&self, username: &str) -> Result<(), ApiError> {
        self.record(Call::Follow(username.to_string()));
        self.writes.next(|| Ok(())).await
    }

    async fn unfollow(&self, username: &str) -> Result<(), ApiError> {
        self.record(Call::Unfollow(username.to_string()));
        self.writes.next(|| Ok(())).await
    }

    async fn list_followings(
        &self,
        username: &str,
        predicate: FollowPredicate,
    ) -> Result<Vec<Profile>, ApiError> {
        self.record(Call::ListFollowings(username.to_string(), predicate));
        self.followings.next(|| Ok(Vec::new())).await
    }

    async fn list_activities(
        &self,
        username: &str,
        predicate: Option<ActivityPredicate>,
    ) -> Result<Vec<UserActivity>, ApiError> {
        self.record(Call::ListActivities(username.to_string(), predicate));
        self.activities.next(|| Ok(Vec::new())).await
    }
}
