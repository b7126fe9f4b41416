//! The profile synchronization store.
//!
//! Holds the viewed profile and everything hanging off it, runs every
//! remote read/write through [`ProfilesApi`], and mirrors shared fields into
//! the injected [`SessionState`] when the edited identity is the signed-in
//! user.
//!
//! Local state only changes after the remote call succeeded. Each change
//! is one intent reduced under the session write lock and the store lock,
//! and the resulting [`ProfileSnapshot`] is published before both locks are
//! released.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::api::{ApiError, ProfilesApi};
use crate::config::TabLayout;
use crate::model::{
    ActivityPredicate, FollowPredicate, Photo, PhotoUpload, Profile, ProfileUpdate, UserActivity,
};
use crate::mvi::Reducer;
use crate::notify::{Notice, Notifier};
use crate::session::{SessionIntent, SessionReducer, SessionSnapshot, SessionState};

use super::intent::ProfileIntent;
use super::operation::Operation;
use super::reaction::{TabReaction, TabTransition};
use super::reducer::ProfileReducer;
use super::state::{is_current_user, OperationFlags, ProfileSnapshot, ProfileState};

/// Sequence numbers for requests of one kind.
///
/// Only the response to the most recently issued ticket may be committed.
#[derive(Default)]
struct Tickets(AtomicU64);

impl Tickets {
    fn issue(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn invalidate(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.0.load(Ordering::SeqCst) == ticket
    }
}

/// Cloneable handle to a profile store.
#[derive(Clone)]
pub struct ProfileStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    api: Arc<dyn ProfilesApi>,
    session: SessionState,
    notifier: Arc<dyn Notifier>,
    tabs: TabLayout,
    state: Mutex<ProfileState>,
    snapshots: watch::Sender<ProfileSnapshot>,
    profile_tickets: Tickets,
    followings_tickets: Tickets,
    reaction_epochs: Tickets,
    reaction: Mutex<Option<TabReaction>>,
}

/// A followings fetch asked for by the tab reaction registered under
/// `epoch`, on entering `tab`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TabRequest {
    pub(crate) epoch: u64,
    pub(crate) tab: usize,
}

/// Non-owning handle held by the tab reaction.
#[derive(Clone)]
pub(crate) struct WeakProfileStore(Weak<StoreInner>);

impl WeakProfileStore {
    pub(crate) fn upgrade(&self) -> Option<ProfileStore> {
        self.0.upgrade().map(|inner| ProfileStore { inner })
    }
}

impl ProfileStore {
    /// Create a store and register its tab reaction.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        api: Arc<dyn ProfilesApi>,
        session: SessionState,
        notifier: Arc<dyn Notifier>,
        tabs: TabLayout,
    ) -> Self {
        let initial = ProfileSnapshot::new(&ProfileState::default(), &session.snapshot());
        let (snapshots, _) = watch::channel(initial);

        let store = Self {
            inner: Arc::new(StoreInner {
                api,
                session,
                notifier,
                tabs,
                state: Mutex::new(ProfileState::default()),
                snapshots,
                profile_tickets: Tickets::default(),
                followings_tickets: Tickets::default(),
                reaction_epochs: Tickets::default(),
                reaction: Mutex::new(None),
            }),
        };
        store.register_reaction();
        store
    }

    // -- Reactive surface -----------------------------------------------------

    /// The last published snapshot.
    pub fn snapshot(&self) -> ProfileSnapshot {
        self.inner.snapshots.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<ProfileSnapshot> {
        self.inner.snapshots.subscribe()
    }

    pub fn session(&self) -> &SessionState {
        &self.inner.session
    }

    pub fn tabs(&self) -> TabLayout {
        self.inner.tabs
    }

    pub fn profile(&self) -> Option<Profile> {
        self.inner.state.lock().profile.clone()
    }

    pub fn followings(&self) -> Vec<Profile> {
        self.inner.state.lock().followings.clone()
    }

    pub fn activities(&self) -> Vec<UserActivity> {
        self.inner.state.lock().activities.clone()
    }

    pub fn flags(&self) -> OperationFlags {
        self.inner.state.lock().flags
    }

    pub fn active_tab(&self) -> usize {
        self.inner.state.lock().active_tab
    }

    /// Session identity equals the loaded profile identity.
    pub fn is_current_user(&self) -> bool {
        self.inner
            .session
            .read(|session| is_current_user(&self.inner.state.lock(), session))
    }

    // -- Tab reaction -----------------------------------------------------------

    /// Register the tab reaction if it is not running.
    pub fn register_reaction(&self) {
        let mut reaction = self.inner.reaction.lock();
        if reaction.is_some() {
            return;
        }
        let epoch = self.inner.reaction_epochs.issue();
        *reaction = Some(TabReaction::spawn(
            self.downgrade(),
            self.inner.session.subscribe(),
            self.inner.tabs,
            epoch,
        ));
        tracing::debug!(epoch, "Tab reaction registered");
    }

    /// Unregister the tab reaction.
    ///
    /// Fetches it started are aborted and late followings responses are
    /// discarded. The store stays usable; [`register_reaction`] restarts
    /// the reaction.
    ///
    /// [`register_reaction`]: ProfileStore::register_reaction
    pub fn dispose(&self) {
        let reaction = self.inner.session.transact(|session| {
            let mut state = self.inner.state.lock();
            let reaction = self.inner.reaction.lock().take()?;
            self.inner.followings_tickets.invalidate();
            *state = ProfileReducer::reduce(
                std::mem::take(&mut *state),
                ProfileIntent::Settled(Operation::LoadFollowings),
            );
            self.publish(&state, session);
            Some(reaction)
        });
        if let Some(reaction) = reaction {
            tracing::debug!(epoch = reaction.epoch(), "Tab reaction disposed");
        }
    }

    /// Select a tab by ordinal index.
    ///
    /// A change of index is forwarded to the tab reaction exactly once.
    pub fn set_active_tab(&self, index: usize) {
        self.inner.session.transact(|session| {
            let mut state = self.inner.state.lock();
            let from = state.active_tab;
            if from == index {
                return;
            }
            *state = ProfileReducer::reduce(
                std::mem::take(&mut *state),
                ProfileIntent::TabSelected { index },
            );
            self.publish(&state, session);

            match self.inner.reaction.lock().as_ref() {
                Some(reaction) => reaction.notify(TabTransition { from, to: index }),
                None => tracing::debug!(to = index, "Tab changed with no reaction registered"),
            }
        });
    }

    // -- Profile ----------------------------------------------------------------

    /// Fetch `username` and replace the held profile.
    ///
    /// Responses to superseded calls are dropped, so the last call made
    /// wins regardless of arrival order.
    pub async fn load_profile(&self, username: &str) {
        let ticket = self.begin(&self.inner.profile_tickets, Operation::LoadProfile);

        match self.inner.api.get(username).await {
            Ok(profile) => {
                if self.commit_current(
                    &self.inner.profile_tickets,
                    ticket,
                    ProfileIntent::ProfileLoaded { profile },
                ) {
                    tracing::info!(username = %username, "Profile loaded");
                } else {
                    tracing::warn!(username = %username, ticket, "Discarding superseded profile response");
                }
            }
            Err(err) => {
                if self.commit_current(
                    &self.inner.profile_tickets,
                    ticket,
                    ProfileIntent::Failed(Operation::LoadProfile),
                ) {
                    self.report(Operation::LoadProfile, &err);
                } else {
                    tracing::debug!(username = %username, error = %err, "Superseded profile request failed");
                }
            }
        }
    }

    /// Drop the held profile and its dependent lists (navigating away).
    pub fn clear_profile(&self) {
        self.commit_invalidating(
            &[&self.inner.profile_tickets, &self.inner.followings_tickets],
            ProfileIntent::ProfileCleared,
        );
    }

    // -- Photos -----------------------------------------------------------------

    /// Upload a photo for the signed-in user.
    ///
    /// The session avatar follows a new main photo only when the viewed
    /// profile was the session user's at call time. The same holds for
    /// [`set_main_photo`](ProfileStore::set_main_photo) and
    /// [`delete_photo`](ProfileStore::delete_photo).
    pub async fn upload_photo(&self, upload: PhotoUpload) {
        let owner = self.acting_user();
        let mirror_session = self.is_current_user();
        self.commit(ProfileIntent::Started(Operation::UploadPhoto));

        match self.inner.api.upload_photo(upload).await {
            Ok(photo) => {
                let Some(owner) = owner else {
                    tracing::warn!(photo_id = %photo.id, "Photo uploaded with no profile or session to attach it to");
                    self.commit(ProfileIntent::Settled(Operation::UploadPhoto));
                    return;
                };
                tracing::info!(username = %owner, photo_id = %photo.id, is_main = photo.is_main, "Photo uploaded");
                let mirror = (mirror_session && photo.is_main).then(|| {
                    SessionIntent::ImageChanged {
                        username: owner.clone(),
                        image: Some(photo.url.clone()),
                    }
                });
                self.commit_mirrored(ProfileIntent::PhotoUploaded { owner, photo }, |_| mirror);
            }
            Err(err) => self.fail(Operation::UploadPhoto, &err),
        }
    }

    /// Make `photo` the main photo.
    pub async fn set_main_photo(&self, photo: &Photo) {
        let owner = self.acting_user();
        let mirror_session = self.is_current_user();
        self.commit(ProfileIntent::Started(Operation::SetMainPhoto));

        match self.inner.api.set_main_photo(&photo.id).await {
            Ok(()) => {
                let Some(owner) = owner else {
                    self.commit(ProfileIntent::Settled(Operation::SetMainPhoto));
                    return;
                };
                tracing::info!(username = %owner, photo_id = %photo.id, "Main photo set");
                let url = photo.url.clone();
                let intent = ProfileIntent::MainPhotoSet {
                    owner: owner.clone(),
                    photo_id: photo.id.clone(),
                };
                self.commit_mirrored(intent, move |state| {
                    if !mirror_session {
                        return None;
                    }
                    // Mirror the image the held profile ended up with.
                    let image = match state.profile.as_ref().filter(|p| p.username == owner) {
                        Some(profile) => profile.image.clone(),
                        None => Some(url),
                    };
                    Some(SessionIntent::ImageChanged {
                        username: owner,
                        image,
                    })
                });
            }
            Err(err) => self.fail(Operation::SetMainPhoto, &err),
        }
    }

    /// Delete `photo`.
    pub async fn delete_photo(&self, photo: &Photo) {
        let owner = self.acting_user();
        let mirror_session = self.is_current_user();
        self.commit(ProfileIntent::Started(Operation::DeletePhoto));

        match self.inner.api.delete_photo(&photo.id).await {
            Ok(()) => {
                let Some(owner) = owner else {
                    self.commit(ProfileIntent::Settled(Operation::DeletePhoto));
                    return;
                };
                tracing::info!(username = %owner, photo_id = %photo.id, "Photo deleted");
                let mirror = (mirror_session && photo.is_main).then(|| {
                    SessionIntent::ImageChanged {
                        username: owner.clone(),
                        image: None,
                    }
                });
                let intent = ProfileIntent::PhotoDeleted {
                    owner,
                    photo_id: photo.id.clone(),
                };
                self.commit_mirrored(intent, |_| mirror);
            }
            Err(err) => self.fail(Operation::DeletePhoto, &err),
        }
    }

    // -- Editing ----------------------------------------------------------------

    /// Legacy full edit of display name and bio.
    pub async fn edit_profile(&self, profile: &Profile) {
        self.commit(ProfileIntent::Started(Operation::EditProfile));

        match self.inner.api.update(profile).await {
            Ok(()) => {
                tracing::info!(username = %profile.username, "Profile edited");
                let mirror = SessionIntent::DisplayNameChanged {
                    username: profile.username.clone(),
                    display_name: profile.display_name.clone(),
                };
                let intent = ProfileIntent::ProfileEdited {
                    owner: profile.username.clone(),
                    display_name: profile.display_name.clone(),
                    bio: profile.bio.clone(),
                };
                self.commit_mirrored(intent, |_| Some(mirror));
            }
            Err(err) => self.fail(Operation::EditProfile, &err),
        }
    }

    /// Partial edit of the signed-in user's profile.
    pub async fn update_profile(&self, update: ProfileUpdate) {
        let owner = self.acting_user();
        self.commit(ProfileIntent::Started(Operation::UpdateProfile));

        match self.inner.api.update_profile(&update).await {
            Ok(()) => {
                let Some(owner) = owner else {
                    self.commit(ProfileIntent::Settled(Operation::UpdateProfile));
                    return;
                };
                tracing::info!(username = %owner, "Profile updated");
                // Unchanged names reduce to the same session and publish nothing.
                let mirror = update
                    .display_name
                    .clone()
                    .map(|display_name| SessionIntent::DisplayNameChanged {
                        username: owner.clone(),
                        display_name,
                    });
                self.commit_mirrored(ProfileIntent::ProfileUpdated { owner, update }, |_| mirror);
            }
            Err(err) => self.fail(Operation::UpdateProfile, &err),
        }
    }

    // -- Follow -----------------------------------------------------------------

    pub async fn follow(&self, username: &str) {
        self.commit(ProfileIntent::Started(Operation::Follow));

        match self.inner.api.follow(username).await {
            Ok(()) => {
                tracing::info!(username = %username, "Followed user");
                self.commit(ProfileIntent::Followed {
                    username: username.to_string(),
                });
            }
            Err(err) => self.fail(Operation::Follow, &err),
        }
    }

    pub async fn unfollow(&self, username: &str) {
        self.commit(ProfileIntent::Started(Operation::Unfollow));

        match self.inner.api.unfollow(username).await {
            Ok(()) => {
                tracing::info!(username = %username, "Unfollowed user");
                self.commit(ProfileIntent::Unfollowed {
                    username: username.to_string(),
                });
            }
            Err(err) => self.fail(Operation::Unfollow, &err),
        }
    }

    // -- Dependent lists --------------------------------------------------------

    /// Replace the activity feed with `username`'s activities.
    pub async fn load_user_activities(&self, username: &str, predicate: Option<ActivityPredicate>) {
        self.commit(ProfileIntent::Started(Operation::LoadActivities));

        match self.inner.api.list_activities(username, predicate).await {
            Ok(activities) => {
                tracing::info!(username = %username, count = activities.len(), "Activities loaded");
                self.commit(ProfileIntent::ActivitiesLoaded { activities });
            }
            Err(err) => self.fail(Operation::LoadActivities, &err),
        }
    }

    /// Replace the followings list for the held profile.
    ///
    /// Does nothing without a held profile. Superseded responses are
    /// dropped like in [`load_profile`](ProfileStore::load_profile).
    pub async fn load_followings(&self, predicate: FollowPredicate) {
        if let Some((ticket, username)) = self.begin_followings(predicate, None) {
            self.finish_followings(ticket, &username, predicate).await;
        }
    }

    /// Issue a followings ticket and mark the fetch started in one commit.
    ///
    /// A tab request is refused once its reaction is disposed or its tab
    /// is no longer active.
    pub(crate) fn begin_followings(
        &self,
        predicate: FollowPredicate,
        request: Option<TabRequest>,
    ) -> Option<(u64, String)> {
        self.inner.session.transact(|session| {
            let mut state = self.inner.state.lock();
            let Some(username) = state.username().map(str::to_string) else {
                tracing::warn!(predicate = %predicate, "No profile loaded, skipping followings fetch");
                return None;
            };

            if let Some(request) = request {
                let live = self.inner.reaction.lock().as_ref().map(TabReaction::epoch);
                if live != Some(request.epoch) || state.active_tab != request.tab {
                    tracing::debug!(
                        predicate = %predicate,
                        epoch = request.epoch,
                        tab = request.tab,
                        "Tab request superseded, skipping followings fetch"
                    );
                    return None;
                }
            }

            let ticket = self.inner.followings_tickets.issue();
            *state = ProfileReducer::reduce(
                std::mem::take(&mut *state),
                ProfileIntent::Started(Operation::LoadFollowings),
            );
            self.publish(&state, session);
            Some((ticket, username))
        })
    }

    /// Fetch the list for a ticket from [`begin_followings`](Self::begin_followings).
    pub(crate) async fn finish_followings(
        &self,
        ticket: u64,
        username: &str,
        predicate: FollowPredicate,
    ) {
        match self.inner.api.list_followings(username, predicate).await {
            Ok(profiles) => {
                let count = profiles.len();
                if self.commit_current(
                    &self.inner.followings_tickets,
                    ticket,
                    ProfileIntent::FollowingsLoaded { profiles },
                ) {
                    tracing::info!(username = %username, predicate = %predicate, count, "Followings loaded");
                } else {
                    tracing::warn!(username = %username, predicate = %predicate, ticket, "Discarding superseded followings response");
                }
            }
            Err(err) => {
                if self.commit_current(
                    &self.inner.followings_tickets,
                    ticket,
                    ProfileIntent::Failed(Operation::LoadFollowings),
                ) {
                    self.report(Operation::LoadFollowings, &err);
                } else {
                    tracing::debug!(username = %username, error = %err, "Superseded followings request failed");
                }
            }
        }
    }

    /// Empty the followings list and drop any in-flight followings response.
    pub fn clear_followings(&self) {
        self.commit_invalidating(
            &[&self.inner.followings_tickets],
            ProfileIntent::FollowingsCleared,
        );
    }

    // -- Internals --------------------------------------------------------------

    fn downgrade(&self) -> WeakProfileStore {
        WeakProfileStore(Arc::downgrade(&self.inner))
    }

    fn loaded_username(&self) -> Option<String> {
        self.inner.state.lock().username().map(str::to_string)
    }

    /// Whose photos and profile a self-edit targets: the session user, or
    /// the held profile when signed out.
    fn acting_user(&self) -> Option<String> {
        self.inner.session.username().or_else(|| self.loaded_username())
    }

    fn commit(&self, intent: ProfileIntent) {
        self.commit_mirrored(intent, |_| None);
    }

    /// Reduce `intent`, then the session intent derived from the new state,
    /// and publish once.
    fn commit_mirrored<F>(&self, intent: ProfileIntent, mirror: F)
    where
        F: FnOnce(&ProfileState) -> Option<SessionIntent>,
    {
        self.inner.session.transact(|session| {
            let mut state = self.inner.state.lock();
            *state = ProfileReducer::reduce(std::mem::take(&mut *state), intent);
            if let Some(session_intent) = mirror(&state) {
                *session = SessionReducer::reduce(std::mem::take(session), session_intent);
            }
            self.publish(&state, session);
        });
    }

    /// Issue a ticket and commit `Started` in the same transaction.
    fn begin(&self, tickets: &Tickets, operation: Operation) -> u64 {
        self.inner.session.transact(|session| {
            let ticket = tickets.issue();
            let mut state = self.inner.state.lock();
            *state = ProfileReducer::reduce(
                std::mem::take(&mut *state),
                ProfileIntent::Started(operation),
            );
            self.publish(&state, session);
            ticket
        })
    }

    /// Invalidate `tickets` and commit `intent` in the same transaction.
    fn commit_invalidating(&self, tickets: &[&Tickets], intent: ProfileIntent) {
        self.inner.session.transact(|session| {
            for kind in tickets {
                kind.invalidate();
            }
            let mut state = self.inner.state.lock();
            *state = ProfileReducer::reduce(std::mem::take(&mut *state), intent);
            self.publish(&state, session);
        });
    }

    /// Commit only if `ticket` is still the latest of its kind.
    fn commit_current(&self, tickets: &Tickets, ticket: u64, intent: ProfileIntent) -> bool {
        self.inner.session.transact(|session| {
            if !tickets.is_current(ticket) {
                return false;
            }
            let mut state = self.inner.state.lock();
            *state = ProfileReducer::reduce(std::mem::take(&mut *state), intent);
            self.publish(&state, session);
            true
        })
    }

    fn fail(&self, operation: Operation, err: &ApiError) {
        self.commit(ProfileIntent::Failed(operation));
        self.report(operation, err);
    }

    fn report(&self, operation: Operation, err: &ApiError) {
        tracing::warn!(
            operation = %operation,
            error_type = err.error_type(),
            error = %err,
            "Profile action failed"
        );
        self.inner.notifier.notify(Notice::failure(operation));
    }

    /// Re-publish after an outside session change.
    pub(crate) fn republish(&self) {
        self.inner.session.read(|session| {
            let state = self.inner.state.lock();
            self.publish(&state, session);
        });
    }

    fn publish(&self, state: &ProfileState, session: &SessionSnapshot) {
        let snapshot = ProfileSnapshot::new(state, session);
        self.inner.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}
