//! Tab-driven followings fetch.
//!
//! The store forwards every change of `active_tab` here. Entering a
//! follow-related tab loads the matching list, unless the tab was left
//! before the transition was handled; entering any other tab clears it. Session changes are also observed so `is_current_user` in
//! the published snapshot stays current.

use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};

use crate::config::TabLayout;
use crate::model::FollowPredicate;
use crate::session::SessionSnapshot;

use super::store::{TabRequest, WeakProfileStore};

/// A change of the active tab index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabTransition {
    pub from: usize,
    pub to: usize,
}

/// Which followings list a tab shows, if any.
pub fn follow_predicate(tabs: &TabLayout, index: usize) -> Option<FollowPredicate> {
    if index == tabs.followers {
        Some(FollowPredicate::Followers)
    } else if index == tabs.following {
        Some(FollowPredicate::Following)
    } else {
        None
    }
}

/// Registered reaction. Dropping it aborts the task and every fetch it
/// started.
pub(crate) struct TabReaction {
    epoch: u64,
    transitions: mpsc::UnboundedSender<TabTransition>,
    task: JoinHandle<()>,
}

impl TabReaction {
    /// Spawn the reaction task. Must be called from within a tokio runtime.
    pub(crate) fn spawn(
        store: WeakProfileStore,
        session: watch::Receiver<SessionSnapshot>,
        tabs: TabLayout,
        epoch: u64,
    ) -> Self {
        let (transitions, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(store, rx, session, tabs, epoch));
        Self {
            epoch,
            transitions,
            task,
        }
    }

    /// Registration number, unique per store.
    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn notify(&self, transition: TabTransition) {
        if self.transitions.send(transition).is_err() {
            tracing::warn!(to = transition.to, "Tab reaction stopped, transition dropped");
        }
    }
}

impl Drop for TabReaction {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    weak: WeakProfileStore,
    mut transitions: mpsc::UnboundedReceiver<TabTransition>,
    mut session: watch::Receiver<SessionSnapshot>,
    tabs: TabLayout,
    epoch: u64,
) {
    let mut fetches = JoinSet::new();
    let mut session_open = true;

    loop {
        tokio::select! {
            transition = transitions.recv() => {
                let Some(transition) = transition else { break };
                let Some(store) = weak.upgrade() else { break };

                match follow_predicate(&tabs, transition.to) {
                    Some(predicate) => {
                        tracing::debug!(
                            from = transition.from,
                            to = transition.to,
                            predicate = %predicate,
                            "Follow tab entered, loading followings"
                        );
                        let request = TabRequest { epoch, tab: transition.to };
                        if let Some((ticket, username)) = store.begin_followings(predicate, Some(request)) {
                            fetches.spawn(async move {
                                store.finish_followings(ticket, &username, predicate).await
                            });
                        }
                    }
                    None => store.clear_followings(),
                }
            }

            changed = session.changed(), if session_open => {
                session_open = changed.is_ok();
                if session_open {
                    match weak.upgrade() {
                        Some(store) => store.republish(),
                        None => break,
                    }
                }
            }

            Some(joined) = fetches.join_next(), if !fetches.is_empty() => {
                if let Err(err) = joined {
                    if err.is_panic() {
                        tracing::error!(error = %err, "Followings fetch panicked");
                    }
                }
            }
        }
    }

    tracing::debug!("Tab reaction stopped");
}
