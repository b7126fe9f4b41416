use crate::mvi::Reducer;

use super::intent::SessionIntent;
use super::state::{SessionSnapshot, SessionUser};

pub struct SessionReducer;

impl Reducer for SessionReducer {
    type State = SessionSnapshot;
    type Intent = SessionIntent;

    fn reduce(mut state: Self::State, intent: Self::Intent) -> Self::State {
        match intent {
            SessionIntent::SignedIn { user } => SessionSnapshot { user: Some(user) },
            SessionIntent::SignedOut => SessionSnapshot { user: None },
            SessionIntent::ImageChanged { username, image } => {
                if let Some(user) = signed_in_as(&mut state, &username) {
                    user.image = image;
                }
                state
            }
            SessionIntent::DisplayNameChanged {
                username,
                display_name,
            } => {
                if let Some(user) = signed_in_as(&mut state, &username) {
                    user.display_name = display_name;
                }
                state
            }
        }
    }
}

fn signed_in_as<'a>(state: &'a mut SessionSnapshot, username: &str) -> Option<&'a mut SessionUser> {
    if state.is(username) {
        state.user.as_mut()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bob() -> SessionSnapshot {
        SessionSnapshot {
            user: Some(SessionUser::new("bob", "Bob")),
        }
    }

    #[test]
    fn image_change_applies_to_matching_user() {
        let state = SessionReducer::reduce(
            bob(),
            SessionIntent::ImageChanged {
                username: "bob".into(),
                image: Some("https://img/b.jpg".into()),
            },
        );
        assert_eq!(
            state.user.unwrap().image.as_deref(),
            Some("https://img/b.jpg")
        );
    }

    #[test]
    fn mirror_for_other_user_is_ignored() {
        let state = SessionReducer::reduce(
            bob(),
            SessionIntent::DisplayNameChanged {
                username: "alice".into(),
                display_name: "Alicia".into(),
            },
        );
        assert_eq!(state, bob());
    }

    #[test]
    fn mirror_while_signed_out_is_ignored() {
        let state = SessionReducer::reduce(
            SessionSnapshot::default(),
            SessionIntent::ImageChanged {
                username: "bob".into(),
                image: None,
            },
        );
        assert!(state.user.is_none());
    }

    #[test]
    fn sign_out_clears_user() {
        let state = SessionReducer::reduce(bob(), SessionIntent::SignedOut);
        assert!(state.username().is_none());
    }
}
