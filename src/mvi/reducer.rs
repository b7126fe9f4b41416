use super::intent::Intent;
use super::state::UiState;

/// Applies an intent to a state.
///
/// Reducers are pure: `(State, Intent) -> State`. Stores call them while
/// holding their lock so a single intent is observed atomically.
pub trait Reducer {
    type State: UiState;
    type Intent: Intent;

    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State;
}
