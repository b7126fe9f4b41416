//! Intent/reducer primitives shared by the profile and session stores.
//!
//! Every state change in this crate is described as an intent and applied
//! by a pure reducer. Stores own the state and are the only dispatchers.
//!
//! ```text
//! action ──→ API ──→ Intent ──→ Reducer ──→ State ──→ snapshot subscribers
//! ```

mod intent;
mod reducer;
mod state;

pub use intent::Intent;
pub use reducer::Reducer;
pub use state::UiState;
