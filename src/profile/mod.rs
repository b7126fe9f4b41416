//! Profile store: the viewed profile, its photos, follow relations,
//! activities and the tab-driven followings list.

mod intent;
mod operation;
mod reaction;
mod reducer;
mod state;
mod store;

pub use intent::ProfileIntent;
pub use operation::Operation;
pub use reaction::{follow_predicate, TabTransition};
pub use reducer::ProfileReducer;
pub use state::{OperationFlags, ProfileSnapshot, ProfileState};
pub use store::ProfileStore;
