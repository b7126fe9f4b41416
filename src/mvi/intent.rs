/// Marker trait for described state transitions.
///
/// Intents are produced by store actions once the remote side has
/// confirmed a change (or when a request starts/fails).
pub trait Intent: Send + 'static {}
