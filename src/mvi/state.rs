/// Marker trait for state owned by a store.
///
/// States are cloned into published snapshots and compared to skip
/// redundant notifications.
pub trait UiState: Clone + PartialEq + Default + Send + 'static {}
