//! Search orchestration: location resolution and debounced provider search.

pub mod coordinator;
pub mod error;
pub mod location;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use coordinator::{SearchCoordinator, DEFAULT_DEBOUNCE};
pub use error::LocationError;
pub use location::{DeviceLocationSource, LocationResolver};
pub use state::{SearchFailure, SearchPhase, SearchState};
