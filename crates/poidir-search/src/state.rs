//! Observable search state published by the coordinator.

use poidir_core::PlaceRecord;

/// Where the latest query is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchPhase {
    #[default]
    Idle,
    /// Waiting for typing to pause.
    Debouncing,
    /// Location, category, and remote search are running.
    InFlight,
    Published,
    Failed,
}

/// A failure the user can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFailure {
    LocationPermissionDenied,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<PlaceRecord>,
    pub is_loading: bool,
    pub phase: SearchPhase,
    pub failure: Option<SearchFailure>,
}

impl SearchState {
    pub(crate) fn clear_results(&mut self) {
        self.results.clear();
        self.is_loading = false;
        self.phase = SearchPhase::Idle;
        self.failure = None;
    }

    pub(crate) fn start_debounce(&mut self) {
        self.is_loading = true;
        self.phase = SearchPhase::Debouncing;
        self.failure = None;
    }
}
