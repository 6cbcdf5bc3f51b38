//! Wires configuration, preferences, providers, and the coordinator together.

use std::sync::Arc;
use std::time::Duration;

use poidir_core::{AppConfig, PlaceRecord, PreferenceStore, ProviderKind};
use poidir_providers::{HttpSettings, ProviderRegistry};
use poidir_search::{LocationResolver, SearchCoordinator, SearchFailure, SearchPhase, SearchState};

use crate::device::FixedDeviceLocation;

/// Upper bound on waiting for one search to settle.
const SEARCH_WAIT: Duration = Duration::from_secs(60);

pub(crate) struct App {
    pub store: PreferenceStore,
    pub coordinator: SearchCoordinator,
}

impl App {
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub(crate) fn build(
        config: &AppConfig,
        provider: Option<ProviderKind>,
    ) -> anyhow::Result<Self> {
        let mut preferences = config.preferences();
        if let Some(provider) = provider {
            preferences.provider = provider;
        }
        let store = PreferenceStore::new(preferences);

        let registry = Arc::new(ProviderRegistry::with_default_providers(
            HttpSettings::from_app_config(config),
            &store.subscribe(),
        )?);
        let device = Arc::new(FixedDeviceLocation::new(config.device_coordinate));
        let resolver = LocationResolver::new(device, Arc::clone(&registry), store.subscribe());
        let coordinator = SearchCoordinator::new(
            registry,
            resolver,
            store.subscribe(),
            Duration::from_millis(config.debounce_ms),
        );

        Ok(Self { store, coordinator })
    }

    /// Runs one search through the debounce path and waits for its outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if location permission is denied, nothing was given
    /// to search for, or the search does not settle in time.
    pub(crate) async fn search_once(
        &self,
        query: &str,
        category: Option<&str>,
    ) -> anyhow::Result<Vec<PlaceRecord>> {
        let mut updates = self.coordinator.subscribe();

        if let Some(code) = category {
            self.coordinator.on_category_selected(code);
        }
        if !query.trim().is_empty() {
            self.coordinator.on_query_changed(query);
        } else if self.coordinator.scope().is_none() {
            anyhow::bail!("nothing to search for: give a query or --category");
        }

        let state = tokio::time::timeout(
            SEARCH_WAIT,
            updates.wait_for(|s| matches!(s.phase, SearchPhase::Published | SearchPhase::Failed)),
        )
        .await
        .map_err(|_| anyhow::anyhow!("search did not finish within {}s", SEARCH_WAIT.as_secs()))??
        .clone();

        outcome(state)
    }
}

fn outcome(state: SearchState) -> anyhow::Result<Vec<PlaceRecord>> {
    match state.failure {
        Some(SearchFailure::LocationPermissionDenied) => {
            anyhow::bail!("location permission denied")
        }
        None => Ok(state.results),
    }
}

/// One result as printed by `search` and the REPL.
pub(crate) fn format_place(index: usize, place: &PlaceRecord) -> String {
    let mut lines = vec![format!("{:>2}. {}", index + 1, place.name)];
    let address = place.address.one_line();
    if !address.is_empty() {
        lines.push(format!("    {address}"));
    }
    if let Some(phone) = &place.phone {
        lines.push(format!("    phone: {phone}"));
    }
    if let Some(website) = &place.website {
        lines.push(format!("    web:   {website}"));
    }
    if !place.description.is_empty() {
        lines.push(format!("    tags:  {}", place.description));
    }
    for hours in &place.hours {
        lines.push(format!("    hours: {hours}"));
    }
    lines.join("\n")
}

pub(crate) fn print_places(places: &[PlaceRecord]) {
    if places.is_empty() {
        println!("no places found");
        return;
    }
    for (index, place) in places.iter().enumerate() {
        println!("{}", format_place(index, place));
    }
}
