use std::collections::HashMap;
use std::sync::Arc;

use poidir_core::{Preferences, ProviderKind};
use tokio::sync::watch;

use crate::error::ProviderError;
use crate::geoapify::GeoapifyClient;
use crate::google::GoogleClient;
use crate::here::HereClient;
use crate::http::HttpSettings;
use crate::provider::{Geocoder, PlacesProvider};

/// The search and geocoding capabilities registered for one backend.
#[derive(Clone)]
pub struct ProviderHandle {
    pub places: Arc<dyn PlacesProvider>,
    pub geocoder: Arc<dyn Geocoder>,
}

/// Lookup table from [`ProviderKind`] to its adapter.
///
/// Built once at startup. Switching providers selects a different entry;
/// nothing here is mutated afterwards.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    handles: HashMap<ProviderKind, ProviderHandle>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the production Geoapify, HERE, and Google adapters.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if any HTTP client cannot be built.
    pub fn with_default_providers(
        settings: HttpSettings,
        preferences: &watch::Receiver<Preferences>,
    ) -> Result<Self, ProviderError> {
        let mut registry = Self::new();

        let geoapify = Arc::new(GeoapifyClient::new(settings, preferences.clone())?);
        registry.insert(ProviderKind::Geoapify, geoapify.clone(), geoapify);

        let here = Arc::new(HereClient::new(settings, preferences.clone())?);
        registry.insert(ProviderKind::Here, here.clone(), here);

        let google = Arc::new(GoogleClient::new(settings, preferences.clone())?);
        registry.insert(ProviderKind::Google, google.clone(), google);

        tracing::debug!(providers = registry.handles.len(), "provider registry built");
        Ok(registry)
    }

    /// Registers (or replaces) the adapters for `kind`.
    pub fn insert(
        &mut self,
        kind: ProviderKind,
        places: Arc<dyn PlacesProvider>,
        geocoder: Arc<dyn Geocoder>,
    ) {
        self.handles.insert(kind, ProviderHandle { places, geocoder });
    }

    #[must_use]
    pub fn get(&self, kind: ProviderKind) -> Option<&ProviderHandle> {
        self.handles.get(&kind)
    }

    #[must_use]
    pub fn places(&self, kind: ProviderKind) -> Option<Arc<dyn PlacesProvider>> {
        self.get(kind).map(|h| Arc::clone(&h.places))
    }

    #[must_use]
    pub fn geocoder(&self, kind: ProviderKind) -> Option<Arc<dyn Geocoder>> {
        self.get(kind).map(|h| Arc::clone(&h.geocoder))
    }

    #[must_use]
    pub fn contains(&self, kind: ProviderKind) -> bool {
        self.handles.contains_key(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_covers_every_provider() {
        let (_tx, rx) = watch::channel(Preferences::default());
        let registry =
            ProviderRegistry::with_default_providers(HttpSettings::default(), &rx).unwrap();
        for kind in ProviderKind::ALL {
            assert!(registry.contains(kind), "missing {kind}");
            assert_eq!(registry.places(kind).unwrap().kind(), kind);
        }
    }

    #[test]
    fn empty_registry_has_nothing() {
        let registry = ProviderRegistry::new();
        assert!(registry.places(ProviderKind::Here).is_none());
        assert!(registry.geocoder(ProviderKind::Here).is_none());
    }
}
