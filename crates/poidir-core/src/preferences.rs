//! Observable user preferences.
//!
//! [`PreferenceStore`] is the single writer; every reader holds a
//! `watch::Receiver` and sees each committed [`Preferences`] value as a whole.

use tokio::sync::watch;

use crate::types::ProviderKind;

/// API credentials, one per backend.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApiKeys {
    pub geoapify: Option<String>,
    pub here: Option<String>,
    pub google: Option<String>,
}

impl std::fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeys")
            .field("geoapify", &self.geoapify.as_ref().map(|_| "[redacted]"))
            .field("here", &self.here.as_ref().map(|_| "[redacted]"))
            .field("google", &self.google.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub provider: ProviderKind,
    pub use_device_location: bool,
    pub default_location: Option<String>,
    pub search_radius_miles: u32,
    pub open_now: bool,
    pub api_keys: ApiKeys,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Geoapify,
            use_device_location: true,
            default_location: None,
            search_radius_miles: 10,
            open_now: false,
            api_keys: ApiKeys::default(),
        }
    }
}

impl Preferences {
    /// Non-blank API key for `kind`, if configured.
    #[must_use]
    pub fn api_key(&self, kind: ProviderKind) -> Option<&str> {
        let key = match kind {
            ProviderKind::Geoapify => self.api_keys.geoapify.as_deref(),
            ProviderKind::Here => self.api_keys.here.as_deref(),
            ProviderKind::Google => self.api_keys.google.as_deref(),
        };
        key.filter(|k| !k.trim().is_empty())
    }

    /// The inputs that determine where "current location" comes from.
    ///
    /// A change here invalidates any cached location.
    #[must_use]
    pub fn location_source(&self) -> (bool, Option<&str>) {
        (self.use_device_location, self.default_location.as_deref())
    }
}

/// Single-writer store that broadcasts every committed change.
#[derive(Debug)]
pub struct PreferenceStore {
    tx: watch::Sender<Preferences>,
}

impl PreferenceStore {
    #[must_use]
    pub fn new(initial: Preferences) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// A clone of the current value.
    #[must_use]
    pub fn snapshot(&self) -> Preferences {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Preferences> {
        self.tx.subscribe()
    }

    /// Applies `edit` and notifies subscribers only if the value changed.
    pub fn update(&self, edit: impl FnOnce(&mut Preferences)) {
        self.tx.send_if_modified(|prefs| {
            let before = prefs.clone();
            edit(prefs);
            let changed = *prefs != before;
            if changed {
                tracing::debug!(
                    provider = %prefs.provider,
                    use_device_location = prefs.use_device_location,
                    radius_miles = prefs.search_radius_miles,
                    "preferences updated"
                );
            }
            changed
        });
    }

    pub fn set_provider(&self, provider: ProviderKind) {
        self.update(|prefs| prefs.provider = provider);
    }

    pub fn set_use_device_location(&self, enabled: bool) {
        self.update(|prefs| prefs.use_device_location = enabled);
    }

    /// Blank input clears the default location.
    pub fn set_default_location(&self, location: &str) {
        let trimmed = location.trim();
        let value = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self.update(|prefs| prefs.default_location = value);
    }

    pub fn set_search_radius_miles(&self, miles: u32) {
        self.update(|prefs| prefs.search_radius_miles = miles.max(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_api_key_is_treated_as_missing() {
        let mut prefs = Preferences::default();
        prefs.api_keys.here = Some("  ".to_string());
        assert_eq!(prefs.api_key(ProviderKind::Here), None);
    }

    #[tokio::test]
    async fn update_notifies_only_on_change() {
        let store = PreferenceStore::new(Preferences::default());
        let mut rx = store.subscribe();
        rx.mark_unchanged();

        store.set_provider(ProviderKind::Geoapify);
        assert!(!rx.has_changed().unwrap());

        store.set_provider(ProviderKind::Here);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().provider, ProviderKind::Here);
    }

    #[test]
    fn default_location_is_trimmed_and_blank_clears() {
        let store = PreferenceStore::new(Preferences::default());
        store.set_default_location("  Charlotte, NC ");
        assert_eq!(
            store.snapshot().default_location.as_deref(),
            Some("Charlotte, NC")
        );
        store.set_default_location("");
        assert_eq!(store.snapshot().default_location, None);
    }

    #[test]
    fn radius_never_drops_below_one_mile() {
        let store = PreferenceStore::new(Preferences::default());
        store.set_search_radius_miles(0);
        assert_eq!(store.snapshot().search_radius_miles, 1);
    }

    #[test]
    fn debug_output_redacts_keys() {
        let mut prefs = Preferences::default();
        prefs.api_keys.google = Some("secret".to_string());
        assert!(!format!("{prefs:?}").contains("secret"));
    }
}
