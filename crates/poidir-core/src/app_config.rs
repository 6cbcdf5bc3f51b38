use crate::preferences::{ApiKeys, Preferences};
use crate::types::{Coordinate, ProviderKind};

#[derive(Clone)]
pub struct AppConfig {
    pub provider: ProviderKind,
    pub use_device_location: bool,
    pub default_location: Option<String>,
    pub search_radius_miles: u32,
    pub open_now: bool,
    pub debounce_ms: u64,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub log_level: String,
    /// Fixed position reported by the command-line device source, if any.
    pub device_coordinate: Option<Coordinate>,
    pub geoapify_api_key: Option<String>,
    pub here_api_key: Option<String>,
    pub google_api_key: Option<String>,
}

impl AppConfig {
    /// Initial preference values seeded from the environment.
    #[must_use]
    pub fn preferences(&self) -> Preferences {
        Preferences {
            provider: self.provider,
            use_device_location: self.use_device_location,
            default_location: self.default_location.clone(),
            search_radius_miles: self.search_radius_miles,
            open_now: self.open_now,
            api_keys: ApiKeys {
                geoapify: self.geoapify_api_key.clone(),
                here: self.here_api_key.clone(),
                google: self.google_api_key.clone(),
            },
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("provider", &self.provider)
            .field("use_device_location", &self.use_device_location)
            .field("default_location", &self.default_location)
            .field("search_radius_miles", &self.search_radius_miles)
            .field("open_now", &self.open_now)
            .field("debounce_ms", &self.debounce_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("log_level", &self.log_level)
            .field("device_coordinate", &self.device_coordinate)
            .field(
                "geoapify_api_key",
                &self.geoapify_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "here_api_key",
                &self.here_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "google_api_key",
                &self.google_api_key.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}
