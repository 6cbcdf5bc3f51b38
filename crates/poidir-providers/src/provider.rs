//! The capability interfaces every place-search backend implements.

use std::future::Future;

use async_trait::async_trait;
use poidir_core::{CategoryCode, Coordinate, PlaceRecord, ProviderKind};
use tokio_util::sync::CancellationToken;

use crate::error::SearchError;

/// Meters per statute mile, rounded the way radius settings are stored.
pub const METERS_PER_MILE: u32 = 1609;

/// Maximum number of places requested from a backend per search.
pub const RESULT_LIMIT: u32 = 30;

/// One search attempt. Built fresh by the caller for every attempt.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub coordinate: Coordinate,
    /// Already-resolved category in the target provider's vocabulary.
    pub category: Option<CategoryCode>,
    /// Cancelled when a newer request supersedes this one.
    pub cancel: CancellationToken,
}

impl SearchRequest {
    #[must_use]
    pub fn new(query: &str, coordinate: Coordinate, category: Option<CategoryCode>) -> Self {
        Self {
            query: query.to_string(),
            coordinate,
            category,
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The query with surrounding whitespace removed.
    #[must_use]
    pub fn trimmed_query(&self) -> &str {
        self.query.trim()
    }
}

/// Remote place search and autocomplete for one vendor.
///
/// Transport, credential, and parse failures are recovered inside the
/// implementation as an empty result. Only [`SearchError::Cancelled`] is
/// returned to the caller.
#[async_trait]
pub trait PlacesProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Searches around `request.coordinate`.
    ///
    /// An invalid coordinate yields an empty result without any network call.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<PlaceRecord>, SearchError>;

    /// Candidate place/address strings for a partially typed query.
    async fn autocomplete(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, SearchError>;

    /// Richer record for a place returned with a `provider_place_id`.
    async fn details(&self, _place_id: &str) -> Option<PlaceRecord> {
        None
    }
}

/// Forward and reverse geocoding for one vendor.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Best coordinate for a free-text address, or `None` on any failure.
    async fn coordinates(&self, address: &str) -> Option<Coordinate>;

    /// Human-readable address for a coordinate, or `None` on any failure.
    async fn address(&self, coordinate: Coordinate) -> Option<String>;
}

/// Converts a configured radius to meters and clamps it to a backend maximum.
#[must_use]
pub fn radius_meters(miles: u32, max_meters: u32) -> u32 {
    miles.saturating_mul(METERS_PER_MILE).min(max_meters)
}

/// Client-side narrowing for free-text searches.
///
/// Category-scoped and blank-query searches keep the full result set.
#[must_use]
pub fn filter_by_query(
    places: Vec<PlaceRecord>,
    query: &str,
    category: Option<&CategoryCode>,
) -> Vec<PlaceRecord> {
    let needle = query.trim().to_lowercase();
    if category.is_some() || needle.is_empty() {
        return places;
    }
    places
        .into_iter()
        .filter(|place| place.matches_text(&needle))
        .collect()
}

/// Runs `fut` unless `cancel` fires first.
pub(crate) async fn until_cancelled<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = T>,
) -> Result<T, SearchError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(SearchError::Cancelled),
        value = fut => Ok(value),
    }
}
