//! Geoapify Places, Place Details, Autocomplete, and Geocoding adapter.

mod response;

use std::time::Instant;

use async_trait::async_trait;
use poidir_core::{Address, CategoryCode, Coordinate, PlaceRecord, Preferences, ProviderKind};
use reqwest::{Client, Url};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::{ProviderError, SearchError};
use crate::http::{build_client, endpoint_url, get_json, parse_base_url, HttpSettings};
use crate::normalize::{clean, join_non_empty, split_opening_hours};
use crate::provider::{
    filter_by_query, radius_meters, until_cancelled, Geocoder, PlacesProvider, SearchRequest,
    RESULT_LIMIT,
};

use self::response::{Feature, FeatureCollection};

const DEFAULT_BASE_URL: &str = "https://api.geoapify.com/";

/// Geoapify caps search circles at ~10 km to bound result volume.
pub const MAX_RADIUS_METERS: u32 = 10_000;

/// Broad category set used when a free-text query has no category.
pub const DEFAULT_CATEGORIES: &str =
    "catering,commercial,service,entertainment,leisure,accommodation,amenity";

/// Client for the Geoapify REST APIs.
///
/// The API key and search radius are read from the preference channel on
/// every call so settings changes apply to the next request.
pub struct GeoapifyClient {
    client: Client,
    base_url: Url,
    preferences: watch::Receiver<Preferences>,
}

impl GeoapifyClient {
    /// Creates a client pointed at the production Geoapify API.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        settings: HttpSettings,
        preferences: watch::Receiver<Preferences>,
    ) -> Result<Self, ProviderError> {
        Self::with_base_url(settings, preferences, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the client cannot be built, or
    /// [`ProviderError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        settings: HttpSettings,
        preferences: watch::Receiver<Preferences>,
        base_url: &str,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(settings)?,
            base_url: parse_base_url(base_url)?,
            preferences,
        })
    }

    fn api_key(&self) -> Option<String> {
        let key = self
            .preferences
            .borrow()
            .api_key(ProviderKind::Geoapify)
            .map(str::to_string);
        if key.is_none() {
            tracing::error!(provider = "geoapify", "Geoapify API key not configured");
        }
        key
    }

    fn places_url(
        &self,
        api_key: &str,
        request: &SearchRequest,
        radius_m: u32,
    ) -> Result<Url, ProviderError> {
        let query = request.trimmed_query();
        let categories = request
            .category
            .as_ref()
            .map_or(DEFAULT_CATEGORIES, CategoryCode::as_str);
        let Coordinate { latitude, longitude } = request.coordinate;
        let filter = format!("circle:{longitude},{latitude},{radius_m}");
        let bias = format!("proximity:{longitude},{latitude}");
        let limit = RESULT_LIMIT.to_string();

        let mut params = vec![
            ("apiKey", api_key),
            ("categories", categories),
            ("limit", limit.as_str()),
            ("filter", filter.as_str()),
            ("bias", bias.as_str()),
        ];
        // Server-side name narrowing is best-effort; results are filtered
        // again client-side.
        if request.category.is_none() && !query.is_empty() {
            params.push(("name", query));
        }
        endpoint_url(&self.base_url, "v2/places", &params)
    }

    async fn fetch_places(
        &self,
        api_key: &str,
        request: &SearchRequest,
        radius_m: u32,
    ) -> Result<Vec<PlaceRecord>, ProviderError> {
        let url = self.places_url(api_key, request, radius_m)?;
        let collection: FeatureCollection = get_json(&self.client, url, "geoapify places").await?;
        Ok(collection
            .features
            .into_iter()
            .filter_map(map_feature)
            .collect())
    }

    async fn fetch_autocomplete(
        &self,
        api_key: &str,
        query: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let url = endpoint_url(
            &self.base_url,
            "v1/geocode/autocomplete",
            &[("apiKey", api_key), ("text", query)],
        )?;
        let collection: FeatureCollection =
            get_json(&self.client, url, "geoapify autocomplete").await?;
        Ok(collection
            .features
            .into_iter()
            .filter_map(|f| clean(f.properties.formatted.as_deref()))
            .collect())
    }

    async fn fetch_geocode(
        &self,
        api_key: &str,
        address: &str,
    ) -> Result<Option<Coordinate>, ProviderError> {
        let url = endpoint_url(
            &self.base_url,
            "v1/geocode/search",
            &[("apiKey", api_key), ("text", address), ("limit", "1")],
        )?;
        let collection: FeatureCollection = get_json(&self.client, url, "geoapify geocode").await?;
        Ok(collection.features.first().and_then(feature_coordinate))
    }

    async fn fetch_reverse(
        &self,
        api_key: &str,
        coordinate: Coordinate,
    ) -> Result<Option<String>, ProviderError> {
        let lat = coordinate.latitude.to_string();
        let lon = coordinate.longitude.to_string();
        let url = endpoint_url(
            &self.base_url,
            "v1/geocode/reverse",
            &[("apiKey", api_key), ("lat", &lat), ("lon", &lon), ("limit", "1")],
        )?;
        let collection: FeatureCollection =
            get_json(&self.client, url, "geoapify reverse geocode").await?;
        Ok(collection
            .features
            .into_iter()
            .next()
            .and_then(|f| clean(f.properties.formatted.as_deref())))
    }

    async fn fetch_details(
        &self,
        api_key: &str,
        place_id: &str,
    ) -> Result<Option<PlaceRecord>, ProviderError> {
        let url = endpoint_url(
            &self.base_url,
            "v2/place-details",
            &[("apiKey", api_key), ("id", place_id)],
        )?;
        let collection: FeatureCollection =
            get_json(&self.client, url, "geoapify place details").await?;
        Ok(collection.features.into_iter().find_map(map_feature))
    }
}

#[async_trait]
impl PlacesProvider for GeoapifyClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Geoapify
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<PlaceRecord>, SearchError> {
        let Some(api_key) = self.api_key() else {
            return Ok(Vec::new());
        };
        if !request.coordinate.is_valid() {
            tracing::warn!(
                provider = "geoapify",
                "skipping search: no valid location; configure device or default location"
            );
            return Ok(Vec::new());
        }

        let radius_miles = self.preferences.borrow().search_radius_miles;
        let radius_m = radius_meters(radius_miles, MAX_RADIUS_METERS);
        let started = Instant::now();

        let fetched = until_cancelled(
            &request.cancel,
            self.fetch_places(&api_key, request, radius_m),
        )
        .await?;
        match fetched {
            Ok(places) => {
                let total = places.len();
                let places = filter_by_query(places, &request.query, request.category.as_ref());
                tracing::debug!(
                    provider = "geoapify",
                    query = request.trimmed_query(),
                    category = request.category.as_ref().map(CategoryCode::as_str),
                    radius_m,
                    features = total,
                    results = places.len(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "search complete"
                );
                Ok(places)
            }
            Err(error) => {
                tracing::error!(provider = "geoapify", %error, "error searching Geoapify places");
                Ok(Vec::new())
            }
        }
    }

    async fn autocomplete(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let Some(api_key) = self.api_key() else {
            return Ok(Vec::new());
        };
        match until_cancelled(cancel, self.fetch_autocomplete(&api_key, query)).await? {
            Ok(suggestions) => Ok(suggestions),
            Err(error) => {
                tracing::error!(
                    provider = "geoapify",
                    %error,
                    "error getting Geoapify autocomplete"
                );
                Ok(Vec::new())
            }
        }
    }

    async fn details(&self, place_id: &str) -> Option<PlaceRecord> {
        let api_key = self.api_key()?;
        match self.fetch_details(&api_key, place_id).await {
            Ok(record) => record,
            Err(error) => {
                tracing::error!(
                    provider = "geoapify",
                    place_id,
                    %error,
                    "error fetching place details"
                );
                None
            }
        }
    }
}

#[async_trait]
impl Geocoder for GeoapifyClient {
    async fn coordinates(&self, address: &str) -> Option<Coordinate> {
        let api_key = self.api_key()?;
        let started = Instant::now();
        let result = self.fetch_geocode(&api_key, address).await;
        tracing::debug!(
            provider = "geoapify",
            elapsed_ms = started.elapsed().as_millis(),
            "geocode request finished"
        );
        result.unwrap_or_else(|error| {
            tracing::error!(provider = "geoapify", %error, "error getting coordinates");
            None
        })
    }

    async fn address(&self, coordinate: Coordinate) -> Option<String> {
        let api_key = self.api_key()?;
        self.fetch_reverse(&api_key, coordinate)
            .await
            .unwrap_or_else(|error| {
                tracing::error!(provider = "geoapify", %error, "error getting address");
                None
            })
    }
}

fn feature_coordinate(feature: &Feature) -> Option<Coordinate> {
    let props = &feature.properties;
    let (lat, lon) = match (props.lat, props.lon) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => feature.geometry.as_ref()?.point()?,
    };
    Some(Coordinate::new(lat, lon))
}

/// Converts one feature into a record. Features with neither a name nor a
/// street are skipped.
fn map_feature(feature: Feature) -> Option<PlaceRecord> {
    let coordinate = feature_coordinate(&feature);
    let props = feature.properties;
    let name = clean(props.name.as_deref()).or_else(|| clean(props.street.as_deref()))?;

    let address = Address {
        street: join_non_empty([props.street.as_deref(), props.housenumber.as_deref()]),
        city: props.city.unwrap_or_default(),
        state: props.state.unwrap_or_default(),
        zip: props.postcode.unwrap_or_default(),
        country: props.country.unwrap_or_default(),
    };

    let phone = clean(props.phone.as_deref())
        .or_else(|| clean(props.contact.as_ref().and_then(|c| c.phone.as_deref())));

    Some(PlaceRecord {
        name,
        address,
        hours: split_opening_hours(props.opening_hours.as_deref()),
        phone,
        description: props.categories.join(", "),
        website: clean(props.website.as_deref()),
        coordinate,
        provider_place_id: clean(props.place_id.as_deref()),
    })
}
