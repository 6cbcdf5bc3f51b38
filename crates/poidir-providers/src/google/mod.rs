//! Google Places (Text Search, Nearby Search, Details, Autocomplete) and
//! Geocoding web-service adapter.

mod response;

use std::time::Instant;

use async_trait::async_trait;
use poidir_core::{CategoryCode, Coordinate, PlaceRecord, Preferences, ProviderKind};
use reqwest::{Client, Url};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::{ProviderError, SearchError};
use crate::http::{build_client, endpoint_url, get_json, parse_base_url, HttpSettings};
use crate::normalize::{clean, format_phone_number, parse_formatted_address};
use crate::provider::{
    filter_by_query, radius_meters, until_cancelled, Geocoder, PlacesProvider, SearchRequest,
};

use self::response::{
    AutocompleteResponse, DetailsResponse, GeocodeResponse, PlaceResult, PlacesResponse,
};

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/";

pub const MAX_RADIUS_METERS: u32 = 50_000;

const DETAILS_FIELDS: &str = "name,formatted_address,formatted_phone_number,\
international_phone_number,opening_hours,types,website,geometry,place_id";

/// Client for the Google Maps Places and Geocoding web services.
pub struct GoogleClient {
    client: Client,
    base_url: Url,
    preferences: watch::Receiver<Preferences>,
}

impl GoogleClient {
    /// Creates a client pointed at the production Google Maps API.
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
            .api_key(ProviderKind::Google)
            .map(str::to_string);
        if key.is_none() {
            tracing::error!(provider = "google", "Google API key not configured");
        }
        key
    }

    /// Text Search for typed queries, Nearby Search for pure browsing.
    fn search_url(
        &self,
        api_key: &str,
        request: &SearchRequest,
        radius_m: u32,
        open_now: bool,
    ) -> Result<Url, ProviderError> {
        let query = request.trimmed_query();
        let location = request.coordinate.to_string();
        let radius = radius_m.to_string();

        let mut params = vec![
            ("key", api_key),
            ("location", location.as_str()),
            ("radius", radius.as_str()),
        ];
        if let Some(category) = request.category.as_ref() {
            params.push(("type", category.as_str()));
        }
        if open_now {
            params.push(("opennow", "true"));
        }

        if query.is_empty() {
            endpoint_url(&self.base_url, "place/nearbysearch/json", &params)
        } else {
            params.push(("query", query));
            endpoint_url(&self.base_url, "place/textsearch/json", &params)
        }
    }

    async fn fetch_places(
        &self,
        api_key: &str,
        request: &SearchRequest,
        radius_m: u32,
        open_now: bool,
    ) -> Result<Vec<PlaceRecord>, ProviderError> {
        let url = self.search_url(api_key, request, radius_m, open_now)?;
        let response: PlacesResponse = get_json(&self.client, url, "google place search").await?;
        check_status(&response.status, response.error_message.as_deref())?;
        Ok(response.results.into_iter().filter_map(map_place).collect())
    }

    async fn fetch_autocomplete(
        &self,
        api_key: &str,
        query: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let url = endpoint_url(
            &self.base_url,
            "place/autocomplete/json",
            &[("key", api_key), ("input", query)],
        )?;
        let response: AutocompleteResponse =
            get_json(&self.client, url, "google autocomplete").await?;
        check_status(&response.status, response.error_message.as_deref())?;
        Ok(response
            .predictions
            .into_iter()
            .filter_map(|p| clean(p.description.as_deref()))
            .collect())
    }

    async fn fetch_details(
        &self,
        api_key: &str,
        place_id: &str,
    ) -> Result<Option<PlaceRecord>, ProviderError> {
        let url = endpoint_url(
            &self.base_url,
            "place/details/json",
            &[("key", api_key), ("place_id", place_id), ("fields", DETAILS_FIELDS)],
        )?;
        let response: DetailsResponse = get_json(&self.client, url, "google place details").await?;
        check_status(&response.status, response.error_message.as_deref())?;
        Ok(response.result.and_then(map_place))
    }

    async fn fetch_geocode(
        &self,
        params: &[(&str, &str)],
    ) -> Result<GeocodeResponse, ProviderError> {
        let url = endpoint_url(&self.base_url, "geocode/json", params)?;
        let response: GeocodeResponse = get_json(&self.client, url, "google geocode").await?;
        check_status(&response.status, response.error_message.as_deref())?;
        Ok(response)
    }
}

#[async_trait]
impl PlacesProvider for GoogleClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<PlaceRecord>, SearchError> {
        let Some(api_key) = self.api_key() else {
            return Ok(Vec::new());
        };
        if !request.coordinate.is_valid() {
            tracing::warn!(
                provider = "google",
                "skipping search: no valid location; configure device or default location"
            );
            return Ok(Vec::new());
        }

        let (radius_miles, open_now) = {
            let prefs = self.preferences.borrow();
            (prefs.search_radius_miles, prefs.open_now)
        };
        let radius_m = radius_meters(radius_miles, MAX_RADIUS_METERS);
        let started = Instant::now();

        let fetched = until_cancelled(
            &request.cancel,
            self.fetch_places(&api_key, request, radius_m, open_now),
        )
        .await?;
        match fetched {
            Ok(places) => {
                let total = places.len();
                let places = filter_by_query(places, &request.query, request.category.as_ref());
                tracing::debug!(
                    provider = "google",
                    query = request.trimmed_query(),
                    category = request.category.as_ref().map(CategoryCode::as_str),
                    radius_m,
                    open_now,
                    places = total,
                    results = places.len(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "search complete"
                );
                Ok(places)
            }
            Err(error) => {
                tracing::error!(provider = "google", %error, "error searching for places");
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
                    provider = "google",
                    %error,
                    "error getting autocomplete suggestions"
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
                    provider = "google",
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
impl Geocoder for GoogleClient {
    async fn coordinates(&self, address: &str) -> Option<Coordinate> {
        let api_key = self.api_key()?;
        match self
            .fetch_geocode(&[("key", api_key.as_str()), ("address", address)])
            .await
        {
            Ok(response) => response.results.first().map(|r| {
                Coordinate::new(r.geometry.location.lat, r.geometry.location.lng)
            }),
            Err(error) => {
                tracing::error!(provider = "google", %error, "error getting coordinates");
                None
            }
        }
    }

    async fn address(&self, coordinate: Coordinate) -> Option<String> {
        let api_key = self.api_key()?;
        let latlng = coordinate.to_string();
        match self
            .fetch_geocode(&[("key", api_key.as_str()), ("latlng", latlng.as_str())])
            .await
        {
            Ok(response) => response
                .results
                .into_iter()
                .next()
                .and_then(|r| clean(r.formatted_address.as_deref())),
            Err(error) => {
                tracing::error!(provider = "google", %error, "error getting address");
                None
            }
        }
    }
}

/// `OK` and `ZERO_RESULTS` are successes; every other status is an API error.
fn check_status(status: &str, message: Option<&str>) -> Result<(), ProviderError> {
    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        other => Err(ProviderError::Api {
            provider: ProviderKind::Google,
            message: match message {
                Some(detail) => format!("{other}: {detail}"),
                None => other.to_string(),
            },
        }),
    }
}

fn map_place(place: PlaceResult) -> Option<PlaceRecord> {
    let name = clean(place.name.as_deref())?;
    let address = parse_formatted_address(
        place
            .formatted_address
            .as_deref()
            .or(place.vicinity.as_deref()),
    );
    let phone = place
        .formatted_phone_number
        .as_deref()
        .or(place.international_phone_number.as_deref())
        .and_then(|p| clean(Some(p)))
        .map(|p| format_phone_number(&p));

    Some(PlaceRecord {
        name,
        address,
        hours: place
            .opening_hours
            .map(|h| h.weekday_text)
            .unwrap_or_default(),
        phone,
        description: place.types.join(", "),
        website: clean(place.website.as_deref()),
        coordinate: place
            .geometry
            .map(|g| Coordinate::new(g.location.lat, g.location.lng)),
        provider_place_id: clean(place.place_id.as_deref()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_status_accepts_zero_results() {
        assert!(check_status("OK", None).is_ok());
        assert!(check_status("ZERO_RESULTS", None).is_ok());
    }

    #[test]
    fn check_status_reports_denial_with_message() {
        let err = check_status("REQUEST_DENIED", Some("The provided API key is invalid."))
            .unwrap_err();
        assert!(err.to_string().contains("REQUEST_DENIED: The provided API key is invalid."));
    }

    #[test]
    fn map_place_parses_address_and_phone() {
        let place: PlaceResult = serde_json::from_value(serde_json::json!({
            "name": "Optimist Hall",
            "formatted_address": "1115 N Brevard St, Charlotte, NC 28206, United States",
            "formatted_phone_number": "+1 704-555-0199",
            "types": ["food", "point_of_interest"],
            "place_id": "ChIJ123",
            "geometry": { "location": { "lat": 35.23, "lng": -80.83 } },
            "opening_hours": { "weekday_text": ["Monday: 7:00 AM – 10:00 PM"] }
        }))
        .unwrap();

        let record = map_place(place).expect("record");
        assert_eq!(record.address.street, "1115 N Brevard St");
        assert_eq!(record.address.state, "NC");
        assert_eq!(record.address.zip, "28206");
        assert_eq!(record.address.country, "United States");
        assert_eq!(record.phone.as_deref(), Some("(704) 555-0199"));
        assert_eq!(record.description, "food, point_of_interest");
        assert_eq!(record.hours.len(), 1);
        assert_eq!(record.provider_place_id.as_deref(), Some("ChIJ123"));
    }

    #[test]
    fn map_place_uses_vicinity_when_formatted_address_missing() {
        let place: PlaceResult = serde_json::from_value(serde_json::json!({
            "name": "Corner Store",
            "vicinity": "12 Oak St, Rock Hill"
        }))
        .unwrap();
        let record = map_place(place).expect("record");
        assert_eq!(record.address.street, "12 Oak St");
        assert_eq!(record.address.city, "Rock Hill");
        assert!(record.coordinate.is_none());
    }
}
