//! HERE Discover/Browse, Geocode, and Reverse Geocode adapter.

mod response;

use std::time::Instant;

use async_trait::async_trait;
use poidir_core::{Address, CategoryCode, Coordinate, PlaceRecord, Preferences, ProviderKind};
use reqwest::{Client, Url};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::{ProviderError, SearchError};
use crate::http::{build_client, endpoint_url, get_json, parse_base_url, HttpSettings};
use crate::normalize::{clean, dedupe_lines, join_non_empty};
use crate::provider::{
    filter_by_query, radius_meters, until_cancelled, Geocoder, PlacesProvider, SearchRequest,
    RESULT_LIMIT,
};

use self::response::{Item, ItemsResponse};

pub const MAX_RADIUS_METERS: u32 = 50_000;

const AUTOCOMPLETE_LIMIT: &str = "5";

/// HERE serves each API from its own host.
#[derive(Debug, Clone)]
pub struct HereEndpoints {
    pub discover: Url,
    pub browse: Url,
    pub geocode: Url,
    pub revgeocode: Url,
}

impl HereEndpoints {
    /// The production hosts.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidBaseUrl`] only if a built-in URL is
    /// malformed.
    pub fn production() -> Result<Self, ProviderError> {
        Ok(Self {
            discover: parse_base_url("https://discover.search.hereapi.com/")?,
            browse: parse_base_url("https://browse.search.hereapi.com/")?,
            geocode: parse_base_url("https://geocode.search.hereapi.com/")?,
            revgeocode: parse_base_url("https://revgeocode.search.hereapi.com/")?,
        })
    }

    /// Every API served from one base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn single(base_url: &str) -> Result<Self, ProviderError> {
        let base = parse_base_url(base_url)?;
        Ok(Self {
            discover: base.clone(),
            browse: base.clone(),
            geocode: base.clone(),
            revgeocode: base,
        })
    }
}

/// Client for the HERE Search APIs.
pub struct HereClient {
    client: Client,
    endpoints: HereEndpoints,
    preferences: watch::Receiver<Preferences>,
}

impl HereClient {
    /// Creates a client pointed at the production HERE hosts.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        settings: HttpSettings,
        preferences: watch::Receiver<Preferences>,
    ) -> Result<Self, ProviderError> {
        Self::with_endpoints(settings, preferences, HereEndpoints::production()?)
    }

    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_endpoints(
        settings: HttpSettings,
        preferences: watch::Receiver<Preferences>,
        endpoints: HereEndpoints,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(settings)?,
            endpoints,
            preferences,
        })
    }

    fn api_key(&self) -> Option<String> {
        let key = self
            .preferences
            .borrow()
            .api_key(ProviderKind::Here)
            .map(str::to_string);
        if key.is_none() {
            tracing::error!(provider = "here", "HERE API key not configured");
        }
        key
    }

    /// Category searches go to `browse`; everything else to `discover`,
    /// which requires a non-empty `q`.
    fn search_url(
        &self,
        api_key: &str,
        request: &SearchRequest,
        radius_m: u32,
    ) -> Result<Url, ProviderError> {
        let Coordinate { latitude, longitude } = request.coordinate;
        let area = format!("circle:{latitude},{longitude};r={radius_m}");
        let limit = RESULT_LIMIT.to_string();

        match request.category.as_ref() {
            Some(category) => endpoint_url(
                &self.endpoints.browse,
                "v1/browse",
                &[
                    ("apiKey", api_key),
                    ("in", &area),
                    ("categories", category.as_str()),
                    ("limit", &limit),
                ],
            ),
            None => {
                let query = match request.trimmed_query() {
                    "" => "*",
                    q => q,
                };
                endpoint_url(
                    &self.endpoints.discover,
                    "v1/discover",
                    &[
                        ("apiKey", api_key),
                        ("q", query),
                        ("in", &area),
                        ("limit", &limit),
                    ],
                )
            }
        }
    }

    async fn fetch_places(
        &self,
        api_key: &str,
        request: &SearchRequest,
        radius_m: u32,
    ) -> Result<Vec<PlaceRecord>, ProviderError> {
        let url = self.search_url(api_key, request, radius_m)?;
        let endpoint = if request.category.is_some() {
            "here browse"
        } else {
            "here discover"
        };
        let response: ItemsResponse = get_json(&self.client, url, endpoint).await?;
        Ok(response.items.into_iter().filter_map(map_item).collect())
    }

    async fn fetch_geocode_items(
        &self,
        api_key: &str,
        query: &str,
        limit: &str,
    ) -> Result<Vec<Item>, ProviderError> {
        let url = endpoint_url(
            &self.endpoints.geocode,
            "v1/geocode",
            &[("apiKey", api_key), ("q", query), ("limit", limit)],
        )?;
        let response: ItemsResponse = get_json(&self.client, url, "here geocode").await?;
        Ok(response.items)
    }

    async fn fetch_reverse(
        &self,
        api_key: &str,
        coordinate: Coordinate,
    ) -> Result<Option<String>, ProviderError> {
        let at = coordinate.to_string();
        let url = endpoint_url(
            &self.endpoints.revgeocode,
            "v1/revgeocode",
            &[("apiKey", api_key), ("at", &at), ("limit", "1")],
        )?;
        let response: ItemsResponse = get_json(&self.client, url, "here reverse geocode").await?;
        Ok(response
            .items
            .into_iter()
            .next()
            .and_then(|item| item.address)
            .and_then(|address| clean(address.label.as_deref())))
    }
}

#[async_trait]
impl PlacesProvider for HereClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Here
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<PlaceRecord>, SearchError> {
        let Some(api_key) = self.api_key() else {
            return Ok(Vec::new());
        };
        if !request.coordinate.is_valid() {
            tracing::warn!(
                provider = "here",
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
                    provider = "here",
                    query = request.trimmed_query(),
                    category = request.category.as_ref().map(CategoryCode::as_str),
                    radius_m,
                    items = total,
                    results = places.len(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "search complete"
                );
                Ok(places)
            }
            Err(error) => {
                tracing::error!(provider = "here", %error, "error searching HERE places");
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
        let fetched = until_cancelled(
            cancel,
            self.fetch_geocode_items(&api_key, query, AUTOCOMPLETE_LIMIT),
        )
        .await?;
        match fetched {
            Ok(items) => Ok(items
                .into_iter()
                .filter_map(|item| {
                    clean(item.title.as_deref()).or_else(|| {
                        item.address
                            .as_ref()
                            .and_then(|a| clean(a.label.as_deref()))
                    })
                })
                .collect()),
            Err(error) => {
                tracing::error!(provider = "here", %error, "error getting HERE autocomplete");
                Ok(Vec::new())
            }
        }
    }
}

#[async_trait]
impl Geocoder for HereClient {
    async fn coordinates(&self, address: &str) -> Option<Coordinate> {
        let api_key = self.api_key()?;
        let started = Instant::now();
        let result = self.fetch_geocode_items(&api_key, address, "1").await;
        tracing::debug!(
            provider = "here",
            elapsed_ms = started.elapsed().as_millis(),
            "geocode request finished"
        );
        match result {
            Ok(items) => items.into_iter().next().and_then(item_coordinate),
            Err(error) => {
                tracing::error!(provider = "here", %error, "error getting coordinates");
                None
            }
        }
    }

    async fn address(&self, coordinate: Coordinate) -> Option<String> {
        let api_key = self.api_key()?;
        self.fetch_reverse(&api_key, coordinate)
            .await
            .unwrap_or_else(|error| {
                tracing::error!(provider = "here", %error, "error getting address");
                None
            })
    }
}

fn item_coordinate(item: Item) -> Option<Coordinate> {
    let position = item.position?;
    Some(Coordinate::new(position.lat?, position.lng?))
}

fn map_item(item: Item) -> Option<PlaceRecord> {
    let name = clean(item.title.as_deref())?;
    let address = item.address.unwrap_or_default();
    let contacts = item.contacts.first();

    let first_value = |values: Option<&Vec<response::ContactValue>>| {
        values
            .and_then(|v| v.first())
            .and_then(|v| clean(v.value.as_deref()))
    };

    Some(PlaceRecord {
        name,
        address: Address {
            street: join_non_empty([address.street.as_deref(), address.house_number.as_deref()]),
            city: address.city.unwrap_or_default(),
            state: address.state.unwrap_or_default(),
            zip: address.postal_code.unwrap_or_default(),
            country: address
                .country_name
                .or(address.country_code)
                .unwrap_or_default(),
        },
        hours: dedupe_lines(
            item.opening_hours
                .iter()
                .flat_map(|hours| hours.text.iter().map(String::as_str)),
        ),
        phone: first_value(contacts.map(|c| &c.phone)),
        description: item
            .categories
            .iter()
            .filter_map(|c| c.name.as_deref())
            .collect::<Vec<_>>()
            .join(", "),
        website: first_value(contacts.map(|c| &c.www)),
        coordinate: item
            .position
            .and_then(|p| Some(Coordinate::new(p.lat?, p.lng?))),
        provider_place_id: None,
    })
}
