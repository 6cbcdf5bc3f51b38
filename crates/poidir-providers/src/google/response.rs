//! Google Maps web-service response shapes (Places and Geocoding).

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(super) struct PlacesResponse {
    #[serde(default)]
    pub results: Vec<PlaceResult>,
    pub status: String,
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DetailsResponse {
    pub result: Option<PlaceResult>,
    pub status: String,
    pub error_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct PlaceResult {
    pub name: Option<String>,
    pub formatted_address: Option<String>,
    pub vicinity: Option<String>,
    pub formatted_phone_number: Option<String>,
    pub international_phone_number: Option<String>,
    pub website: Option<String>,
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub types: Vec<String>,
    pub place_id: Option<String>,
    pub opening_hours: Option<OpeningHours>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct OpeningHours {
    #[serde(default)]
    pub weekday_text: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Deserialize)]
pub(super) struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub(super) struct AutocompleteResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
    pub status: String,
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Prediction {
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GeocodeResponse {
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    pub status: String,
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GeocodeResult {
    pub formatted_address: Option<String>,
    pub geometry: Geometry,
}
