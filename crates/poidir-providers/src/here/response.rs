//! HERE Search (v1) response shapes.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub(super) struct ItemsResponse {
    #[serde(default)]
    pub items: Vec<Item>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct Item {
    pub title: Option<String>,
    pub address: Option<HereAddress>,
    pub position: Option<Position>,
    #[serde(default)]
    pub contacts: Vec<Contacts>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub opening_hours: Vec<OpeningHours>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct HereAddress {
    pub label: Option<String>,
    pub street: Option<String>,
    pub house_number: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country_name: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Position {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct Contacts {
    #[serde(default)]
    pub phone: Vec<ContactValue>,
    #[serde(default)]
    pub www: Vec<ContactValue>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ContactValue {
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Category {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct OpeningHours {
    #[serde(default)]
    pub text: Vec<String>,
}
