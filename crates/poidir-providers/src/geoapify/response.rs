//! Geoapify response shapes. Only the fields we read are modelled.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub(super) struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Feature {
    #[serde(default)]
    pub properties: Properties,
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct Properties {
    pub name: Option<String>,
    pub street: Option<String>,
    pub housenumber: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
    pub formatted: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub opening_hours: Option<String>,
    pub place_id: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub contact: Option<Contact>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct Contact {
    pub phone: Option<String>,
}

/// GeoJSON geometry. Points are `[longitude, latitude]`; details responses
/// may carry polygons, which are ignored.
#[derive(Debug, Deserialize)]
pub(super) struct Geometry {
    #[serde(default)]
    pub coordinates: serde_json::Value,
}

impl Geometry {
    pub fn point(&self) -> Option<(f64, f64)> {
        let pair = self.coordinates.as_array()?;
        let lon = pair.first()?.as_f64()?;
        let lat = pair.get(1)?.as_f64()?;
        Some((lat, lon))
    }
}
