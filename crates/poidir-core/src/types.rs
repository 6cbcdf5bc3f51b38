//! Shared data shapes passed between providers, the location resolver, and
//! the search coordinator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
///
/// `(0.0, 0.0)` is reserved as [`Coordinate::UNSET`] and never treated as a
/// real search origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Sentinel meaning "no usable location".
    pub const UNSET: Coordinate = Coordinate {
        latitude: 0.0,
        longitude: 0.0,
    };

    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns `true` when this coordinate may be used as a search origin.
    ///
    /// Null Island and non-finite values are both rejected.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && !(self.latitude == 0.0 && self.longitude == 0.0)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Structured postal address. Every field is present; unknown parts are `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

impl Address {
    /// Single-line rendering that skips empty parts.
    #[must_use]
    pub fn one_line(&self) -> String {
        let state_zip = [self.state.as_str(), self.zip.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        [
            self.street.as_str(),
            self.city.as_str(),
            state_zip.as_str(),
            self.country.as_str(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// A normalized point of interest produced by a provider adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub name: String,
    pub address: Address,
    /// Free-text opening hours lines, in provider order.
    pub hours: Vec<String>,
    pub phone: Option<String>,
    /// Provider categories joined with `", "`; may be empty.
    pub description: String,
    pub website: Option<String>,
    pub coordinate: Option<Coordinate>,
    /// Opaque ID for providers that support a place-details follow-up call.
    pub provider_place_id: Option<String>,
}

impl PlaceRecord {
    /// Case-insensitive substring match against name and description.
    ///
    /// `needle` must already be trimmed and lowercased.
    #[must_use]
    pub fn matches_text(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }
}

/// Which remote place-search backend is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Geoapify,
    Here,
    Google,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::Geoapify,
        ProviderKind::Here,
        ProviderKind::Google,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Geoapify => "geoapify",
            ProviderKind::Here => "here",
            ProviderKind::Google => "google",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a provider name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown provider \"{0}\" (expected geoapify, here, or google)")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "geoapify" => Ok(ProviderKind::Geoapify),
            "here" => Ok(ProviderKind::Here),
            "google" | "google_places" | "google-places" => Ok(ProviderKind::Google),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_island_is_not_a_valid_origin() {
        assert!(!Coordinate::UNSET.is_valid());
        assert!(!Coordinate::new(0.0, 0.0).is_valid());
    }

    #[test]
    fn non_finite_coordinates_are_invalid() {
        assert!(!Coordinate::new(f64::NAN, 10.0).is_valid());
        assert!(!Coordinate::new(10.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn coordinate_on_an_axis_is_still_valid() {
        assert!(Coordinate::new(0.0, -80.8).is_valid());
        assert!(Coordinate::new(35.2, 0.0).is_valid());
    }

    #[test]
    fn address_one_line_skips_empty_parts() {
        let address = Address {
            street: "1 Main St".to_string(),
            city: "Charlotte".to_string(),
            state: "NC".to_string(),
            zip: String::new(),
            country: String::new(),
        };
        assert_eq!(address.one_line(), "1 Main St, Charlotte, NC");
        assert_eq!(Address::default().one_line(), "");
    }

    #[test]
    fn provider_kind_parses_aliases() {
        assert_eq!("HERE".parse::<ProviderKind>(), Ok(ProviderKind::Here));
        assert_eq!(
            "google_places".parse::<ProviderKind>(),
            Ok(ProviderKind::Google)
        );
        assert!("bing".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn place_record_serializes_missing_address_parts_as_empty_strings() {
        let record = PlaceRecord {
            name: "Cafe".to_string(),
            address: Address::default(),
            hours: vec![],
            phone: None,
            description: String::new(),
            website: None,
            coordinate: None,
            provider_place_id: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["address"]["city"], "");
        assert_eq!(json["address"]["country"], "");
    }
}
