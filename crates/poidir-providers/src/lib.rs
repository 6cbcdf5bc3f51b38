//! HTTP adapters for the place-search backends (Geoapify, HERE, Google).
//!
//! Each adapter implements [`PlacesProvider`] and [`Geocoder`] and maps the
//! vendor's JSON into [`poidir_core::PlaceRecord`].

pub mod error;
pub mod geoapify;
pub mod google;
pub mod here;
pub mod http;
pub(crate) mod normalize;
pub mod provider;
pub mod registry;

pub use error::{ProviderError, SearchError};
pub use geoapify::GeoapifyClient;
pub use google::GoogleClient;
pub use here::{HereClient, HereEndpoints};
pub use http::HttpSettings;
pub use provider::{
    filter_by_query, radius_meters, Geocoder, PlacesProvider, SearchRequest, METERS_PER_MILE,
    RESULT_LIMIT,
};
pub use registry::{ProviderHandle, ProviderRegistry};
