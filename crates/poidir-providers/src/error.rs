use poidir_core::ProviderKind;
use thiserror::Error;

/// Failures inside a provider adapter.
///
/// These never cross the [`PlacesProvider`](crate::PlacesProvider) boundary:
/// adapters log them and degrade to an empty result.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network, TLS, or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {endpoint}")]
    UnexpectedStatus { status: u16, endpoint: &'static str },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The vendor returned a well-formed error envelope.
    #[error("{provider} API error: {message}")]
    Api {
        provider: ProviderKind,
        message: String,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// The only error a provider call surfaces to its caller.
///
/// Cancellation is not a failure: it means a newer request superseded this
/// one and the caller must not treat it as "found nothing".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("request superseded by a newer one")]
    Cancelled,
}
