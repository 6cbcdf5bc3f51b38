//! Shared HTTP plumbing for the provider adapters.

use std::time::Duration;

use poidir_core::AppConfig;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::ProviderError;

const USER_AGENT: &str = "poidir/0.1 (place-directory)";

/// Timeouts applied to every backend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl HttpSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }
}

/// Builds a `reqwest::Client` with the configured timeouts.
///
/// # Errors
///
/// Returns [`ProviderError::Http`] if the client cannot be constructed.
pub(crate) fn build_client(settings: HttpSettings) -> Result<Client, ProviderError> {
    Ok(Client::builder()
        .timeout(settings.request_timeout)
        .connect_timeout(settings.connect_timeout)
        .user_agent(USER_AGENT)
        .build()?)
}

/// Parses a base URL, normalising it to end with exactly one slash so that
/// relative endpoint paths join underneath it.
///
/// # Errors
///
/// Returns [`ProviderError::InvalidBaseUrl`] if `base_url` is not a valid URL.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, ProviderError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| ProviderError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })
}

/// Joins `path` onto `base` and appends percent-encoded query parameters.
///
/// # Errors
///
/// Returns [`ProviderError::InvalidBaseUrl`] if `path` does not join onto
/// `base`.
pub(crate) fn endpoint_url(
    base: &Url,
    path: &str,
    params: &[(&str, &str)],
) -> Result<Url, ProviderError> {
    let mut url = base.join(path).map_err(|e| ProviderError::InvalidBaseUrl {
        url: format!("{base}{path}"),
        reason: e.to_string(),
    })?;
    {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in params {
            pairs.append_pair(k, v);
        }
    }
    Ok(url)
}

/// Sends a GET request, asserts a 2xx status, and deserializes the body.
///
/// `endpoint` is a short label used in errors instead of the URL, which
/// carries the API key.
///
/// # Errors
///
/// - [`ProviderError::Http`] on network failure or timeout.
/// - [`ProviderError::UnexpectedStatus`] on a non-2xx status.
/// - [`ProviderError::Deserialize`] if the body does not match `T`.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: Url,
    endpoint: &'static str,
) -> Result<T, ProviderError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ProviderError::Http(e.without_url()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::UnexpectedStatus {
            status: status.as_u16(),
            endpoint,
        });
    }
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::Http(e.without_url()))?;
    serde_json::from_str(&body).map_err(|e| ProviderError::Deserialize {
        context: endpoint.to_string(),
        source: e,
    })
}
