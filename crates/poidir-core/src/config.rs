use crate::app_config::AppConfig;
use crate::types::{Coordinate, ProviderKind};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Blank values count as unset so `.env` templates can leave keys empty.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        parse_flag(&or_default(var, default)).ok_or_else(|| {
            invalid(var, "expected one of true/false/1/0/yes/no".to_string())
        })
    };

    let parse_f64 = |var: &str| -> Result<Option<f64>, ConfigError> {
        optional(var)
            .map(|raw| raw.parse::<f64>().map_err(|e| invalid(var, e.to_string())))
            .transpose()
    };

    let provider = or_default("POIDIR_PROVIDER", "geoapify")
        .parse::<ProviderKind>()
        .map_err(|e| invalid("POIDIR_PROVIDER", e.to_string()))?;

    let use_device_location = parse_bool("POIDIR_USE_DEVICE_LOCATION", "true")?;
    let default_location = optional("POIDIR_DEFAULT_LOCATION");
    let search_radius_miles = parse_u32("POIDIR_SEARCH_RADIUS_MILES", "10")?;
    if search_radius_miles == 0 {
        return Err(invalid(
            "POIDIR_SEARCH_RADIUS_MILES",
            "radius must be at least 1 mile".to_string(),
        ));
    }
    let open_now = parse_bool("POIDIR_OPEN_NOW", "false")?;

    let debounce_ms = parse_u64("POIDIR_DEBOUNCE_MS", "300")?;
    let request_timeout_secs = parse_u64("POIDIR_REQUEST_TIMEOUT_SECS", "10")?;
    let connect_timeout_secs = parse_u64("POIDIR_CONNECT_TIMEOUT_SECS", "5")?;
    let log_level = or_default("POIDIR_LOG_LEVEL", "info");

    let device_coordinate = match (
        parse_f64("POIDIR_DEVICE_LATITUDE")?,
        parse_f64("POIDIR_DEVICE_LONGITUDE")?,
    ) {
        (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
        (None, None) => None,
        (Some(_), None) => {
            return Err(invalid(
                "POIDIR_DEVICE_LONGITUDE",
                "must be set together with POIDIR_DEVICE_LATITUDE".to_string(),
            ))
        }
        (None, Some(_)) => {
            return Err(invalid(
                "POIDIR_DEVICE_LATITUDE",
                "must be set together with POIDIR_DEVICE_LONGITUDE".to_string(),
            ))
        }
    };

    Ok(AppConfig {
        provider,
        use_device_location,
        default_location,
        search_radius_miles,
        open_now,
        debounce_ms,
        request_timeout_secs,
        connect_timeout_secs,
        log_level,
        device_coordinate,
        geoapify_api_key: optional("GEOAPIFY_API_KEY"),
        here_api_key: optional("HERE_API_KEY"),
        google_api_key: optional("GOOGLE_API_KEY"),
    })
}

/// Parse a boolean flag. Unrecognized values yield `None`.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
