pub mod app_config;
pub mod category;
pub mod config;
pub mod preferences;
pub mod types;

pub use app_config::AppConfig;
pub use category::{resolve_category, CategoryCode, CategoryMapper};
pub use config::{load_app_config, load_app_config_from_env};
pub use preferences::{ApiKeys, PreferenceStore, Preferences};
pub use types::{Address, Coordinate, PlaceRecord, ProviderKind, UnknownProvider};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
