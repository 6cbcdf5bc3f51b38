//! Mapping from human-facing category labels to provider category codes.
//!
//! Matching is exact on the trimmed, lowercased query so that natural-language
//! searches such as "restaurants in springfield" fall through to free-text
//! search instead of being scoped to a category filter.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::ProviderKind;

/// A provider-specific category identifier (e.g. `catering.cafe`, `100-1100`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryCode(String);

impl CategoryCode {
    /// Wraps a raw code. Returns `None` for blank input.
    #[must_use]
    pub fn new(code: &str) -> Option<Self> {
        let trimmed = code.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct CategoryEntry {
    labels: &'static [&'static str],
    geoapify: &'static str,
    here: &'static str,
    google: &'static str,
}

impl CategoryEntry {
    fn code_for(&self, kind: ProviderKind) -> &'static str {
        match kind {
            ProviderKind::Geoapify => self.geoapify,
            ProviderKind::Here => self.here,
            ProviderKind::Google => self.google,
        }
    }
}

const CATEGORY_TABLE: &[CategoryEntry] = &[
    CategoryEntry {
        labels: &["gas stations", "gas station", "fuel"],
        geoapify: "commercial.gas,service.vehicle.fuel",
        here: "700-7600-0116",
        google: "gas_station",
    },
    CategoryEntry {
        labels: &["restaurants", "restaurant", "food"],
        geoapify: "catering.restaurant",
        here: "100-1000",
        google: "restaurant",
    },
    CategoryEntry {
        labels: &["entertainment"],
        geoapify: "entertainment",
        here: "200",
        google: "tourist_attraction",
    },
    CategoryEntry {
        labels: &["coffee", "coffee shops", "coffee shop", "cafe", "cafes"],
        geoapify: "catering.cafe",
        here: "100-1100",
        google: "cafe",
    },
    CategoryEntry {
        labels: &["shopping", "shops", "store", "stores"],
        geoapify: "commercial",
        here: "600",
        google: "store",
    },
    CategoryEntry {
        labels: &["hotels", "hotel", "lodging"],
        geoapify: "accommodation.hotel",
        here: "500-5000",
        google: "lodging",
    },
];

/// Pure label → category-code lookup for one provider's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryMapper {
    kind: ProviderKind,
}

impl CategoryMapper {
    #[must_use]
    pub fn for_provider(kind: ProviderKind) -> Self {
        Self { kind }
    }

    /// Returns the provider category code for an exact label hit.
    #[must_use]
    pub fn map(&self, query: &str) -> Option<CategoryCode> {
        let normalized = query.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        CATEGORY_TABLE
            .iter()
            .find(|entry| entry.labels.contains(&normalized.as_str()))
            .map(|entry| CategoryCode(entry.code_for(self.kind).to_string()))
    }
}

/// Picks the category for one search attempt.
///
/// An exact label match on the query wins; the externally scoped category is
/// only used when the mapper finds nothing.
#[must_use]
pub fn resolve_category(
    kind: ProviderKind,
    query: &str,
    scope: Option<&CategoryCode>,
) -> Option<CategoryCode> {
    CategoryMapper::for_provider(kind)
        .map(query)
        .or_else(|| scope.cloned())
}
