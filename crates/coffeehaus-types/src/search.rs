use serde::{Deserialize, Serialize};

use crate::models::ShopDetails;

pub const DEFAULT_LIMIT: usize = 10;
pub const DEFAULT_RADIUS_M: u32 = 10_000;
/// Largest page a single search returns.
pub const MAX_LIMIT: usize = 50;

/// Parameters of a shop search. Zero values mean "use the default".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchOptions {
    pub query: String,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lng: f64,
    /// Meters.
    #[serde(default)]
    pub radius: u32,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

impl SearchOptions {
    /// Fills zero values with defaults and caps the page size. Coordinates
    /// that are not finite are treated as absent.
    pub fn with_defaults(mut self) -> Self {
        if self.limit == 0 {
            self.limit = DEFAULT_LIMIT;
        }
        self.limit = self.limit.min(MAX_LIMIT);
        if !self.lat.is_finite() || !self.lng.is_finite() {
            self.lat = 0.0;
            self.lng = 0.0;
        }
        if self.radius == 0 {
            self.radius = DEFAULT_RADIUS_M;
        }
        self
    }

    pub fn has_location(&self) -> bool {
        self.lat != 0.0 && self.lng != 0.0
    }

    /// Location hint handed to the query analyzer.
    pub fn user_location(&self) -> String {
        if self.has_location() {
            format!("{:.6},{:.6}", self.lat, self.lng)
        } else {
            "unknown".to_string()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Proximity,
    Area,
    Specific,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentLocation {
    #[serde(default)]
    pub name: String,
    /// Kilometers.
    #[serde(default)]
    pub radius: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchTerms {
    #[serde(default)]
    pub shop: Option<String>,
    #[serde(default)]
    pub filters: Vec<String>,
}

/// Structured reading of a free-text search, as produced by the query analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIntent {
    pub search_type: SearchType,
    pub normalized_query: String,
    #[serde(default)]
    pub location: Option<IntentLocation>,
    #[serde(default)]
    pub terms: SearchTerms,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub search_type: SearchType,
    pub normalized_query: String,
    pub shops: Vec<ShopDetails>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_zero_values() {
        let opts = SearchOptions {
            query: "latte".into(),
            ..Default::default()
        }
        .with_defaults();
        assert_eq!(opts.limit, DEFAULT_LIMIT);
        assert_eq!(opts.radius, DEFAULT_RADIUS_M);
        assert_eq!(opts.user_location(), "unknown");
    }

    #[test]
    fn oversized_pages_and_bad_coordinates_are_tamed() {
        let opts = SearchOptions {
            query: "latte".into(),
            lat: f64::NAN,
            lng: -118.19,
            limit: usize::MAX,
            offset: usize::MAX,
            ..Default::default()
        }
        .with_defaults();
        assert_eq!(opts.limit, MAX_LIMIT);
        assert_eq!(opts.offset, usize::MAX);
        assert!(!opts.has_location());
        assert_eq!(opts.user_location(), "unknown");
    }

    #[test]
    fn intent_parses_analyzer_json() {
        let raw = r#"{
            "searchType": "specific",
            "normalizedQuery": "stereoscope coffee",
            "location": { "name": "Newport Beach, CA", "radius": 5 },
            "terms": { "shop": "Stereoscope Coffee", "filters": [] }
        }"#;
        let intent: SearchIntent = serde_json::from_str(raw).unwrap();
        assert_eq!(intent.search_type, SearchType::Specific);
        assert_eq!(intent.terms.shop.as_deref(), Some("Stereoscope Coffee"));
        assert_eq!(intent.location.unwrap().radius, 5.0);
    }

    #[test]
    fn intent_tolerates_missing_optional_sections() {
        let raw = r#"{ "searchType": "proximity", "normalizedQuery": "coffee" }"#;
        let intent: SearchIntent = serde_json::from_str(raw).unwrap();
        assert!(intent.location.is_none());
        assert!(intent.terms.filters.is_empty());
    }
}
