//! Wire types for the Mapbox forward-geocoding response.

use model::spot::UNKNOWN_PLACE;
use serde::Deserialize;

use crate::ResolvedPlace;

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Best match, the way the provider ranks them.
    pub fn into_best_match(self) -> Option<Feature> {
        self.features.into_iter().next()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    /// Provider order: `[longitude, latitude]`.
    pub center: [f64; 2],
    #[serde(default)]
    pub context: Vec<ContextEntry>,
    pub place_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContextEntry {
    pub id: String,
    pub text: String,
}

impl Feature {
    pub fn longitude(&self) -> f64 {
        self.center[0]
    }

    pub fn latitude(&self) -> f64 {
        self.center[1]
    }

    fn context_text(&self, id_prefix: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|entry| entry.id.starts_with(id_prefix))
            .map(|entry| entry.text.as_str())
    }

    pub fn city(&self) -> &str {
        self.context_text("place").unwrap_or(UNKNOWN_PLACE)
    }

    pub fn country(&self) -> &str {
        self.context_text("country").unwrap_or(UNKNOWN_PLACE)
    }

    pub fn into_resolved(self) -> ResolvedPlace {
        ResolvedPlace {
            latitude: self.latitude(),
            longitude: self.longitude(),
            city: self.city().to_owned(),
            country: self.country().to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_RESPONSE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "id": "address.1234",
                "place_name": "1 Main St, New York, USA",
                "center": [-73.0, 40.0],
                "context": [
                    {"id": "neighborhood.1", "text": "Financial District"},
                    {"id": "place.2", "text": "New York"},
                    {"id": "region.3", "text": "New York"},
                    {"id": "country.4", "text": "USA"}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_center_order_is_longitude_latitude() {
        let parsed: FeatureCollection = serde_json::from_str(FULL_RESPONSE).unwrap();
        let resolved = parsed.into_best_match().unwrap().into_resolved();
        assert_eq!(resolved.latitude, 40.0);
        assert_eq!(resolved.longitude, -73.0);
    }

    #[test]
    fn test_context_extraction() {
        let parsed: FeatureCollection = serde_json::from_str(FULL_RESPONSE).unwrap();
        let feature = parsed.into_best_match().unwrap();
        assert_eq!(feature.city(), "New York");
        assert_eq!(feature.country(), "USA");
    }

    #[test]
    fn test_missing_context_falls_back_to_unknown() {
        let partial = r#"{
            "features": [{"center": [9.99, 53.55]}]
        }"#;
        let parsed: FeatureCollection = serde_json::from_str(partial).unwrap();
        let resolved = parsed.into_best_match().unwrap().into_resolved();
        assert_eq!(resolved.city, "unknown");
        assert_eq!(resolved.country, "unknown");
    }

    #[test]
    fn test_no_features_means_no_match() {
        let empty = r#"{"type": "FeatureCollection", "features": []}"#;
        let parsed: FeatureCollection = serde_json::from_str(empty).unwrap();
        assert!(parsed.into_best_match().is_none());
    }
}
