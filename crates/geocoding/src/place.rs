//! The alternative strategy: a client-side autocomplete widget hands back a
//! fully structured place object, so city and country come from typed
//! address-component tags instead of string parsing.

use model::spot::UNKNOWN_PLACE;
use serde::Deserialize;

use crate::ResolvedPlace;

pub const LOCALITY_TAG: &str = "locality";
pub const COUNTRY_TAG: &str = "country";

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceDetails {
    pub formatted_address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

impl PlaceDetails {
    pub fn component(&self, tag: &str) -> Option<&str> {
        self.address_components
            .iter()
            .find(|component| component.types.iter().any(|t| t == tag))
            .map(|component| component.long_name.as_str())
    }

    pub fn into_resolved(self) -> ResolvedPlace {
        let city = self
            .component(LOCALITY_TAG)
            .unwrap_or(UNKNOWN_PLACE)
            .to_owned();
        let country = self
            .component(COUNTRY_TAG)
            .unwrap_or(UNKNOWN_PLACE)
            .to_owned();
        ResolvedPlace {
            latitude: self.latitude,
            longitude: self.longitude,
            city,
            country,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place() -> PlaceDetails {
        serde_json::from_str(
            r#"{
                "formatted_address": "1 Main St, New York, NY, USA",
                "latitude": 40.0,
                "longitude": -73.0,
                "address_components": [
                    {"long_name": "1", "types": ["street_number"]},
                    {"long_name": "Main St", "types": ["route"]},
                    {"long_name": "New York", "types": ["locality", "political"]},
                    {"long_name": "USA", "types": ["country", "political"]}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_typed_tag_lookup() {
        let resolved = place().into_resolved();
        assert_eq!(resolved.city, "New York");
        assert_eq!(resolved.country, "USA");
        assert_eq!(resolved.latitude, 40.0);
    }

    #[test]
    fn test_missing_components_fall_back_to_unknown() {
        let bare: PlaceDetails = serde_json::from_str(
            r#"{"formatted_address": null, "latitude": 1.0, "longitude": 2.0}"#,
        )
        .unwrap();
        let resolved = bare.into_resolved();
        assert_eq!(resolved.city, "unknown");
        assert_eq!(resolved.country, "unknown");
    }
}
