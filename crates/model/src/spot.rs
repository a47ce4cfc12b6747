use std::{error, fmt};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::{
    geo::haversine_distance,
    id::{HasId, Id},
};

use crate::{profile::Profile, slug, ExampleData, WithDistance};

/// Placeholder for a city or country the geocoder could not resolve.
pub const UNKNOWN_PLACE: &str = "unknown";

/// A shared prayer location. Never hard-deleted; `deleted_at` marks a spot as
/// inactive and can be cleared again by its creator or an admin.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrayerSpot {
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub country: String,
    pub slug: String,
    pub created_by: Id<Profile>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl HasId for PrayerSpot {
    type IdType = String;
}

impl PrayerSpot {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Public detail route for this spot.
    pub fn detail_path(&self) -> String {
        format!("/{}", self.slug)
    }

    /// Case-insensitive substring filter over name, address and description.
    /// An empty term matches every spot.
    pub fn matches(&self, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        let term = term.to_lowercase();
        let contains = |field: &str| field.to_lowercase().contains(&term);
        contains(&self.name)
            || self.address.as_deref().map_or(false, contains)
            || self.description.as_deref().map_or(false, contains)
    }

    /// Whether `actor` may delete or restore this spot.
    pub fn moderated_by(
        &self,
        actor: &Id<Profile>,
        profile: Option<&Profile>,
    ) -> bool {
        *actor == self.created_by || profile.map_or(false, |p| p.is_admin)
    }

    pub fn with_distance_to(
        self,
        latitude: f64,
        longitude: f64,
    ) -> WithDistance<PrayerSpot> {
        let distance =
            haversine_distance(latitude, longitude, self.latitude, self.longitude);
        WithDistance::new(distance, self)
    }
}

impl ExampleData for PrayerSpot {
    fn example_data() -> Self {
        PrayerSpot {
            name: "Quiet Room".to_owned(),
            description: Some("Small room on the second floor.".to_owned()),
            address: Some("1 Main St".to_owned()),
            latitude: 40.0,
            longitude: -73.0,
            city: "NYC".to_owned(),
            country: "USA".to_owned(),
            slug: "usa/nyc/quiet-room".to_owned(),
            created_by: Id::new("user-1".to_owned()),
            created_at: DateTime::<Utc>::MIN_UTC,
            deleted_at: None,
        }
    }
}

/// Insert payload for a spot. The store assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewSpot {
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub country: String,
    pub slug: String,
    pub created_by: Id<Profile>,
}

/// Typed draft collected by the spot form. Coordinates default to the
/// `(0, 0)` sentinel, which counts as "not yet resolved".
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpotDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
}

impl SpotDraft {
    pub fn has_location(&self) -> bool {
        !(self.latitude == 0.0 && self.longitude == 0.0)
    }

    pub fn city_or_unknown(&self) -> &str {
        if self.city.trim().is_empty() {
            UNKNOWN_PLACE
        } else {
            &self.city
        }
    }

    pub fn country_or_unknown(&self) -> &str {
        if self.country.trim().is_empty() {
            UNKNOWN_PLACE
        } else {
            &self.country
        }
    }

    /// Slug the draft would be stored under, before collision handling.
    pub fn slug(&self) -> String {
        slug::slug(&self.name, self.city_or_unknown(), self.country_or_unknown())
    }

    /// Checked before every create call, mirroring the store-side rules.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.name.trim().is_empty() {
            return Err(DraftError::MissingName);
        }
        if !self.has_location() {
            return Err(DraftError::LocationUnset);
        }
        Ok(())
    }

    pub fn into_new_spot(self, created_by: Id<Profile>, slug: String) -> NewSpot {
        let city = self.city_or_unknown().to_owned();
        let country = self.country_or_unknown().to_owned();
        NewSpot {
            name: self.name,
            description: none_if_blank(self.description),
            address: none_if_blank(self.address),
            latitude: self.latitude,
            longitude: self.longitude,
            city,
            country,
            slug,
            created_by,
        }
    }
}

fn none_if_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
    MissingName,
    LocationUnset,
}

impl error::Error for DraftError {}

impl fmt::Display for DraftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftError::MissingName => write!(f, "A name is required."),
            DraftError::LocationUnset => {
                write!(f, "The location has not been resolved yet.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spot() -> PrayerSpot {
        PrayerSpot::example_data()
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(spot().matches(""));
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        assert!(spot().matches("qUiEt"));
        assert!(spot().matches("main st"));
        assert!(spot().matches("SECOND FLOOR"));
    }

    #[test]
    fn test_filter_misses() {
        assert!(!spot().matches("cathedral"));
    }

    #[test]
    fn test_filter_ignores_missing_optional_fields() {
        let mut s = spot();
        s.address = None;
        s.description = None;
        assert!(!s.matches("main"));
        assert!(s.matches("quiet"));
    }

    #[test]
    fn test_owner_can_moderate() {
        let s = spot();
        assert!(s.moderated_by(&Id::new("user-1".to_owned()), None));
    }

    #[test]
    fn test_admin_can_moderate() {
        let s = spot();
        let admin = Profile {
            display_name: None,
            is_admin: true,
        };
        assert!(s.moderated_by(&Id::new("someone-else".to_owned()), Some(&admin)));
    }

    #[test]
    fn test_stranger_cannot_moderate() {
        let s = spot();
        let profile = Profile {
            display_name: None,
            is_admin: false,
        };
        assert!(!s.moderated_by(&Id::new("someone-else".to_owned()), Some(&profile)));
        assert!(!s.moderated_by(&Id::new("someone-else".to_owned()), None));
    }

    #[test]
    fn test_draft_requires_name() {
        let draft = SpotDraft {
            latitude: 40.0,
            longitude: -73.0,
            ..Default::default()
        };
        assert_eq!(draft.validate(), Err(DraftError::MissingName));
    }

    #[test]
    fn test_draft_rejects_zero_zero_coordinates() {
        let draft = SpotDraft {
            name: "Quiet Room".to_owned(),
            ..Default::default()
        };
        assert_eq!(draft.validate(), Err(DraftError::LocationUnset));
    }

    #[test]
    fn test_single_zero_axis_is_a_valid_location() {
        let draft = SpotDraft {
            name: "Equator Point".to_owned(),
            latitude: 0.0,
            longitude: 11.5,
            ..Default::default()
        };
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_unknown_place_fallbacks() {
        let draft = SpotDraft {
            name: "Quiet Room".to_owned(),
            latitude: 40.0,
            longitude: -73.0,
            ..Default::default()
        };
        assert_eq!(draft.slug(), "unknown/unknown/quiet-room");
    }

    #[test]
    fn test_camel_case_wire_format() {
        let json = serde_json::to_value(spot()).unwrap();
        assert!(json.get("createdBy").is_some());
        assert!(json.get("createdAt").is_some());
        // skip_serializing_none drops the null deleted_at
        assert!(json.get("deletedAt").is_none());
    }
}
