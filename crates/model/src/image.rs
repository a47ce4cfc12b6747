use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::{HasId, Id};

use crate::spot::PrayerSpot;

/// An image attached to a spot. At most one image per spot is primary; the
/// first uploaded image becomes primary by default.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpotImage {
    pub spot_id: Id<PrayerSpot>,
    pub image_url: String,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

impl HasId for SpotImage {
    type IdType = String;
}

/// Insert payload for an image. The store assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub spot_id: Id<PrayerSpot>,
    pub image_url: String,
    pub is_primary: bool,
}
