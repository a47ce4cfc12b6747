use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::HasId;

use crate::ExampleData;

/// Per-user profile. Keyed by the identity service's user id; `is_admin`
/// authorizes delete/restore on any spot.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub display_name: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl HasId for Profile {
    type IdType = String;
}

impl ExampleData for Profile {
    fn example_data() -> Self {
        Profile {
            display_name: Some("Jordan".to_owned()),
            is_admin: false,
        }
    }
}
