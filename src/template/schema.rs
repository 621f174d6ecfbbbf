//! Template schema definitions
//!
//! These types match the TypeScript definitions used by the web client.
//! Nothing on the server creates, stores, or applies templates yet; the type
//! exists so both sides agree on the wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A visual theme for the recording screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// URL or storage key of the background image
    pub background_image: String,
    /// Hex color code, e.g. `#3F37C9`
    pub primary_color: String,
    pub secondary_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Template {
    pub fn new(
        name: String,
        background_image: String,
        primary_color: String,
        secondary_color: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description: None,
            background_image,
            primary_color,
            secondary_color,
            thumbnail: None,
            created_at: Utc::now(),
        }
    }
}
