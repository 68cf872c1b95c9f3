//! Construction model

use serde::{Deserialize, Serialize};

/// A construct that can be assigned to machines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Construction {
    /// Construct identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Display color (CSS color string)
    pub color: String,
    /// User who created the construct
    #[serde(default)]
    pub created_by: Option<String>,
    /// ISO-8601 creation time
    #[serde(default)]
    pub created_at: Option<String>,
}
