// Container identity models

use serde::{Deserialize, Serialize};

/// Number of leading id characters used as the `id` metric label.
pub const SHORT_ID_LEN: usize = 12;

pub const UNKNOWN_NAME: &str = "unknown";

/// A live container as reported by the daemon's list call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRef {
    pub id: String,
    pub name: String,
}

impl ContainerRef {
    /// Build from the raw id and names list; the first name wins, leading `/` is stripped.
    pub fn from_names(id: impl Into<String>, names: &[String]) -> Self {
        Self {
            id: id.into(),
            name: display_name(names),
        }
    }

    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }
}

/// First name with any leading path separator removed; "unknown" when no name is present.
pub fn display_name(names: &[String]) -> String {
    names
        .first()
        .map(|n| n.trim_start_matches('/'))
        .filter(|n| !n.is_empty())
        .unwrap_or(UNKNOWN_NAME)
        .to_string()
}

/// First 12 characters of the id (the whole id when it is shorter).
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}
