use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Category tag for dashboard feed entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActivityKind {
    Payment,
    Webhook,
}

/// Append-only audit trail of business events, consumed most-recent-first by
/// the dashboard feed. Display only: nothing reads these back for behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: i64,
    pub kind: ActivityKind,
    pub description: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: i64,
}
