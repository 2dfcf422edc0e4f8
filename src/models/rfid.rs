use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One scanner write: the tag and the server time it arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfidScan {
    pub uid: String,
    pub captured_at: DateTime<Utc>,
}

/// Snapshot of the mailbox as seen by a polling reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveRfid {
    pub uid: Option<String>,
    #[serde(rename = "timestamp")]
    pub captured_at: Option<DateTime<Utc>>,
    #[serde(rename = "isActive")]
    pub is_active: bool,
}
