use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Device {
    pub id: Uuid,
    pub device_name: String,
    pub device_type: DeviceType,
    pub room: String,
    pub connection_key: String,
    /// Last value written to the row. Not authoritative for reachability.
    #[serde(rename = "stored_status")]
    pub status: DeviceStatus,
    pub last_heartbeat_at: Option<DateTime<Utc>>,
    pub camera_enabled: bool,
    pub rfid_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "device_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Kiosk,
    Esp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "device_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
    Maintenance,
}

impl Default for DeviceStatus {
    fn default() -> Self {
        Self::Offline
    }
}

/// Reachability derived from the heartbeat timestamp at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Online,
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceWithPresence {
    #[serde(flatten)]
    pub device: Device,
    #[serde(rename = "status")]
    pub effective_status: Presence,
}
