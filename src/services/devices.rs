use rand::{distributions::Alphanumeric, Rng};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    config::LogRetention,
    error::{AppError, AppResult},
    models::{AttendanceLog, Device, DeviceStatus, DeviceType},
};

use super::students::non_blank;

pub const DEFAULT_ROOM: &str = "Unassigned";

const DEVICE_LOG_LIMIT: i64 = 1000;

#[derive(Debug, Deserialize)]
pub struct NewDevice {
    pub device_name: String,
    pub device_type: DeviceType,
    pub room: Option<String>,
    pub connection_key: Option<String>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct DeviceConfigUpdate {
    pub device_name: Option<String>,
    pub room: Option<String>,
    pub status: Option<DeviceStatus>,
    pub camera_enabled: Option<bool>,
    pub rfid_enabled: Option<bool>,
}

pub fn generate_connection_key() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|c| (c as char).to_ascii_lowercase())
        .collect();
    format!("kiosk_{}", suffix)
}

/// Admin-side device management. Presence reads go through `PresenceTracker`.
pub struct DevicesService {
    db: PgPool,
}

impl DevicesService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, new: NewDevice) -> AppResult<Device> {
        let name = non_blank(Some(&new.device_name))
            .ok_or_else(|| AppError::Validation("Device name is required".to_string()))?;

        let connection_key = non_blank(new.connection_key.as_deref())
            .map(str::to_string)
            .unwrap_or_else(generate_connection_key);

        let device: Device = sqlx::query_as(
            r#"
            INSERT INTO devices (id, device_name, device_type, room, connection_key, status, camera_enabled, rfid_enabled)
            VALUES ($1, $2, $3, $4, $5, $6, true, true)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(new.device_type)
        .bind(non_blank(new.room.as_deref()).unwrap_or(DEFAULT_ROOM))
        .bind(connection_key)
        .bind(DeviceStatus::Offline)
        .fetch_one(&self.db)
        .await?;

        tracing::info!("Registered device {} ({})", device.device_name, device.id);
        Ok(device)
    }

    pub async fn update_config(&self, id: Uuid, update: DeviceConfigUpdate) -> AppResult<Device> {
        let device: Option<Device> = sqlx::query_as(
            r#"
            UPDATE devices
            SET device_name = COALESCE($2, device_name),
                room = COALESCE($3, room),
                status = COALESCE($4, status),
                camera_enabled = COALESCE($5, camera_enabled),
                rfid_enabled = COALESCE($6, rfid_enabled),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(non_blank(update.device_name.as_deref()))
        .bind(non_blank(update.room.as_deref()))
        .bind(update.status)
        .bind(update.camera_enabled)
        .bind(update.rfid_enabled)
        .fetch_optional(&self.db)
        .await?;

        device.ok_or(AppError::DeviceNotFound)
    }

    /// Removes a device after detaching its schedules and handling its logs.
    pub async fn delete(&self, id: Uuid, logs: LogRetention) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query("UPDATE schedules SET kiosk_id = NULL, updated_at = NOW() WHERE kiosk_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        match logs {
            LogRetention::Purge => {
                sqlx::query("DELETE FROM attendance_logs WHERE kiosk_id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
            LogRetention::Detach => {
                sqlx::query("UPDATE attendance_logs SET kiosk_id = NULL WHERE kiosk_id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        let result = sqlx::query("DELETE FROM devices WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::DeviceNotFound);
        }

        tx.commit().await?;
        tracing::info!("Deleted device {} (logs: {:?})", id, logs);
        Ok(())
    }

    pub async fn logs(&self, id: Uuid) -> AppResult<Vec<AttendanceLog>> {
        let logs: Vec<AttendanceLog> = sqlx::query_as(
            r#"
            SELECT * FROM attendance_logs
            WHERE kiosk_id = $1
            ORDER BY timestamp DESC
            LIMIT $2
            "#,
        )
        .bind(id)
        .bind(DEVICE_LOG_LIMIT)
        .fetch_all(&self.db)
        .await?;

        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_key_has_kiosk_prefix() {
        let key = generate_connection_key();
        assert!(key.starts_with("kiosk_"));
        assert_eq!(key.len(), "kiosk_".len() + 9);
        assert!(key["kiosk_".len()..]
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn config_update_leaves_absent_fields_unset() {
        let update: DeviceConfigUpdate =
            serde_json::from_str(r#"{"camera_enabled": false}"#).unwrap();
        assert_eq!(update.camera_enabled, Some(false));
        assert!(update.rfid_enabled.is_none());
        assert!(update.status.is_none());
        assert!(update.device_name.is_none());
    }

    #[test]
    fn config_update_accepts_maintenance_hint() {
        let update: DeviceConfigUpdate =
            serde_json::from_str(r#"{"status": "maintenance"}"#).unwrap();
        assert_eq!(update.status, Some(DeviceStatus::Maintenance));
    }
}
