use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::Device,
};

/// Device reads and heartbeat writes needed by the presence tracker.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn find_device_by_id(&self, id: Uuid) -> AppResult<Device>;

    async fn list_devices(&self) -> AppResult<Vec<Device>>;

    /// Fails with `DeviceNotFound` and writes nothing when `id` is unknown.
    async fn update_device_heartbeat(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()>;
}

#[derive(Clone)]
pub struct PgDeviceStore {
    db: PgPool,
}

impl PgDeviceStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DeviceStore for PgDeviceStore {
    async fn find_device_by_id(&self, id: Uuid) -> AppResult<Device> {
        let device: Option<Device> = sqlx::query_as("SELECT * FROM devices WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        device.ok_or(AppError::DeviceNotFound)
    }

    async fn list_devices(&self) -> AppResult<Vec<Device>> {
        let devices: Vec<Device> =
            sqlx::query_as("SELECT * FROM devices ORDER BY created_at, device_name")
                .fetch_all(&self.db)
                .await?;

        Ok(devices)
    }

    async fn update_device_heartbeat(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        // A maintenance flag set by an admin survives heartbeats.
        let updated: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE devices
            SET last_heartbeat_at = $2,
                status = CASE WHEN status = 'maintenance' THEN status ELSE 'online'::device_status END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(at)
        .fetch_optional(&self.db)
        .await?;

        updated.map(|_| ()).ok_or(AppError::DeviceNotFound)
    }
}
