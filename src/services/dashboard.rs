use serde::Serialize;
use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{DeviceType, RegistrationStatus},
};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_students: i64,
    pub total_kiosks: i64,
    pub total_schedules: i64,
    pub pending_registrations: i64,
}

pub async fn stats(db: &PgPool) -> AppResult<DashboardStats> {
    let (total_students, total_kiosks, total_schedules, pending_registrations): (i64, i64, i64, i64) =
        sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM students),
                (SELECT COUNT(*) FROM devices WHERE device_type = $1),
                (SELECT COUNT(*) FROM schedules),
                (SELECT COUNT(*) FROM pending_registrations WHERE status = $2)
            "#,
        )
        .bind(DeviceType::Kiosk)
        .bind(RegistrationStatus::Pending)
        .fetch_one(db)
        .await?;

    Ok(DashboardStats {
        total_students,
        total_kiosks,
        total_schedules,
        pending_registrations,
    })
}
