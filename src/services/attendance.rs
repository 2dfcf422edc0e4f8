use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{AttendanceLog, AttendanceStatus},
};

use super::{clock::Clock, schedules::on_missing_kiosk, students::non_blank};

/// A tap reported by a kiosk.
#[derive(Debug, Deserialize)]
pub struct AttendanceEvent {
    pub student_id: Option<String>,
    pub subject_code: Option<String>,
    pub kiosk_id: Option<Uuid>,
    pub room: Option<String>,
    #[serde(default)]
    pub status: AttendanceStatus,
    pub timestamp: Option<DateTime<Utc>>,
}

pub struct AttendanceService {
    db: PgPool,
    clock: Arc<dyn Clock>,
}

impl AttendanceService {
    pub fn new(db: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub async fn record(&self, event: AttendanceEvent) -> AppResult<AttendanceLog> {
        let (Some(student_id), Some(subject_code)) = (
            non_blank(event.student_id.as_deref()),
            non_blank(event.subject_code.as_deref()),
        ) else {
            return Err(AppError::Validation(
                "student_id and subject_code are required".to_string(),
            ));
        };

        let timestamp = event.timestamp.unwrap_or_else(|| self.clock.now());

        let log: AttendanceLog = sqlx::query_as(
            r#"
            INSERT INTO attendance_logs (id, student_id, subject_code, room, kiosk_id, timestamp, date, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(subject_code)
        .bind(non_blank(event.room.as_deref()))
        .bind(event.kiosk_id)
        .bind(timestamp)
        .bind(timestamp.date_naive())
        .bind(event.status)
        .fetch_one(&self.db)
        .await
        .map_err(on_missing_kiosk)?;

        tracing::debug!(
            "Logged {} for {} in {} ({:?})",
            student_id,
            subject_code,
            log.date,
            log.status
        );
        Ok(log)
    }
}
