use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Schedule {
    pub id: Uuid,
    pub subject_code: String,
    pub subject_name: String,
    pub time_start: String,
    pub time_end: String,
    pub days: Option<String>,
    pub grace_period: i32,
    pub teacher_id: Option<Uuid>,
    pub kiosk_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScheduleWithTeacher {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub schedule: Schedule,
    pub teacher_name: String,
}

/// Timetable row pulled by kiosks.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScheduleSync {
    pub subject_code: String,
    pub time_start: String,
    pub time_end: String,
    pub days: Option<String>,
    pub grace_period: i32,
    pub kiosk_id: Option<Uuid>,
}
