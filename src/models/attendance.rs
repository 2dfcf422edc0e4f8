use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceLog {
    pub id: Uuid,
    pub student_id: String,
    pub subject_code: String,
    pub room: Option<String>,
    pub kiosk_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "attendance_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
}

impl Default for AttendanceStatus {
    fn default() -> Self {
        Self::Present
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceLogWithStudent {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub log: AttendanceLog,
    pub student_name: String,
}
