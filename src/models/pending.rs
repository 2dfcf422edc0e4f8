use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PendingRegistration {
    pub id: Uuid,
    pub given_name: String,
    pub middle_name: Option<String>,
    pub surname: String,
    pub student_id: String,
    pub course: String,
    pub date_enrolled: Option<String>,
    pub cor_url: Option<String>,
    pub face_image_url: Option<String>,
    pub enrolled_subjects: Option<String>,
    pub rfid_uid: Option<String>,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PendingRegistration {
    /// "Given Middle Surname", skipping a blank middle name.
    pub fn full_name(&self) -> String {
        let middle = self
            .middle_name
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty());

        match middle {
            Some(middle) => format!("{} {} {}", self.given_name.trim(), middle, self.surname.trim()),
            None => format!("{} {}", self.given_name.trim(), self.surname.trim()),
        }
        .trim()
        .to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "registration_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}
