use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: Uuid,
    pub full_name: String,
    pub student_id: String,
    pub course: String,
    pub rfid_uid: Option<String>,
    pub face_image_url: Option<String>,
    pub enrolled_subjects: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    /// True when any of `subject_codes` appears in the enrolled subjects text.
    pub fn takes_any(&self, subject_codes: &[String]) -> bool {
        match &self.enrolled_subjects {
            Some(enrolled) => subject_codes
                .iter()
                .any(|code| !code.is_empty() && enrolled.contains(code.as_str())),
            None => false,
        }
    }
}

/// Roster row pulled by kiosks.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StudentSync {
    pub id: Uuid,
    pub full_name: String,
    pub student_id: String,
    pub rfid_uid: Option<String>,
    pub face_image_url: Option<String>,
    pub enrolled_subjects: Option<String>,
}
