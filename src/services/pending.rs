use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{on_unique_violation, AppError, AppResult},
    models::{PendingRegistration, RegistrationStatus, Student},
};

use super::students::non_blank;

/// Self-registration submitted from the enrollment site.
#[derive(Debug, Deserialize)]
pub struct RegistrationInput {
    pub given_name: Option<String>,
    pub middle_name: Option<String>,
    pub surname: Option<String>,
    pub student_id: Option<String>,
    pub course: Option<String>,
    pub date_enrolled: Option<String>,
    pub cor_url: Option<String>,
    pub face_image_url: Option<String>,
    pub enrolled_subjects: Option<String>,
}

pub struct PendingService {
    db: PgPool,
}

impl PendingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> AppResult<Vec<PendingRegistration>> {
        let pending: Vec<PendingRegistration> = sqlx::query_as(
            "SELECT * FROM pending_registrations WHERE status = $1 ORDER BY created_at DESC",
        )
        .bind(RegistrationStatus::Pending)
        .fetch_all(&self.db)
        .await?;

        Ok(pending)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<PendingRegistration> {
        let pending: Option<PendingRegistration> =
            sqlx::query_as("SELECT * FROM pending_registrations WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.db)
                .await?;

        pending.ok_or(AppError::PendingNotFound)
    }

    pub async fn create(&self, input: RegistrationInput) -> AppResult<PendingRegistration> {
        let (Some(given_name), Some(surname), Some(student_id), Some(course)) = (
            non_blank(input.given_name.as_deref()),
            non_blank(input.surname.as_deref()),
            non_blank(input.student_id.as_deref()),
            non_blank(input.course.as_deref()),
        ) else {
            return Err(AppError::Validation("Required fields missing".to_string()));
        };

        let pending: PendingRegistration = sqlx::query_as(
            r#"
            INSERT INTO pending_registrations
                (id, given_name, middle_name, surname, student_id, course, date_enrolled,
                 cor_url, face_image_url, enrolled_subjects, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(given_name)
        .bind(non_blank(input.middle_name.as_deref()))
        .bind(surname)
        .bind(student_id)
        .bind(course)
        .bind(&input.date_enrolled)
        .bind(&input.cor_url)
        .bind(&input.face_image_url)
        .bind(&input.enrolled_subjects)
        .bind(RegistrationStatus::Pending)
        .fetch_one(&self.db)
        .await?;

        Ok(pending)
    }

    /// Turns a pending registration into a student holding `rfid_uid`.
    pub async fn approve(&self, id: Uuid, rfid_uid: Option<&str>) -> AppResult<Student> {
        let rfid_uid = non_blank(rfid_uid)
            .ok_or_else(|| AppError::Validation("RFID UID is required".to_string()))?;

        let mut tx = self.db.begin().await?;

        let pending: Option<PendingRegistration> =
            sqlx::query_as("SELECT * FROM pending_registrations WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let pending = pending.ok_or(AppError::PendingNotFound)?;
        if pending.status != RegistrationStatus::Pending {
            return Err(AppError::AlreadyProcessed);
        }

        let student: Student = sqlx::query_as(
            r#"
            INSERT INTO students (id, full_name, student_id, course, rfid_uid, face_image_url, enrolled_subjects)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(pending.full_name())
        .bind(&pending.student_id)
        .bind(&pending.course)
        .bind(rfid_uid)
        .bind(pending.face_image_url.as_ref().or(pending.cor_url.as_ref()))
        .bind(&pending.enrolled_subjects)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| on_unique_violation(e, AppError::StudentAlreadyExists))?;

        sqlx::query(
            "UPDATE pending_registrations SET status = $2, rfid_uid = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(RegistrationStatus::Approved)
        .bind(rfid_uid)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!("Approved registration {} as student {}", id, student.student_id);

        Ok(student)
    }

    /// Rejection deletes the registration outright.
    pub async fn reject(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM pending_registrations WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::PendingNotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn registration(middle: Option<&str>) -> PendingRegistration {
        let now = Utc::now();
        PendingRegistration {
            id: Uuid::new_v4(),
            given_name: "Juan".to_string(),
            middle_name: middle.map(str::to_string),
            surname: "Dela Cruz".to_string(),
            student_id: "2024-00123".to_string(),
            course: "BSCpE".to_string(),
            date_enrolled: None,
            cor_url: None,
            face_image_url: None,
            enrolled_subjects: None,
            rfid_uid: None,
            status: RegistrationStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn full_name_includes_middle_name_when_present() {
        assert_eq!(registration(Some("Reyes")).full_name(), "Juan Reyes Dela Cruz");
    }

    #[test]
    fn full_name_skips_blank_middle_name() {
        assert_eq!(registration(None).full_name(), "Juan Dela Cruz");
        assert_eq!(registration(Some("  ")).full_name(), "Juan Dela Cruz");
    }

    #[test]
    fn registration_input_tolerates_missing_optionals() {
        let input: RegistrationInput = serde_json::from_str(
            r#"{"given_name":"Juan","surname":"Dela Cruz","student_id":"2024-1","course":"BSCpE"}"#,
        )
        .unwrap();
        assert!(input.middle_name.is_none());
        assert!(input.enrolled_subjects.is_none());
    }
}
