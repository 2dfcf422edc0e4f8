use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{on_unique_violation, AppError, AppResult},
    models::{Role, Student, StudentSync},
};

#[derive(Debug, Deserialize)]
pub struct StudentInput {
    pub full_name: Option<String>,
    pub student_id: Option<String>,
    pub course: Option<String>,
    pub rfid_uid: Option<String>,
    pub face_image_url: Option<String>,
    pub enrolled_subjects: Option<String>,
}

/// Students a teacher may see: those enrolled in at least one of their subjects.
pub fn visible_to_teacher(students: Vec<Student>, subject_codes: &[String]) -> Vec<Student> {
    if subject_codes.is_empty() {
        return Vec::new();
    }

    students
        .into_iter()
        .filter(|student| student.takes_any(subject_codes))
        .collect()
}

pub struct StudentsService {
    db: PgPool,
}

impl StudentsService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_for(&self, role: Role, account_id: Uuid) -> AppResult<Vec<Student>> {
        let students: Vec<Student> =
            sqlx::query_as("SELECT * FROM students ORDER BY created_at DESC")
                .fetch_all(&self.db)
                .await?;

        match role {
            Role::Admin => Ok(students),
            Role::Teacher => {
                let subject_codes: Vec<String> = sqlx::query_scalar(
                    "SELECT DISTINCT subject_code FROM schedules WHERE teacher_id = $1",
                )
                .bind(account_id)
                .fetch_all(&self.db)
                .await?;

                Ok(visible_to_teacher(students, &subject_codes))
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Student> {
        let student: Option<Student> = sqlx::query_as("SELECT * FROM students WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        student.ok_or(AppError::StudentNotFound)
    }

    pub async fn create(&self, input: StudentInput) -> AppResult<Student> {
        let (Some(full_name), Some(student_id), Some(course)) = (
            non_blank(input.full_name.as_deref()),
            non_blank(input.student_id.as_deref()),
            non_blank(input.course.as_deref()),
        ) else {
            return Err(AppError::Validation(
                "Full name, student ID and course are required".to_string(),
            ));
        };

        let student: Student = sqlx::query_as(
            r#"
            INSERT INTO students (id, full_name, student_id, course, rfid_uid, face_image_url, enrolled_subjects)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(full_name)
        .bind(student_id)
        .bind(course)
        .bind(non_blank(input.rfid_uid.as_deref()))
        .bind(&input.face_image_url)
        .bind(&input.enrolled_subjects)
        .fetch_one(&self.db)
        .await
        .map_err(|e| on_unique_violation(e, AppError::StudentAlreadyExists))?;

        Ok(student)
    }

    pub async fn update(&self, id: Uuid, input: StudentInput) -> AppResult<Student> {
        let student: Option<Student> = sqlx::query_as(
            r#"
            UPDATE students
            SET full_name = COALESCE($2, full_name),
                student_id = COALESCE($3, student_id),
                course = COALESCE($4, course),
                rfid_uid = COALESCE($5, rfid_uid),
                face_image_url = COALESCE($6, face_image_url),
                enrolled_subjects = COALESCE($7, enrolled_subjects),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(non_blank(input.full_name.as_deref()))
        .bind(non_blank(input.student_id.as_deref()))
        .bind(non_blank(input.course.as_deref()))
        .bind(non_blank(input.rfid_uid.as_deref()))
        .bind(&input.face_image_url)
        .bind(&input.enrolled_subjects)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| on_unique_violation(e, AppError::StudentAlreadyExists))?;

        student.ok_or(AppError::StudentNotFound)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::StudentNotFound);
        }

        Ok(())
    }

    pub async fn sync(&self) -> AppResult<Vec<StudentSync>> {
        let roster: Vec<StudentSync> = sqlx::query_as(
            r#"
            SELECT id, full_name, student_id, rfid_uid, face_image_url, enrolled_subjects
            FROM students
            ORDER BY student_id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(roster)
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn student(name: &str, enrolled: Option<&str>) -> Student {
        let now = Utc::now();
        Student {
            id: Uuid::new_v4(),
            full_name: name.to_string(),
            student_id: format!("2024-{}", name),
            course: "BSCpE".to_string(),
            rfid_uid: None,
            face_image_url: None,
            enrolled_subjects: enrolled.map(str::to_string),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn teacher_sees_students_sharing_a_subject() {
        let students = vec![
            student("ana", Some("CPE16, MATH101")),
            student("ben", Some("PHYS1")),
            student("cy", None),
        ];
        let visible = visible_to_teacher(students, &["MATH101".to_string()]);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].full_name, "ana");
    }

    #[test]
    fn teacher_without_subjects_sees_nobody() {
        let students = vec![student("ana", Some("CPE16"))];
        assert!(visible_to_teacher(students, &[]).is_empty());
    }

    #[test]
    fn blank_subject_codes_never_match() {
        let ana = student("ana", Some("CPE16"));
        assert!(!ana.takes_any(&[String::new()]));
    }

    #[test]
    fn non_blank_trims_and_drops_empty() {
        assert_eq!(non_blank(Some("  04A1 ")), Some("04A1"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
