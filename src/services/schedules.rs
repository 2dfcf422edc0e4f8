use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{AttendanceLogWithStudent, Role, Schedule, ScheduleSync, ScheduleWithTeacher},
};

use super::students::non_blank;

const WITH_TEACHER: &str = r#"
    SELECT s.*, COALESCE(a.full_name, 'Unassigned') AS teacher_name
    FROM schedules s
    LEFT JOIN admins a ON a.id = s.teacher_id
"#;

#[derive(Debug, Deserialize)]
pub struct ScheduleInput {
    pub subject_code: Option<String>,
    pub subject_name: Option<String>,
    pub time_start: Option<String>,
    pub time_end: Option<String>,
    pub days: Option<String>,
    pub grace_period: Option<serde_json::Value>,
    pub teacher_id: Option<Uuid>,
}

impl ScheduleInput {
    /// Grace period in minutes. Accepts a number or a numeric string; anything else is 0.
    pub fn grace_minutes(&self) -> i32 {
        match &self.grace_period {
            Some(serde_json::Value::Number(n)) => n.as_i64().unwrap_or(0) as i32,
            Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }
}

pub struct SchedulesService {
    db: PgPool,
}

impl SchedulesService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_for(&self, role: Role, account_id: Uuid) -> AppResult<Vec<ScheduleWithTeacher>> {
        let schedules: Vec<ScheduleWithTeacher> = match role {
            Role::Admin => {
                sqlx::query_as(&format!("{} ORDER BY s.time_start", WITH_TEACHER))
                    .fetch_all(&self.db)
                    .await?
            }
            Role::Teacher => {
                sqlx::query_as(&format!(
                    "{} WHERE s.teacher_id = $1 ORDER BY s.time_start",
                    WITH_TEACHER
                ))
                .bind(account_id)
                .fetch_all(&self.db)
                .await?
            }
        };

        Ok(schedules)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<ScheduleWithTeacher> {
        let schedule: Option<ScheduleWithTeacher> =
            sqlx::query_as(&format!("{} WHERE s.id = $1", WITH_TEACHER))
                .bind(id)
                .fetch_optional(&self.db)
                .await?;

        schedule.ok_or(AppError::ScheduleNotFound)
    }

    pub async fn by_kiosk(&self, kiosk_id: Uuid) -> AppResult<Vec<ScheduleWithTeacher>> {
        let schedules: Vec<ScheduleWithTeacher> = sqlx::query_as(&format!(
            "{} WHERE s.kiosk_id = $1 ORDER BY s.time_start",
            WITH_TEACHER
        ))
        .bind(kiosk_id)
        .fetch_all(&self.db)
        .await?;

        Ok(schedules)
    }

    /// Points a schedule at a kiosk, or detaches it when `kiosk_id` is `None`.
    pub async fn assign_to_kiosk(&self, schedule_id: Uuid, kiosk_id: Option<Uuid>) -> AppResult<()> {
        let result = sqlx::query("UPDATE schedules SET kiosk_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(schedule_id)
            .bind(kiosk_id)
            .execute(&self.db)
            .await
            .map_err(on_missing_kiosk)?;

        if result.rows_affected() == 0 {
            return Err(AppError::ScheduleNotFound);
        }

        Ok(())
    }

    pub async fn create(&self, input: ScheduleInput) -> AppResult<Schedule> {
        let (Some(code), Some(name), Some(start), Some(end)) = (
            non_blank(input.subject_code.as_deref()),
            non_blank(input.subject_name.as_deref()),
            non_blank(input.time_start.as_deref()),
            non_blank(input.time_end.as_deref()),
        ) else {
            return Err(AppError::Validation("Missing required fields".to_string()));
        };

        let schedule: Schedule = sqlx::query_as(
            r#"
            INSERT INTO schedules (id, subject_code, subject_name, time_start, time_end, days, grace_period, teacher_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(code)
        .bind(name)
        .bind(start)
        .bind(end)
        .bind(&input.days)
        .bind(input.grace_minutes())
        .bind(input.teacher_id)
        .fetch_one(&self.db)
        .await?;

        Ok(schedule)
    }

    pub async fn update(&self, id: Uuid, input: ScheduleInput) -> AppResult<Schedule> {
        let schedule: Option<Schedule> = sqlx::query_as(
            r#"
            UPDATE schedules
            SET subject_code = COALESCE($2, subject_code),
                subject_name = COALESCE($3, subject_name),
                time_start = COALESCE($4, time_start),
                time_end = COALESCE($5, time_end),
                days = COALESCE($6, days),
                grace_period = $7,
                teacher_id = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(non_blank(input.subject_code.as_deref()))
        .bind(non_blank(input.subject_name.as_deref()))
        .bind(non_blank(input.time_start.as_deref()))
        .bind(non_blank(input.time_end.as_deref()))
        .bind(&input.days)
        .bind(input.grace_minutes())
        .bind(input.teacher_id)
        .fetch_optional(&self.db)
        .await?;

        schedule.ok_or(AppError::ScheduleNotFound)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ScheduleNotFound);
        }

        Ok(())
    }

    pub async fn sync(&self) -> AppResult<Vec<ScheduleSync>> {
        let timetable: Vec<ScheduleSync> = sqlx::query_as(
            r#"
            SELECT subject_code, time_start, time_end, days, grace_period, kiosk_id
            FROM schedules
            ORDER BY time_start
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(timetable)
    }

    /// Attendance for the schedule's subject, optionally narrowed to one day.
    pub async fn logs(
        &self,
        id: Uuid,
        date: Option<NaiveDate>,
    ) -> AppResult<Vec<AttendanceLogWithStudent>> {
        let schedule = self.get(id).await?;

        let logs: Vec<AttendanceLogWithStudent> = sqlx::query_as(
            r#"
            SELECT l.*, COALESCE(st.full_name, 'Unknown Student') AS student_name
            FROM attendance_logs l
            LEFT JOIN students st ON st.student_id = l.student_id
            WHERE l.subject_code = $1
              AND ($2::date IS NULL OR l.date = $2)
            ORDER BY l.timestamp DESC
            "#,
        )
        .bind(&schedule.schedule.subject_code)
        .bind(date)
        .fetch_all(&self.db)
        .await?;

        Ok(logs)
    }
}

/// Maps a foreign-key violation on `kiosk_id` to `DeviceNotFound`.
pub(crate) fn on_missing_kiosk(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => AppError::DeviceNotFound,
        _ => AppError::Database(err),
    }
}
