use std::sync::Arc;

use rand::Rng;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{on_unique_violation, AppError, AppResult},
    models::{Account, Role},
};

use super::{auth::hash_password, mailer::Mailer};

const PASSWORD_CHARSET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$";

pub const GENERATED_PASSWORD_LEN: usize = 8;

pub fn generate_password(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| PASSWORD_CHARSET[rng.gen_range(0..PASSWORD_CHARSET.len())] as char)
        .collect()
}

/// Mails freshly generated login details to a new account holder.
pub async fn send_credentials(
    mailer: &dyn Mailer,
    account: &Account,
    plain_password: &str,
) -> AppResult<()> {
    let Some(email) = account.email.as_deref() else {
        tracing::warn!("Account {} has no email; credentials not sent", account.username);
        return Ok(());
    };

    let name = account.full_name.as_deref().unwrap_or(&account.username);
    let subject = match account.role {
        Role::Admin => "Admin Access Granted - Smart Attendance System",
        Role::Teacher => "Welcome to Smart Attendance - Your Credentials",
    };
    let body = format!(
        "Hello {},\n\nYour {} account for the Smart Attendance System is ready.\n\n\
         Username: {}\nPassword: {}\n\nPlease log in and change your password as soon as possible.\n",
        name,
        account.role.as_str(),
        account.username,
        plain_password
    );

    mailer.send_mail(email, subject, &body).await
}

pub struct AccountsService {
    db: PgPool,
    mailer: Arc<dyn Mailer>,
}

impl AccountsService {
    pub fn new(db: PgPool, mailer: Arc<dyn Mailer>) -> Self {
        Self { db, mailer }
    }

    pub async fn list(&self, role: Role) -> AppResult<Vec<Account>> {
        let accounts: Vec<Account> =
            sqlx::query_as("SELECT * FROM admins WHERE role = $1 ORDER BY created_at DESC")
                .bind(role)
                .fetch_all(&self.db)
                .await?;

        Ok(accounts)
    }

    /// Creates a teacher whose username is their teacher id.
    pub async fn create_teacher(
        &self,
        full_name: &str,
        email: &str,
        teacher_id: &str,
        rfid_uid: Option<&str>,
    ) -> AppResult<Account> {
        self.create(Role::Teacher, teacher_id, full_name, email, rfid_uid)
            .await
    }

    pub async fn create_admin(&self, full_name: &str, email: &str, username: &str) -> AppResult<Account> {
        self.create(Role::Admin, username, full_name, email, None).await
    }

    async fn create(
        &self,
        role: Role,
        username: &str,
        full_name: &str,
        email: &str,
        rfid_uid: Option<&str>,
    ) -> AppResult<Account> {
        let plain_password = generate_password(GENERATED_PASSWORD_LEN);

        let account: Account = sqlx::query_as(
            r#"
            INSERT INTO admins (id, username, password_hash, role, full_name, email, rfid_uid)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(hash_password(&plain_password)?)
        .bind(role)
        .bind(full_name)
        .bind(email)
        .bind(rfid_uid.filter(|u| !u.is_empty()))
        .fetch_one(&self.db)
        .await
        .map_err(|e| on_unique_violation(e, AppError::UsernameTaken))?;

        tracing::info!("Created {} account {}", role.as_str(), account.username);
        send_credentials(self.mailer.as_ref(), &account, &plain_password).await?;

        Ok(account)
    }

    pub async fn update(
        &self,
        role: Role,
        id: Uuid,
        full_name: Option<&str>,
        email: Option<&str>,
        rfid_uid: Option<&str>,
        password: Option<&str>,
    ) -> AppResult<Account> {
        let password_hash = match password.filter(|p| !p.is_empty()) {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        let account: Option<Account> = sqlx::query_as(
            r#"
            UPDATE admins
            SET full_name = COALESCE($3, full_name),
                email = COALESCE($4, email),
                rfid_uid = COALESCE($5, rfid_uid),
                password_hash = COALESCE($6, password_hash),
                updated_at = NOW()
            WHERE id = $1 AND role = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(role)
        .bind(full_name)
        .bind(email)
        .bind(rfid_uid)
        .bind(password_hash)
        .fetch_optional(&self.db)
        .await?;

        account.ok_or(AppError::AccountNotFound)
    }

    /// Unassigns the teacher from their schedules, then removes the account.
    pub async fn delete_teacher(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        sqlx::query("UPDATE schedules SET teacher_id = NULL, updated_at = NOW() WHERE teacher_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM admins WHERE id = $1 AND role = $2")
            .bind(id)
            .bind(Role::Teacher)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::AccountNotFound);
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn delete_admin(&self, caller_id: Uuid, id: Uuid) -> AppResult<()> {
        if caller_id == id {
            return Err(AppError::CannotDeleteSelf);
        }

        let result = sqlx::query("DELETE FROM admins WHERE id = $1 AND role = $2")
            .bind(id)
            .bind(Role::Admin)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::AccountNotFound);
        }

        Ok(())
    }

    /// Seeds an admin login when the table has none.
    pub async fn ensure_default_admin(&self, username: &str, password: &str) -> AppResult<()> {
        let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins WHERE role = $1")
            .bind(Role::Admin)
            .fetch_one(&self.db)
            .await?;

        if admins > 0 {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO admins (id, username, password_hash, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(hash_password(password)?)
        .bind(Role::Admin)
        .execute(&self.db)
        .await?;

        tracing::warn!("Seeded default admin '{}'; change its password", username);
        Ok(())
    }
}
