use async_trait::async_trait;

use crate::error::AppResult;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_mail(&self, to: &str, subject: &str, body: &str) -> AppResult<()>;
}

/// Writes outgoing mail to the log instead of a transport.
pub struct LogMailer {
    from: String,
    development: bool,
}

impl LogMailer {
    pub fn new(from: impl Into<String>, development: bool) -> Self {
        Self {
            from: from.into(),
            development,
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_mail(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        // In development, the body (with credentials) goes to the log
        if self.development {
            tracing::info!("Mail from {} to {}: {}\n{}", self.from, to, subject, body);
            return Ok(());
        }

        // TODO: plug an SMTP transport in here once the school's relay host is provisioned
        tracing::warn!("Mail transport not configured; dropped \"{}\" to {}", subject, to);
        Ok(())
    }
}
