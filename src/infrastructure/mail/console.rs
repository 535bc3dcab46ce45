use async_trait::async_trait;
use tracing::info;

use crate::application::ports::{Mailer, OutgoingEmail};
use crate::shared::errors::InfraError;

/// Logs messages instead of delivering them. Used in development.
#[derive(Debug, Default, Clone)]
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), InfraError> {
        info!(
            to = %email.to,
            subject = %email.subject,
            "📧 Email (console backend)\n{}",
            email.body
        );
        Ok(())
    }
}
