//! Outbound mail port

use async_trait::async_trait;

use crate::shared::errors::InfraError;

/// Plain-text message addressed to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivers email. Implementations must be safe to share between tasks.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), InfraError>;
}
