//! SMTP delivery via lettre

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use crate::application::ports::{Mailer, OutgoingEmail};
use crate::shared::errors::InfraError;

/// SMTP connection settings
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// STARTTLS upgrade; plain connection otherwise (local relays)
    pub starttls: bool,
    pub from: String,
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, InfraError> {
        let from: Mailbox = settings
            .from
            .parse()
            .map_err(|e| InfraError::Mail(format!("Invalid from address: {}", e)))?;

        let mut builder = if settings.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
                .map_err(|e| InfraError::Mail(format!("SMTP relay error: {}", e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
        };
        builder = builder.port(settings.port);

        if let (Some(user), Some(pass)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), InfraError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| InfraError::Mail(format!("Invalid to address: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| InfraError::Mail(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| InfraError::Mail(format!("Failed to send email: {}", e)))?;

        debug!("Email sent to {}", email.to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(from: &str) -> SmtpSettings {
        SmtpSettings {
            host: "localhost".into(),
            port: 2525,
            username: None,
            password: None,
            starttls: false,
            from: from.into(),
        }
    }

    #[tokio::test]
    async fn rejects_malformed_from_address() {
        assert!(matches!(
            SmtpMailer::new(&settings("not an address")),
            Err(InfraError::Mail(_))
        ));
    }

    #[tokio::test]
    async fn rejects_malformed_recipient_before_connecting() {
        let mailer = SmtpMailer::new(&settings("Rooms <rooms@example.com>")).unwrap();
        let err = mailer
            .send(&OutgoingEmail {
                to: "nobody".into(),
                subject: "s".into(),
                body: "b".into(),
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid to address"));
    }
}
