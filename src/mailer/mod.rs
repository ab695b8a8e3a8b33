/**
 * Mailer
 *
 * Outbound email behind a small trait so handlers never talk to SMTP
 * directly. The production implementation uses lettre's async SMTP
 * transport; when no credentials are configured the mailer runs in
 * disabled mode and returns simulated receipts, which keeps local
 * development working without an SMTP server.
 *
 * Registration and welcome mail are best-effort: handlers log a send
 * failure and carry on. Forgot-password treats a failure as fatal and
 * rolls back the stored reset state.
 */

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use uuid::Uuid;

mod templates;

pub use templates::{password_reset_email, verification_email, welcome_email};

/// Email delivery failure
#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("message build failed: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("smtp failure: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// A composed message ready for delivery
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
    pub reply_to: Option<String>,
}

/// Delivery receipt
#[derive(Debug, Clone)]
pub struct MailReceipt {
    pub message_id: String,
}

/// Outbound email delivery
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<MailReceipt, MailError>;
}

/// SMTP connection settings, loaded from the environment
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// `From` header, e.g. `"Mercato" <no-reply@mercato.example>`
    pub from: String,
}

/// SMTP-backed mailer
///
/// Runs in disabled mode (simulated receipts) when credentials are
/// absent from the configuration.
pub struct SmtpMailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let transport = match (&config.username, &config.password) {
            (Some(username), Some(password)) => {
                let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
                    .port(config.port)
                    .credentials(Credentials::new(username.clone(), password.clone()))
                    .build();
                Some(transport)
            }
            _ => {
                tracing::warn!("SMTP credentials not configured; outbound email is disabled");
                None
            }
        };

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<MailReceipt, MailError> {
        let Some(transport) = &self.transport else {
            tracing::debug!(to = %email.to, subject = %email.subject, "mailer disabled, simulating send");
            return Ok(MailReceipt {
                message_id: format!("simulated-{}", Uuid::new_v4()),
            });
        };

        let message_id = format!("<{}@mercato>", Uuid::new_v4());

        let mut builder = Message::builder()
            .from(self.from.parse()?)
            .to(email.to.parse()?)
            .subject(&email.subject)
            .message_id(Some(message_id.clone()));

        if let Some(reply_to) = &email.reply_to {
            builder = builder.reply_to(reply_to.parse()?);
        }

        let message = builder.multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(email.text),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(email.html),
                ),
        )?;

        transport.send(message).await?;
        tracing::info!(to = %email.to, subject = %email.subject, "email sent");

        Ok(MailReceipt { message_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disabled_mailer() -> SmtpMailer {
        SmtpMailer::new(&SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: None,
            password: None,
            from: "\"Mercato\" <no-reply@mercato.example>".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_disabled_mailer_simulates_send() {
        let mailer = disabled_mailer();
        let receipt = mailer
            .send(OutgoingEmail {
                to: "alice@example.com".to_string(),
                subject: "Hello".to_string(),
                html: "<p>Hi</p>".to_string(),
                text: "Hi".to_string(),
                reply_to: None,
            })
            .await
            .unwrap();

        assert!(receipt.message_id.starts_with("simulated-"));
    }
}
