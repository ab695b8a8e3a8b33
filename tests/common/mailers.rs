//! Test mailers
//!
//! A recording mailer that captures outgoing messages for assertions,
//! and a failing mailer for exercising delivery-failure paths.

use std::sync::Mutex;

use async_trait::async_trait;
use mercato::mailer::{MailError, MailReceipt, Mailer, OutgoingEmail};

/// Captures every message instead of sending it
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<MailReceipt, MailError> {
        let mut sent = self.sent.lock().expect("mailer mutex poisoned");
        sent.push(email);
        Ok(MailReceipt {
            message_id: format!("recorded-{}", sent.len()),
        })
    }
}

/// Fails every send with an address error
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _email: OutgoingEmail) -> Result<MailReceipt, MailError> {
        Err(MailError::Address(
            "not-an-address".parse::<lettre::Address>().unwrap_err(),
        ))
    }
}
