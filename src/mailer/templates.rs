//! Email templates
//!
//! Plain-text and HTML bodies for the three transactional emails the
//! auth flows send. Links point at the configured frontend URL.

use crate::mailer::OutgoingEmail;

/// Email-verification message with the signed verification link
pub fn verification_email(to: &str, name: &str, verification_url: &str) -> OutgoingEmail {
    let subject = "Verify your Mercato account".to_string();
    let text = format!(
        "Hi {name},\n\n\
         Welcome to Mercato! Please verify your email address by opening the link below:\n\n\
         {verification_url}\n\n\
         The link expires in 24 hours. If you did not create this account, you can ignore this email.\n"
    );
    let html = format!(
        "<h2>Hi {name},</h2>\
         <p>Welcome to Mercato! Please verify your email address:</p>\
         <p><a href=\"{verification_url}\">Verify my email</a></p>\
         <p>The link expires in 24 hours. If you did not create this account, you can ignore this email.</p>"
    );

    OutgoingEmail {
        to: to.to_string(),
        subject,
        html,
        text,
        reply_to: None,
    }
}

/// Password-reset message with the signed reset link
pub fn password_reset_email(to: &str, name: &str, reset_url: &str) -> OutgoingEmail {
    let subject = "Reset your Mercato password".to_string();
    let text = format!(
        "Hi {name},\n\n\
         We received a request to reset your password. Open the link below to choose a new one:\n\n\
         {reset_url}\n\n\
         The link expires in 1 hour. If you did not request a reset, you can ignore this email.\n"
    );
    let html = format!(
        "<h2>Hi {name},</h2>\
         <p>We received a request to reset your password:</p>\
         <p><a href=\"{reset_url}\">Reset my password</a></p>\
         <p>The link expires in 1 hour. If you did not request a reset, you can ignore this email.</p>"
    );

    OutgoingEmail {
        to: to.to_string(),
        subject,
        html,
        text,
        reply_to: None,
    }
}

/// Welcome message sent after a successful email verification
pub fn welcome_email(to: &str, name: &str) -> OutgoingEmail {
    let subject = "Welcome to Mercato!".to_string();
    let text = format!(
        "Hi {name},\n\n\
         Your email is verified and your account is ready. Happy shopping!\n"
    );
    let html = format!(
        "<h2>Hi {name},</h2>\
         <p>Your email is verified and your account is ready. Happy shopping!</p>"
    );

    OutgoingEmail {
        to: to.to_string(),
        subject,
        html,
        text,
        reply_to: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_email_carries_link() {
        let email = verification_email(
            "alice@example.com",
            "alice",
            "https://shop.example/verify-email?token=abc",
        );
        assert_eq!(email.to, "alice@example.com");
        assert!(email.html.contains("https://shop.example/verify-email?token=abc"));
        assert!(email.text.contains("https://shop.example/verify-email?token=abc"));
        assert!(email.subject.contains("Verify"));
    }

    #[test]
    fn test_reset_email_carries_link() {
        let email = password_reset_email(
            "alice@example.com",
            "alice",
            "https://shop.example/reset-password?token=abc",
        );
        assert!(email.html.contains("reset-password?token=abc"));
        assert!(email.text.contains("reset-password?token=abc"));
    }

    #[test]
    fn test_welcome_email_addresses_user() {
        let email = welcome_email("alice@example.com", "alice");
        assert!(email.text.contains("alice"));
        assert!(email.html.contains("alice"));
    }
}
