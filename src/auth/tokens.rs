/**
 * Token Codec
 *
 * Issues and verifies the four JWT kinds used by the service:
 *
 * | kind                 | carries               | default lifetime |
 * |----------------------|-----------------------|------------------|
 * | `access`             | id, email, role       | 15 minutes       |
 * | `refresh`            | id, email, token id   | 7 days           |
 * | `email_verification` | id, email             | 24 hours         |
 * | `password_reset`     | id, email             | 1 hour           |
 *
 * Each kind is signed with its own secret, so a leaked secret for one
 * kind cannot be used to forge another. Verification checks signature,
 * expiry (zero leeway), issuer, audience, and that the embedded `type`
 * claim matches the expected kind.
 */

use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::users::Role;

/// Token verification failure
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Signature was valid but `exp` has passed
    #[error("token expired")]
    Expired,
    /// Bad signature, malformed structure, wrong kind, or wrong issuer/audience
    #[error("invalid token")]
    Invalid,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        }
    }
}

/// The four token kinds, carried in the `type` claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
    EmailVerification,
    PasswordReset,
}

/// JWT claims structure shared by all four kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Account ID
    pub id: Uuid,
    /// Account email
    pub email: String,
    /// Role, present on access tokens only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Token kind discriminator
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Random per-token ID, present on refresh tokens only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<Uuid>,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
}

/// Signing configuration for the codec
///
/// Loaded from the environment by `server::config`; constructed
/// directly in tests.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub issuer: String,
    pub audience: String,
    pub access_secret: String,
    pub refresh_secret: String,
    pub email_secret: String,
    pub password_reset_secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
    pub email_ttl_secs: i64,
    pub password_reset_ttl_secs: i64,
}

/// Access + refresh token pair returned by register, login, and refresh
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Signs and verifies all four token kinds
#[derive(Debug, Clone)]
pub struct TokenCodec {
    config: TokenConfig,
}

impl TokenCodec {
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    /// Refresh token lifetime, used to stamp session expiry
    pub fn refresh_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.config.refresh_ttl_secs)
    }

    fn secret_for(&self, kind: TokenKind) -> &str {
        match kind {
            TokenKind::Access => &self.config.access_secret,
            TokenKind::Refresh => &self.config.refresh_secret,
            TokenKind::EmailVerification => &self.config.email_secret,
            TokenKind::PasswordReset => &self.config.password_reset_secret,
        }
    }

    fn ttl_for(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.config.access_ttl_secs,
            TokenKind::Refresh => self.config.refresh_ttl_secs,
            TokenKind::EmailVerification => self.config.email_ttl_secs,
            TokenKind::PasswordReset => self.config.password_reset_ttl_secs,
        }
    }

    fn issue(
        &self,
        kind: TokenKind,
        user_id: Uuid,
        email: &str,
        role: Option<Role>,
        token_id: Option<Uuid>,
    ) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            id: user_id,
            email: email.to_string(),
            role,
            kind,
            token_id,
            iat: now,
            exp: now + self.ttl_for(kind),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        let key = EncodingKey::from_secret(self.secret_for(kind).as_bytes());
        Ok(encode(&Header::default(), &claims, &key)?)
    }

    /// Issue an access token carrying id, email, and role
    pub fn issue_access(&self, user_id: Uuid, email: &str, role: Role) -> Result<String, TokenError> {
        self.issue(TokenKind::Access, user_id, email, Some(role), None)
    }

    /// Issue a refresh token with a random per-token ID
    pub fn issue_refresh(&self, user_id: Uuid, email: &str) -> Result<String, TokenError> {
        self.issue(TokenKind::Refresh, user_id, email, None, Some(Uuid::new_v4()))
    }

    /// Issue an email verification token
    pub fn issue_email_verification(&self, user_id: Uuid, email: &str) -> Result<String, TokenError> {
        self.issue(TokenKind::EmailVerification, user_id, email, None, None)
    }

    /// Issue a password reset token
    pub fn issue_password_reset(&self, user_id: Uuid, email: &str) -> Result<String, TokenError> {
        self.issue(TokenKind::PasswordReset, user_id, email, None, None)
    }

    /// Issue an access + refresh pair for a freshly authenticated account
    pub fn issue_pair(&self, user_id: Uuid, email: &str, role: Role) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access(user_id, email, role)?,
            refresh_token: self.issue_refresh(user_id, email)?,
            expires_in: self.config.access_ttl_secs,
        })
    }

    /// Verify a token of the expected kind and return its claims
    ///
    /// # Errors
    ///
    /// - `TokenError::Expired` when the signature is valid but `exp`
    ///   has passed (zero leeway)
    /// - `TokenError::Invalid` for a bad signature, malformed token,
    ///   wrong issuer/audience, or a `type` claim that does not match
    ///   `kind`
    pub fn verify(&self, kind: TokenKind, token: &str) -> Result<Claims, TokenError> {
        let key = DecodingKey::from_secret(self.secret_for(kind).as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        let data = decode::<Claims>(token, &key, &validation)?;

        if data.claims.kind != kind {
            return Err(TokenError::Invalid);
        }

        Ok(data.claims)
    }

    /// Decode claims without verifying the signature
    ///
    /// For advisory inspection only (e.g. showing a token's expiry);
    /// never use the result for authorization decisions.
    pub fn decode_unverified(token: &str) -> Option<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .ok()
            .map(|data| data.claims)
    }

    /// Expiration instant of a token, without verifying it
    pub fn token_expiration(token: &str) -> Option<DateTime<Utc>> {
        let claims = Self::decode_unverified(token)?;
        DateTime::from_timestamp(claims.exp, 0)
    }

    /// Whether a token's declared expiry has passed (unverified, advisory)
    pub fn is_expired(token: &str) -> bool {
        match Self::token_expiration(token) {
            Some(exp) => exp < Utc::now(),
            None => true,
        }
    }

    /// Extract the token from an `Authorization: Bearer <token>` header value
    pub fn extract_bearer(header: &str) -> Option<&str> {
        let mut parts = header.splitn(2, ' ');
        match (parts.next(), parts.next()) {
            (Some("Bearer"), Some(token)) if !token.is_empty() => Some(token),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn test_config() -> TokenConfig {
        TokenConfig {
            issuer: "mercato-api".to_string(),
            audience: "mercato-users".to_string(),
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            email_secret: "test-email-secret".to_string(),
            password_reset_secret: "test-reset-secret".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 7 * 24 * 3600,
            email_ttl_secs: 24 * 3600,
            password_reset_ttl_secs: 3600,
        }
    }

    fn codec() -> TokenCodec {
        TokenCodec::new(test_config())
    }

    #[test]
    fn test_access_roundtrip() {
        let codec = codec();
        let id = Uuid::new_v4();
        let token = codec.issue_access(id, "a@example.com", Role::User).unwrap();
        let claims = codec.verify(TokenKind::Access, &token).unwrap();

        assert_eq!(claims.id, id);
        assert_eq!(claims.email, "a@example.com");
        assert_eq!(claims.role, Some(Role::User));
        assert_eq!(claims.kind, TokenKind::Access);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_each_kind_roundtrips() {
        let codec = codec();
        let id = Uuid::new_v4();

        let refresh = codec.issue_refresh(id, "a@example.com").unwrap();
        let email = codec.issue_email_verification(id, "a@example.com").unwrap();
        let reset = codec.issue_password_reset(id, "a@example.com").unwrap();

        assert_eq!(
            codec.verify(TokenKind::Refresh, &refresh).unwrap().kind,
            TokenKind::Refresh
        );
        assert_eq!(
            codec.verify(TokenKind::EmailVerification, &email).unwrap().kind,
            TokenKind::EmailVerification
        );
        assert_eq!(
            codec.verify(TokenKind::PasswordReset, &reset).unwrap().kind,
            TokenKind::PasswordReset
        );
    }

    #[test]
    fn test_refresh_token_has_unique_id() {
        let codec = codec();
        let id = Uuid::new_v4();
        let first = codec.issue_refresh(id, "a@example.com").unwrap();
        let second = codec.issue_refresh(id, "a@example.com").unwrap();

        let first_id = codec.verify(TokenKind::Refresh, &first).unwrap().token_id;
        let second_id = codec.verify(TokenKind::Refresh, &second).unwrap().token_id;

        assert!(first_id.is_some());
        assert_ne!(first_id, second_id);
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let codec = codec();
        let token = codec
            .issue_email_verification(Uuid::new_v4(), "a@example.com")
            .unwrap();

        // An email token is signed with a different secret than access,
        // and even with matching secrets the `type` claim would differ.
        assert_matches!(
            codec.verify(TokenKind::Access, &token),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_type_claim_checked_under_shared_secret() {
        let mut config = test_config();
        config.password_reset_secret = config.email_secret.clone();
        let codec = TokenCodec::new(config);

        let token = codec
            .issue_email_verification(Uuid::new_v4(), "a@example.com")
            .unwrap();

        // Same secret, wrong declared kind: still rejected.
        assert_matches!(
            codec.verify(TokenKind::PasswordReset, &token),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_expired_token() {
        let mut config = test_config();
        config.access_ttl_secs = -10;
        let codec = TokenCodec::new(config);

        let token = codec
            .issue_access(Uuid::new_v4(), "a@example.com", Role::User)
            .unwrap();

        assert_matches!(
            codec.verify(TokenKind::Access, &token),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_tampered_token_rejected() {
        let codec = codec();
        let token = codec
            .issue_access(Uuid::new_v4(), "a@example.com", Role::User)
            .unwrap();

        let mut tampered = token.clone();
        // Flip the final signature character.
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        assert_matches!(
            codec.verify(TokenKind::Access, &tampered),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let codec = codec();
        let token = codec
            .issue_access(Uuid::new_v4(), "a@example.com", Role::User)
            .unwrap();

        let mut other = test_config();
        other.issuer = "someone-else".to_string();
        assert_matches!(
            TokenCodec::new(other).verify(TokenKind::Access, &token),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_malformed_token_rejected() {
        let codec = codec();
        assert_matches!(
            codec.verify(TokenKind::Access, "not.a.jwt"),
            Err(TokenError::Invalid)
        );
        assert_matches!(codec.verify(TokenKind::Access, ""), Err(TokenError::Invalid));
    }

    #[test]
    fn test_decode_unverified_reads_expired_token() {
        let mut config = test_config();
        config.access_ttl_secs = -10;
        let codec = TokenCodec::new(config);
        let id = Uuid::new_v4();
        let token = codec.issue_access(id, "a@example.com", Role::Admin).unwrap();

        let claims = TokenCodec::decode_unverified(&token).unwrap();
        assert_eq!(claims.id, id);
        assert!(TokenCodec::is_expired(&token));
    }

    #[test]
    fn test_decode_unverified_malformed() {
        assert!(TokenCodec::decode_unverified("garbage").is_none());
        assert!(TokenCodec::is_expired("garbage"));
    }

    #[test]
    fn test_issue_pair() {
        let codec = codec();
        let pair = codec
            .issue_pair(Uuid::new_v4(), "a@example.com", Role::User)
            .unwrap();

        assert_eq!(pair.expires_in, 900);
        assert!(codec.verify(TokenKind::Access, &pair.access_token).is_ok());
        assert!(codec.verify(TokenKind::Refresh, &pair.refresh_token).is_ok());
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(TokenCodec::extract_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(TokenCodec::extract_bearer("bearer abc"), None);
        assert_eq!(TokenCodec::extract_bearer("Basic abc"), None);
        assert_eq!(TokenCodec::extract_bearer("Bearer"), None);
        assert_eq!(TokenCodec::extract_bearer(""), None);
    }
}
