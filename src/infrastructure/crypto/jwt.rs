//! JWT access/refresh and password reset tokens

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::UserRole;

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Access token lifetime in minutes
    pub access_token_minutes: i64,
    /// Refresh token lifetime in days
    pub refresh_token_days: i64,
    /// Password reset token lifetime in hours
    pub password_reset_hours: i64,
    /// Issuer claim
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "insecure-development-secret-change-me".to_string(),
            access_token_minutes: 60,
            refresh_token_days: 1,
            password_reset_hours: 24,
            issuer: "room-booking".to_string(),
        }
    }
}

impl JwtConfig {
    /// Access token lifetime in seconds
    pub fn access_expires_in(&self) -> i64 {
        self.access_token_minutes * 60
    }

    fn lifetime(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => Duration::minutes(self.access_token_minutes),
            TokenKind::Refresh => Duration::days(self.refresh_token_days),
            TokenKind::PasswordReset => Duration::hours(self.password_reset_hours),
        }
    }
}

/// What a JWT may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
    PasswordReset,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access => f.write_str("access"),
            Self::Refresh => f.write_str("refresh"),
            Self::PasswordReset => f.write_str("password reset"),
        }
    }
}

/// JWT claims; `username` and `role` ride along with the standard ones
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    pub username: String,
    pub role: UserRole,
    pub token_type: TokenKind,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub iss: String,
    /// Unique token id
    pub jti: String,
}

impl TokenClaims {
    pub fn new(
        user_id: &str,
        username: &str,
        role: UserRole,
        kind: TokenKind,
        config: &JwtConfig,
    ) -> Self {
        let now = Utc::now();
        let exp = now + config.lifetime(kind);

        Self {
            sub: user_id.to_string(),
            username: username.to_string(),
            role,
            token_type: kind,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: config.issuer.clone(),
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Access + refresh token pair issued at login
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("expected a {expected} token")]
    WrongKind { expected: TokenKind },
    #[error("invalid token: {0}")]
    Invalid(jsonwebtoken::errors::Error),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e),
        }
    }
}

/// Create a single signed token
pub fn create_token(
    user_id: &str,
    username: &str,
    role: UserRole,
    kind: TokenKind,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = TokenClaims::new(user_id, username, role, kind, config);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Create an access/refresh pair for a user
pub fn create_token_pair(
    user_id: &str,
    username: &str,
    role: UserRole,
    config: &JwtConfig,
) -> Result<TokenPair, jsonwebtoken::errors::Error> {
    Ok(TokenPair {
        access: create_token(user_id, username, role, TokenKind::Access, config)?,
        refresh: create_token(user_id, username, role, TokenKind::Refresh, config)?,
        expires_in: config.access_expires_in(),
    })
}

/// Verify signature, issuer and expiry, and check the token kind
pub fn verify_token(
    token: &str,
    expected: TokenKind,
    config: &JwtConfig,
) -> Result<TokenClaims, TokenError> {
    let mut validation = Validation::default();
    validation.set_issuer(&[&config.issuer]);

    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;

    let claims = token_data.claims;
    if claims.is_expired() {
        return Err(TokenError::Expired);
    }
    if claims.token_type != expected {
        return Err(TokenError::WrongKind { expected });
    }
    Ok(claims)
}

/// Reset tokens are signed with the server secret plus the account's current
/// password hash, so a token stops verifying once the password changes.
fn password_reset_config(config: &JwtConfig, password_hash: &str) -> JwtConfig {
    JwtConfig {
        secret: format!("{}:{}", config.secret, password_hash),
        ..config.clone()
    }
}

/// Create a single-use password reset token for a user
pub fn create_password_reset_token(
    user_id: &str,
    username: &str,
    role: UserRole,
    password_hash: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    create_token(
        user_id,
        username,
        role,
        TokenKind::PasswordReset,
        &password_reset_config(config, password_hash),
    )
}

/// Verify a reset token against the account it claims to belong to
pub fn verify_password_reset_token(
    token: &str,
    user_id: &str,
    password_hash: &str,
    config: &JwtConfig,
) -> Result<TokenClaims, TokenError> {
    let claims = verify_token(
        token,
        TokenKind::PasswordReset,
        &password_reset_config(config, password_hash),
    )?;
    if claims.sub != user_id {
        return Err(TokenError::Invalid(ErrorKind::InvalidSubject.into()));
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".into(),
            ..JwtConfig::default()
        }
    }

    #[test]
    fn pair_round_trips_with_custom_claims() {
        let cfg = config();
        let pair = create_token_pair("u-1", "alice", UserRole::Admin, &cfg).unwrap();
        assert_eq!(pair.expires_in, 3600);

        let access = verify_token(&pair.access, TokenKind::Access, &cfg).unwrap();
        assert_eq!(access.sub, "u-1");
        assert_eq!(access.username, "alice");
        assert_eq!(access.role, UserRole::Admin);
        assert!(access.is_admin());

        let refresh = verify_token(&pair.refresh, TokenKind::Refresh, &cfg).unwrap();
        assert_eq!(refresh.token_type, TokenKind::Refresh);
        assert_ne!(access.jti, refresh.jti);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let cfg = config();
        let pair = create_token_pair("u-1", "bob", UserRole::Member, &cfg).unwrap();
        let err = verify_token(&pair.refresh, TokenKind::Access, &cfg).unwrap_err();
        assert!(matches!(err, TokenError::WrongKind { expected: TokenKind::Access }));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let cfg = config();
        let token = create_token("u-1", "bob", UserRole::Member, TokenKind::Access, &cfg).unwrap();
        let other = JwtConfig {
            secret: "another-secret".into(),
            ..config()
        };
        assert!(matches!(
            verify_token(&token, TokenKind::Access, &other),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let cfg = JwtConfig {
            access_token_minutes: -10,
            ..config()
        };
        let token = create_token("u-1", "bob", UserRole::Member, TokenKind::Access, &cfg).unwrap();
        assert!(matches!(
            verify_token(&token, TokenKind::Access, &cfg),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn reset_token_is_bound_to_password_hash() {
        let cfg = config();
        let token =
            create_password_reset_token("u-1", "bob", UserRole::Member, "$2b$04$old", &cfg)
                .unwrap();

        let claims = verify_password_reset_token(&token, "u-1", "$2b$04$old", &cfg).unwrap();
        assert_eq!(claims.token_type, TokenKind::PasswordReset);

        // password changed since issue
        assert!(matches!(
            verify_password_reset_token(&token, "u-1", "$2b$04$new", &cfg),
            Err(TokenError::Invalid(_))
        ));
        // issued for someone else
        assert!(matches!(
            verify_password_reset_token(&token, "u-2", "$2b$04$old", &cfg),
            Err(TokenError::Invalid(_))
        ));
        // not usable as a bearer token
        assert!(verify_token(&token, TokenKind::Access, &cfg).is_err());
    }
}
