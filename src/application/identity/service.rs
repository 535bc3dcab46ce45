//! Identity service: application-layer orchestration
//!
//! HTTP handlers are thin wrappers that delegate to this service.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::application::ports::{Mailer, OutgoingEmail};
use crate::domain::{CreateUserDto, DomainError, DomainResult, RepositoryProvider, User, UserRole};
use crate::infrastructure::crypto::jwt::{
    create_password_reset_token, create_token, create_token_pair, verify_password_reset_token,
    verify_token, JwtConfig, TokenKind, TokenPair,
};
use crate::infrastructure::crypto::password::{hash_password_with_cost, verify_password};
use crate::infrastructure::mail::ConsoleMailer;

/// Input for account registration
#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Authentication result returned after a successful login
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub tokens: TokenPair,
    pub user: User,
}

/// New access token issued from a refresh token
#[derive(Debug, Clone)]
pub struct RefreshedToken {
    pub access: String,
    pub expires_in: i64,
}

/// Where password reset links point; the link is `<link_base>/<uid>/<token>`
#[derive(Debug, Clone)]
pub struct PasswordResetSettings {
    pub link_base: String,
}

impl Default for PasswordResetSettings {
    fn default() -> Self {
        Self {
            link_base: "http://localhost:5173/reset-password".to_string(),
        }
    }
}

pub struct IdentityService {
    repos: Arc<dyn RepositoryProvider>,
    jwt_config: JwtConfig,
    password_cost: u32,
    mailer: Arc<dyn Mailer>,
    reset: PasswordResetSettings,
}

impl IdentityService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, jwt_config: JwtConfig, password_cost: u32) -> Self {
        Self {
            repos,
            jwt_config,
            password_cost,
            mailer: Arc::new(ConsoleMailer),
            reset: PasswordResetSettings::default(),
        }
    }

    /// Deliver password reset links through `mailer` instead of the log.
    pub fn with_password_reset(
        mut self,
        mailer: Arc<dyn Mailer>,
        settings: PasswordResetSettings,
    ) -> Self {
        self.mailer = mailer;
        self.reset = settings;
        self
    }

    pub fn jwt_config(&self) -> &JwtConfig {
        &self.jwt_config
    }

    fn hash(&self, password: &str) -> DomainResult<String> {
        hash_password_with_cost(password, self.password_cost)
            .map_err(|e| DomainError::Storage(format!("Failed to hash password: {}", e)))
    }

    // ── Registration ────────────────────────────────────────────

    /// Register a new member account.
    ///
    /// Field shape (lengths, email syntax) is checked by the HTTP layer.
    pub async fn register(&self, input: RegisterUser) -> DomainResult<User> {
        let users = self.repos.users();

        if users.get_user_by_username(&input.username).await?.is_some() {
            return Err(DomainError::Conflict("Username already exists".into()));
        }
        if users.get_user_by_email(&input.email).await?.is_some() {
            return Err(DomainError::Conflict("Email already exists".into()));
        }

        let user = users
            .create_user(CreateUserDto {
                username: input.username,
                email: input.email,
                role: UserRole::Member,
                password_hash: self.hash(&input.password)?,
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, "New user registered");
        Ok(user)
    }

    /// Create the initial admin account when no users exist yet.
    ///
    /// Returns `true` if an account was created.
    pub async fn ensure_default_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> DomainResult<bool> {
        if self.repos.users().count_users().await? > 0 {
            return Ok(false);
        }

        self.repos
            .users()
            .create_user(CreateUserDto {
                username: username.to_string(),
                email: email.to_string(),
                role: UserRole::Admin,
                password_hash: self.hash(password)?,
            })
            .await?;

        warn!(username, "Default admin account created; change its password");
        Ok(true)
    }

    // ── Authentication ──────────────────────────────────────────

    /// Authenticate by username or email + password and issue a token pair.
    pub async fn login(&self, username_or_email: &str, password: &str) -> DomainResult<AuthResult> {
        let users = self.repos.users();
        let user = match users.get_user_by_username(username_or_email).await? {
            Some(user) => Some(user),
            None => users.get_user_by_email(username_or_email).await?,
        };

        let Some(user) = user else {
            return Err(DomainError::Unauthorized("Invalid credentials".into()));
        };

        let valid = verify_password(password, &user.password_hash).unwrap_or(false);
        if !valid {
            return Err(DomainError::Unauthorized("Invalid credentials".into()));
        }

        if !user.is_active {
            return Err(DomainError::Unauthorized("Account is disabled".into()));
        }

        let tokens = create_token_pair(&user.id, &user.username, user.role, &self.jwt_config)
            .map_err(|e| DomainError::Storage(format!("Failed to create token: {}", e)))?;

        users.record_login(&user.id).await?;
        info!(user_id = %user.id, username = %user.username, "User logged in");

        Ok(AuthResult { tokens, user })
    }

    /// Exchange a refresh token for a fresh access token.
    ///
    /// The account is re-read so that role changes and deactivation apply.
    pub async fn refresh(&self, refresh_token: &str) -> DomainResult<RefreshedToken> {
        let claims = verify_token(refresh_token, TokenKind::Refresh, &self.jwt_config)
            .map_err(|e| DomainError::Unauthorized(e.to_string()))?;

        let user = match self.repos.users().get_user_by_id(&claims.sub).await? {
            Some(user) if user.is_active => user,
            _ => return Err(DomainError::Unauthorized("Account is not available".into())),
        };

        let access = create_token(
            &user.id,
            &user.username,
            user.role,
            TokenKind::Access,
            &self.jwt_config,
        )
        .map_err(|e| DomainError::Storage(format!("Failed to create token: {}", e)))?;

        Ok(RefreshedToken {
            access,
            expires_in: self.jwt_config.access_expires_in(),
        })
    }

    // ── Password reset ──────────────────────────────────────────

    /// Email a reset link to the account registered under `email`.
    ///
    /// Succeeds whether or not such an account exists.
    pub async fn request_password_reset(&self, email: &str) -> DomainResult<()> {
        let user = match self.repos.users().get_user_by_email(email).await? {
            Some(user) if user.is_active => user,
            _ => {
                info!("Password reset requested for unknown or inactive email");
                return Ok(());
            }
        };

        let token = create_password_reset_token(
            &user.id,
            &user.username,
            user.role,
            &user.password_hash,
            &self.jwt_config,
        )
        .map_err(|e| DomainError::Storage(format!("Failed to create token: {}", e)))?;

        let email = self.password_reset_email(&user, &token);
        match self.mailer.send(&email).await {
            Ok(()) => info!(user_id = %user.id, "Password reset link sent"),
            Err(e) => error!(user_id = %user.id, error = %e, "Failed to send password reset link"),
        }
        Ok(())
    }

    /// Set a new password if `token` is a live reset token for `user_id`.
    ///
    /// A token works once: changing the password invalidates it.
    pub async fn confirm_password_reset(
        &self,
        user_id: &str,
        token: &str,
        new_password: &str,
    ) -> DomainResult<()> {
        let invalid = || DomainError::field("token", "Invalid or expired reset link");

        let user = match self.repos.users().get_user_by_id(user_id).await? {
            Some(user) if user.is_active => user,
            _ => return Err(invalid()),
        };

        verify_password_reset_token(token, &user.id, &user.password_hash, &self.jwt_config)
            .map_err(|_| invalid())?;

        let hash = self.hash(new_password)?;
        self.repos.users().update_password(&user.id, &hash).await?;

        info!(user_id = %user.id, username = %user.username, "Password reset completed");
        Ok(())
    }

    fn password_reset_email(&self, user: &User, token: &str) -> OutgoingEmail {
        let link = format!(
            "{}/{}/{}",
            self.reset.link_base.trim_end_matches('/'),
            user.id,
            token
        );
        OutgoingEmail {
            to: user.email.clone(),
            subject: "Reset your password".to_string(),
            body: format!(
                "Hello {},\n\n\
                 A password reset was requested for your account. Open the link below\n\
                 to choose a new password:\n\n{}\n\n\
                 The link will expire in {} hours. If you did not ask for this,\n\
                 you can ignore this email.\n",
                user.username, link, self.jwt_config.password_reset_hours
            ),
        }
    }

    // ── Queries ─────────────────────────────────────────────────

    pub async fn current_user(&self, user_id: &str) -> DomainResult<User> {
        self.repos
            .users()
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", "id", user_id))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::infrastructure::storage::InMemoryStorage;
    use crate::shared::errors::InfraError;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "identity-test-secret".into(),
            ..JwtConfig::default()
        }
    }

    fn service() -> IdentityService {
        IdentityService::new(Arc::new(InMemoryStorage::new()), config(), 4)
    }

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), InfraError> {
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    /// Service whose reset emails land in the returned mailer
    fn service_with_mailer() -> (IdentityService, Arc<RecordingMailer>, Arc<InMemoryStorage>) {
        let storage = Arc::new(InMemoryStorage::new());
        let mailer = Arc::new(RecordingMailer::default());
        let svc = IdentityService::new(storage.clone(), config(), 4).with_password_reset(
            mailer.clone(),
            PasswordResetSettings {
                link_base: "https://rooms.example.com/reset/".into(),
            },
        );
        (svc, mailer, storage)
    }

    /// Pull `(uid, token)` out of the link in a reset email
    fn link_parts(email: &OutgoingEmail) -> (String, String) {
        let link = email
            .body
            .lines()
            .find(|l| l.starts_with("https://rooms.example.com/reset/"))
            .unwrap();
        let mut parts = link.trim_start_matches("https://rooms.example.com/reset/").split('/');
        (
            parts.next().unwrap().to_string(),
            parts.next().unwrap().to_string(),
        )
    }

    fn alice() -> RegisterUser {
        RegisterUser {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "correct horse".into(),
        }
    }

    #[tokio::test]
    async fn register_creates_member() {
        let svc = service();
        let user = svc.register(alice()).await.unwrap();
        assert_eq!(user.role, UserRole::Member);
        assert_ne!(user.password_hash, "correct horse");
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let svc = service();
        svc.register(alice()).await.unwrap();
        let mut again = alice();
        again.username = "alice2".into();
        assert!(matches!(
            svc.register(again).await,
            Err(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn login_by_username_or_email() {
        let svc = service();
        svc.register(alice()).await.unwrap();

        let by_name = svc.login("alice", "correct horse").await.unwrap();
        let by_mail = svc.login("alice@example.com", "correct horse").await.unwrap();
        assert_eq!(by_name.user.id, by_mail.user.id);

        let claims = verify_token(&by_name.tokens.access, TokenKind::Access, svc.jwt_config()).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, UserRole::Member);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let svc = service();
        svc.register(alice()).await.unwrap();
        assert!(matches!(
            svc.login("alice", "nope").await,
            Err(DomainError::Unauthorized(_))
        ));
        assert!(matches!(
            svc.login("bob", "correct horse").await,
            Err(DomainError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn refresh_requires_refresh_token() {
        let svc = service();
        svc.register(alice()).await.unwrap();
        let auth = svc.login("alice", "correct horse").await.unwrap();

        let refreshed = svc.refresh(&auth.tokens.refresh).await.unwrap();
        assert!(verify_token(&refreshed.access, TokenKind::Access, svc.jwt_config()).is_ok());

        assert!(matches!(
            svc.refresh(&auth.tokens.access).await,
            Err(DomainError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn default_admin_only_on_empty_store() {
        let svc = service();
        assert!(svc.ensure_default_admin("admin", "admin@example.com", "adminpass").await.unwrap());
        assert!(!svc.ensure_default_admin("admin2", "a2@example.com", "adminpass").await.unwrap());

        let auth = svc.login("admin", "adminpass").await.unwrap();
        assert_eq!(auth.user.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn disabled_account_is_only_reported_after_password_check() {
        let (svc, _, storage) = service_with_mailer();
        let user = svc.register(alice()).await.unwrap();
        storage.set_user_active(&user.id, false);

        let Err(DomainError::Unauthorized(msg)) = svc.login("alice", "wrong password").await else {
            panic!("expected unauthorized");
        };
        assert_eq!(msg, "Invalid credentials");

        let Err(DomainError::Unauthorized(msg)) = svc.login("alice", "correct horse").await else {
            panic!("expected unauthorized");
        };
        assert_eq!(msg, "Account is disabled");
    }

    #[tokio::test]
    async fn password_reset_round_trip() {
        let (svc, mailer, _) = service_with_mailer();
        let user = svc.register(alice()).await.unwrap();

        svc.request_password_reset("alice@example.com").await.unwrap();
        let email = mailer.sent.lock().unwrap().pop().unwrap();
        assert_eq!(email.to, "alice@example.com");
        assert!(email.body.contains("expire in 24 hours"));

        let (uid, token) = link_parts(&email);
        assert_eq!(uid, user.id);

        svc.confirm_password_reset(&uid, &token, "brand new secret")
            .await
            .unwrap();
        assert!(svc.login("alice", "brand new secret").await.is_ok());
        assert!(svc.login("alice", "correct horse").await.is_err());

        // the same link cannot be used twice
        let err = svc
            .confirm_password_reset(&uid, &token, "another secret")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::FieldValidation(ref f) if f.contains_key("token")));
    }

    #[tokio::test]
    async fn password_reset_for_unknown_email_is_silent() {
        let (svc, mailer, _) = service_with_mailer();
        svc.register(alice()).await.unwrap();

        svc.request_password_reset("nobody@example.com").await.unwrap();
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reset_token_for_one_user_does_not_work_for_another() {
        let (svc, mailer, _) = service_with_mailer();
        svc.register(alice()).await.unwrap();
        let bob = svc
            .register(RegisterUser {
                username: "bob".into(),
                email: "bob@example.com".into(),
                password: "bob password".into(),
            })
            .await
            .unwrap();

        svc.request_password_reset("alice@example.com").await.unwrap();
        let (_, token) = link_parts(&mailer.sent.lock().unwrap()[0]);

        assert!(svc
            .confirm_password_reset(&bob.id, &token, "hijacked!!")
            .await
            .is_err());
        assert!(svc
            .confirm_password_reset("missing", &token, "hijacked!!")
            .await
            .is_err());
        assert!(svc.login("bob", "bob password").await.is_ok());
    }
}
