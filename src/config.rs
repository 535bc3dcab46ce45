//! Application configuration
//!
//! Loaded from a TOML file (default `~/.config/room-booking/config.toml`).
//! Every section is optional; missing keys fall back to defaults. A handful
//! of secrets can be supplied through the environment (or a `.env` file)
//! instead of the file:
//!
//! | Variable        | Overrides                |
//! |-----------------|--------------------------|
//! | `SECRET_KEY`    | `security.secret_key`    |
//! | `DATABASE_URL`  | `database.url`           |
//! | `SMTP_HOST`     | `email.smtp.host`        |
//! | `SMTP_USER`     | `email.smtp.username`    |
//! | `SMTP_PASSWORD` | `email.smtp.password`    |

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::application::PasswordResetSettings;
use crate::domain::MAX_REMINDER_HOURS;
use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::infrastructure::mail::SmtpSettings;
use crate::infrastructure::DatabaseConfig;
use crate::shared::errors::InfraError;

pub const DEFAULT_SECRET_KEY: &str = "insecure-development-secret-change-me";

/// Default location of the configuration file
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("room-booking")
        .join("config.toml")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
    pub admin: AdminConfig,
    pub email: EmailConfig,
    pub reminders: RemindersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            shutdown_timeout: 30,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: DatabaseConfig::default().url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// HS256 signing key for access and refresh tokens
    pub secret_key: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    /// Lifetime of password reset links
    pub password_reset_hours: i64,
    /// bcrypt cost factor
    pub password_cost: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            secret_key: DEFAULT_SECRET_KEY.to_string(),
            access_token_minutes: 60,
            refresh_token_days: 1,
            password_reset_hours: 24,
            password_cost: bcrypt::DEFAULT_COST,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn`, `error` or a full `EnvFilter` directive
    pub level: String,
    /// `json` or `pretty`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Account created on first start when the users table is empty
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            email: "admin@localhost".to_string(),
            password: "admin12345".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailBackend {
    Smtp,
    #[default]
    Console,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub backend: EmailBackend,
    /// Sender address, e.g. `Room Booking <noreply@example.com>`
    pub from: String,
    /// Frontend page that accepts `<uid>/<token>` for a password reset
    pub reset_url: String,
    pub smtp: SmtpConfig,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            backend: EmailBackend::Console,
            from: "noreply@localhost".to_string(),
            reset_url: PasswordResetSettings::default().link_base,
            smtp: SmtpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub starttls: bool,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 587,
            username: None,
            password: None,
            starttls: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemindersConfig {
    pub default_hours: i64,
}

impl Default for RemindersConfig {
    fn default() -> Self {
        Self { default_hours: 24 }
    }
}

impl AppConfig {
    /// Read the TOML file at `path` and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, InfraError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| InfraError::Config(format!("{}: {}", path.display(), e)))?;
        let mut config = Self::from_toml(&raw)?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, InfraError> {
        toml::from_str(raw).map_err(|e| InfraError::Config(e.to_string()))
    }

    /// Defaults plus environment overrides; used when no file can be read.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = lookup("SECRET_KEY") {
            self.security.secret_key = v;
        }
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = lookup("SMTP_HOST") {
            self.email.smtp.host = v;
        }
        if let Some(v) = lookup("SMTP_USER") {
            self.email.smtp.username = Some(v);
        }
        if let Some(v) = lookup("SMTP_PASSWORD") {
            self.email.smtp.password = Some(v);
        }
    }

    /// Reject settings the server cannot start with.
    pub fn validate(&self) -> Result<(), InfraError> {
        if self.security.secret_key.trim().is_empty() {
            return Err(InfraError::Config("security.secret_key is empty".into()));
        }
        if self.security.access_token_minutes <= 0 || self.security.refresh_token_days <= 0 {
            return Err(InfraError::Config("token lifetimes must be positive".into()));
        }
        if !(1..=720).contains(&self.security.password_reset_hours) {
            return Err(InfraError::Config(
                "security.password_reset_hours must be between 1 and 720".into(),
            ));
        }
        if !(4..=31).contains(&self.security.password_cost) {
            return Err(InfraError::Config(
                "security.password_cost must be between 4 and 31".into(),
            ));
        }
        if !(0..=MAX_REMINDER_HOURS).contains(&self.reminders.default_hours) {
            return Err(InfraError::Config(format!(
                "reminders.default_hours must be between 0 and {}",
                MAX_REMINDER_HOURS
            )));
        }
        if self.email.backend == EmailBackend::Smtp && self.email.smtp.host.trim().is_empty() {
            return Err(InfraError::Config("email.smtp.host is required for smtp backend".into()));
        }
        Ok(())
    }

    pub fn uses_default_secret(&self) -> bool {
        self.security.secret_key == DEFAULT_SECRET_KEY
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database.url.clone())
    }

    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.security.secret_key.clone(),
            access_token_minutes: self.security.access_token_minutes,
            refresh_token_days: self.security.refresh_token_days,
            password_reset_hours: self.security.password_reset_hours,
            ..JwtConfig::default()
        }
    }

    pub fn password_reset_settings(&self) -> PasswordResetSettings {
        PasswordResetSettings {
            link_base: self.email.reset_url.clone(),
        }
    }

    pub fn smtp_settings(&self) -> SmtpSettings {
        let smtp = &self.email.smtp;
        SmtpSettings {
            host: smtp.host.clone(),
            port: smtp.port,
            username: smtp.username.clone(),
            password: smtp.password.clone(),
            starttls: smtp.starttls,
            from: self.email.from.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = AppConfig::from_toml("").unwrap();
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.reminders.default_hours, 24);
        assert_eq!(cfg.email.backend, EmailBackend::Console);
        assert!(cfg.uses_default_secret());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [server]
            port = 9100

            [email]
            backend = "smtp"
            from = "bookings@example.com"

            [email.smtp]
            host = "smtp.example.com"
            port = 2525
            starttls = false
            "#,
        )
        .unwrap();

        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.email.backend, EmailBackend::Smtp);

        let smtp = cfg.smtp_settings();
        assert_eq!(smtp.host, "smtp.example.com");
        assert_eq!(smtp.port, 2525);
        assert!(!smtp.starttls);
        assert_eq!(smtp.from, "bookings@example.com");
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = AppConfig::from_toml("[server\nport = ").unwrap_err();
        assert!(matches!(err, InfraError::Config(_)));
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("SECRET_KEY", "from-env"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("SMTP_USER", "mailer"),
            ("SMTP_PASSWORD", "hunter22"),
            ("SMTP_HOST", "   "),
        ]
        .into_iter()
        .collect();

        let mut cfg = AppConfig::default();
        cfg.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(cfg.security.secret_key, "from-env");
        assert_eq!(cfg.database.url, "sqlite::memory:");
        assert_eq!(cfg.email.smtp.username.as_deref(), Some("mailer"));
        assert_eq!(cfg.email.smtp.password.as_deref(), Some("hunter22"));
        // blank values are ignored
        assert_eq!(cfg.email.smtp.host, "localhost");
    }

    #[test]
    fn jwt_config_follows_security_section() {
        let mut cfg = AppConfig::default();
        cfg.security.secret_key = "k".repeat(50);
        cfg.security.access_token_minutes = 15;

        let jwt = cfg.jwt_config();
        assert_eq!(jwt.secret, cfg.security.secret_key);
        assert_eq!(jwt.access_expires_in(), 15 * 60);
        assert_eq!(jwt.refresh_token_days, 1);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = AppConfig::default();
        cfg.security.secret_key = " ".into();
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.reminders.default_hours = -1;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.security.password_cost = 2;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.security.password_reset_hours = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn reminder_hours_have_an_upper_bound() {
        let mut cfg = AppConfig::default();
        cfg.reminders.default_hours = MAX_REMINDER_HOURS;
        assert!(cfg.validate().is_ok());

        cfg.reminders.default_hours = MAX_REMINDER_HOURS + 1;
        assert!(matches!(cfg.validate(), Err(InfraError::Config(_))));

        let cfg = AppConfig::from_toml("[reminders]\ndefault_hours = 9223372036854775807").unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn password_reset_settings_follow_config() {
        let cfg = AppConfig::from_toml(
            r#"
            [security]
            password_reset_hours = 2

            [email]
            reset_url = "https://rooms.example.com/reset-password"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.jwt_config().password_reset_hours, 2);
        assert_eq!(
            cfg.password_reset_settings().link_base,
            "https://rooms.example.com/reset-password"
        );
    }

    #[test]
    fn default_path_ends_with_app_dir() {
        let path = default_config_path();
        assert!(path.ends_with("room-booking/config.toml"));
    }
}
