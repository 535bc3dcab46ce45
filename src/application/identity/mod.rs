//! Identity module: registration & authentication
//!
//! Contains the `IdentityService` which orchestrates account use-cases:
//! registration, login, token refresh, password reset, current user lookup.

pub mod service;

pub use service::{
    AuthResult, IdentityService, PasswordResetSettings, RefreshedToken, RegisterUser,
};
