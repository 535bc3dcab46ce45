//! Authentication module: register, login, token refresh, password reset,
//! current user

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
