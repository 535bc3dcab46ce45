//! Token signing, password hashing and secret generation

pub mod jwt;
pub mod password;
pub mod secret_key;
