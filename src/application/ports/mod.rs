//! Application ports (hexagonal architecture boundaries)
//!
//! Outbound ports the application layer depends on; adapters live in
//! `infrastructure`.

pub mod mailer;

pub use mailer::{Mailer, OutgoingEmail};
