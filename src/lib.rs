//! # Room Booking Service
//!
//! Backend for reserving meeting rooms: members book one or more rooms for a
//! time slot, admins manage floors and rooms and see every booking, and a
//! scheduled job emails reminders for approved bookings that start soon.
//!
//! ## Architecture
//!
//! - **domain**: Users, floors, rooms and bookings plus repository traits
//! - **application**: Identity, booking and reminder use cases
//! - **infrastructure**: SeaORM persistence, in-memory storage, crypto, mail
//! - **interfaces**: REST API with Swagger documentation
//! - **server**: Runtime bootstrap shared by the binaries

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::database::repositories::SeaOrmRepositoryProvider;
pub use infrastructure::{init_database, run_migrations, DatabaseConfig, InMemoryStorage};

// Re-export API router
pub use interfaces::http::{create_api_router, ApiContext};
