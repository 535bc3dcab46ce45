//! Rooms, floors and bookings use-cases

pub mod service;

pub use service::{BookingRequest, BookingService};
