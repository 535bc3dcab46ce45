//! Booking aggregate
//!
//! Contains the Booking entity, status lifecycle, reminder window, and
//! repository interface.

pub mod model;
pub mod repository;
pub mod window;

pub use model::{
    overlap_conflict, Booking, BookingDetails, BookingOwner, BookingStatus, NewBooking,
};
pub use repository::BookingRepository;
pub use window::{ReminderWindow, MAX_REMINDER_HOURS};
