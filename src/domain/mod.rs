pub mod booking;
pub mod repositories;
pub mod room;
pub mod user;

// Re-export commonly used types
pub use booking::{
    overlap_conflict, Booking, BookingDetails, BookingOwner, BookingRepository, BookingStatus, NewBooking,
    ReminderWindow, MAX_REMINDER_HOURS,
};
pub use repositories::{DomainResult, RepositoryProvider};
pub use room::{Floor, NewFloor, NewRoom, Room, RoomRepository};
pub use user::{CreateUserDto, User, UserRepository, UserRole};

pub use crate::shared::errors::DomainError;
