//! Database entities module

pub mod booking;
pub mod booking_room;
pub mod floor;
pub mod room;
pub mod user;

pub use booking::Entity as Booking;
pub use booking_room::Entity as BookingRoom;
pub use floor::Entity as Floor;
pub use room::Entity as Room;
pub use user::Entity as User;
