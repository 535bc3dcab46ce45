//! Room aggregate: floors and the rooms placed on them.

pub mod model;
pub mod repository;

pub use model::{Floor, NewFloor, NewRoom, Room};
pub use repository::RoomRepository;
