//! Room catalogue: floors and rooms

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
