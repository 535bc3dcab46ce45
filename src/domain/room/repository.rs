//! Room / floor repository interface

use async_trait::async_trait;

use super::model::{Floor, NewFloor, NewRoom, Room};
use crate::domain::DomainResult;

#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// All floors ordered by level, then name
    async fn list_floors(&self) -> DomainResult<Vec<Floor>>;

    async fn find_floor(&self, id: i32) -> DomainResult<Option<Floor>>;

    /// Floor names are unique; a duplicate yields `DomainError::Conflict`.
    async fn create_floor(&self, floor: NewFloor) -> DomainResult<Floor>;

    /// All rooms, optionally restricted to one floor, ordered by id
    async fn list_rooms(&self, floor_id: Option<i32>) -> DomainResult<Vec<Room>>;

    /// Rooms whose id is in `ids`; unknown ids are silently skipped
    async fn find_rooms_by_ids(&self, ids: &[i32]) -> DomainResult<Vec<Room>>;

    async fn create_room(&self, room: NewRoom) -> DomainResult<Room>;
}
