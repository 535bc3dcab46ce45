//! Room and floor DTOs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::{Floor, NewFloor, NewRoom, Room};

#[derive(Debug, Serialize, ToSchema)]
pub struct FloorDto {
    pub id: i32,
    pub name: String,
    pub level: i32,
}

impl From<Floor> for FloorDto {
    fn from(f: Floor) -> Self {
        Self {
            id: f.id,
            name: f.name,
            level: f.level,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoomDto {
    pub id: i32,
    pub name: String,
    pub capacity: i32,
    pub description: Option<String>,
    pub floor_id: i32,
    pub floor_name: String,
}

impl From<Room> for RoomDto {
    fn from(r: Room) -> Self {
        Self {
            id: r.id,
            name: r.name,
            capacity: r.capacity,
            description: r.description,
            floor_id: r.floor_id,
            floor_name: r.floor_name,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RoomsQuery {
    /// Only rooms on this floor
    pub floor_id: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFloorRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[serde(default)]
    pub level: i32,
}

impl From<CreateFloorRequest> for NewFloor {
    fn from(r: CreateFloorRequest) -> Self {
        Self {
            name: r.name,
            level: r.level,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRoomRequest {
    pub floor_id: i32,
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[validate(range(min = 1, max = 1000, message = "capacity must be 1-1000"))]
    pub capacity: i32,
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: Option<String>,
}

impl From<CreateRoomRequest> for NewRoom {
    fn from(r: CreateRoomRequest) -> Self {
        Self {
            floor_id: r.floor_id,
            name: r.name,
            capacity: r.capacity,
            description: r.description,
        }
    }
}
