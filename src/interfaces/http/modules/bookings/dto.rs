//! Booking DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::BookingRequest;
use crate::domain::BookingDetails;
use crate::interfaces::http::modules::rooms::RoomDto;

/// Request to book one or more rooms
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookingRequest {
    /// Rooms to book; duplicates are ignored
    #[validate(length(min = 1, message = "at least one room is required"))]
    pub room_ids: Vec<i32>,
    /// RFC 3339 timestamp
    pub start_datetime: DateTime<Utc>,
    /// RFC 3339 timestamp, after `start_datetime`
    pub end_datetime: DateTime<Utc>,
    #[validate(length(max = 500, message = "purpose must be at most 500 characters"))]
    pub purpose: Option<String>,
    /// Owner of the booking (admins only; defaults to the caller)
    pub user_id: Option<String>,
}

impl From<CreateBookingRequest> for BookingRequest {
    fn from(r: CreateBookingRequest) -> Self {
        Self {
            room_ids: r.room_ids,
            start_datetime: r.start_datetime,
            end_datetime: r.end_datetime,
            purpose: r.purpose.filter(|p| !p.trim().is_empty()),
            user_id: r.user_id,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBookingStatusRequest {
    /// `Pending`, `Approved` or `Cancelled`
    #[validate(length(min = 1, message = "status is required"))]
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingOwnerDto {
    pub id: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingDto {
    pub id: i32,
    pub user: BookingOwnerDto,
    pub rooms: Vec<RoomDto>,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub purpose: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BookingDetails> for BookingDto {
    fn from(d: BookingDetails) -> Self {
        Self {
            id: d.booking.id,
            user: BookingOwnerDto {
                id: d.owner.id,
                username: d.owner.username,
                email: d.owner.email,
            },
            rooms: d.rooms.into_iter().map(RoomDto::from).collect(),
            start_datetime: d.booking.start_datetime,
            end_datetime: d.booking.end_datetime,
            purpose: d.booking.purpose,
            status: d.booking.status.as_str().to_string(),
            created_at: d.booking.created_at,
            updated_at: d.booking.updated_at,
        }
    }
}
