//! Booking domain entity

use chrono::{DateTime, Utc};

use crate::domain::room::Room;
use crate::shared::errors::DomainError;

/// Booking status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingStatus {
    /// Awaiting approval (initial state)
    Pending,
    /// Confirmed; eligible for reminders
    Approved,
    /// Withdrawn or rejected (terminal)
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(Self::Pending),
            "Approved" => Some(Self::Approved),
            "Cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Whether a booking in this status still occupies its rooms
    pub fn holds_rooms(&self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }

    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Cancelled)
                | (Self::Approved, Self::Cancelled)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Booking of one or more rooms by a single user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub id: i32,
    pub user_id: String,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub purpose: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Whether `[start, end)` intersects this booking's time range
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_datetime < end && start < self.end_datetime
    }
}

/// Conflict returned when a new booking would double-book a room
pub fn overlap_conflict(clashes: &[Booking]) -> DomainError {
    let ids: Vec<String> = clashes.iter().map(|b| b.id.to_string()).collect();
    DomainError::Conflict(format!(
        "Requested rooms are already booked for this time (booking {})",
        ids.join(", ")
    ))
}

/// The account a booking belongs to, as needed for display and email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingOwner {
    pub id: String,
    pub username: String,
    pub email: String,
}

/// Booking together with its owner and booked rooms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDetails {
    pub booking: Booking,
    pub owner: BookingOwner,
    pub rooms: Vec<Room>,
}

/// Validated data for inserting a booking. Status is always `Pending`.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: String,
    pub room_ids: Vec<i32>,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub purpose: Option<String>,
}
