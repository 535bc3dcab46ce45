//! Booking repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{Booking, BookingDetails, BookingStatus, NewBooking};
use crate::domain::DomainResult;

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert a booking with status `Pending` and link its rooms.
    ///
    /// The overlap check and the insert are one atomic step: if a
    /// Pending/Approved booking on any of the rooms intersects the range,
    /// nothing is stored and `DomainError::Conflict` is returned.
    async fn create(&self, booking: NewBooking) -> DomainResult<BookingDetails>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<BookingDetails>>;

    /// All bookings, newest start first
    async fn find_all(&self) -> DomainResult<Vec<BookingDetails>>;

    /// Bookings owned by `user_id`, newest start first
    async fn find_by_user(&self, user_id: &str) -> DomainResult<Vec<BookingDetails>>;

    /// Pending/Approved bookings on any of `room_ids` whose range
    /// intersects `[start, end)`
    async fn find_overlapping(
        &self,
        room_ids: &[i32],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<Vec<Booking>>;

    /// Approved bookings with `from <= start_datetime <= to`, earliest first
    async fn find_approved_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<BookingDetails>>;

    /// Set status (transition rules are enforced by the caller)
    async fn update_status(&self, id: i32, status: BookingStatus) -> DomainResult<()>;
}
