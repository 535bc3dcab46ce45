//! Booking service: room catalogue and booking lifecycle

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::application::Caller;
use crate::domain::{
    BookingDetails, BookingStatus, DomainError, DomainResult, Floor, NewBooking, NewFloor,
    NewRoom, RepositoryProvider, Room,
};
use crate::shared::errors::FieldErrors;

/// Booking creation input after JSON decoding
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub room_ids: Vec<i32>,
    pub start_datetime: DateTime<Utc>,
    pub end_datetime: DateTime<Utc>,
    pub purpose: Option<String>,
    /// Book on behalf of another account (admins only)
    pub user_id: Option<String>,
}

pub struct BookingService {
    repos: Arc<dyn RepositoryProvider>,
}

fn push_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

impl BookingService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    // ── Catalogue ───────────────────────────────────────────────

    pub async fn list_rooms(&self, floor_id: Option<i32>) -> DomainResult<Vec<Room>> {
        self.repos.rooms().list_rooms(floor_id).await
    }

    pub async fn list_floors(&self) -> DomainResult<Vec<Floor>> {
        self.repos.rooms().list_floors().await
    }

    pub async fn create_floor(&self, floor: NewFloor) -> DomainResult<Floor> {
        let floor = self.repos.rooms().create_floor(floor).await?;
        info!(floor_id = floor.id, name = %floor.name, "Floor created");
        Ok(floor)
    }

    pub async fn create_room(&self, room: NewRoom) -> DomainResult<Room> {
        if self.repos.rooms().find_floor(room.floor_id).await?.is_none() {
            return Err(DomainError::field("floor_id", format!("Unknown floor {}", room.floor_id)));
        }
        let room = self.repos.rooms().create_room(room).await?;
        info!(room_id = room.id, name = %room.name, floor = %room.floor_name, "Room created");
        Ok(room)
    }

    // ── Bookings ────────────────────────────────────────────────

    /// Validate and persist a booking as `Pending`.
    ///
    /// All field problems are reported together; room conflicts are checked
    /// only once the request itself is valid.
    pub async fn create_booking(
        &self,
        caller: &Caller,
        request: BookingRequest,
        now: DateTime<Utc>,
    ) -> DomainResult<BookingDetails> {
        let mut errors = FieldErrors::new();

        let mut room_ids = request.room_ids;
        room_ids.sort_unstable();
        room_ids.dedup();
        if room_ids.is_empty() {
            push_error(&mut errors, "room_ids", "At least one room is required");
        }

        if request.end_datetime <= request.start_datetime {
            push_error(&mut errors, "end_datetime", "End time must be after start time");
        }
        if request.start_datetime < now {
            push_error(&mut errors, "start_datetime", "Start time cannot be in the past");
        }

        let owner_id = match request.user_id {
            Some(user_id) if user_id != caller.user_id => {
                if !caller.is_admin() {
                    return Err(DomainError::Forbidden(
                        "Only administrators can book on behalf of other users".into(),
                    ));
                }
                if self.repos.users().get_user_by_id(&user_id).await?.is_none() {
                    push_error(&mut errors, "user_id", format!("Unknown user {}", user_id));
                }
                user_id
            }
            _ => caller.user_id.clone(),
        };

        if !room_ids.is_empty() {
            let found = self.repos.rooms().find_rooms_by_ids(&room_ids).await?;
            let missing: Vec<String> = room_ids
                .iter()
                .filter(|id| !found.iter().any(|r| r.id == **id))
                .map(|id| id.to_string())
                .collect();
            if !missing.is_empty() {
                push_error(
                    &mut errors,
                    "room_ids",
                    format!("Unknown room id(s): {}", missing.join(", ")),
                );
            }
        }

        if !errors.is_empty() {
            return Err(DomainError::FieldValidation(errors));
        }

        let details = self
            .repos
            .bookings()
            .create(NewBooking {
                user_id: owner_id,
                room_ids,
                start_datetime: request.start_datetime,
                end_datetime: request.end_datetime,
                purpose: request.purpose,
            })
            .await?;

        info!(
            booking_id = details.booking.id,
            user = %details.owner.username,
            rooms = details.rooms.len(),
            start = %details.booking.start_datetime,
            "Booking created"
        );
        Ok(details)
    }

    /// Every booking for admins, the caller's own otherwise.
    pub async fn list_bookings(&self, caller: &Caller) -> DomainResult<Vec<BookingDetails>> {
        if caller.is_admin() {
            self.repos.bookings().find_all().await
        } else {
            self.repos.bookings().find_by_user(&caller.user_id).await
        }
    }

    pub async fn list_my_bookings(&self, caller: &Caller) -> DomainResult<Vec<BookingDetails>> {
        self.repos.bookings().find_by_user(&caller.user_id).await
    }

    /// Apply a status transition.
    ///
    /// Members only see their own bookings and may only cancel them.
    pub async fn update_status(
        &self,
        caller: &Caller,
        booking_id: i32,
        status: BookingStatus,
    ) -> DomainResult<BookingDetails> {
        let details = match self.repos.bookings().find_by_id(booking_id).await? {
            Some(d) if caller.can_act_for(&d.booking.user_id) => d,
            _ => return Err(DomainError::not_found("Booking", "id", booking_id)),
        };

        if !caller.is_admin() && status != BookingStatus::Cancelled {
            return Err(DomainError::Forbidden(
                "Only administrators can approve bookings".into(),
            ));
        }

        let current = details.booking.status;
        if !current.can_transition_to(status) {
            return Err(DomainError::field(
                "status",
                format!("Cannot change status from {} to {}", current, status),
            ));
        }

        self.repos.bookings().update_status(booking_id, status).await?;
        info!(booking_id, from = %current, to = %status, "Booking status changed");

        self.repos
            .bookings()
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", "id", booking_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CreateUserDto, UserRepository, RoomRepository, UserRole};
    use crate::infrastructure::storage::InMemoryStorage;
    use chrono::{Duration, TimeZone};

    struct Fixture {
        service: BookingService,
        member: Caller,
        other: Caller,
        admin: Caller,
        room: Room,
        now: DateTime<Utc>,
    }

    async fn user(storage: &InMemoryStorage, name: &str, role: UserRole) -> Caller {
        let user = storage
            .create_user(CreateUserDto {
                username: name.into(),
                email: format!("{}@example.com", name),
                role,
                password_hash: "x".into(),
            })
            .await
            .unwrap();
        Caller::new(user.id, role)
    }

    async fn fixture() -> Fixture {
        let storage = Arc::new(InMemoryStorage::new());
        let member = user(&storage, "alice", UserRole::Member).await;
        let other = user(&storage, "bob", UserRole::Member).await;
        let admin = user(&storage, "root", UserRole::Admin).await;
        let floor = storage
            .create_floor(NewFloor { name: "First".into(), level: 1 })
            .await
            .unwrap();
        let room = storage
            .create_room(NewRoom {
                floor_id: floor.id,
                name: "Boardroom".into(),
                capacity: 12,
                description: None,
            })
            .await
            .unwrap();
        Fixture {
            service: BookingService::new(storage),
            member,
            other,
            admin,
            room,
            now: Utc.with_ymd_and_hms(2030, 3, 1, 8, 0, 0).unwrap(),
        }
    }

    fn request(f: &Fixture, offset_hours: i64, len_hours: i64) -> BookingRequest {
        let start = f.now + Duration::hours(offset_hours);
        BookingRequest {
            room_ids: vec![f.room.id],
            start_datetime: start,
            end_datetime: start + Duration::hours(len_hours),
            purpose: Some("Planning".into()),
            user_id: None,
        }
    }

    #[tokio::test]
    async fn creates_pending_booking_for_caller() {
        let f = fixture().await;
        let created = f
            .service
            .create_booking(&f.member, request(&f, 2, 1), f.now)
            .await
            .unwrap();
        assert_eq!(created.booking.status, BookingStatus::Pending);
        assert_eq!(created.booking.user_id, f.member.user_id);
        assert_eq!(created.rooms[0].floor_name, "First");
    }

    #[tokio::test]
    async fn reports_all_field_errors_together() {
        let f = fixture().await;
        let mut req = request(&f, -2, -1);
        req.room_ids = vec![f.room.id, 404];
        let err = f.service.create_booking(&f.member, req, f.now).await.unwrap_err();
        let DomainError::FieldValidation(errors) = err else {
            panic!("expected field errors");
        };
        assert!(errors.contains_key("end_datetime"));
        assert!(errors.contains_key("start_datetime"));
        assert_eq!(errors["room_ids"], vec!["Unknown room id(s): 404".to_string()]);
    }

    #[tokio::test]
    async fn overlapping_booking_conflicts() {
        let f = fixture().await;
        f.service.create_booking(&f.member, request(&f, 2, 2), f.now).await.unwrap();
        let err = f
            .service
            .create_booking(&f.other, request(&f, 3, 2), f.now)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        // back-to-back is fine
        f.service.create_booking(&f.other, request(&f, 4, 1), f.now).await.unwrap();
    }

    #[tokio::test]
    async fn only_admin_books_on_behalf() {
        let f = fixture().await;
        let mut req = request(&f, 2, 1);
        req.user_id = Some(f.other.user_id.clone());
        assert!(matches!(
            f.service.create_booking(&f.member, req.clone(), f.now).await,
            Err(DomainError::Forbidden(_))
        ));

        let created = f.service.create_booking(&f.admin, req, f.now).await.unwrap();
        assert_eq!(created.booking.user_id, f.other.user_id);
    }

    #[tokio::test]
    async fn listing_respects_role() {
        let f = fixture().await;
        f.service.create_booking(&f.member, request(&f, 2, 1), f.now).await.unwrap();
        f.service.create_booking(&f.other, request(&f, 5, 1), f.now).await.unwrap();

        let mine = f.service.list_bookings(&f.member).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].booking.user_id, f.member.user_id);

        assert_eq!(f.service.list_bookings(&f.admin).await.unwrap().len(), 2);
        assert_eq!(f.service.list_my_bookings(&f.admin).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn member_may_only_cancel_own_booking() {
        let f = fixture().await;
        let b = f.service.create_booking(&f.member, request(&f, 2, 1), f.now).await.unwrap();
        let id = b.booking.id;

        assert!(matches!(
            f.service.update_status(&f.member, id, BookingStatus::Approved).await,
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.update_status(&f.other, id, BookingStatus::Cancelled).await,
            Err(DomainError::NotFound { .. })
        ));

        let cancelled = f
            .service
            .update_status(&f.member, id, BookingStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.booking.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn admin_cannot_revive_cancelled_booking() {
        let f = fixture().await;
        let b = f.service.create_booking(&f.member, request(&f, 2, 1), f.now).await.unwrap();
        let id = b.booking.id;
        f.service.update_status(&f.admin, id, BookingStatus::Approved).await.unwrap();
        f.service.update_status(&f.admin, id, BookingStatus::Cancelled).await.unwrap();

        let err = f
            .service
            .update_status(&f.admin, id, BookingStatus::Approved)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::FieldValidation(ref e) if e.contains_key("status")));
    }

    #[tokio::test]
    async fn room_on_unknown_floor_is_rejected() {
        let f = fixture().await;
        let err = f
            .service
            .create_room(NewRoom {
                floor_id: 99,
                name: "Ghost".into(),
                capacity: 1,
                description: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::FieldValidation(ref e) if e.contains_key("floor_id")));
    }
}
