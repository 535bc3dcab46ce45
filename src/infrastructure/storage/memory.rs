//! In-memory storage implementation

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::domain::repositories::RepositoryProvider;
use crate::domain::{
    overlap_conflict, Booking, BookingDetails, BookingOwner, BookingRepository, BookingStatus,
    CreateUserDto, DomainError, DomainResult, Floor, NewBooking, NewFloor, NewRoom, Room,
    RoomRepository, User, UserRepository,
};

/// Stored room row; the floor name is joined on read.
#[derive(Clone)]
struct RoomRow {
    id: i32,
    floor_id: i32,
    name: String,
    capacity: i32,
    description: Option<String>,
}

/// In-memory storage for development and testing.
///
/// Implements every repository trait and serves as its own
/// `RepositoryProvider`.
pub struct InMemoryStorage {
    users: DashMap<String, User>,
    floors: DashMap<i32, Floor>,
    rooms: DashMap<i32, RoomRow>,
    bookings: DashMap<i32, Booking>,
    booking_rooms: DashMap<i32, Vec<i32>>,
    floor_counter: AtomicI32,
    room_counter: AtomicI32,
    booking_counter: AtomicI32,
    /// Serializes the overlap check and insert in `create`
    booking_write: Mutex<()>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            floors: DashMap::new(),
            rooms: DashMap::new(),
            bookings: DashMap::new(),
            booking_rooms: DashMap::new(),
            floor_counter: AtomicI32::new(1),
            room_counter: AtomicI32::new(1),
            booking_counter: AtomicI32::new(1),
            booking_write: Mutex::new(()),
        }
    }

    /// Insert a booking row directly, bypassing creation rules.
    ///
    /// Lets tests place bookings in the past or in a given status.
    pub fn insert_booking(&self, booking: Booking, room_ids: Vec<i32>) {
        self.booking_counter
            .fetch_max(booking.id + 1, Ordering::SeqCst);
        self.booking_rooms.insert(booking.id, room_ids);
        self.bookings.insert(booking.id, booking);
    }

    /// Flip an account's active flag; there is no API for it yet.
    pub fn set_user_active(&self, id: &str, active: bool) {
        if let Some(mut user) = self.users.get_mut(id) {
            user.is_active = active;
        }
    }

    fn overlapping(
        &self,
        room_ids: &[i32],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<Booking> {
        let mut found: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|b| b.status.holds_rooms() && b.overlaps(start, end))
            .filter(|b| {
                self.booking_rooms
                    .get(&b.id)
                    .is_some_and(|ids| ids.iter().any(|id| room_ids.contains(id)))
            })
            .map(|b| b.value().clone())
            .collect();
        found.sort_by_key(|b| b.id);
        found
    }

    fn room_to_domain(&self, row: &RoomRow) -> Room {
        Room {
            id: row.id,
            floor_id: row.floor_id,
            floor_name: self
                .floors
                .get(&row.floor_id)
                .map(|f| f.name.clone())
                .unwrap_or_default(),
            name: row.name.clone(),
            capacity: row.capacity,
            description: row.description.clone(),
        }
    }

    fn details(&self, booking: Booking) -> DomainResult<BookingDetails> {
        let Some(owner) = self.users.get(&booking.user_id).map(|u| BookingOwner {
            id: u.id.clone(),
            username: u.username.clone(),
            email: u.email.clone(),
        }) else {
            return Err(DomainError::Storage(format!(
                "booking {} references missing user {}",
                booking.id, booking.user_id
            )));
        };

        let mut room_ids = self
            .booking_rooms
            .get(&booking.id)
            .map(|ids| ids.clone())
            .unwrap_or_default();
        room_ids.sort_unstable();
        let rooms = room_ids
            .iter()
            .filter_map(|id| self.rooms.get(id).map(|r| self.room_to_domain(&r)))
            .collect();

        Ok(BookingDetails {
            booking,
            owner,
            rooms,
        })
    }

    fn collect_details(
        &self,
        filter: impl Fn(&Booking) -> bool,
        newest_first: bool,
    ) -> DomainResult<Vec<BookingDetails>> {
        let mut matching: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|b| filter(b.value()))
            .map(|b| b.value().clone())
            .collect();
        matching.sort_by_key(|b| (b.start_datetime, b.id));
        if newest_first {
            matching.reverse();
        }
        matching.into_iter().map(|b| self.details(b)).collect()
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryProvider for InMemoryStorage {
    fn users(&self) -> &dyn UserRepository {
        self
    }

    fn rooms(&self) -> &dyn RoomRepository {
        self
    }

    fn bookings(&self) -> &dyn BookingRepository {
        self
    }
}

#[async_trait]
impl UserRepository for InMemoryStorage {
    async fn create_user(&self, dto: CreateUserDto) -> DomainResult<User> {
        let taken = self
            .users
            .iter()
            .any(|u| u.username == dto.username || u.email == dto.email);
        if taken {
            return Err(DomainError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            username: dto.username,
            email: dto.email,
            password_hash: dto.password_hash,
            role: dto.role,
            is_active: true,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };
        self.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> DomainResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.value().clone()))
    }

    async fn get_user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.value().clone()))
    }

    async fn get_user_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn record_login(&self, id: &str) -> DomainResult<()> {
        let Some(mut user) = self.users.get_mut(id) else {
            return Err(DomainError::not_found("User", "id", id));
        };
        let now = Utc::now();
        user.last_login_at = Some(now);
        user.updated_at = now;
        Ok(())
    }

    async fn update_password(&self, id: &str, password_hash: &str) -> DomainResult<()> {
        let Some(mut user) = self.users.get_mut(id) else {
            return Err(DomainError::not_found("User", "id", id));
        };
        user.password_hash = password_hash.to_string();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn count_users(&self) -> DomainResult<u64> {
        Ok(self.users.len() as u64)
    }
}

#[async_trait]
impl RoomRepository for InMemoryStorage {
    async fn list_floors(&self) -> DomainResult<Vec<Floor>> {
        let mut floors: Vec<Floor> = self.floors.iter().map(|f| f.value().clone()).collect();
        floors.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.name.cmp(&b.name)));
        Ok(floors)
    }

    async fn find_floor(&self, id: i32) -> DomainResult<Option<Floor>> {
        Ok(self.floors.get(&id).map(|f| f.clone()))
    }

    async fn create_floor(&self, new: NewFloor) -> DomainResult<Floor> {
        if self.floors.iter().any(|f| f.name == new.name) {
            return Err(DomainError::Conflict(
                "Floor with this name already exists".to_string(),
            ));
        }
        let floor = Floor {
            id: self.floor_counter.fetch_add(1, Ordering::SeqCst),
            name: new.name,
            level: new.level,
        };
        self.floors.insert(floor.id, floor.clone());
        Ok(floor)
    }

    async fn list_rooms(&self, floor_id: Option<i32>) -> DomainResult<Vec<Room>> {
        let mut rooms: Vec<Room> = self
            .rooms
            .iter()
            .filter(|r| floor_id.map_or(true, |f| r.floor_id == f))
            .map(|r| self.room_to_domain(&r))
            .collect();
        rooms.sort_by_key(|r| r.id);
        Ok(rooms)
    }

    async fn find_rooms_by_ids(&self, ids: &[i32]) -> DomainResult<Vec<Room>> {
        let mut rooms: Vec<Room> = self
            .rooms
            .iter()
            .filter(|r| ids.contains(&r.id))
            .map(|r| self.room_to_domain(&r))
            .collect();
        rooms.sort_by_key(|r| r.id);
        Ok(rooms)
    }

    async fn create_room(&self, new: NewRoom) -> DomainResult<Room> {
        if !self.floors.contains_key(&new.floor_id) {
            return Err(DomainError::not_found("Floor", "id", new.floor_id));
        }
        let row = RoomRow {
            id: self.room_counter.fetch_add(1, Ordering::SeqCst),
            floor_id: new.floor_id,
            name: new.name,
            capacity: new.capacity,
            description: new.description,
        };
        let room = self.room_to_domain(&row);
        self.rooms.insert(row.id, row);
        Ok(room)
    }
}

#[async_trait]
impl BookingRepository for InMemoryStorage {
    async fn create(&self, new: NewBooking) -> DomainResult<BookingDetails> {
        let _guard = self
            .booking_write
            .lock()
            .map_err(|_| DomainError::Storage("booking lock poisoned".to_string()))?;

        let clashes = self.overlapping(&new.room_ids, new.start_datetime, new.end_datetime);
        if !clashes.is_empty() {
            return Err(overlap_conflict(&clashes));
        }

        let now = Utc::now();
        let booking = Booking {
            id: self.booking_counter.fetch_add(1, Ordering::SeqCst),
            user_id: new.user_id,
            start_datetime: new.start_datetime,
            end_datetime: new.end_datetime,
            purpose: new.purpose,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.booking_rooms.insert(booking.id, new.room_ids);
        self.bookings.insert(booking.id, booking.clone());
        self.details(booking)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<BookingDetails>> {
        let booking = self.bookings.get(&id).map(|b| b.clone());
        booking.map(|b| self.details(b)).transpose()
    }

    async fn find_all(&self) -> DomainResult<Vec<BookingDetails>> {
        self.collect_details(|_| true, true)
    }

    async fn find_by_user(&self, user_id: &str) -> DomainResult<Vec<BookingDetails>> {
        self.collect_details(|b| b.user_id == user_id, true)
    }

    async fn find_overlapping(
        &self,
        room_ids: &[i32],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<Vec<Booking>> {
        Ok(self.overlapping(room_ids, start, end))
    }

    async fn find_approved_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<BookingDetails>> {
        self.collect_details(
            |b| {
                b.status == BookingStatus::Approved
                    && b.start_datetime >= from
                    && b.start_datetime <= to
            },
            false,
        )
    }

    async fn update_status(&self, id: i32, status: BookingStatus) -> DomainResult<()> {
        let Some(mut booking) = self.bookings.get_mut(&id) else {
            return Err(DomainError::not_found("Booking", "id", id));
        };
        booking.status = status;
        booking.updated_at = Utc::now();
        Ok(())
    }
}
