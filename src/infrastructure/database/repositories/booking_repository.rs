//! SeaORM implementation of BookingRepository

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Set, TransactionTrait,
};
use tracing::debug;

use super::db_err;
use super::room_repository::room_to_domain;
use crate::domain::{
    overlap_conflict, Booking, BookingDetails, BookingOwner, BookingRepository, BookingStatus, DomainError,
    DomainResult, NewBooking, Room,
};
use crate::infrastructure::database::entities::{booking, booking_room, floor, room, user};

pub struct SeaOrmBookingRepository {
    db: DatabaseConnection,
}

/// Pending/Approved rows on any of `room_ids` intersecting `[start, end)`
fn overlapping(
    room_ids: &[i32],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Select<booking::Entity> {
    booking::Entity::find()
        .inner_join(booking_room::Entity)
        .filter(booking_room::Column::RoomId.is_in(room_ids.iter().copied()))
        .filter(booking::Column::Status.is_in([
            booking::BookingStatus::Pending,
            booking::BookingStatus::Approved,
        ]))
        .filter(booking::Column::StartDatetime.lt(end))
        .filter(booking::Column::EndDatetime.gt(start))
        .distinct()
        .order_by_asc(booking::Column::Id)
}

impl SeaOrmBookingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Attach owners and rooms to a batch of booking rows, preserving order.
    async fn load_details(&self, models: Vec<booking::Model>) -> DomainResult<Vec<BookingDetails>> {
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let booking_ids: Vec<i32> = models.iter().map(|m| m.id).collect();
        let user_ids: Vec<String> = models.iter().map(|m| m.user_id.clone()).collect();

        let owners: HashMap<String, BookingOwner> = user::Entity::find()
            .filter(user::Column::Id.is_in(user_ids))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|u| {
                (
                    u.id.clone(),
                    BookingOwner {
                        id: u.id,
                        username: u.username,
                        email: u.email,
                    },
                )
            })
            .collect();

        let links = booking_room::Entity::find()
            .filter(booking_room::Column::BookingId.is_in(booking_ids))
            .order_by_asc(booking_room::Column::RoomId)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let room_ids: Vec<i32> = links.iter().map(|l| l.room_id).collect();
        let rooms: HashMap<i32, Room> = room::Entity::find()
            .find_also_related(floor::Entity)
            .filter(room::Column::Id.is_in(room_ids))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|(r, f)| (r.id, room_to_domain(r, f)))
            .collect();

        let mut rooms_by_booking: HashMap<i32, Vec<Room>> = HashMap::new();
        for link in links {
            if let Some(room) = rooms.get(&link.room_id) {
                rooms_by_booking
                    .entry(link.booking_id)
                    .or_default()
                    .push(room.clone());
            }
        }

        let mut details = Vec::with_capacity(models.len());
        for model in models {
            let Some(owner) = owners.get(&model.user_id).cloned() else {
                return Err(DomainError::Storage(format!(
                    "booking {} references missing user {}",
                    model.id, model.user_id
                )));
            };
            let rooms = rooms_by_booking.remove(&model.id).unwrap_or_default();
            details.push(BookingDetails {
                booking: model_to_domain(model),
                owner,
                rooms,
            });
        }
        Ok(details)
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn status_to_domain(s: booking::BookingStatus) -> BookingStatus {
    match s {
        booking::BookingStatus::Pending => BookingStatus::Pending,
        booking::BookingStatus::Approved => BookingStatus::Approved,
        booking::BookingStatus::Cancelled => BookingStatus::Cancelled,
    }
}

fn status_to_entity(s: BookingStatus) -> booking::BookingStatus {
    match s {
        BookingStatus::Pending => booking::BookingStatus::Pending,
        BookingStatus::Approved => booking::BookingStatus::Approved,
        BookingStatus::Cancelled => booking::BookingStatus::Cancelled,
    }
}

fn model_to_domain(m: booking::Model) -> Booking {
    Booking {
        id: m.id,
        user_id: m.user_id,
        start_datetime: m.start_datetime,
        end_datetime: m.end_datetime,
        purpose: m.purpose,
        status: status_to_domain(m.status),
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

// ── BookingRepository impl ──────────────────────────────────────

#[async_trait]
impl BookingRepository for SeaOrmBookingRepository {
    async fn create(&self, new: NewBooking) -> DomainResult<BookingDetails> {
        debug!(
            "Creating booking for user {} on rooms {:?}",
            new.user_id, new.room_ids
        );

        let now = Utc::now();
        // Insert before the overlap check: the write lock is then held until
        // commit, and concurrent creates check against this row.
        let txn = self.db.begin().await.map_err(db_err)?;

        let model = booking::ActiveModel {
            user_id: Set(new.user_id),
            start_datetime: Set(new.start_datetime),
            end_datetime: Set(new.end_datetime),
            purpose: Set(new.purpose),
            status: Set(booking::BookingStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        let links: Vec<booking_room::ActiveModel> = new
            .room_ids
            .iter()
            .map(|room_id| booking_room::ActiveModel {
                booking_id: Set(model.id),
                room_id: Set(*room_id),
            })
            .collect();
        if !links.is_empty() {
            booking_room::Entity::insert_many(links)
                .exec(&txn)
                .await
                .map_err(db_err)?;
        }

        let clashes = overlapping(&new.room_ids, new.start_datetime, new.end_datetime)
            .filter(booking::Column::Id.ne(model.id))
            .all(&txn)
            .await
            .map_err(db_err)?;
        if !clashes.is_empty() {
            txn.rollback().await.map_err(db_err)?;
            let clashes: Vec<Booking> = clashes.into_iter().map(model_to_domain).collect();
            return Err(overlap_conflict(&clashes));
        }

        txn.commit().await.map_err(db_err)?;

        self.load_details(vec![model])
            .await?
            .pop()
            .ok_or_else(|| DomainError::Storage("created booking vanished".to_string()))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<BookingDetails>> {
        let Some(model) = booking::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };
        Ok(self.load_details(vec![model]).await?.pop())
    }

    async fn find_all(&self) -> DomainResult<Vec<BookingDetails>> {
        let models = booking::Entity::find()
            .order_by_desc(booking::Column::StartDatetime)
            .order_by_desc(booking::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        self.load_details(models).await
    }

    async fn find_by_user(&self, user_id: &str) -> DomainResult<Vec<BookingDetails>> {
        let models = booking::Entity::find()
            .filter(booking::Column::UserId.eq(user_id))
            .order_by_desc(booking::Column::StartDatetime)
            .order_by_desc(booking::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        self.load_details(models).await
    }

    async fn find_overlapping(
        &self,
        room_ids: &[i32],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<Vec<Booking>> {
        if room_ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = overlapping(room_ids, start, end)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn find_approved_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<BookingDetails>> {
        let models = booking::Entity::find()
            .filter(booking::Column::Status.eq(booking::BookingStatus::Approved))
            .filter(booking::Column::StartDatetime.gte(from))
            .filter(booking::Column::StartDatetime.lte(to))
            .order_by_asc(booking::Column::StartDatetime)
            .order_by_asc(booking::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        self.load_details(models).await
    }

    async fn update_status(&self, id: i32, status: BookingStatus) -> DomainResult<()> {
        debug!("Updating booking {} status to {}", id, status);

        let Some(existing) = booking::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Err(DomainError::not_found("Booking", "id", id));
        };

        let mut active: booking::ActiveModel = existing.into();
        active.status = Set(status_to_entity(status));
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await.map_err(db_err)?;
        Ok(())
    }
}
