//! SeaORM implementation of RoomRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::debug;

use super::{conflict_or_db_err, db_err};
use crate::domain::{DomainError, DomainResult, Floor, NewFloor, NewRoom, Room, RoomRepository};
use crate::infrastructure::database::entities::{floor, room};

pub struct SeaOrmRoomRepository {
    db: DatabaseConnection,
}

impl SeaOrmRoomRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn floor_to_domain(m: floor::Model) -> Floor {
    Floor {
        id: m.id,
        name: m.name,
        level: m.level,
    }
}

pub(super) fn room_to_domain(m: room::Model, floor: Option<floor::Model>) -> Room {
    Room {
        id: m.id,
        floor_id: m.floor_id,
        floor_name: floor.map(|f| f.name).unwrap_or_default(),
        name: m.name,
        capacity: m.capacity,
        description: m.description,
    }
}

#[async_trait]
impl RoomRepository for SeaOrmRoomRepository {
    async fn list_floors(&self) -> DomainResult<Vec<Floor>> {
        let models = floor::Entity::find()
            .order_by_asc(floor::Column::Level)
            .order_by_asc(floor::Column::Name)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(floor_to_domain).collect())
    }

    async fn find_floor(&self, id: i32) -> DomainResult<Option<Floor>> {
        let model = floor::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(floor_to_domain))
    }

    async fn create_floor(&self, new: NewFloor) -> DomainResult<Floor> {
        debug!("Creating floor: {}", new.name);

        let model = floor::ActiveModel {
            name: Set(new.name),
            level: Set(new.level),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| conflict_or_db_err(e, "Floor with this name already exists"))?;

        Ok(floor_to_domain(model))
    }

    async fn list_rooms(&self, floor_id: Option<i32>) -> DomainResult<Vec<Room>> {
        let mut query = room::Entity::find().find_also_related(floor::Entity);
        if let Some(floor_id) = floor_id {
            query = query.filter(room::Column::FloorId.eq(floor_id));
        }

        let rows = query
            .order_by_asc(room::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(|(r, f)| room_to_domain(r, f)).collect())
    }

    async fn find_rooms_by_ids(&self, ids: &[i32]) -> DomainResult<Vec<Room>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = room::Entity::find()
            .find_also_related(floor::Entity)
            .filter(room::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(room::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(|(r, f)| room_to_domain(r, f)).collect())
    }

    async fn create_room(&self, new: NewRoom) -> DomainResult<Room> {
        debug!("Creating room '{}' on floor {}", new.name, new.floor_id);

        let Some(floor) = floor::Entity::find_by_id(new.floor_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Err(DomainError::not_found("Floor", "id", new.floor_id));
        };

        let model = room::ActiveModel {
            floor_id: Set(new.floor_id),
            name: Set(new.name),
            capacity: Set(new.capacity),
            description: Set(new.description),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| conflict_or_db_err(e, "Room already exists"))?;

        Ok(room_to_domain(model, Some(floor)))
    }
}
