//! Booking entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Booking status column
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum BookingStatus {
    #[sea_orm(string_value = "Pending")]
    Pending,
    #[sea_orm(string_value = "Approved")]
    Approved,
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: String,

    pub start_datetime: DateTimeUtc,
    pub end_datetime: DateTimeUtc,

    #[sea_orm(nullable)]
    pub purpose: Option<String>,

    pub status: BookingStatus,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::booking_room::Entity")]
    BookingRooms,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::booking_room::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BookingRooms.def()
    }
}

impl Related<super::room::Entity> for Entity {
    fn to() -> RelationDef {
        super::booking_room::Relation::Room.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::booking_room::Relation::Booking.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
