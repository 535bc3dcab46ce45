//! Create booking_rooms association table

use sea_orm_migration::prelude::*;

use super::m20240101_000003_create_rooms::Rooms;
use super::m20240101_000004_create_bookings::Bookings;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BookingRooms::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(BookingRooms::BookingId).integer().not_null())
                    .col(ColumnDef::new(BookingRooms::RoomId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(BookingRooms::BookingId)
                            .col(BookingRooms::RoomId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_rooms_booking")
                            .from(BookingRooms::Table, BookingRooms::BookingId)
                            .to(Bookings::Table, Bookings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_rooms_room")
                            .from(BookingRooms::Table, BookingRooms::RoomId)
                            .to(Rooms::Table, Rooms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_booking_rooms_room")
                    .table(BookingRooms::Table)
                    .col(BookingRooms::RoomId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BookingRooms::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum BookingRooms {
    Table,
    BookingId,
    RoomId,
}
