//! Room catalogue handlers

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;

use super::dto::*;
use crate::interfaces::http::common::{ok, ApiError, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::modules::bookings::BookingAppState;

#[utoipa::path(
    get,
    path = "/api/rooms",
    tag = "Rooms",
    params(RoomsQuery),
    responses(
        (status = 200, description = "All rooms", body = ApiResponse<Vec<RoomDto>>)
    )
)]
pub async fn list_rooms(
    State(state): State<BookingAppState>,
    Query(query): Query<RoomsQuery>,
) -> ApiResult<Vec<RoomDto>> {
    let rooms = state.service.list_rooms(query.floor_id).await?;
    ok(rooms.into_iter().map(RoomDto::from).collect())
}

#[utoipa::path(
    get,
    path = "/api/floors",
    tag = "Rooms",
    responses(
        (status = 200, description = "All floors, lowest level first", body = ApiResponse<Vec<FloorDto>>)
    )
)]
pub async fn list_floors(State(state): State<BookingAppState>) -> ApiResult<Vec<FloorDto>> {
    let floors = state.service.list_floors().await?;
    ok(floors.into_iter().map(FloorDto::from).collect())
}

#[utoipa::path(
    post,
    path = "/api/floors",
    tag = "Rooms",
    security(("bearer_auth" = [])),
    request_body = CreateFloorRequest,
    responses(
        (status = 201, description = "Floor created", body = ApiResponse<FloorDto>),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Floor name taken")
    )
)]
pub async fn create_floor(
    State(state): State<BookingAppState>,
    ValidatedJson(request): ValidatedJson<CreateFloorRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FloorDto>>), ApiError> {
    let floor = state.service.create_floor(request.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(floor.into()))))
}

#[utoipa::path(
    post,
    path = "/api/rooms",
    tag = "Rooms",
    security(("bearer_auth" = [])),
    request_body = CreateRoomRequest,
    responses(
        (status = 201, description = "Room created", body = ApiResponse<RoomDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn create_room(
    State(state): State<BookingAppState>,
    ValidatedJson(request): ValidatedJson<CreateRoomRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RoomDto>>), ApiError> {
    let room = state.service.create_room(request.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(room.into()))))
}
