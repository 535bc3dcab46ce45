//! Booking HTTP handlers

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;

use super::dto::*;
use crate::application::BookingService;
use crate::domain::{BookingStatus, DomainError};
use crate::interfaces::http::common::{ok, ApiError, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;

/// Application state for room and booking handlers.
#[derive(Clone)]
pub struct BookingAppState {
    pub service: Arc<BookingService>,
}

#[utoipa::path(
    post,
    path = "/api/bookings/create",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created as Pending", body = ApiResponse<BookingDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Booking on behalf of another user"),
        (status = 409, description = "Rooms already booked for that time")
    )
)]
pub async fn create_booking(
    State(state): State<BookingAppState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BookingDto>>), ApiError> {
    let details = state
        .service
        .create_booking(&user.caller(), request.into(), Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(details.into()))))
}

#[utoipa::path(
    get,
    path = "/api/bookings",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All bookings for admins, own bookings otherwise", body = ApiResponse<Vec<BookingDto>>)
    )
)]
pub async fn list_bookings(
    State(state): State<BookingAppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Vec<BookingDto>> {
    let bookings = state.service.list_bookings(&user.caller()).await?;
    ok(bookings.into_iter().map(BookingDto::from).collect())
}

#[utoipa::path(
    post,
    path = "/api/bookings",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created as Pending", body = ApiResponse<BookingDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Rooms already booked for that time")
    )
)]
pub async fn create_booking_in_list(
    state: State<BookingAppState>,
    user: Extension<AuthenticatedUser>,
    request: ValidatedJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BookingDto>>), ApiError> {
    create_booking(state, user, request).await
}

#[utoipa::path(
    get,
    path = "/api/bookings/my",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Bookings owned by the caller", body = ApiResponse<Vec<BookingDto>>)
    )
)]
pub async fn list_my_bookings(
    State(state): State<BookingAppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Vec<BookingDto>> {
    let bookings = state.service.list_my_bookings(&user.caller()).await?;
    ok(bookings.into_iter().map(BookingDto::from).collect())
}

#[utoipa::path(
    patch,
    path = "/api/bookings/{id}/status",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Booking ID")),
    request_body = UpdateBookingStatusRequest,
    responses(
        (status = 200, description = "Updated booking", body = ApiResponse<BookingDto>),
        (status = 400, description = "Transition not allowed"),
        (status = 403, description = "Members may only cancel"),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn update_booking_status(
    State(state): State<BookingAppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateBookingStatusRequest>,
) -> ApiResult<BookingDto> {
    let status = BookingStatus::parse(&request.status).ok_or_else(|| {
        DomainError::field(
            "status",
            format!("\"{}\" is not a valid status", request.status),
        )
    })?;

    let details = state
        .service
        .update_status(&user.caller(), id, status)
        .await?;
    ok(details.into())
}
