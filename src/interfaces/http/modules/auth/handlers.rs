//! Authentication API handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};

use super::dto::{
    LoginRequest, LoginResponse, MessageResponse, PasswordResetConfirmRequest,
    PasswordResetRequest, RefreshRequest, RefreshResponse, RegisterRequest, UserInfo,
};
use crate::application::{IdentityService, RegisterUser};
use crate::interfaces::http::common::{ok, ApiError, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;

/// Auth state
#[derive(Clone)]
pub struct AuthHandlerState {
    pub identity: Arc<IdentityService>,
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = ApiResponse<UserInfo>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "User already exists")
    )
)]
pub async fn register(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserInfo>>), ApiError> {
    let user = state
        .identity
        .register(RegisterUser {
            username: request.username,
            email: request.email,
            password: request.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(user.into()))))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token pair issued", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let auth = state.identity.login(&request.username, &request.password).await?;

    ok(LoginResponse {
        access: auth.tokens.access,
        refresh: auth.tokens.refresh,
        token_type: "Bearer".to_string(),
        expires_in: auth.tokens.expires_in,
        user: auth.user.into(),
    })
}

#[utoipa::path(
    post,
    path = "/api/auth/token/refresh",
    tag = "Authentication",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = ApiResponse<RefreshResponse>),
        (status = 401, description = "Invalid or expired refresh token")
    )
)]
pub async fn refresh_token(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<RefreshRequest>,
) -> ApiResult<RefreshResponse> {
    let refreshed = state.identity.refresh(&request.refresh).await?;

    ok(RefreshResponse {
        access: refreshed.access,
        token_type: "Bearer".to_string(),
        expires_in: refreshed.expires_in,
    })
}

#[utoipa::path(
    post,
    path = "/api/auth/password-reset",
    tag = "Authentication",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset link sent if the account exists", body = ApiResponse<MessageResponse>),
        (status = 400, description = "Validation error")
    )
)]
pub async fn request_password_reset(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<PasswordResetRequest>,
) -> ApiResult<MessageResponse> {
    state.identity.request_password_reset(&request.email).await?;

    ok(MessageResponse {
        message: "If an account exists for this email, a password reset link has been sent."
            .to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/api/auth/password-reset/confirm",
    tag = "Authentication",
    request_body = PasswordResetConfirmRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<MessageResponse>),
        (status = 400, description = "Validation error or invalid/expired link")
    )
)]
pub async fn confirm_password_reset(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<PasswordResetConfirmRequest>,
) -> ApiResult<MessageResponse> {
    state
        .identity
        .confirm_password_reset(&request.uid, &request.token, &request.password)
        .await?;

    ok(MessageResponse {
        message: "Password has been reset.".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/api/auth/user",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserInfo>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn current_user(
    State(state): State<AuthHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<UserInfo> {
    let user = state.identity.current_user(&user.user_id).await?;
    ok(user.into())
}
