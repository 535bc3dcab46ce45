//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, patch, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::{BookingService, IdentityService};
use crate::interfaces::http::common::ApiResponse;
use crate::interfaces::http::middleware::{admin_middleware, auth_middleware, AuthState};
use crate::interfaces::http::modules::auth::{self, AuthHandlerState};
use crate::interfaces::http::modules::bookings::{self, BookingAppState};
use crate::interfaces::http::modules::health::{self, HealthState};
use crate::interfaces::http::modules::metrics::{self, http_metrics_middleware, MetricsState};
use crate::interfaces::http::modules::rooms;

/// Who may call a route group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Anonymous,
    /// Valid access token
    Authenticated,
    /// Valid access token with the `admin` role
    Admin,
}

/// Everything the HTTP layer needs from the rest of the application
pub struct ApiContext {
    pub identity: Arc<IdentityService>,
    pub bookings: Arc<BookingService>,
    pub db: Option<DatabaseConnection>,
    pub prometheus: Option<PrometheusHandle>,
}

/// Unified router state; handlers extract their own slice via `FromRef`.
#[derive(Clone)]
pub struct ApiState {
    pub auth: AuthState,
    pub identity: Arc<IdentityService>,
    pub bookings: Arc<BookingService>,
    pub db: Option<DatabaseConnection>,
    pub prometheus: Option<PrometheusHandle>,
    pub started_at: Arc<Instant>,
}

impl FromRef<ApiState> for AuthHandlerState {
    fn from_ref(s: &ApiState) -> Self {
        AuthHandlerState {
            identity: Arc::clone(&s.identity),
        }
    }
}

impl FromRef<ApiState> for BookingAppState {
    fn from_ref(s: &ApiState) -> Self {
        BookingAppState {
            service: Arc::clone(&s.bookings),
        }
    }
}

impl FromRef<ApiState> for HealthState {
    fn from_ref(s: &ApiState) -> Self {
        HealthState {
            db: s.db.clone(),
            started_at: Arc::clone(&s.started_at),
        }
    }
}

impl FromRef<ApiState> for MetricsState {
    fn from_ref(s: &ApiState) -> Self {
        MetricsState {
            handle: s.prometheus.clone(),
        }
    }
}

/// Attach the guards for `capability` to every route in `router`.
fn guard(router: Router<ApiState>, capability: Capability, auth: &AuthState) -> Router<ApiState> {
    match capability {
        Capability::Anonymous => router,
        Capability::Authenticated => {
            router.route_layer(middleware::from_fn_with_state(auth.clone(), auth_middleware))
        }
        // Layers run outermost-last: authenticate first, then check the role.
        Capability::Admin => router
            .route_layer(middleware::from_fn(admin_middleware))
            .route_layer(middleware::from_fn_with_state(auth.clone(), auth_middleware)),
    }
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT access token"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::refresh_token,
        auth::request_password_reset,
        auth::confirm_password_reset,
        auth::current_user,
        rooms::list_rooms,
        rooms::list_floors,
        rooms::create_floor,
        rooms::create_room,
        bookings::create_booking,
        bookings::list_bookings,
        bookings::create_booking_in_list,
        bookings::list_my_bookings,
        bookings::update_booking_status,
    ),
    components(
        schemas(
            ApiResponse<String>,
            health::HealthResponse,
            health::ComponentHealth,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::RegisterRequest,
            auth::RefreshRequest,
            auth::RefreshResponse,
            auth::PasswordResetRequest,
            auth::PasswordResetConfirmRequest,
            auth::MessageResponse,
            auth::UserInfo,
            rooms::FloorDto,
            rooms::RoomDto,
            rooms::CreateFloorRequest,
            rooms::CreateRoomRequest,
            bookings::BookingDto,
            bookings::BookingOwnerDto,
            bookings::CreateBookingRequest,
            bookings::UpdateBookingStatusRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Server health check"),
        (name = "Authentication", description = "Registration, JWT login and refresh, password reset, current user"),
        (name = "Rooms", description = "Floors and rooms available for booking"),
        (name = "Bookings", description = "Room bookings and their approval lifecycle"),
    ),
    info(
        title = "Room Booking API",
        version = "1.0.0",
        description = "REST API for booking meeting rooms",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(ctx: ApiContext) -> Router {
    let auth = AuthState {
        jwt_config: ctx.identity.jwt_config().clone(),
    };

    let state = ApiState {
        auth: auth.clone(),
        identity: ctx.identity,
        bookings: ctx.bookings,
        db: ctx.db,
        prometheus: ctx.prometheus,
        started_at: Arc::new(Instant::now()),
    };

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::prometheus_metrics))
        .route("/api/rooms", get(rooms::list_rooms))
        .route("/api/floors", get(rooms::list_floors))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/token/refresh", post(auth::refresh_token))
        .route("/api/auth/password-reset", post(auth::request_password_reset))
        .route(
            "/api/auth/password-reset/confirm",
            post(auth::confirm_password_reset),
        );

    let member_routes = Router::new()
        .route("/api/auth/user", get(auth::current_user))
        .route("/api/bookings/create", post(bookings::create_booking))
        .route(
            "/api/bookings",
            get(bookings::list_bookings).post(bookings::create_booking_in_list),
        )
        .route("/api/bookings/my", get(bookings::list_my_bookings))
        .route("/api/bookings/{id}/status", patch(bookings::update_booking_status));

    let admin_routes = Router::new()
        .route("/api/floors", post(rooms::create_floor))
        .route("/api/rooms", post(rooms::create_room));

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(guard(public_routes, Capability::Anonymous, &auth))
        .merge(guard(member_routes, Capability::Authenticated, &auth))
        .merge(guard(admin_routes, Capability::Admin, &auth))
        .layer(middleware::from_fn(http_metrics_middleware))
        .with_state(state)
        .merge(swagger_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
