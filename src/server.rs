//! Reusable server runtime.
//!
//! Provides [`ServerHandle`] that encapsulates the full server lifecycle:
//! database init, migrations, default admin, REST API, metrics and graceful
//! shutdown. Both the plain `room-booking` binary and the `booking-manage`
//! CLI start the server through it; the CLI also reuses the database and
//! mailer helpers for its one-shot commands.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};

use crate::application::{BookingService, IdentityService, Mailer};
use crate::config::{AppConfig, EmailBackend};
use crate::domain::RepositoryProvider;
use crate::infrastructure::database::repositories::SeaOrmRepositoryProvider;
use crate::infrastructure::{
    init_database, run_migrations, ConsoleMailer, SmtpMailer,
};
use crate::interfaces::http::{create_api_router, ApiContext};
use crate::shared::errors::InfraError;
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the booking server.
pub struct ServerOptions {
    /// Application configuration.
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
    /// Create default admin user if none exists (default: true).
    pub create_default_admin: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
            create_default_admin: true,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running booking server.
///
/// ```rust,no_run
/// use room_booking::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.shutdown_signal().wait().await;
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    /// Repository provider for data access.
    pub repos: Arc<dyn RepositoryProvider>,
    /// The configuration the server was started with.
    pub config: AppConfig,
    /// Port the REST API is listening on.
    pub port: u16,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Start the server with the given options.
    ///
    /// This will:
    /// 1. Install the Prometheus metrics recorder
    /// 2. Connect to the database and run migrations
    /// 3. Create the default admin user (if enabled)
    /// 4. Start the REST API server (with Swagger UI)
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        app_cfg.validate()?;

        info!("Starting room booking service...");

        let prometheus_handle = install_metrics_recorder();

        if app_cfg.uses_default_secret() {
            warn!("⚠️  security.secret_key is the built-in development key; set SECRET_KEY");
        }
        let jwt_config = app_cfg.jwt_config();
        info!(
            access_minutes = jwt_config.access_token_minutes,
            refresh_days = jwt_config.refresh_token_days,
            "JWT configured"
        );

        // ── Database ───────────────────────────────────────────
        let db = connect_database(&app_cfg, opts.auto_migrate).await?;

        // ── Repositories & Services ────────────────────────────
        let repos: Arc<dyn RepositoryProvider> =
            Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
        let mailer = build_mailer(&app_cfg)?;
        let identity = Arc::new(
            IdentityService::new(repos.clone(), jwt_config, app_cfg.security.password_cost)
                .with_password_reset(mailer, app_cfg.password_reset_settings()),
        );
        let bookings = Arc::new(BookingService::new(repos.clone()));

        if opts.create_default_admin {
            let admin = &app_cfg.admin;
            match identity
                .ensure_default_admin(&admin.username, &admin.email, &admin.password)
                .await
            {
                Ok(true) => info!(username = %admin.username, "Default admin created"),
                Ok(false) => {}
                Err(e) => error!("Failed to create admin user: {}", e),
            }
        }

        // ── Shutdown coordinator ───────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        // ── REST API server ────────────────────────────────────
        let api_router = create_api_router(ApiContext {
            identity,
            bookings,
            db: Some(db.clone()),
            prometheus: prometheus_handle,
        });

        let api_addr = app_cfg.server.address();
        let listener = tokio::net::TcpListener::bind(&api_addr).await?;
        let port = listener.local_addr()?.port();
        info!("REST API server listening on http://{}", api_addr);
        info!("Swagger UI available at http://{}/docs/", api_addr);

        let api_shutdown = shutdown_signal.clone();
        let api_server = axum::serve(listener, api_router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("🛑 REST API server received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        info!("🚀 Server started.");

        Ok(Self {
            repos,
            config: app_cfg,
            port,
            db,
            shutdown,
            api_task,
        })
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    /// Trigger graceful shutdown (non-blocking).
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the server to stop after shutdown has been triggered.
    ///
    /// In-flight requests get `server.shutdown_timeout` seconds to drain.
    pub async fn wait(self) {
        info!("⏳ Waiting for server tasks to complete...");

        let timeout = Duration::from_secs(self.shutdown.timeout_secs());
        match tokio::time::timeout(timeout, self.api_task).await {
            Ok(Ok(())) => info!("REST API server stopped"),
            Ok(Err(e)) => error!("REST API server task panicked: {}", e),
            Err(_) => warn!(
                timeout_secs = timeout.as_secs(),
                "REST API server did not drain in time"
            ),
        }

        if let Err(e) = self.db.close().await {
            warn!("Error closing database connection: {}", e);
        } else {
            info!("✅ Database connection closed");
        }

        info!("👋 Shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("🛑 Shutting down...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// Install the process-wide Prometheus recorder, or reuse it when already
/// installed. Returns `None` if another recorder owns the slot.
pub fn install_metrics_recorder() -> Option<PrometheusHandle> {
    static PROM_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

    PROM_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                info!("📊 Prometheus metrics recorder installed");
                Some(handle)
            }
            Err(e) => {
                warn!("Prometheus recorder unavailable: {}", e);
                None
            }
        })
        .clone()
}

/// Connect to the configured database, optionally running migrations.
pub async fn connect_database(
    config: &AppConfig,
    auto_migrate: bool,
) -> Result<DatabaseConnection, sea_orm::DbErr> {
    let db_config = config.database_config();
    info!("Database: {}", db_config.url);

    let db = init_database(&db_config).await?;
    if auto_migrate {
        run_migrations(&db).await?;
    }
    Ok(db)
}

/// Build the mail transport selected by `email.backend`.
pub fn build_mailer(config: &AppConfig) -> Result<Arc<dyn Mailer>, InfraError> {
    match config.email.backend {
        EmailBackend::Console => Ok(Arc::new(ConsoleMailer)),
        EmailBackend::Smtp => {
            let settings = config.smtp_settings();
            info!(host = %settings.host, port = settings.port, "Using SMTP mail backend");
            Ok(Arc::new(SmtpMailer::new(&settings)?))
        }
    }
}

/// Initialize tracing (logging) from the application config.
///
/// `RUST_LOG` takes precedence over `logging.level`. Call once at process
/// startup; later calls are ignored.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let result = match config.logging.format.to_lowercase().as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init(),
    };

    if let Err(e) = result {
        eprintln!("tracing already initialized: {}", e);
    }
}
