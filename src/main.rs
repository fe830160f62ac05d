// Surf Window API v0.1
use axum::routing::{get, post};
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod catalog;
mod config;
mod db;
mod errors;
mod helpers;
mod routes;
mod services;
mod time;

use config::AppConfig;
use routes::refresh::AppState;
use services::open_meteo::OpenMeteoClient;
use services::scheduler::{SchedulerState, SharedSchedulerState};

/// Maximum number of connections in the database pool.
const DB_POOL_MAX_CONNECTIONS: u32 = 5;
/// Minimum number of connections kept alive in the database pool.
const DB_POOL_MIN_CONNECTIONS: u32 = 2;

/// Surf Window API OpenAPI specification.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Surf Window API",
        version = "0.1.0",
        description = "Daily surf-window recommendations for fixed Shikoku surf spots. \
            Aggregates hourly Open-Meteo weather and marine forecasts into 3-hour \
            daylight slots, scores them per skill level, and serves a \
            go/tough/unavailable dashboard with per-spot health warnings.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Dashboard", description = "Assembled surf dashboard"),
        (name = "Refresh", description = "On-demand forecast refresh trigger"),
        (name = "Scheduler", description = "Background refresh scheduler status"),
    ),
    paths(
        routes::health::health_check,
        routes::dashboard::get_dashboard,
        routes::refresh::trigger_refresh,
        routes::scheduler::get_scheduler_status,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::refresh::RefreshResponse,
            services::dashboard::DashboardData,
            services::dashboard::SpotDashboardItem,
            services::dashboard::SpotWarnings,
            services::dashboard::SpotLevelView,
            services::dashboard::SpotDecision,
            services::evaluation::SurfStatus,
            services::refresh::SpotOutcome,
            services::scheduler::SchedulerState,
            catalog::SkillLevel,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "surf_window_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    // Set up database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(DB_POOL_MAX_CONNECTIONS)
        .min_connections(DB_POOL_MIN_CONNECTIONS)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Seed spots from the static catalog
    let seeds = catalog::spot_seeds();
    match db::queries::seed_spots(&pool, &seeds).await {
        Ok(()) => tracing::info!("Seeded {} spots", seeds.len()),
        Err(e) => tracing::error!("Failed to seed spots: {}", e),
    }

    // Create Open-Meteo client
    let client = OpenMeteoClient::new();

    // Build shared application state for the refresh trigger
    let app_state = AppState {
        pool: pool.clone(),
        client: client.clone(),
        refresh_secret: config.refresh_secret.clone(),
    };

    // Create shared scheduler state and spawn the background scheduler
    let scheduler_state: SharedSchedulerState = Arc::new(RwLock::new(SchedulerState::new()));
    tokio::spawn(services::scheduler::run_scheduler(
        pool.clone(),
        client,
        scheduler_state.clone(),
        config.refresh_interval_secs,
    ));

    // CORS: browsers only read; the refresh trigger is server-to-server
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any);

    // Build router
    // Dashboard and health use PgPool state directly; refresh uses AppState.
    let dashboard_routes = Router::new()
        .route("/api/v1/dashboard", get(routes::dashboard::get_dashboard))
        .with_state(pool.clone());

    let refresh_routes = Router::new()
        .route("/api/v1/refresh", post(routes::refresh::trigger_refresh))
        .with_state(app_state);

    // Health check uses PgPool to verify DB connectivity
    let health_routes = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .with_state(pool);

    // Scheduler status uses SharedSchedulerState
    let scheduler_routes = Router::new()
        .route(
            "/api/v1/scheduler/status",
            get(routes::scheduler::get_scheduler_status),
        )
        .with_state(scheduler_state);

    let app = Router::new()
        .merge(health_routes)
        .merge(dashboard_routes)
        .merge(refresh_routes)
        .merge(scheduler_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
