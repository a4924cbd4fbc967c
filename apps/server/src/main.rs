mod auth;
mod availability;
mod booking;
mod db;
mod handlers;
mod models;
mod rate_limit;
mod schedule;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::sqlite::SqlitePoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use rate_limit::{limit_admin, limit_booking, limit_client, limit_public, RateLimiter};

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub auth_secret: String,
    pub admin_client_id: String,
    pub started_at: Instant,
}

/// Rate limit cleanup interval (seconds).
const RATE_LIMIT_CLEANUP_SECS: u64 = 300;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // ── Required env vars ──
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:dorado.db?mode=rwc".into());
    let auth_secret = std::env::var("AUTH_SECRET").expect("AUTH_SECRET must be set");
    let admin_client_id =
        std::env::var("ADMIN_CLIENT_ID").expect("ADMIN_CLIENT_ID must be set");

    // ── Tracing ──
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());
    let webapp_url = std::env::var("WEBAPP_URL").unwrap_or_default();

    // ── Database ──
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    db::run_migrations(&pool).await?;

    let state = Arc::new(AppState {
        db: pool,
        auth_secret,
        admin_client_id,
        started_at: Instant::now(),
    });

    // ── Rate limiter + background cleanup ──
    let rate_limiter = RateLimiter::new();
    let cleanup_limiter = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(RATE_LIMIT_CLEANUP_SECS));
        loop {
            interval.tick().await;
            cleanup_limiter.cleanup();
        }
    });

    // ── CORS: whitelist WEBAPP_URL when configured, otherwise allow any ──
    let cors = if webapp_url.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<axum::http::HeaderValue> = vec![
            webapp_url.parse().expect("WEBAPP_URL must be a valid URL"),
            "http://localhost:3000".parse().unwrap(), // Next dev server
        ];
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // ── Router (tiers with per-tier rate limits) ──

    // 1. No-limit: health checks
    let no_limit_routes = Router::new().route("/api/health", get(handlers::health::health));

    // 2. Public: read-only endpoints (no auth, 60 req/min)
    let public_routes = Router::new()
        .route("/api/services", get(handlers::client::list_services))
        .route(
            "/api/available-dates",
            get(handlers::client::list_available_dates),
        )
        .route(
            "/api/available-times",
            get(handlers::client::list_available_times),
        )
        .route("/api/policies", get(handlers::client::get_policies))
        .route("/api/contact", get(handlers::client::get_contact))
        .route("/api/promos/validate", get(handlers::client::validate_promo))
        .layer(from_fn_with_state(rate_limiter.clone(), limit_public));

    // 3. Appointment creation: strictest limit (5 req/5min)
    let booking_routes = Router::new()
        .route("/api/appointments", post(handlers::client::create_appointment))
        .layer(from_fn_with_state(rate_limiter.clone(), limit_booking));

    // 4. Authenticated client endpoints (30 req/min)
    let client_routes = Router::new()
        .route("/api/appointments/my", get(handlers::client::my_appointments))
        .route(
            "/api/appointments/{id}",
            delete(handlers::client::cancel_appointment),
        )
        .route("/api/waitlist", post(handlers::client::join_waitlist))
        .route("/api/waitlist/my", get(handlers::client::my_waitlist))
        .route("/api/waitlist/{id}", delete(handlers::client::leave_waitlist))
        .layer(from_fn_with_state(rate_limiter.clone(), limit_client));

    // 5. Admin: all admin endpoints (120 req/min)
    let admin_routes = Router::new()
        .route(
            "/api/admin/schedule",
            get(handlers::admin::get_schedule).put(handlers::admin::update_schedule),
        )
        .route(
            "/api/admin/blocked-dates",
            get(handlers::admin::list_blocked_dates).post(handlers::admin::add_blocked_date),
        )
        .route(
            "/api/admin/blocked-dates/{id}",
            delete(handlers::admin::remove_blocked_date),
        )
        .route(
            "/api/admin/services",
            get(handlers::admin::list_all_services).post(handlers::admin::create_service),
        )
        .route(
            "/api/admin/services/{id}",
            put(handlers::admin::update_service).delete(handlers::admin::delete_service),
        )
        .route(
            "/api/admin/promos",
            get(handlers::admin::list_promos).post(handlers::admin::create_promo),
        )
        .route(
            "/api/admin/promos/{id}",
            put(handlers::admin::update_promo).delete(handlers::admin::delete_promo),
        )
        .route(
            "/api/admin/appointments",
            get(handlers::admin::list_appointments),
        )
        .route(
            "/api/admin/appointments/{id}/complete",
            post(handlers::admin::complete_appointment),
        )
        .route(
            "/api/admin/appointments/{id}/cancel",
            post(handlers::admin::cancel_appointment),
        )
        .route("/api/admin/waitlist", get(handlers::admin::list_waitlist))
        .route("/api/admin/policies", put(handlers::admin::update_policies))
        .route("/api/admin/contact", put(handlers::admin::update_contact))
        .route("/api/admin/stats", get(handlers::admin::stats))
        .layer(from_fn_with_state(rate_limiter.clone(), limit_admin));

    let app = Router::new()
        .merge(no_limit_routes)
        .merge(public_routes)
        .merge(booking_routes)
        .merge(client_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    tracing::info!("Dorado Nails server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
