pub mod admin;
pub mod client;
pub mod health;

use axum::{http::StatusCode, Json};
use chrono::{FixedOffset, NaiveDate, Utc};

use crate::booking::BookingError;
use crate::models::ApiResponse;
use crate::schedule::WeeklySchedule;

// ── Shared constants ──

/// Salon timezone offset (UTC-3, no DST).
const SALON_OFFSET_SECS: i32 = -3 * 3600;

/// Current date and time in salon local time.
pub fn salon_now() -> chrono::DateTime<FixedOffset> {
    let tz = FixedOffset::east_opt(SALON_OFFSET_SECS).unwrap();
    Utc::now().with_timezone(&tz)
}

pub fn salon_today() -> NaiveDate {
    salon_now().date_naive()
}

/// Timestamp format used for created_at / cancelled_at columns.
pub fn salon_timestamp() -> String {
    salon_now().format("%Y-%m-%d %H:%M:%S").to_string()
}

// ── Shared error plumbing ──

/// Error tuple every handler returns on failure.
pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

pub fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    (status, Json(ApiResponse::error(msg)))
}

pub fn db_error(context: &str, e: sqlx::Error) -> ApiError {
    tracing::error!("{}: {}", context, e);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "Error de base de datos")
}

pub fn booking_error(err: BookingError) -> ApiError {
    let (status, msg) = match err {
        BookingError::InvalidService => {
            (StatusCode::NOT_FOUND, "Servicio no encontrado o inactivo")
        }
        BookingError::DateUnavailable => (StatusCode::CONFLICT, "La fecha no está disponible"),
        BookingError::OutsideBusinessHours => {
            (StatusCode::CONFLICT, "El horario está fuera del horario de atención")
        }
        BookingError::SlotConflict => (StatusCode::CONFLICT, "El horario ya no está disponible"),
        BookingError::InvalidPromo => {
            (StatusCode::BAD_REQUEST, "Código promocional inválido o agotado")
        }
    };
    api_error(status, msg)
}

// ── Shared queries ──

/// The shared SELECT columns for appointment queries.
pub const APPOINTMENT_SELECT: &str =
    "SELECT id, client_id, client_name, service_id, service_name, date, start_time, end_time,
            status, price, discount_code, discount_percent, created_at, cancelled_at
     FROM appointments";

/// Load the weekly schedule document, falling back to the business default
/// when no document has been saved yet.
pub async fn load_weekly_schedule(db: &sqlx::SqlitePool) -> Result<WeeklySchedule, sqlx::Error> {
    let raw: Option<String> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = 'weekly_schedule'")
            .fetch_optional(db)
            .await?;
    match raw {
        Some(json) => match serde_json::from_str(&json) {
            Ok(schedule) => Ok(schedule),
            Err(e) => {
                tracing::warn!("stored weekly schedule is malformed, using default: {}", e);
                Ok(WeeklySchedule::default())
            }
        },
        None => Ok(WeeklySchedule::default()),
    }
}

pub async fn load_setting(
    db: &sqlx::SqlitePool,
    key: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await
}

pub async fn save_setting(
    db: &sqlx::SqlitePool,
    key: &str,
    value: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(db)
    .await?;
    Ok(())
}

/// Cancellation lead hours; zero (always cancellable) when unset or
/// unparseable.
pub async fn load_cancellation_hours(db: &sqlx::SqlitePool) -> Result<i64, sqlx::Error> {
    Ok(load_setting(db, "cancellation_hours")
        .await?
        .and_then(|v| v.parse().ok())
        .unwrap_or(0))
}

pub async fn is_date_blocked(db: &sqlx::SqlitePool, date: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) > 0 FROM blocked_dates WHERE date = ?")
        .bind(date)
        .fetch_one(db)
        .await
}
