use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    Json,
};
use chrono::{Datelike, NaiveDate};
use std::collections::HashSet;
use std::sync::Arc;

use super::{
    api_error, booking_error, db_error, is_date_blocked, load_cancellation_hours,
    load_setting, load_weekly_schedule, salon_timestamp, salon_today, ApiError,
    APPOINTMENT_SELECT,
};
use crate::availability::{available_dates, free_starts, BusyInterval};
use crate::booking::{can_cancel, check_slot, discounted_price, promo_usable, BookingError};
use crate::models::*;
use crate::schedule::TimeOfDay;
use crate::{auth, AppState};

/// Helper: extract the authenticated client from the Authorization header.
fn extract_client(
    headers: &axum::http::HeaderMap,
    state: &AppState,
) -> Result<AuthClient, ApiError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            api_error(StatusCode::UNAUTHORIZED, "Falta el encabezado de autorización")
        })?;
    auth::extract_client_from_header(header, &state.auth_secret)
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "Credenciales inválidas"))
}

/// Map (start_time, end_time) rows onto busy intervals, skipping rows whose
/// stored times do not parse.
fn busy_from_rows(rows: &[(String, String)]) -> Vec<BusyInterval> {
    rows.iter()
        .filter_map(|(start, end)| {
            match (TimeOfDay::parse(start), TimeOfDay::parse(end)) {
                (Some(start), Some(end)) => Some(BusyInterval { start, end }),
                _ => {
                    tracing::warn!("appointment with unparseable times: {} - {}", start, end);
                    None
                }
            }
        })
        .collect()
}

// ── Endpoints ──

/// GET /api/services — list active services.
pub async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<Service>>>, ApiError> {
    let services = sqlx::query_as::<_, Service>(
        "SELECT id, name, description, duration_min, price, is_active
         FROM services WHERE is_active = 1 ORDER BY id ASC",
    )
    .fetch_all(&state.db)
    .await
    .map_err(|e| db_error("list_services", e))?;

    Ok(Json(ApiResponse::success(services)))
}

/// GET /api/available-dates — bookable dates over the search horizon.
pub async fn list_available_dates(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let schedule = load_weekly_schedule(&state.db)
        .await
        .map_err(|e| db_error("list_available_dates schedule", e))?;

    let blocked_rows: Vec<String> = sqlx::query_scalar("SELECT date FROM blocked_dates")
        .fetch_all(&state.db)
        .await
        .map_err(|e| db_error("list_available_dates blocked", e))?;
    let blocked: HashSet<NaiveDate> = blocked_rows
        .iter()
        .filter_map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .collect();

    let dates = available_dates(&schedule, &blocked, salon_today())
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();

    Ok(Json(ApiResponse::success(dates)))
}

/// GET /api/available-times?date=YYYY-MM-DD&service_id=N — free start times
/// for a date and service, conflict-filtered against that day's
/// appointments. Advisory: the allocator re-checks at booking time.
pub async fn list_available_times(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailableTimesQuery>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let Ok(date) = NaiveDate::parse_from_str(&query.date, "%Y-%m-%d") else {
        return Err(api_error(StatusCode::BAD_REQUEST, "Formato de fecha inválido"));
    };

    let service = sqlx::query_as::<_, Service>(
        "SELECT id, name, description, duration_min, price, is_active
         FROM services WHERE id = ? AND is_active = 1",
    )
    .bind(query.service_id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| db_error("list_available_times service", e))?;

    // Unknown service, past date, or blocked date: nothing to offer.
    let Some(service) = service else {
        return Ok(Json(ApiResponse::success(vec![])));
    };
    let Ok(duration) = u16::try_from(service.duration_min) else {
        return Ok(Json(ApiResponse::success(vec![])));
    };
    if date <= salon_today()
        || is_date_blocked(&state.db, &query.date)
            .await
            .map_err(|e| db_error("list_available_times blocked", e))?
    {
        return Ok(Json(ApiResponse::success(vec![])));
    }

    let schedule = load_weekly_schedule(&state.db)
        .await
        .map_err(|e| db_error("list_available_times schedule", e))?;

    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT start_time, end_time FROM appointments
         WHERE date = ? AND status != 'cancelled'",
    )
    .bind(&query.date)
    .fetch_all(&state.db)
    .await
    .map_err(|e| db_error("list_available_times appointments", e))?;
    let busy = busy_from_rows(&rows);

    let times = free_starts(schedule.day(date.weekday()), duration, &busy)
        .iter()
        .map(|t| t.to_string())
        .collect();

    Ok(Json(ApiResponse::success(times)))
}

/// POST /api/appointments — create an appointment for the authenticated
/// client. Preconditions run in order, each with its own error; the conflict
/// recheck and the insert share one transaction.
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Json(body): Json<CreateAppointmentRequest>,
) -> Result<Json<ApiResponse<Appointment>>, ApiError> {
    let client = extract_client(&headers, &state)?;

    let Ok(date) = NaiveDate::parse_from_str(&body.date, "%Y-%m-%d") else {
        return Err(api_error(StatusCode::BAD_REQUEST, "Formato de fecha inválido"));
    };
    let Some(start) = TimeOfDay::parse(&body.start_time) else {
        return Err(api_error(StatusCode::BAD_REQUEST, "Formato de hora inválido"));
    };

    // Precondition 1: the service exists and is active.
    let service = sqlx::query_as::<_, Service>(
        "SELECT id, name, description, duration_min, price, is_active
         FROM services WHERE id = ? AND is_active = 1",
    )
    .bind(body.service_id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| db_error("create_appointment service", e))?
    .ok_or_else(|| booking_error(BookingError::InvalidService))?;

    let duration = u16::try_from(service.duration_min).map_err(|_| {
        tracing::error!("service {} has out-of-range duration", service.id);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Servicio mal configurado")
    })?;

    // The selector never offers today or earlier; hold the allocator to the
    // same floor.
    if date <= salon_today() {
        return Err(booking_error(BookingError::DateUnavailable));
    }

    let schedule = load_weekly_schedule(&state.db)
        .await
        .map_err(|e| db_error("create_appointment schedule", e))?;
    let blocked = is_date_blocked(&state.db, &body.date)
        .await
        .map_err(|e| db_error("create_appointment blocked", e))?;
    let day = schedule.day(date.weekday());

    // Preconditions 2-4 against a fresh appointment list, then the insert,
    // all in one transaction. An early return drops the transaction and
    // rolls back.
    let mut tx = state
        .db
        .begin()
        .await
        .map_err(|e| db_error("create_appointment begin", e))?;

    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT start_time, end_time FROM appointments
         WHERE date = ? AND status != 'cancelled'",
    )
    .bind(&body.date)
    .fetch_all(&mut *tx)
    .await
    .map_err(|e| db_error("create_appointment recheck", e))?;
    let busy = busy_from_rows(&rows);

    let end = check_slot(day, blocked, start, duration, &busy).map_err(booking_error)?;

    // Optional promo: conditional atomic redemption inside the same
    // transaction, so the counter never exceeds the limit under races.
    let mut price = service.price;
    let mut discount_code = None;
    let mut discount_percent = None;
    if let Some(code) = body.promo_code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        let promo = sqlx::query_as::<_, PromoCode>(
            "SELECT id, code, discount_percent, is_active, usage_limit, usage_count
             FROM promo_codes WHERE code = ? COLLATE NOCASE",
        )
        .bind(code)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("create_appointment promo", e))?
        .filter(promo_usable)
        .ok_or_else(|| booking_error(BookingError::InvalidPromo))?;

        let redeemed = sqlx::query(
            "UPDATE promo_codes SET usage_count = usage_count + 1
             WHERE id = ? AND is_active = 1 AND usage_count < usage_limit",
        )
        .bind(promo.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("create_appointment redeem", e))?;
        if redeemed.rows_affected() == 0 {
            return Err(booking_error(BookingError::InvalidPromo));
        }

        price = discounted_price(service.price, promo.discount_percent);
        discount_code = Some(promo.code);
        discount_percent = Some(promo.discount_percent);
    }

    let created_at = salon_timestamp();
    let id = sqlx::query(
        "INSERT INTO appointments (client_id, client_name, service_id, service_name,
         date, start_time, end_time, status, price, discount_code, discount_percent, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&client.id)
    .bind(&client.name)
    .bind(service.id)
    .bind(&service.name)
    .bind(&body.date)
    .bind(start.to_string())
    .bind(end.to_string())
    .bind(AppointmentStatus::Confirmed.as_str())
    .bind(price)
    .bind(&discount_code)
    .bind(discount_percent)
    .bind(&created_at)
    .execute(&mut *tx)
    .await
    .map_err(|e| db_error("create_appointment insert", e))?
    .last_insert_rowid();

    tx.commit()
        .await
        .map_err(|e| db_error("create_appointment commit", e))?;

    let appointment = Appointment {
        id,
        client_id: client.id,
        client_name: client.name,
        service_id: service.id,
        service_name: service.name,
        date: body.date,
        start_time: start.to_string(),
        end_time: end.to_string(),
        status: AppointmentStatus::Confirmed.as_str().into(),
        price,
        discount_code,
        discount_percent,
        created_at,
        cancelled_at: None,
    };

    Ok(Json(ApiResponse::success(appointment)))
}

/// GET /api/appointments/my — the client's appointments, newest date first.
pub async fn my_appointments(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> Result<Json<ApiResponse<Vec<Appointment>>>, ApiError> {
    let client = extract_client(&headers, &state)?;

    let query = format!(
        "{} WHERE client_id = ? ORDER BY date DESC, start_time DESC",
        APPOINTMENT_SELECT
    );
    let appointments = sqlx::query_as::<_, Appointment>(&query)
        .bind(&client.id)
        .fetch_all(&state.db)
        .await
        .map_err(|e| db_error("my_appointments", e))?;

    Ok(Json(ApiResponse::success(appointments)))
}

/// DELETE /api/appointments/:id — cancel an own confirmed appointment,
/// subject to the configured cancellation lead time.
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<&'static str>>, ApiError> {
    let client = extract_client(&headers, &state)?;

    let query = format!(
        "{} WHERE id = ? AND client_id = ? AND status = 'confirmed'",
        APPOINTMENT_SELECT
    );
    let appointment = sqlx::query_as::<_, Appointment>(&query)
        .bind(id)
        .bind(&client.id)
        .fetch_optional(&state.db)
        .await
        .map_err(|e| db_error("cancel_appointment fetch", e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Turno no encontrado"))?;

    let lead_hours = load_cancellation_hours(&state.db)
        .await
        .map_err(|e| db_error("cancel_appointment policy", e))?;

    // Unparseable stored times default to cancellable.
    let cancellable = match (
        NaiveDate::parse_from_str(&appointment.date, "%Y-%m-%d"),
        TimeOfDay::parse(&appointment.start_time),
    ) {
        (Ok(date), Some(start)) => {
            can_cancel(date, start, lead_hours, super::salon_now().naive_local())
        }
        _ => true,
    };
    if !cancellable {
        return Err(api_error(
            StatusCode::CONFLICT,
            format!(
                "No se puede cancelar con menos de {} horas de anticipación",
                lead_hours
            ),
        ));
    }

    sqlx::query("UPDATE appointments SET status = ?, cancelled_at = ? WHERE id = ?")
        .bind(AppointmentStatus::Cancelled.as_str())
        .bind(salon_timestamp())
        .bind(id)
        .execute(&state.db)
        .await
        .map_err(|e| db_error("cancel_appointment update", e))?;

    Ok(Json(ApiResponse::success("Turno cancelado")))
}

/// GET /api/promos/validate?code=X — preview a promo code without redeeming
/// it. The usage counter only moves at booking time.
pub async fn validate_promo(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PromoValidateQuery>,
) -> Result<Json<ApiResponse<PromoPreview>>, ApiError> {
    let promo = sqlx::query_as::<_, PromoCode>(
        "SELECT id, code, discount_percent, is_active, usage_limit, usage_count
         FROM promo_codes WHERE code = ? COLLATE NOCASE",
    )
    .bind(query.code.trim())
    .fetch_optional(&state.db)
    .await
    .map_err(|e| db_error("validate_promo", e))?
    .filter(promo_usable)
    .ok_or_else(|| booking_error(BookingError::InvalidPromo))?;

    Ok(Json(ApiResponse::success(PromoPreview {
        code: promo.code,
        discount_percent: promo.discount_percent,
    })))
}

/// GET /api/policies — cancellation lead hours.
pub async fn get_policies(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<PoliciesPayload>>, ApiError> {
    let cancellation_hours = load_cancellation_hours(&state.db)
        .await
        .map_err(|e| db_error("get_policies", e))?;
    Ok(Json(ApiResponse::success(PoliciesPayload { cancellation_hours })))
}

/// GET /api/contact — salon WhatsApp number for booking confirmations.
pub async fn get_contact(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ContactPayload>>, ApiError> {
    let whatsapp = load_setting(&state.db, "contact_whatsapp")
        .await
        .map_err(|e| db_error("get_contact", e))?
        .unwrap_or_default();
    Ok(Json(ApiResponse::success(ContactPayload { whatsapp })))
}

// ── Waitlist ──

/// POST /api/waitlist — join the waitlist for a date.
pub async fn join_waitlist(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Json(body): Json<WaitlistRequest>,
) -> Result<Json<ApiResponse<WaitlistEntry>>, ApiError> {
    let client = extract_client(&headers, &state)?;

    if NaiveDate::parse_from_str(&body.date, "%Y-%m-%d").is_err() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Formato de fecha inválido"));
    }

    let already: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM waitlist WHERE client_id = ? AND date = ?",
    )
    .bind(&client.id)
    .bind(&body.date)
    .fetch_one(&state.db)
    .await
    .map_err(|e| db_error("join_waitlist check", e))?;
    if already {
        return Err(api_error(
            StatusCode::CONFLICT,
            "Ya estás en la lista de espera para esa fecha",
        ));
    }

    let created_at = salon_timestamp();
    let id = sqlx::query(
        "INSERT INTO waitlist (client_id, client_name, date, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&client.id)
    .bind(&client.name)
    .bind(&body.date)
    .bind(&created_at)
    .execute(&state.db)
    .await
    .map_err(|e| db_error("join_waitlist insert", e))?
    .last_insert_rowid();

    Ok(Json(ApiResponse::success(WaitlistEntry {
        id,
        client_id: client.id,
        client_name: client.name,
        date: body.date,
        created_at,
    })))
}

/// GET /api/waitlist/my — the client's waitlist entries.
pub async fn my_waitlist(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> Result<Json<ApiResponse<Vec<WaitlistEntry>>>, ApiError> {
    let client = extract_client(&headers, &state)?;

    let entries = sqlx::query_as::<_, WaitlistEntry>(
        "SELECT id, client_id, client_name, date, created_at
         FROM waitlist WHERE client_id = ? ORDER BY date ASC",
    )
    .bind(&client.id)
    .fetch_all(&state.db)
    .await
    .map_err(|e| db_error("my_waitlist", e))?;

    Ok(Json(ApiResponse::success(entries)))
}

/// DELETE /api/waitlist/:id — leave the waitlist.
pub async fn leave_waitlist(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<&'static str>>, ApiError> {
    let client = extract_client(&headers, &state)?;

    let result = sqlx::query("DELETE FROM waitlist WHERE id = ? AND client_id = ?")
        .bind(id)
        .bind(&client.id)
        .execute(&state.db)
        .await
        .map_err(|e| db_error("leave_waitlist", e))?;
    if result.rows_affected() == 0 {
        return Err(api_error(StatusCode::NOT_FOUND, "Entrada no encontrada"));
    }

    Ok(Json(ApiResponse::success("Saliste de la lista de espera")))
}

// ── Tests ──
