use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    Json,
};
use chrono::{Datelike, Duration, Months, NaiveDate};
use std::sync::Arc;

use super::{
    api_error, db_error, load_weekly_schedule, salon_timestamp, salon_today, save_setting,
    ApiError, APPOINTMENT_SELECT,
};
use crate::models::*;
use crate::schedule::{WeeklySchedule, SLOT_STEP_MIN};
use crate::{auth, AppState};

/// Helper: extract the admin (validates both the token and the admin id).
fn extract_admin(
    headers: &axum::http::HeaderMap,
    state: &AppState,
) -> Result<AuthClient, ApiError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            api_error(StatusCode::UNAUTHORIZED, "Falta el encabezado de autorización")
        })?;
    let client = auth::extract_client_from_header(header, &state.auth_secret)
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "Credenciales inválidas"))?;

    if !auth::is_admin(&client, &state.admin_client_id) {
        return Err(api_error(StatusCode::FORBIDDEN, "Acceso denegado"));
    }

    Ok(client)
}

fn validate_duration(duration_min: i64) -> Result<(), ApiError> {
    if duration_min <= 0 || duration_min % i64::from(SLOT_STEP_MIN) != 0 {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("La duración debe ser un múltiplo positivo de {} minutos", SLOT_STEP_MIN),
        ));
    }
    Ok(())
}

// ── Weekly schedule ──

/// GET /api/admin/schedule — the current weekly schedule document.
pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> Result<Json<ApiResponse<WeeklySchedule>>, ApiError> {
    extract_admin(&headers, &state)?;

    let schedule = load_weekly_schedule(&state.db)
        .await
        .map_err(|e| db_error("get_schedule", e))?;
    Ok(Json(ApiResponse::success(schedule)))
}

/// PUT /api/admin/schedule — replace the weekly schedule as a whole
/// document.
pub async fn update_schedule(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Json(schedule): Json<WeeklySchedule>,
) -> Result<Json<ApiResponse<WeeklySchedule>>, ApiError> {
    extract_admin(&headers, &state)?;

    if let Err(reason) = schedule.validate() {
        return Err(api_error(StatusCode::BAD_REQUEST, reason));
    }

    let json = serde_json::to_string(&schedule).map_err(|e| {
        tracing::error!("update_schedule serialize: {}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Error interno")
    })?;
    save_setting(&state.db, "weekly_schedule", &json)
        .await
        .map_err(|e| db_error("update_schedule", e))?;

    Ok(Json(ApiResponse::success(schedule)))
}

// ── Blocked dates ──

/// GET /api/admin/blocked-dates — all blocked dates, chronological.
pub async fn list_blocked_dates(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> Result<Json<ApiResponse<Vec<BlockedDate>>>, ApiError> {
    extract_admin(&headers, &state)?;

    let dates = sqlx::query_as::<_, BlockedDate>(
        "SELECT id, date, reason FROM blocked_dates ORDER BY date ASC",
    )
    .fetch_all(&state.db)
    .await
    .map_err(|e| db_error("list_blocked_dates", e))?;

    Ok(Json(ApiResponse::success(dates)))
}

/// POST /api/admin/blocked-dates — block a calendar date.
pub async fn add_blocked_date(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Json(body): Json<BlockedDateRequest>,
) -> Result<Json<ApiResponse<BlockedDate>>, ApiError> {
    extract_admin(&headers, &state)?;

    if NaiveDate::parse_from_str(&body.date, "%Y-%m-%d").is_err() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Formato de fecha inválido"));
    }

    let exists: bool =
        sqlx::query_scalar("SELECT COUNT(*) > 0 FROM blocked_dates WHERE date = ?")
            .bind(&body.date)
            .fetch_one(&state.db)
            .await
            .map_err(|e| db_error("add_blocked_date check", e))?;
    if exists {
        return Err(api_error(StatusCode::CONFLICT, "La fecha ya está bloqueada"));
    }

    let id = sqlx::query("INSERT INTO blocked_dates (date, reason) VALUES (?, ?)")
        .bind(&body.date)
        .bind(&body.reason)
        .execute(&state.db)
        .await
        .map_err(|e| db_error("add_blocked_date insert", e))?
        .last_insert_rowid();

    Ok(Json(ApiResponse::success(BlockedDate {
        id,
        date: body.date,
        reason: body.reason,
    })))
}

/// DELETE /api/admin/blocked-dates/:id — unblock a date.
pub async fn remove_blocked_date(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<&'static str>>, ApiError> {
    extract_admin(&headers, &state)?;

    let result = sqlx::query("DELETE FROM blocked_dates WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await
        .map_err(|e| db_error("remove_blocked_date", e))?;
    if result.rows_affected() == 0 {
        return Err(api_error(StatusCode::NOT_FOUND, "Fecha bloqueada no encontrada"));
    }

    Ok(Json(ApiResponse::success("Fecha desbloqueada")))
}

// ── Services ──

/// GET /api/admin/services — list ALL services (including inactive).
pub async fn list_all_services(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> Result<Json<ApiResponse<Vec<Service>>>, ApiError> {
    extract_admin(&headers, &state)?;

    let services = sqlx::query_as::<_, Service>(
        "SELECT id, name, description, duration_min, price, is_active
         FROM services ORDER BY id ASC",
    )
    .fetch_all(&state.db)
    .await
    .map_err(|e| db_error("list_all_services", e))?;

    Ok(Json(ApiResponse::success(services)))
}

/// POST /api/admin/services — create a new service.
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Json(body): Json<CreateServiceRequest>,
) -> Result<Json<ApiResponse<Service>>, ApiError> {
    extract_admin(&headers, &state)?;

    if body.name.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "El nombre es obligatorio"));
    }
    validate_duration(body.duration_min)?;
    if body.price < 0 {
        return Err(api_error(StatusCode::BAD_REQUEST, "El precio no puede ser negativo"));
    }

    let id = sqlx::query(
        "INSERT INTO services (name, description, duration_min, price) VALUES (?, ?, ?, ?)",
    )
    .bind(body.name.trim())
    .bind(body.description.as_deref().unwrap_or(""))
    .bind(body.duration_min)
    .bind(body.price)
    .execute(&state.db)
    .await
    .map_err(|e| db_error("create_service", e))?
    .last_insert_rowid();

    let service = sqlx::query_as::<_, Service>(
        "SELECT id, name, description, duration_min, price, is_active FROM services WHERE id = ?",
    )
    .bind(id)
    .fetch_one(&state.db)
    .await
    .map_err(|e| db_error("create_service fetch", e))?;

    Ok(Json(ApiResponse::success(service)))
}

/// PUT /api/admin/services/:id — update a service.
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<UpdateServiceRequest>,
) -> Result<Json<ApiResponse<Service>>, ApiError> {
    extract_admin(&headers, &state)?;

    if let Some(duration) = body.duration_min {
        validate_duration(duration)?;
    }
    if matches!(body.price, Some(p) if p < 0) {
        return Err(api_error(StatusCode::BAD_REQUEST, "El precio no puede ser negativo"));
    }

    if let Some(name) = &body.name {
        sqlx::query("UPDATE services SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&state.db)
            .await
            .map_err(|e| db_error("update_service name", e))?;
    }
    if let Some(description) = &body.description {
        sqlx::query("UPDATE services SET description = ? WHERE id = ?")
            .bind(description)
            .bind(id)
            .execute(&state.db)
            .await
            .map_err(|e| db_error("update_service description", e))?;
    }
    if let Some(duration) = body.duration_min {
        sqlx::query("UPDATE services SET duration_min = ? WHERE id = ?")
            .bind(duration)
            .bind(id)
            .execute(&state.db)
            .await
            .map_err(|e| db_error("update_service duration", e))?;
    }
    if let Some(price) = body.price {
        sqlx::query("UPDATE services SET price = ? WHERE id = ?")
            .bind(price)
            .bind(id)
            .execute(&state.db)
            .await
            .map_err(|e| db_error("update_service price", e))?;
    }
    if let Some(active) = body.is_active {
        sqlx::query("UPDATE services SET is_active = ? WHERE id = ?")
            .bind(active)
            .bind(id)
            .execute(&state.db)
            .await
            .map_err(|e| db_error("update_service active", e))?;
    }

    let service = sqlx::query_as::<_, Service>(
        "SELECT id, name, description, duration_min, price, is_active FROM services WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| db_error("update_service fetch", e))?
    .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Servicio no encontrado"))?;

    Ok(Json(ApiResponse::success(service)))
}

/// DELETE /api/admin/services/:id — remove a service. Appointments keep
/// their denormalized name and price snapshot.
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<&'static str>>, ApiError> {
    extract_admin(&headers, &state)?;

    let result = sqlx::query("DELETE FROM services WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await
        .map_err(|e| db_error("delete_service", e))?;
    if result.rows_affected() == 0 {
        return Err(api_error(StatusCode::NOT_FOUND, "Servicio no encontrado"));
    }

    Ok(Json(ApiResponse::success("Servicio eliminado")))
}

// ── Promo codes ──

fn validate_percent(percent: i64) -> Result<(), ApiError> {
    if !(1..=100).contains(&percent) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "El descuento debe estar entre 1 y 100",
        ));
    }
    Ok(())
}

/// GET /api/admin/promos — all promo codes.
pub async fn list_promos(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> Result<Json<ApiResponse<Vec<PromoCode>>>, ApiError> {
    extract_admin(&headers, &state)?;

    let promos = sqlx::query_as::<_, PromoCode>(
        "SELECT id, code, discount_percent, is_active, usage_limit, usage_count
         FROM promo_codes ORDER BY id ASC",
    )
    .fetch_all(&state.db)
    .await
    .map_err(|e| db_error("list_promos", e))?;

    Ok(Json(ApiResponse::success(promos)))
}

/// POST /api/admin/promos — create a promo code.
pub async fn create_promo(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Json(body): Json<CreatePromoRequest>,
) -> Result<Json<ApiResponse<PromoCode>>, ApiError> {
    extract_admin(&headers, &state)?;

    let code = body.code.trim().to_uppercase();
    if code.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "El código es obligatorio"));
    }
    validate_percent(body.discount_percent)?;
    if body.usage_limit < 1 {
        return Err(api_error(StatusCode::BAD_REQUEST, "El límite de usos debe ser al menos 1"));
    }

    // Codes are unique case-insensitively.
    let exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM promo_codes WHERE code = ? COLLATE NOCASE",
    )
    .bind(&code)
    .fetch_one(&state.db)
    .await
    .map_err(|e| db_error("create_promo check", e))?;
    if exists {
        return Err(api_error(StatusCode::CONFLICT, "El código ya existe"));
    }

    let id = sqlx::query(
        "INSERT INTO promo_codes (code, discount_percent, usage_limit) VALUES (?, ?, ?)",
    )
    .bind(&code)
    .bind(body.discount_percent)
    .bind(body.usage_limit)
    .execute(&state.db)
    .await
    .map_err(|e| db_error("create_promo insert", e))?
    .last_insert_rowid();

    Ok(Json(ApiResponse::success(PromoCode {
        id,
        code,
        discount_percent: body.discount_percent,
        is_active: true,
        usage_limit: body.usage_limit,
        usage_count: 0,
    })))
}

/// PUT /api/admin/promos/:id — update a promo code.
pub async fn update_promo(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<UpdatePromoRequest>,
) -> Result<Json<ApiResponse<PromoCode>>, ApiError> {
    extract_admin(&headers, &state)?;

    if let Some(percent) = body.discount_percent {
        validate_percent(percent)?;
        sqlx::query("UPDATE promo_codes SET discount_percent = ? WHERE id = ?")
            .bind(percent)
            .bind(id)
            .execute(&state.db)
            .await
            .map_err(|e| db_error("update_promo percent", e))?;
    }
    if let Some(limit) = body.usage_limit {
        if limit < 1 {
            return Err(api_error(StatusCode::BAD_REQUEST, "El límite de usos debe ser al menos 1"));
        }
        sqlx::query("UPDATE promo_codes SET usage_limit = ? WHERE id = ?")
            .bind(limit)
            .bind(id)
            .execute(&state.db)
            .await
            .map_err(|e| db_error("update_promo limit", e))?;
    }
    if let Some(active) = body.is_active {
        sqlx::query("UPDATE promo_codes SET is_active = ? WHERE id = ?")
            .bind(active)
            .bind(id)
            .execute(&state.db)
            .await
            .map_err(|e| db_error("update_promo active", e))?;
    }

    let promo = sqlx::query_as::<_, PromoCode>(
        "SELECT id, code, discount_percent, is_active, usage_limit, usage_count
         FROM promo_codes WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| db_error("update_promo fetch", e))?
    .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Código no encontrado"))?;

    Ok(Json(ApiResponse::success(promo)))
}

/// DELETE /api/admin/promos/:id — delete a promo code.
pub async fn delete_promo(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<&'static str>>, ApiError> {
    extract_admin(&headers, &state)?;

    let result = sqlx::query("DELETE FROM promo_codes WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await
        .map_err(|e| db_error("delete_promo", e))?;
    if result.rows_affected() == 0 {
        return Err(api_error(StatusCode::NOT_FOUND, "Código no encontrado"));
    }

    Ok(Json(ApiResponse::success("Código eliminado")))
}

// ── Appointments ──

/// GET /api/admin/appointments — confirmed appointments for a day, a range,
/// or everything upcoming.
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Json<ApiResponse<Vec<Appointment>>>, ApiError> {
    extract_admin(&headers, &state)?;

    let appointments = if let Some(date) = &query.date {
        let sql = format!(
            "{} WHERE date = ? AND status = 'confirmed' ORDER BY start_time ASC",
            APPOINTMENT_SELECT
        );
        sqlx::query_as::<_, Appointment>(&sql)
            .bind(date)
            .fetch_all(&state.db)
            .await
    } else if let (Some(from), Some(to)) = (&query.from, &query.to) {
        let sql = format!(
            "{} WHERE date BETWEEN ? AND ? AND status = 'confirmed'
             ORDER BY date ASC, start_time ASC",
            APPOINTMENT_SELECT
        );
        sqlx::query_as::<_, Appointment>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&state.db)
            .await
    } else {
        let sql = format!(
            "{} WHERE date >= ? AND status = 'confirmed' ORDER BY date ASC, start_time ASC",
            APPOINTMENT_SELECT
        );
        sqlx::query_as::<_, Appointment>(&sql)
            .bind(salon_today().format("%Y-%m-%d").to_string())
            .fetch_all(&state.db)
            .await
    }
    .map_err(|e| db_error("list_appointments", e))?;

    Ok(Json(ApiResponse::success(appointments)))
}

/// POST /api/admin/appointments/:id/complete — mark a confirmed appointment
/// as completed.
pub async fn complete_appointment(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<&'static str>>, ApiError> {
    extract_admin(&headers, &state)?;

    let result = sqlx::query(
        "UPDATE appointments SET status = ? WHERE id = ? AND status = 'confirmed'",
    )
    .bind(AppointmentStatus::Completed.as_str())
    .bind(id)
    .execute(&state.db)
    .await
    .map_err(|e| db_error("complete_appointment", e))?;
    if result.rows_affected() == 0 {
        return Err(api_error(StatusCode::NOT_FOUND, "Turno no encontrado o ya cerrado"));
    }

    Ok(Json(ApiResponse::success("Turno completado")))
}

/// POST /api/admin/appointments/:id/cancel — admin cancels a confirmed
/// appointment; the lead-time policy does not apply.
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<&'static str>>, ApiError> {
    extract_admin(&headers, &state)?;

    let result = sqlx::query(
        "UPDATE appointments SET status = ?, cancelled_at = ?
         WHERE id = ? AND status = 'confirmed'",
    )
    .bind(AppointmentStatus::Cancelled.as_str())
    .bind(salon_timestamp())
    .bind(id)
    .execute(&state.db)
    .await
    .map_err(|e| db_error("admin cancel_appointment", e))?;
    if result.rows_affected() == 0 {
        return Err(api_error(StatusCode::NOT_FOUND, "Turno no encontrado o ya cerrado"));
    }

    Ok(Json(ApiResponse::success("Turno cancelado")))
}

// ── Waitlist ──

/// GET /api/admin/waitlist?date=YYYY-MM-DD — waitlist entries for a date.
pub async fn list_waitlist(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Query(query): Query<WaitlistDateQuery>,
) -> Result<Json<ApiResponse<Vec<WaitlistEntry>>>, ApiError> {
    extract_admin(&headers, &state)?;

    let entries = sqlx::query_as::<_, WaitlistEntry>(
        "SELECT id, client_id, client_name, date, created_at
         FROM waitlist WHERE date = ? ORDER BY created_at ASC",
    )
    .bind(&query.date)
    .fetch_all(&state.db)
    .await
    .map_err(|e| db_error("list_waitlist", e))?;

    Ok(Json(ApiResponse::success(entries)))
}

// ── Settings ──

/// PUT /api/admin/policies — set the cancellation lead hours.
pub async fn update_policies(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Json(body): Json<PoliciesPayload>,
) -> Result<Json<ApiResponse<PoliciesPayload>>, ApiError> {
    extract_admin(&headers, &state)?;

    if body.cancellation_hours < 0 {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Las horas de anticipación no pueden ser negativas",
        ));
    }

    save_setting(&state.db, "cancellation_hours", &body.cancellation_hours.to_string())
        .await
        .map_err(|e| db_error("update_policies", e))?;

    Ok(Json(ApiResponse::success(body)))
}

/// PUT /api/admin/contact — set the salon WhatsApp number.
pub async fn update_contact(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
    Json(body): Json<ContactPayload>,
) -> Result<Json<ApiResponse<ContactPayload>>, ApiError> {
    extract_admin(&headers, &state)?;

    save_setting(&state.db, "contact_whatsapp", &body.whatsapp)
        .await
        .map_err(|e| db_error("update_contact", e))?;

    Ok(Json(ApiResponse::success(body)))
}

// ── Stats ──

/// First and last day of the month containing `today`.
fn month_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(today);
    (start, end)
}

/// GET /api/admin/stats — appointment counts, monthly revenue from
/// completed appointments, top services.
pub async fn stats(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> Result<Json<ApiResponse<StatsResponse>>, ApiError> {
    extract_admin(&headers, &state)?;

    let today = salon_today();
    let week_start = (today - Duration::days(6)).format("%Y-%m-%d").to_string();
    let today_str = today.format("%Y-%m-%d").to_string();
    let (month_start, month_end) = month_bounds(today);
    let month_start = month_start.format("%Y-%m-%d").to_string();
    let month_end = month_end.format("%Y-%m-%d").to_string();

    let appointments_last_7_days: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM appointments WHERE date BETWEEN ? AND ?")
            .bind(&week_start)
            .bind(&today_str)
            .fetch_one(&state.db)
            .await
            .map_err(|e| db_error("stats week", e))?;

    let appointments_this_month: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM appointments WHERE date BETWEEN ? AND ?")
            .bind(&month_start)
            .bind(&month_end)
            .fetch_one(&state.db)
            .await
            .map_err(|e| db_error("stats month", e))?;

    let revenue_this_month: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(price), 0) FROM appointments
         WHERE status = 'completed' AND date BETWEEN ? AND ?",
    )
    .bind(&month_start)
    .bind(&month_end)
    .fetch_one(&state.db)
    .await
    .map_err(|e| db_error("stats revenue", e))?;

    let top_services = sqlx::query_as::<_, ServiceCount>(
        "SELECT service_name AS name, COUNT(*) AS count FROM appointments
         GROUP BY service_name ORDER BY count DESC, name ASC LIMIT 3",
    )
    .fetch_all(&state.db)
    .await
    .map_err(|e| db_error("stats top services", e))?;

    Ok(Json(ApiResponse::success(StatsResponse {
        appointments_last_7_days,
        appointments_this_month,
        revenue_this_month,
        top_services,
    })))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_month_bounds_mid_month() {
        assert_eq!(
            month_bounds(date("2026-03-15")),
            (date("2026-03-01"), date("2026-03-31"))
        );
    }

    #[test]
    fn test_month_bounds_december_rollover() {
        assert_eq!(
            month_bounds(date("2026-12-31")),
            (date("2026-12-01"), date("2026-12-31"))
        );
    }

    #[test]
    fn test_month_bounds_february() {
        assert_eq!(
            month_bounds(date("2026-02-10")),
            (date("2026-02-01"), date("2026-02-28"))
        );
        // Leap year
        assert_eq!(
            month_bounds(date("2028-02-10")),
            (date("2028-02-01"), date("2028-02-29"))
        );
    }
}
