use serde::{Deserialize, Serialize};

// ── Database models ──

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub duration_min: i64,
    pub price: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Appointment {
    pub id: i64,
    pub client_id: String,
    pub client_name: String,
    pub service_id: i64,
    pub service_name: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub status: String,
    /// Price snapshot taken at booking time; later service edits never
    /// change it.
    pub price: i64,
    pub discount_code: Option<String>,
    pub discount_percent: Option<i64>,
    pub created_at: String,
    pub cancelled_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BlockedDate {
    pub id: i64,
    pub date: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PromoCode {
    pub id: i64,
    pub code: String,
    pub discount_percent: i64,
    pub is_active: bool,
    pub usage_limit: i64,
    pub usage_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WaitlistEntry {
    pub id: i64,
    pub client_id: String,
    pub client_name: String,
    pub date: String,
    pub created_at: String,
}

// ── Appointment status ──

/// Appointment lifecycle. Transitions leave `confirmed` and never return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentStatus {
    Confirmed,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

// ── API request/response types ──

#[derive(Debug, Deserialize)]
pub struct CreateAppointmentRequest {
    pub service_id: i64,
    pub date: String,
    pub start_time: String,
    #[serde(default)]
    pub promo_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AvailableTimesQuery {
    pub date: String,
    pub service_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct PromoValidateQuery {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct PromoPreview {
    pub code: String,
    pub discount_percent: i64,
}

#[derive(Debug, Deserialize)]
pub struct BlockedDateRequest {
    pub date: String,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub description: Option<String>,
    pub duration_min: i64,
    pub price: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub duration_min: Option<i64>,
    pub price: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePromoRequest {
    pub code: String,
    pub discount_percent: i64,
    pub usage_limit: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePromoRequest {
    pub discount_percent: Option<i64>,
    pub usage_limit: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AppointmentsQuery {
    pub date: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WaitlistRequest {
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct WaitlistDateQuery {
    pub date: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PoliciesPayload {
    pub cancellation_hours: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContactPayload {
    pub whatsapp: String,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ServiceCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub appointments_last_7_days: i64,
    pub appointments_this_month: i64,
    pub revenue_this_month: i64,
    pub top_services: Vec<ServiceCount>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

// ── Signed client identity ──

/// Identity payload issued and signed by the upstream auth provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClient {
    pub id: String,
    pub name: String,
    pub issued_at: i64,
}
