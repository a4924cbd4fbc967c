use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::models::ApiResponse;

// ── Tiers ──

/// Request tiers with their sliding-window budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Read-only endpoints.
    Public,
    /// Authenticated client endpoints.
    Client,
    /// Appointment creation (strictest).
    Booking,
    /// Admin endpoints.
    Admin,
}

impl Tier {
    fn max_requests(self) -> usize {
        match self {
            Tier::Public => 60,
            Tier::Client => 30,
            Tier::Booking => 5,
            Tier::Admin => 120,
        }
    }

    fn window(self) -> Duration {
        match self {
            Tier::Booking => Duration::from_secs(300),
            _ => Duration::from_secs(60),
        }
    }
}

// ── Core rate limiter ──

/// In-memory per-IP rate limiter using sliding-window counters, keyed by
/// (tier, client IP).
#[derive(Clone, Default)]
pub struct RateLimiter {
    hits: Arc<DashMap<(Tier, IpAddr), Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a request from `ip` is allowed under the given tier.
    ///
    /// Returns `Ok(())` if allowed, `Err(retry_after_secs)` if limited.
    pub fn check(&self, tier: Tier, ip: IpAddr) -> Result<(), u64> {
        self.check_window(tier, ip, tier.max_requests(), tier.window())
    }

    fn check_window(
        &self,
        tier: Tier,
        ip: IpAddr,
        max_requests: usize,
        window: Duration,
    ) -> Result<(), u64> {
        let now = Instant::now();
        let mut entry = self.hits.entry((tier, ip)).or_default();

        // Evict timestamps that slid out of the window.
        entry.retain(|t| now.duration_since(*t) < window);

        if entry.len() >= max_requests {
            let oldest = entry[0];
            let retry_after = (oldest + window)
                .saturating_duration_since(now)
                .as_secs()
                .max(1);
            return Err(retry_after);
        }

        entry.push(now);
        Ok(())
    }

    /// Drop entries idle for more than twice their tier window.
    /// Call periodically from a background task.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.hits.retain(|(tier, _ip), timestamps| {
            let cutoff = tier.window() * 2;
            timestamps.retain(|t| now.duration_since(*t) < cutoff);
            !timestamps.is_empty()
        });
    }
}

// ── IP extraction ──

/// Client IP from X-Forwarded-For (reverse proxy) or ConnectInfo.
fn client_ip(req: &Request) -> IpAddr {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            if let Ok(ip) = first.trim().parse::<IpAddr>() {
                return ip;
            }
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

fn too_many_requests(retry_after: u64) -> Response {
    let body = ApiResponse::<()>::error(format!(
        "Demasiadas solicitudes. Probá de nuevo en {} segundos",
        retry_after
    ));
    (
        StatusCode::TOO_MANY_REQUESTS,
        [("Retry-After", retry_after.to_string())],
        Json(body),
    )
        .into_response()
}

// ── Middleware functions (one per tier) ──

async fn limit(
    tier: Tier,
    limiter: RateLimiter,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    let ip = client_ip(&req);
    match limiter.check(tier, ip) {
        Ok(()) => Ok(next.run(req).await),
        Err(retry_after) => Err(too_many_requests(retry_after)),
    }
}

/// Rate limiter for public read-only endpoints (60 req/min).
pub async fn limit_public(
    State(limiter): State<RateLimiter>,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    limit(Tier::Public, limiter, req, next).await
}

/// Rate limiter for authenticated client endpoints (30 req/min).
pub async fn limit_client(
    State(limiter): State<RateLimiter>,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    limit(Tier::Client, limiter, req, next).await
}

/// Rate limiter for appointment creation (5 req/5min — strictest).
pub async fn limit_booking(
    State(limiter): State<RateLimiter>,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    limit(Tier::Booking, limiter, req, next).await
}

/// Rate limiter for admin endpoints (120 req/min).
pub async fn limit_admin(
    State(limiter): State<RateLimiter>,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    limit(Tier::Admin, limiter, req, next).await
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn test_ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn test_allows_requests_under_limit() {
        let limiter = RateLimiter::new();
        let ip = test_ip(1);
        for _ in 0..5 {
            assert!(limiter.check(Tier::Booking, ip).is_ok());
        }
    }

    #[test]
    fn test_rejects_over_limit() {
        let limiter = RateLimiter::new();
        let ip = test_ip(1);
        for _ in 0..5 {
            limiter.check(Tier::Booking, ip).unwrap();
        }
        assert!(limiter.check(Tier::Booking, ip).is_err());
    }

    #[test]
    fn test_returns_retry_after_within_window() {
        let limiter = RateLimiter::new();
        let ip = test_ip(1);
        for _ in 0..5 {
            limiter.check(Tier::Booking, ip).unwrap();
        }
        let retry_after = limiter.check(Tier::Booking, ip).unwrap_err();
        assert!(retry_after >= 1 && retry_after <= 300);
    }

    #[test]
    fn test_different_ips_independent() {
        let limiter = RateLimiter::new();
        for _ in 0..5 {
            limiter.check(Tier::Booking, test_ip(1)).unwrap();
        }
        assert!(limiter.check(Tier::Booking, test_ip(1)).is_err());
        assert!(limiter.check(Tier::Booking, test_ip(2)).is_ok());
    }

    #[test]
    fn test_different_tiers_independent() {
        let limiter = RateLimiter::new();
        let ip = test_ip(1);
        for _ in 0..5 {
            limiter.check(Tier::Booking, ip).unwrap();
        }
        assert!(limiter.check(Tier::Booking, ip).is_err());
        assert!(limiter.check(Tier::Public, ip).is_ok());
    }

    #[test]
    fn test_window_expiry_allows_again() {
        let limiter = RateLimiter::new();
        let ip = test_ip(1);
        let window = Duration::from_millis(100);
        assert!(limiter.check_window(Tier::Public, ip, 1, window).is_ok());
        assert!(limiter.check_window(Tier::Public, ip, 1, window).is_err());

        sleep(Duration::from_millis(150));

        assert!(limiter.check_window(Tier::Public, ip, 1, window).is_ok());
    }

    #[test]
    fn test_cleanup_preserves_active_entries() {
        let limiter = RateLimiter::new();
        let ip = test_ip(1);
        for _ in 0..4 {
            limiter.check(Tier::Booking, ip).unwrap();
        }

        limiter.cleanup();

        limiter.check(Tier::Booking, ip).unwrap(); // fifth request still counted
        assert!(limiter.check(Tier::Booking, ip).is_err());
    }
}
