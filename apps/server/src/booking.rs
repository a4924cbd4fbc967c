use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::availability::{fits_business_hours, overlaps, BusyInterval};
use crate::models::PromoCode;
use crate::schedule::{DaySchedule, TimeOfDay};

/// Why an appointment could not be created. Each precondition fails with its
/// own kind so the caller can tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BookingError {
    #[error("service not found or inactive")]
    InvalidService,
    #[error("weekday disabled or date blocked")]
    DateUnavailable,
    #[error("requested time does not fit the business hours")]
    OutsideBusinessHours,
    #[error("slot overlaps an existing appointment")]
    SlotConflict,
    #[error("promo code not found, inactive or exhausted")]
    InvalidPromo,
}

/// Allocator slot preconditions, in order: date open, time fits an interval
/// (end boundary inclusive), no overlap against the busy list. Returns the
/// computed end time on success.
///
/// The busy list must be freshly loaded by the caller; the filtered list
/// shown at listing time may be stale.
pub fn check_slot(
    day: &DaySchedule,
    date_blocked: bool,
    start: TimeOfDay,
    duration_min: u16,
    busy: &[BusyInterval],
) -> Result<TimeOfDay, BookingError> {
    if !day.enabled || date_blocked {
        return Err(BookingError::DateUnavailable);
    }
    if duration_min == 0 || !fits_business_hours(day, start, duration_min) {
        return Err(BookingError::OutsideBusinessHours);
    }
    let end = start
        .add_minutes(duration_min)
        .ok_or(BookingError::OutsideBusinessHours)?;
    if busy.iter().any(|b| overlaps(start, end, b.start, b.end)) {
        return Err(BookingError::SlotConflict);
    }
    Ok(end)
}

/// A code is usable iff it is active and has redemptions left.
pub fn promo_usable(promo: &PromoCode) -> bool {
    promo.is_active && promo.usage_count < promo.usage_limit
}

/// Price after applying a percentage discount, rounded half-up.
pub fn discounted_price(price: i64, discount_percent: i64) -> i64 {
    let percent = discount_percent.clamp(0, 100);
    (price * (100 - percent) + 50) / 100
}

/// Whether a confirmed appointment may still be cancelled. A zero or
/// negative lead means always cancellable; otherwise the time remaining
/// before the start must be at least `lead_hours`, boundary inclusive.
pub fn can_cancel(
    date: NaiveDate,
    start: TimeOfDay,
    lead_hours: i64,
    now: NaiveDateTime,
) -> bool {
    if lead_hours <= 0 {
        return true;
    }
    let start_at = date.and_time(start.to_naive_time());
    start_at - now >= chrono::Duration::hours(lead_hours)
}

// ── Tests ──
