use chrono::{Datelike, Duration, NaiveDate};
use std::collections::HashSet;

use crate::schedule::{DaySchedule, TimeOfDay, WeeklySchedule, SLOT_STEP_MIN};

/// How far ahead the date selector scans, in calendar days.
pub const DATE_HORIZON_DAYS: i64 = 60;

/// Maximum number of dates the selector returns.
pub const DATE_TARGET_COUNT: usize = 30;

/// A half-open `[start, end)` interval occupied by an existing appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusyInterval {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

/// Half-open overlap: `[a, b)` and `[c, d)` conflict iff `a < d && c < b`.
/// Touching endpoints do not conflict, so back-to-back appointments are fine.
pub fn overlaps(a: TimeOfDay, b: TimeOfDay, c: TimeOfDay, d: TimeOfDay) -> bool {
    a < d && c < b
}

/// Candidate start times for one day schedule and service duration.
///
/// Walks every interval independently in SLOT_STEP_MIN steps, keeping starts
/// whose end lands on or before the interval end (boundary-inclusive).
/// Inverted intervals yield nothing; overlapping intervals may yield
/// duplicates, which the conflict filter and the allocator both tolerate.
pub fn candidate_starts(day: &DaySchedule, duration_min: u16) -> Vec<TimeOfDay> {
    if !day.enabled || duration_min == 0 {
        return Vec::new();
    }
    let mut starts = Vec::new();
    for interval in &day.intervals {
        let end = u32::from(interval.end.minutes());
        let duration = u32::from(duration_min);
        let mut cursor = u32::from(interval.start.minutes());
        while cursor + duration <= end {
            if let Some(t) = TimeOfDay::from_minutes(cursor as u16) {
                starts.push(t);
            }
            cursor += u32::from(SLOT_STEP_MIN);
        }
    }
    starts
}

/// Drop candidates whose `[start, start+duration)` overlaps an existing
/// non-cancelled appointment. Advisory only; the allocator re-runs the same
/// rule against a fresh appointment list at commit time.
pub fn filter_conflicts(
    candidates: Vec<TimeOfDay>,
    duration_min: u16,
    busy: &[BusyInterval],
) -> Vec<TimeOfDay> {
    candidates
        .into_iter()
        .filter(|start| match start.add_minutes(duration_min) {
            Some(end) => !busy.iter().any(|b| overlaps(*start, end, b.start, b.end)),
            None => false,
        })
        .collect()
}

/// Generated-and-filtered bookable start times for one date.
pub fn free_starts(day: &DaySchedule, duration_min: u16, busy: &[BusyInterval]) -> Vec<TimeOfDay> {
    filter_conflicts(candidate_starts(day, duration_min), duration_min, busy)
}

/// Bookable dates: tomorrow through DATE_HORIZON_DAYS ahead, keeping the
/// first DATE_TARGET_COUNT whose weekday is enabled and which are not
/// blocked. Today is never offered. Pure given its inputs.
pub fn available_dates(
    schedule: &WeeklySchedule,
    blocked: &HashSet<NaiveDate>,
    today: NaiveDate,
) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    for offset in 1..=DATE_HORIZON_DAYS {
        if dates.len() >= DATE_TARGET_COUNT {
            break;
        }
        let date = today + Duration::days(offset);
        if schedule.day(date.weekday()).enabled && !blocked.contains(&date) {
            dates.push(date);
        }
    }
    dates
}

/// True when `[start, start+duration]` fits inside some configured interval,
/// end boundary inclusive.
pub fn fits_business_hours(day: &DaySchedule, start: TimeOfDay, duration_min: u16) -> bool {
    day.intervals.iter().any(|interval| {
        interval.start <= start
            && u32::from(start.minutes()) + u32::from(duration_min)
                <= u32::from(interval.end.minutes())
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::TimeInterval;

    fn t(s: &str) -> TimeOfDay {
        TimeOfDay::parse(s).unwrap()
    }

    fn day(intervals: &[(&str, &str)]) -> DaySchedule {
        DaySchedule {
            enabled: true,
            intervals: intervals
                .iter()
                .map(|(start, end)| TimeInterval { start: t(start), end: t(end) })
                .collect(),
        }
    }

    fn busy(start: &str, end: &str) -> BusyInterval {
        BusyInterval { start: t(start), end: t(end) }
    }

    fn strings(times: &[TimeOfDay]) -> Vec<String> {
        times.iter().map(|t| t.to_string()).collect()
    }

    // ── candidate_starts ──

    #[test]
    fn test_disabled_day_generates_nothing() {
        let mut d = day(&[("08:00", "12:00")]);
        d.enabled = false;
        assert!(candidate_starts(&d, 30).is_empty());
    }

    #[test]
    fn test_no_intervals_generates_nothing() {
        let d = day(&[]);
        assert!(candidate_starts(&d, 30).is_empty());
    }

    #[test]
    fn test_morning_interval_hour_service() {
        let d = day(&[("08:00", "12:00")]);
        assert_eq!(
            strings(&candidate_starts(&d, 60)),
            ["08:00", "08:30", "09:00", "09:30", "10:00", "10:30", "11:00"]
        );
    }

    #[test]
    fn test_last_candidate_is_boundary_tight() {
        // The last candidate ends exactly at the interval end, and one more
        // step would overshoot.
        let d = day(&[("08:00", "12:00")]);
        let starts = candidate_starts(&d, 60);
        let last = *starts.last().unwrap();
        assert_eq!(last, t("11:00"));
        assert_eq!(last.minutes() + 60, t("12:00").minutes());
        assert!(last.minutes() + 60 + SLOT_STEP_MIN > t("12:00").minutes());
    }

    #[test]
    fn test_duration_equal_to_interval() {
        let d = day(&[("13:30", "16:00")]);
        assert_eq!(strings(&candidate_starts(&d, 150)), ["13:30"]);
    }

    #[test]
    fn test_duration_longer_than_interval() {
        let d = day(&[("13:30", "16:00")]);
        assert!(candidate_starts(&d, 180).is_empty());
    }

    #[test]
    fn test_intervals_processed_independently() {
        let d = day(&[("08:00", "09:00"), ("13:30", "14:30")]);
        assert_eq!(
            strings(&candidate_starts(&d, 60)),
            ["08:00", "13:30"]
        );
    }

    #[test]
    fn test_overlapping_intervals_tolerated() {
        // Malformed input with overlapping intervals produces duplicates,
        // never a crash.
        let d = day(&[("08:00", "10:00"), ("08:00", "10:00")]);
        let starts = candidate_starts(&d, 60);
        assert_eq!(strings(&starts), ["08:00", "08:30", "09:00", "08:00", "08:30", "09:00"]);
    }

    #[test]
    fn test_inverted_interval_tolerated() {
        let d = day(&[("12:00", "08:00")]);
        assert!(candidate_starts(&d, 30).is_empty());
    }

    #[test]
    fn test_zero_duration_generates_nothing() {
        let d = day(&[("08:00", "12:00")]);
        assert!(candidate_starts(&d, 0).is_empty());
    }

    // ── overlaps ──

    #[test]
    fn test_overlap_touching_endpoints_do_not_conflict() {
        assert!(!overlaps(t("08:00"), t("09:00"), t("09:00"), t("10:00")));
        assert!(!overlaps(t("10:00"), t("11:00"), t("09:00"), t("10:00")));
    }

    #[test]
    fn test_overlap_partial_and_nested() {
        assert!(overlaps(t("08:30"), t("09:30"), t("09:00"), t("10:00")));
        assert!(overlaps(t("09:15"), t("09:45"), t("09:00"), t("10:00")));
        assert!(overlaps(t("08:00"), t("12:00"), t("09:00"), t("10:00")));
    }

    #[test]
    fn test_overlap_identical_intervals() {
        assert!(overlaps(t("09:00"), t("10:00"), t("09:00"), t("10:00")));
    }

    // ── filter_conflicts / free_starts ──

    #[test]
    fn test_monday_morning_with_existing_booking() {
        // Monday 08:00-12:00, 60-minute service, existing 09:00-10:00
        // appointment: every candidate whose hour-long window touches
        // 09:00-10:00 is gone.
        let d = day(&[("08:00", "12:00")]);
        let taken = [busy("09:00", "10:00")];
        assert_eq!(
            strings(&free_starts(&d, 60, &taken)),
            ["08:00", "10:00", "10:30", "11:00"]
        );
    }

    #[test]
    fn test_back_to_back_allowed() {
        let d = day(&[("08:00", "12:00")]);
        let taken = [busy("09:00", "10:00")];
        let free = free_starts(&d, 30, &taken);
        let free = strings(&free);
        assert!(free.contains(&"08:30".to_string())); // ends exactly at 09:00
        assert!(free.contains(&"10:00".to_string())); // starts exactly at 10:00
        assert!(!free.contains(&"09:00".to_string()));
        assert!(!free.contains(&"09:30".to_string()));
    }

    #[test]
    fn test_no_busy_keeps_all_candidates() {
        let d = day(&[("08:00", "12:00")]);
        assert_eq!(
            free_starts(&d, 60, &[]),
            candidate_starts(&d, 60)
        );
    }

    #[test]
    fn test_fully_booked_day() {
        let d = day(&[("08:00", "12:00")]);
        let taken = [busy("08:00", "12:00")];
        assert!(free_starts(&d, 30, &taken).is_empty());
    }

    #[test]
    fn test_accepted_appointments_pairwise_disjoint() {
        // Booking greedily from the filtered list never produces a pair of
        // overlapping appointments.
        let d = day(&[("08:00", "12:00")]);
        let mut taken: Vec<BusyInterval> = Vec::new();
        loop {
            let free = free_starts(&d, 60, &taken);
            let Some(start) = free.first().copied() else { break };
            let end = start.add_minutes(60).unwrap();
            taken.push(BusyInterval { start, end });
        }
        for (i, a) in taken.iter().enumerate() {
            for b in &taken[i + 1..] {
                assert!(!overlaps(a.start, a.end, b.start, b.end));
            }
        }
        assert_eq!(taken.len(), 4); // 08:00, 09:00, 10:00, 11:00
    }

    // ── available_dates ──

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_dates_start_tomorrow_and_skip_weekends() {
        let schedule = WeeklySchedule::default();
        // 2026-03-02 is a Monday.
        let today = date("2026-03-02");
        let dates = available_dates(&schedule, &HashSet::new(), today);
        assert_eq!(dates.first(), Some(&date("2026-03-03"))); // Tuesday, not today
        assert!(dates.iter().all(|d| {
            let w = d.weekday();
            w != chrono::Weekday::Sat && w != chrono::Weekday::Sun
        }));
    }

    #[test]
    fn test_dates_capped_at_target_count() {
        let schedule = WeeklySchedule::default();
        let dates = available_dates(&schedule, &HashSet::new(), date("2026-03-02"));
        assert_eq!(dates.len(), DATE_TARGET_COUNT);
    }

    #[test]
    fn test_blocked_date_excluded() {
        let schedule = WeeklySchedule::default();
        let today = date("2026-03-01"); // Sunday
        let blocked: HashSet<NaiveDate> = [date("2026-03-02")].into(); // Monday
        let dates = available_dates(&schedule, &blocked, today);
        assert!(!dates.contains(&date("2026-03-02")));
        assert_eq!(dates.first(), Some(&date("2026-03-03")));
    }

    #[test]
    fn test_sparse_schedule_exhausts_horizon() {
        // Only Mondays enabled: at most 9 Mondays fit in a 60-day horizon,
        // so the result is shorter than the target count.
        let mut schedule = WeeklySchedule::default();
        schedule.tuesday.enabled = false;
        schedule.wednesday.enabled = false;
        schedule.thursday.enabled = false;
        schedule.friday.enabled = false;
        let dates = available_dates(&schedule, &HashSet::new(), date("2026-03-02"));
        assert!(dates.len() < DATE_TARGET_COUNT);
        assert!(!dates.is_empty());
        assert!(dates.iter().all(|d| d.weekday() == chrono::Weekday::Mon));
    }

    #[test]
    fn test_selector_is_deterministic() {
        let schedule = WeeklySchedule::default();
        let blocked: HashSet<NaiveDate> = [date("2026-03-09"), date("2026-03-10")].into();
        let today = date("2026-03-02");
        assert_eq!(
            available_dates(&schedule, &blocked, today),
            available_dates(&schedule, &blocked, today)
        );
    }

    #[test]
    fn test_all_days_disabled_yields_nothing() {
        let schedule = WeeklySchedule {
            sunday: DaySchedule::default(),
            monday: DaySchedule::default(),
            tuesday: DaySchedule::default(),
            wednesday: DaySchedule::default(),
            thursday: DaySchedule::default(),
            friday: DaySchedule::default(),
            saturday: DaySchedule::default(),
        };
        assert!(available_dates(&schedule, &HashSet::new(), date("2026-03-02")).is_empty());
    }

    // ── fits_business_hours ──

    #[test]
    fn test_fit_boundary_inclusive() {
        let d = day(&[("13:30", "16:00")]);
        assert!(fits_business_hours(&d, t("15:00"), 60)); // ends exactly 16:00
        assert!(!fits_business_hours(&d, t("15:30"), 60)); // would end 16:30
    }

    #[test]
    fn test_fit_rejects_start_before_open() {
        let d = day(&[("08:00", "12:00")]);
        assert!(!fits_business_hours(&d, t("07:30"), 60));
    }

    #[test]
    fn test_fit_rejects_gap_straddle() {
        // 11:30 + 120min straddles the midday break even though both ends
        // fall inside some interval.
        let d = day(&[("08:00", "12:00"), ("13:30", "16:00")]);
        assert!(!fits_business_hours(&d, t("11:30"), 120));
    }

    #[test]
    fn test_fit_second_interval() {
        let d = day(&[("08:00", "12:00"), ("13:30", "16:00")]);
        assert!(fits_business_hours(&d, t("13:30"), 90));
    }
}
