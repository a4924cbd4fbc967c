use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Granularity of candidate slot start times, in minutes.
pub const SLOT_STEP_MIN: u16 = 30;

const MINUTES_PER_DAY: u16 = 24 * 60;

// ── TimeOfDay ──

/// Wall-clock time with minute precision, stored as minutes since midnight.
///
/// Ordering is chronological; serializes as `"HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub fn new(hour: u16, minute: u16) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self(hour * 60 + minute))
        } else {
            None
        }
    }

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes < MINUTES_PER_DAY).then_some(Self(minutes))
    }

    /// Minutes since midnight.
    pub fn minutes(self) -> u16 {
        self.0
    }

    /// Parse `"HH:MM"`.
    pub fn parse(s: &str) -> Option<Self> {
        let (h, m) = s.split_once(':')?;
        if h.len() != 2 || m.len() != 2 {
            return None;
        }
        Self::new(h.parse().ok()?, m.parse().ok()?)
    }

    /// Add a duration in minutes; `None` when the result crosses midnight.
    pub fn add_minutes(self, minutes: u16) -> Option<Self> {
        self.0
            .checked_add(minutes)
            .and_then(Self::from_minutes)
    }

    pub fn to_naive_time(self) -> chrono::NaiveTime {
        chrono::NaiveTime::from_num_seconds_from_midnight_opt(u32::from(self.0) * 60, 0)
            .unwrap_or(chrono::NaiveTime::MIN)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid time of day: {value:?}"))
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> Self {
        t.to_string()
    }
}

/// Infallible constructor for compile-time-known times.
const fn hm(hour: u16, minute: u16) -> TimeOfDay {
    TimeOfDay(hour * 60 + minute)
}

// ── Weekly schedule ──

/// An open interval of a working day. Valid intervals satisfy `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeInterval {
    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }
}

/// Recurring open hours for one day of the week.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub enabled: bool,
    pub intervals: Vec<TimeInterval>,
}

/// The salon's recurring weekly hours, persisted as one settings document.
///
/// Every canonical day is a required field, so a stored document missing a
/// day fails to deserialize instead of silently defaulting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub sunday: DaySchedule,
    pub monday: DaySchedule,
    pub tuesday: DaySchedule,
    pub wednesday: DaySchedule,
    pub thursday: DaySchedule,
    pub friday: DaySchedule,
    pub saturday: DaySchedule,
}

impl WeeklySchedule {
    pub fn day(&self, weekday: Weekday) -> &DaySchedule {
        match weekday {
            Weekday::Sun => &self.sunday,
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
        }
    }

    fn days(&self) -> [(&'static str, &DaySchedule); 7] {
        [
            ("sunday", &self.sunday),
            ("monday", &self.monday),
            ("tuesday", &self.tuesday),
            ("wednesday", &self.wednesday),
            ("thursday", &self.thursday),
            ("friday", &self.friday),
            ("saturday", &self.saturday),
        ]
    }

    /// Every interval must satisfy `start < end`. Overlap between intervals
    /// is not rejected here; downstream slot math tolerates it.
    pub fn validate(&self) -> Result<(), String> {
        for (name, day) in self.days() {
            for interval in &day.intervals {
                if !interval.is_valid() {
                    return Err(format!(
                        "{name}: interval {}-{} is empty or inverted",
                        interval.start, interval.end
                    ));
                }
            }
        }
        Ok(())
    }
}

impl Default for WeeklySchedule {
    /// Business default: closed on weekends, Monday-Friday open
    /// 08:00-12:00 and 13:30-16:00.
    fn default() -> Self {
        let closed = DaySchedule::default();
        let open = DaySchedule {
            enabled: true,
            intervals: vec![
                TimeInterval { start: hm(8, 0), end: hm(12, 0) },
                TimeInterval { start: hm(13, 30), end: hm(16, 0) },
            ],
        };
        Self {
            sunday: closed.clone(),
            monday: open.clone(),
            tuesday: open.clone(),
            wednesday: open.clone(),
            thursday: open.clone(),
            friday: open,
            saturday: closed,
        }
    }
}

// ── Tests ──
