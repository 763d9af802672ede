//! Interval model for the planning week.
//!
//! # Responsibility
//! - Define the canonical half-open time range used by every other module.
//! - Provide pure comparison primitives (overlap, containment, gap).
//! - Subtract busy ranges from a window to expose contiguous free space.
//!
//! # Invariants
//! - `end > start` for every constructed `TimeInterval`.
//! - Touching endpoints never overlap (`[a, b)` and `[b, c)` are disjoint).
//! - All arithmetic is on integer minutes; no floating point.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Minutes since Monday 00:00 of the planning week.
pub type Minute = i64;

pub const MINUTES_PER_HOUR: Minute = 60;
pub const MINUTES_PER_DAY: Minute = 24 * MINUTES_PER_HOUR;
pub const DAYS_PER_WEEK: i64 = 7;
pub const MINUTES_PER_WEEK: Minute = DAYS_PER_WEEK * MINUTES_PER_DAY;

/// Malformed time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalError {
    /// `end <= start`.
    Reversed { start: Minute, end: Minute },
    /// Range leaves the `[0, MINUTES_PER_WEEK]` planning week.
    OutsideWeek { start: Minute, end: Minute },
}

impl Display for IntervalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reversed { start, end } => {
                write!(f, "interval end ({end}) must be > start ({start})")
            }
            Self::OutsideWeek { start, end } => write!(
                f,
                "interval [{start}, {end}) lies outside the planning week [0, {MINUTES_PER_WEEK})"
            ),
        }
    }
}

impl Error for IntervalError {}

/// Day of the planning week, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    /// Zero-based index from Monday.
    pub fn index(self) -> i64 {
        match self {
            Self::Mon => 0,
            Self::Tue => 1,
            Self::Wed => 2,
            Self::Thu => 3,
            Self::Fri => 4,
            Self::Sat => 5,
            Self::Sun => 6,
        }
    }

    /// Day containing `minute`, or `None` outside the week.
    pub fn of_minute(minute: Minute) -> Option<Self> {
        if !(0..MINUTES_PER_WEEK).contains(&minute) {
            return None;
        }
        Self::ALL.get((minute / MINUTES_PER_DAY) as usize).copied()
    }

    /// Parses `MON`..`SUN` or full English day names, case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "MON" | "MONDAY" => Some(Self::Mon),
            "TUE" | "TUES" | "TUESDAY" => Some(Self::Tue),
            "WED" | "WEDNESDAY" => Some(Self::Wed),
            "THU" | "THUR" | "THURS" | "THURSDAY" => Some(Self::Thu),
            "FRI" | "FRIDAY" => Some(Self::Fri),
            "SAT" | "SATURDAY" => Some(Self::Sat),
            "SUN" | "SUNDAY" => Some(Self::Sun),
            _ => None,
        }
    }

    pub fn abbrev(self) -> &'static str {
        match self {
            Self::Mon => "Mon",
            Self::Tue => "Tue",
            Self::Wed => "Wed",
            Self::Thu => "Thu",
            Self::Fri => "Fri",
            Self::Sat => "Sat",
            Self::Sun => "Sun",
        }
    }
}

/// Converts a wall-clock time on `day` into a week minute.
pub fn week_minute(day: Weekday, hour: i64, minute: i64) -> Minute {
    day.index() * MINUTES_PER_DAY + hour * MINUTES_PER_HOUR + minute
}

/// Half-open range `[start, end)` in week minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct TimeInterval {
    start: Minute,
    end: Minute,
}

#[derive(Deserialize)]
struct RawInterval {
    start: Minute,
    end: Minute,
}

impl TryFrom<RawInterval> for TimeInterval {
    type Error = IntervalError;

    fn try_from(value: RawInterval) -> Result<Self, Self::Error> {
        Self::new(value.start, value.end)
    }
}

impl TimeInterval {
    /// Builds an interval, rejecting `end <= start`.
    pub fn new(start: Minute, end: Minute) -> Result<Self, IntervalError> {
        if end <= start {
            return Err(IntervalError::Reversed { start, end });
        }
        Ok(Self { start, end })
    }

    /// Builds `[start, start + duration)`.
    pub fn starting_at(start: Minute, duration: Minute) -> Result<Self, IntervalError> {
        Self::new(start, start.saturating_add(duration))
    }

    /// Wall-clock range on one day, e.g. `on(Weekday::Tue, (14, 0), (17, 0))`.
    pub fn on(day: Weekday, from: (i64, i64), to: (i64, i64)) -> Result<Self, IntervalError> {
        Self::new(
            week_minute(day, from.0, from.1),
            week_minute(day, to.0, to.1),
        )
    }

    /// The whole of `day`.
    pub fn day_span(day: Weekday) -> Self {
        let start = day.index() * MINUTES_PER_DAY;
        Self {
            start,
            end: start + MINUTES_PER_DAY,
        }
    }

    /// The whole planning week.
    pub fn week() -> Self {
        Self {
            start: 0,
            end: MINUTES_PER_WEEK,
        }
    }

    pub fn start(&self) -> Minute {
        self.start
    }

    pub fn end(&self) -> Minute {
        self.end
    }

    pub fn duration(&self) -> Minute {
        self.end - self.start
    }

    /// Half-open overlap test; shared endpoints do not overlap.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, point: Minute) -> bool {
        self.start <= point && point < self.end
    }

    /// Whether `self` lies entirely inside `window`.
    pub fn within(&self, window: &TimeInterval) -> bool {
        window.start <= self.start && self.end <= window.end
    }

    /// Signed distance between two intervals; negative means overlap.
    pub fn gap(&self, other: &TimeInterval) -> Minute {
        self.start.max(other.start) - self.end.min(other.end)
    }

    pub fn intersection(&self, other: &TimeInterval) -> Option<TimeInterval> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (end > start).then_some(TimeInterval { start, end })
    }

    /// Smallest interval covering both.
    pub fn span(&self, other: &TimeInterval) -> TimeInterval {
        TimeInterval {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Rejects intervals outside the planning week.
    pub fn ensure_in_week(&self) -> Result<(), IntervalError> {
        if self.within(&Self::week()) {
            Ok(())
        } else {
            Err(IntervalError::OutsideWeek {
                start: self.start,
                end: self.end,
            })
        }
    }
}

impl Display for TimeInterval {
    /// `Tue 14:00-17:00`; the end day is spelled out when it differs,
    /// e.g. `Tue 23:00-Wed 01:00`. An end on midnight stays `24:00`.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (start_day, start_time) = clock(self.start);
        let end_day = Weekday::of_minute(self.end - 1);
        let end_time = self.end - day_base(self.end - 1);
        write!(
            f,
            "{} {:02}:{:02}-",
            start_day.map_or("?", Weekday::abbrev),
            start_time / MINUTES_PER_HOUR,
            start_time % MINUTES_PER_HOUR
        )?;
        if end_day != start_day {
            write!(f, "{} ", end_day.map_or("?", Weekday::abbrev))?;
        }
        write!(
            f,
            "{:02}:{:02}",
            end_time / MINUTES_PER_HOUR,
            end_time % MINUTES_PER_HOUR
        )
    }
}

fn day_base(minute: Minute) -> Minute {
    minute - minute.rem_euclid(MINUTES_PER_DAY)
}

fn clock(minute: Minute) -> (Option<Weekday>, Minute) {
    (Weekday::of_minute(minute), minute.rem_euclid(MINUTES_PER_DAY))
}

/// Subtracts `busy` from `window`, returning free pieces in chronological order.
///
/// Pieces separated by an obstacle stay separate even if their durations
/// would sum to enough; only contiguous space is reported.
pub fn free_subintervals<I>(window: &TimeInterval, busy: I) -> Vec<TimeInterval>
where
    I: IntoIterator<Item = TimeInterval>,
{
    let mut blocked: Vec<TimeInterval> = busy
        .into_iter()
        .filter_map(|interval| interval.intersection(window))
        .collect();
    blocked.sort();

    let mut free = Vec::new();
    let mut cursor = window.start;
    for interval in blocked {
        if interval.start > cursor {
            free.push(TimeInterval {
                start: cursor,
                end: interval.start,
            });
        }
        cursor = cursor.max(interval.end);
    }
    if cursor < window.end {
        free.push(TimeInterval {
            start: cursor,
            end: window.end,
        });
    }
    free
}
