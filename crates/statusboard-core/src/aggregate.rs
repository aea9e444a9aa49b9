//! Groups events into calendar days for the dashboard and history views.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveTime, TimeZone};
use serde::Serialize;
use statusboard_types::{Incident, ScheduledMaintenance, Timestamp};

/// Truncates a timestamp to midnight in its own offset.
pub fn truncate_to_day(at: Timestamp) -> Timestamp {
    let midnight = at.date_naive().and_time(NaiveTime::MIN);
    at.offset()
        .from_local_datetime(&midnight)
        .single()
        .unwrap_or(at)
}

/// `at` moved back by `days` whole days, or `None` outside the calendar range.
pub fn days_before(at: Timestamp, days: i64) -> Option<Timestamp> {
    Duration::try_days(days).and_then(|back| at.checked_sub_signed(back))
}

/// An event that can be placed on a day.
pub trait DayStamped {
    /// The instant that decides which day the event belongs to.
    fn day_stamp(&self) -> Timestamp;

    /// Tie-breaker within one instant; higher sorts first.
    fn sequence(&self) -> i64;
}

impl DayStamped for Incident {
    fn day_stamp(&self) -> Timestamp {
        self.time
    }

    fn sequence(&self) -> i64 {
        self.id
    }
}

impl DayStamped for ScheduledMaintenance {
    fn day_stamp(&self) -> Timestamp {
        self.planned_start
    }

    fn sequence(&self) -> i64 {
        self.id
    }
}

/// Events that share a day, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayGroup<T> {
    /// Midnight of the day, in the offset of the events it holds.
    pub day: Timestamp,
    pub entries: Vec<T>,
}

/// Never seed more than this many empty days.
pub const MAX_EMPTY_DAYS: u32 = 366;

/// Trailing empty days to show even when nothing happened on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyDays {
    /// Capped at [`MAX_EMPTY_DAYS`].
    pub count: u32,
    /// The newest day shown is the day containing this instant.
    pub until: Timestamp,
}

/// Scheduled maintenance grouped by start day, with a total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedMaintenance {
    pub days: Vec<DayGroup<ScheduledMaintenance>>,
    pub count: usize,
}

/// Groups items by day, newest day first.
///
/// The result does not depend on input order: within a day, items are
/// sorted by their stamp and then by sequence, both descending.
pub fn group_by_day<T: DayStamped>(items: Vec<T>, empty: Option<EmptyDays>) -> Vec<DayGroup<T>> {
    let mut days: BTreeMap<Timestamp, Vec<T>> = BTreeMap::new();

    if let Some(empty) = empty {
        for back in 0..empty.count.min(MAX_EMPTY_DAYS) {
            let Some(day) = days_before(empty.until, i64::from(back)) else {
                break;
            };
            days.entry(truncate_to_day(day)).or_default();
        }
    }

    for item in items {
        days.entry(truncate_to_day(item.day_stamp()))
            .or_default()
            .push(item);
    }

    days.into_iter()
        .rev()
        .map(|(day, mut entries)| {
            entries.sort_by(|a, b| {
                b.day_stamp()
                    .cmp(&a.day_stamp())
                    .then_with(|| b.sequence().cmp(&a.sequence()))
            });
            DayGroup { day, entries }
        })
        .collect()
}

/// Groups incidents by the day they started.
///
/// Pass `Some` to pre-seed trailing empty days (dashboard view); history
/// pages pass `None`.
pub fn aggregate_incidents(
    incidents: Vec<Incident>,
    empty: Option<EmptyDays>,
) -> Vec<DayGroup<Incident>> {
    group_by_day(incidents, empty)
}

/// Groups scheduled maintenance by planned start day. Never pre-seeds.
pub fn aggregate_maintenance(items: Vec<ScheduledMaintenance>) -> AggregatedMaintenance {
    let count = items.len();
    AggregatedMaintenance {
        days: group_by_day(items, None),
        count,
    }
}
