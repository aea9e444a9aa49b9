//! Newest-first paging over stored events.

use chrono::{DateTime, Utc};
use statusboard_db::{Entity, RecordStore, ScanControl, ScanDirection, StoreError};
use statusboard_types::{Incident, Pagination, ScheduledMaintenance, Timestamp};

use crate::aggregate::{days_before, truncate_to_day};

/// The `[from, to]` interval a "latest" listing keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub from: Timestamp,
    pub to: Timestamp,
}

impl Window {
    /// From midnight `days` days before `now`, up to `now`.
    ///
    /// A start before the earliest representable instant is clamped to it.
    pub fn trailing(days: i64, now: Timestamp) -> Self {
        let from =
            days_before(now, days).unwrap_or_else(|| DateTime::<Utc>::MIN_UTC.fixed_offset());
        Self {
            from: truncate_to_day(from),
            to: now,
        }
    }

    pub fn contains(&self, at: Timestamp) -> bool {
        self.from <= at && at <= self.to
    }
}

/// Scans newest-first, keeping records accepted by `keep`.
///
/// Rejected records do not count against the offset. The scan stops as
/// soon as a full page is collected.
pub fn scan_page<T, S, F>(
    store: &S,
    pagination: &Pagination,
    mut keep: F,
) -> Result<Vec<T>, StoreError>
where
    T: Entity,
    S: RecordStore,
    F: FnMut(&T) -> bool,
{
    let limit = pagination.effective_limit();
    let offset = pagination.effective_offset();
    let mut page = Vec::with_capacity(limit);
    let mut skipped = 0usize;

    store.scan(ScanDirection::Reverse, |record: T| {
        if !keep(&record) {
            return ScanControl::Continue;
        }
        if skipped < offset {
            skipped += 1;
            return ScanControl::Continue;
        }
        page.push(record);
        if page.len() >= limit {
            ScanControl::Stop
        } else {
            ScanControl::Continue
        }
    })?;

    Ok(page)
}

/// One page of incidents, newest first.
///
/// With `latest`, only incidents whose `time` falls in the trailing
/// `days_to_aggregate` window are returned.
pub fn page_incidents<S: RecordStore>(
    store: &S,
    latest: bool,
    pagination: &Pagination,
    days_to_aggregate: i64,
    now: Timestamp,
) -> Result<Vec<Incident>, StoreError> {
    if !latest {
        return scan_page(store, pagination, |_: &Incident| true);
    }
    let window = Window::trailing(days_to_aggregate, now);
    scan_page(store, pagination, |incident: &Incident| {
        window.contains(incident.time)
    })
}

/// All scheduled maintenance, newest first.
///
/// With `latest`, work that ended before the window start is left out.
pub fn list_maintenance<S: RecordStore>(
    store: &S,
    latest: bool,
    days_to_aggregate: i64,
    now: Timestamp,
) -> Result<Vec<ScheduledMaintenance>, StoreError> {
    let window = latest.then(|| Window::trailing(days_to_aggregate, now));
    let mut items = Vec::new();
    store.scan(ScanDirection::Reverse, |item: ScheduledMaintenance| {
        if window.is_none_or(|w| item.planned_end >= w.from) {
            items.push(item);
        }
        ScanControl::Continue
    })?;
    Ok(items)
}
