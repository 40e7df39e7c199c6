//! Booked time on a single work center, kept sorted by start.

use chrono::{DateTime, Utc};

use crate::calendar::overlaps;

/// One booked half-open interval, attributed to the work order holding it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Booking {
    pub work_order: usize,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Intervals already claimed on one work center.
///
/// Seeded with immovable (maintenance-flagged) work orders; movable orders
/// are booked as the engine places them. Intervals stay attributed to their
/// work order and are never merged, so a conflict can always name its
/// occupant.
///
/// Invariant: entries are sorted by start.
#[derive(Clone, Debug, Default)]
pub struct CenterSchedule {
    entries: Vec<Booking>,
}

impl CenterSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Books an interval for a work order, keeping the start ordering.
    pub fn book(&mut self, work_order: usize, start: DateTime<Utc>, end: DateTime<Utc>) {
        let idx = self.entries.partition_point(|b| b.start < start);
        self.entries.insert(
            idx,
            Booking {
                work_order,
                start,
                end,
            },
        );
    }

    /// Among bookings overlapping `[start, end)`, the one released first.
    ///
    /// `None` means the interval is free. Entries at or past `end` cannot
    /// overlap, which bounds the scan.
    pub fn earliest_release(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Booking> {
        let hi = self.entries.partition_point(|b| b.start < end);
        self.entries[..hi]
            .iter()
            .filter(|b| overlaps(start, end, b.start, b.end))
            .copied()
            .min_by_key(|b| b.end)
    }
}
