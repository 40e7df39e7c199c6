//! Shift-aware time arithmetic for work centers.
//!
//! All instants are UTC; the weekly shift schedule is interpreted in UTC with
//! no timezone conversion. Work pauses outside shift windows and resumes at
//! the next shift, so "duration" means working minutes, not wall-clock time.
//!
//! Walk loops are bounded by caller-supplied caps and return `None` when a
//! cap is exhausted; the engine turns that into a safety-cap error naming
//! the work order.

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};

use crate::models::{MaintenanceWindow, Shift};

/// Day of week with Sunday = 0 through Saturday = 6.
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Whether two half-open intervals `[a_start, a_end)` and `[b_start, b_end)`
/// overlap. Adjacent intervals (`a_end == b_start`) do not.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

/// Whether `[start, end)` intersects any maintenance window.
pub fn overlaps_maintenance(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    windows: &[MaintenanceWindow],
) -> bool {
    windows.iter().any(|w| overlaps(start, end, w.start, w.end))
}

/// Weekly shift lookup for one work center.
///
/// Built once per work center from its shift rows; at most one shift per
/// day, first row wins. Malformed rows (day > 6, start >= end, hour > 23)
/// are treated as closed days.
#[derive(Clone, Debug)]
pub struct ShiftCalendar {
    hours_by_day: [Option<(u8, u8)>; 7],
}

impl ShiftCalendar {
    pub fn new(shifts: &[Shift]) -> Self {
        let mut hours_by_day = [None; 7];
        for shift in shifts {
            let day = shift.day_of_week as usize;
            if day > 6 || shift.start_hour >= shift.end_hour || shift.end_hour > 23 {
                continue;
            }
            if hours_by_day[day].is_none() {
                hours_by_day[day] = Some((shift.start_hour, shift.end_hour));
            }
        }
        Self { hours_by_day }
    }

    /// Whether any day of the week has a shift.
    pub fn has_shifts(&self) -> bool {
        self.hours_by_day.iter().any(|h| h.is_some())
    }

    /// Shift hours for the given calendar day, if it is open.
    fn shift_hours_on(&self, day: NaiveDate) -> Option<(u8, u8)> {
        self.hours_by_day[day_of_week(day) as usize]
    }

    /// Whether the instant falls inside a shift window (start inclusive,
    /// end exclusive).
    pub fn within_shift(&self, instant: DateTime<Utc>) -> bool {
        match self.shift_hours_on(instant.date_naive()) {
            Some((start_hour, end_hour)) => {
                let minute_of_day = instant.hour() * 60 + instant.minute();
                minute_of_day >= u32::from(start_hour) * 60
                    && minute_of_day < u32::from(end_hour) * 60
            }
            None => false,
        }
    }

    /// The smallest shift-start instant at or after `from`.
    ///
    /// Scans day by day, at most `max_scan_days` days ahead.
    pub fn next_shift_start(
        &self,
        from: DateTime<Utc>,
        max_scan_days: usize,
    ) -> Option<DateTime<Utc>> {
        if !self.has_shifts() {
            return None;
        }
        let mut day = from.date_naive();
        for _ in 0..=max_scan_days {
            if let Some((start_hour, _)) = self.shift_hours_on(day) {
                let shift_start = at_hour(day, start_hour)?;
                if shift_start >= from {
                    return Some(shift_start);
                }
            }
            day = day.succ_opt()?;
        }
        None
    }

    /// Aligns an instant onto working time: unchanged when already inside a
    /// shift, otherwise the next shift start.
    pub fn align_to_shift(
        &self,
        instant: DateTime<Utc>,
        max_scan_days: usize,
    ) -> Option<DateTime<Utc>> {
        if self.within_shift(instant) {
            Some(instant)
        } else {
            self.next_shift_start(instant, max_scan_days)
        }
    }

    /// First instant at which `duration_minutes` of shift-inside time has
    /// elapsed starting at or after `start`.
    ///
    /// A zero duration returns `start` unchanged, without alignment. The walk
    /// advances at most `max_iterations` day-steps.
    pub fn end_after_working(
        &self,
        start: DateTime<Utc>,
        duration_minutes: i64,
        max_iterations: usize,
    ) -> Option<DateTime<Utc>> {
        if duration_minutes <= 0 {
            return Some(start);
        }

        let mut remaining = duration_minutes;
        let mut cursor = start;
        for _ in 0..max_iterations {
            let day = cursor.date_naive();
            let Some((start_hour, end_hour)) = self.shift_hours_on(day) else {
                cursor = next_day_start(day)?;
                continue;
            };

            let shift_start = at_hour(day, start_hour)?;
            let shift_end = at_hour(day, end_hour)?;
            if cursor < shift_start {
                cursor = shift_start;
            }
            if cursor >= shift_end {
                cursor = next_day_start(day)?;
                continue;
            }

            let available = (shift_end - cursor).num_minutes();
            if available >= remaining {
                return Some(cursor + chrono::Duration::minutes(remaining));
            }
            remaining -= available;
            cursor = next_day_start(day)?;
        }
        None
    }

    /// Working minutes inside `[start, end)`: the shift-covered portion of
    /// the range, excluding everything outside shift windows.
    pub fn working_minutes_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
        if end <= start {
            return 0;
        }

        let mut total = 0;
        let mut day = start.date_naive();
        let last = end.date_naive();
        while day <= last {
            if let Some((start_hour, end_hour)) = self.hours_by_day[day_of_week(day) as usize] {
                if let (Some(shift_start), Some(shift_end)) =
                    (at_hour(day, start_hour), at_hour(day, end_hour))
                {
                    let lo = shift_start.max(start);
                    let hi = shift_end.min(end);
                    if hi > lo {
                        total += (hi - lo).num_minutes();
                    }
                }
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        total
    }
}

fn at_hour(day: NaiveDate, hour: u8) -> Option<DateTime<Utc>> {
    day.and_hms_opt(u32::from(hour), 0, 0).map(|t| t.and_utc())
}

fn next_day_start(day: NaiveDate) -> Option<DateTime<Utc>> {
    day.succ_opt()?.and_hms_opt(0, 0, 0).map(|t| t.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // February 2026: the 8th is a Sunday, the 9th a Monday.
    fn dt(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, day, hour, minute, 0).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, day).unwrap()
    }

    /// Mon-Fri 08:00-17:00.
    fn weekday_shifts() -> Vec<Shift> {
        (1..=5).map(|d| Shift::new(d, 8, 17)).collect()
    }

    #[test]
    fn test_day_of_week_all_seven_days() {
        // 2026-02-08 is a Sunday; the encoding is Sunday=0..Saturday=6
        for offset in 0..7 {
            assert_eq!(day_of_week(date(8 + offset)), offset as u8);
        }
    }

    #[test]
    fn test_overlap_half_open() {
        let a0 = dt(10, 8, 0);
        let a1 = dt(10, 10, 0);
        assert!(overlaps(a0, a1, dt(10, 9, 0), dt(10, 11, 0)));
        assert!(overlaps(a0, a1, dt(10, 7, 0), dt(10, 9, 0)));
        assert!(overlaps(a0, a1, dt(10, 8, 30), dt(10, 9, 30)));
        // Adjacent intervals do not overlap
        assert!(!overlaps(a0, a1, dt(10, 10, 0), dt(10, 12, 0)));
        assert!(!overlaps(a0, a1, dt(10, 6, 0), dt(10, 8, 0)));
    }

    #[test]
    fn test_overlaps_maintenance() {
        let windows = vec![MaintenanceWindow::new(dt(10, 13, 0), dt(10, 15, 0))];
        assert!(overlaps_maintenance(dt(10, 12, 0), dt(10, 14, 0), &windows));
        assert!(!overlaps_maintenance(dt(10, 15, 0), dt(10, 17, 0), &windows));
        assert!(!overlaps_maintenance(dt(10, 12, 0), dt(10, 13, 0), &windows));
    }

    #[test]
    fn test_within_shift_boundaries() {
        let cal = ShiftCalendar::new(&weekday_shifts());
        assert!(cal.within_shift(dt(10, 8, 0))); // shift start is inside
        assert!(cal.within_shift(dt(10, 16, 59)));
        assert!(!cal.within_shift(dt(10, 17, 0))); // shift end is outside
        assert!(!cal.within_shift(dt(10, 7, 59)));
        assert!(!cal.within_shift(dt(14, 12, 0))); // Saturday is closed
    }

    #[test]
    fn test_next_shift_start() {
        let cal = ShiftCalendar::new(&weekday_shifts());
        // Before Tuesday's shift: that morning
        assert_eq!(cal.next_shift_start(dt(10, 6, 0), 100), Some(dt(10, 8, 0)));
        // Exactly at shift start: unchanged
        assert_eq!(cal.next_shift_start(dt(10, 8, 0), 100), Some(dt(10, 8, 0)));
        // Mid-shift: the next day's start (shift start already passed)
        assert_eq!(cal.next_shift_start(dt(10, 12, 0), 100), Some(dt(11, 8, 0)));
        // Friday evening: Monday morning
        assert_eq!(cal.next_shift_start(dt(13, 18, 0), 100), Some(dt(16, 8, 0)));
        // No shifts at all: nothing to find
        let closed = ShiftCalendar::new(&[]);
        assert_eq!(closed.next_shift_start(dt(10, 8, 0), 100), None);
    }

    #[test]
    fn test_align_to_shift() {
        let cal = ShiftCalendar::new(&weekday_shifts());
        assert_eq!(cal.align_to_shift(dt(10, 9, 30), 100), Some(dt(10, 9, 30)));
        assert_eq!(cal.align_to_shift(dt(10, 6, 0), 100), Some(dt(10, 8, 0)));
        assert_eq!(cal.align_to_shift(dt(10, 17, 0), 100), Some(dt(11, 8, 0)));
        // Saturday lands on Monday morning
        assert_eq!(cal.align_to_shift(dt(14, 10, 0), 100), Some(dt(16, 8, 0)));
    }

    #[test]
    fn test_end_after_working_same_day() {
        let cal = ShiftCalendar::new(&weekday_shifts());
        assert_eq!(
            cal.end_after_working(dt(10, 8, 0), 240, 1000),
            Some(dt(10, 12, 0))
        );
    }

    #[test]
    fn test_end_after_working_zero_duration_no_alignment() {
        let cal = ShiftCalendar::new(&weekday_shifts());
        // Zero duration returns the start untouched, even outside a shift
        assert_eq!(cal.end_after_working(dt(14, 3, 0), 0, 1000), Some(dt(14, 3, 0)));
    }

    #[test]
    fn test_end_after_working_spans_shift_boundary() {
        let cal = ShiftCalendar::new(&weekday_shifts());
        // Monday 16:00 + 120 working minutes: 60 tonight, 60 Tuesday morning
        assert_eq!(
            cal.end_after_working(dt(9, 16, 0), 120, 1000),
            Some(dt(10, 9, 0))
        );
    }

    #[test]
    fn test_end_after_working_skips_weekend() {
        let cal = ShiftCalendar::new(&weekday_shifts());
        // Friday 16:00 + 120 working minutes: 60 Friday, 60 Monday morning
        assert_eq!(
            cal.end_after_working(dt(13, 16, 0), 120, 1000),
            Some(dt(16, 9, 0))
        );
    }

    #[test]
    fn test_end_after_working_starts_before_shift() {
        let cal = ShiftCalendar::new(&weekday_shifts());
        // Cursor snaps to shift start before any minutes accrue
        assert_eq!(
            cal.end_after_working(dt(10, 5, 0), 60, 1000),
            Some(dt(10, 9, 0))
        );
    }

    #[test]
    fn test_end_after_working_multi_day_duration() {
        let cal = ShiftCalendar::new(&weekday_shifts());
        // 600 minutes from Monday 08:00: 540 Monday, 60 Tuesday
        assert_eq!(
            cal.end_after_working(dt(9, 8, 0), 600, 1000),
            Some(dt(10, 9, 0))
        );
    }

    #[test]
    fn test_end_after_working_exact_fill() {
        let cal = ShiftCalendar::new(&weekday_shifts());
        // Exactly fills the remaining shift: end lands on shift end
        assert_eq!(
            cal.end_after_working(dt(10, 15, 0), 120, 1000),
            Some(dt(10, 17, 0))
        );
    }

    #[test]
    fn test_end_after_working_no_shifts_hits_cap() {
        let cal = ShiftCalendar::new(&[]);
        assert_eq!(cal.end_after_working(dt(10, 8, 0), 60, 1000), None);
    }

    #[test]
    fn test_working_minutes_between() {
        let cal = ShiftCalendar::new(&weekday_shifts());
        // Fully inside one shift
        assert_eq!(cal.working_minutes_between(dt(10, 9, 0), dt(10, 11, 0)), 120);
        // Overnight Monday 16:00 -> Tuesday 09:00 covers 60 + 60
        assert_eq!(cal.working_minutes_between(dt(9, 16, 0), dt(10, 9, 0)), 120);
        // A full closed weekend contributes nothing
        assert_eq!(cal.working_minutes_between(dt(14, 0, 0), dt(16, 0, 0)), 0);
        // Inverted range
        assert_eq!(cal.working_minutes_between(dt(10, 11, 0), dt(10, 9, 0)), 0);
    }

    #[test]
    fn test_duplicate_shift_rows_first_wins() {
        let cal = ShiftCalendar::new(&[Shift::new(2, 8, 17), Shift::new(2, 9, 12)]);
        assert!(cal.within_shift(dt(10, 8, 30)));
    }

    #[test]
    fn test_malformed_shift_rows_ignored() {
        let cal = ShiftCalendar::new(&[
            Shift::new(9, 8, 17),  // bad day
            Shift::new(2, 17, 8),  // inverted hours
            Shift::new(3, 8, 24),  // hour out of range
        ]);
        assert!(!cal.has_shifts());
    }
}
