//! Slot availability over a single working day.
//!
//! A working day is a window `[start, end)` walked in fixed steps. Each step
//! is a candidate start; it is offered when the service fits before the end
//! of the window and the candidate interval does not overlap any busy
//! interval. Busy intervals are the active appointments of the staff member.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

pub const DEFAULT_SERVICE_MINUTES: i64 = 30;

/// Upper bound for a service length or a buffer.
pub const MAX_MINUTES: i64 = 24 * 60;

/// Half-open `[start, end)` interval of local, naive time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Interval {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && self.end > other.start
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkingHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub step_min: i64,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).expect("09:00 is a valid time"),
            end: NaiveTime::from_hms_opt(17, 0, 0).expect("17:00 is a valid time"),
            step_min: 30,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub time: String,
    pub datetime: String,
    pub display: String,
}

impl Slot {
    fn at(start: NaiveDateTime) -> Self {
        Self {
            time: start.format("%H:%M").to_string(),
            datetime: start.format("%Y-%m-%dT%H:%M").to_string(),
            display: start.format("%I:%M %p").to_string(),
        }
    }
}

impl WorkingHours {
    pub fn new(start: NaiveTime, end: NaiveTime, step_min: i64) -> Self {
        Self {
            start,
            end,
            step_min,
        }
    }

    /// The whole working window of `date`, used to select the day's bookings.
    pub fn day_bounds(date: NaiveDate) -> Interval {
        let start = date.and_time(NaiveTime::MIN);
        Interval::new(start, start + Duration::days(1))
    }

    pub fn slots_for(&self, date: NaiveDate, duration_min: i64, busy: &[Interval]) -> Vec<Slot> {
        let window_start = date.and_time(self.start);
        let window_end = date.and_time(self.end);
        if duration_min > (window_end - window_start).num_minutes() {
            return Vec::new();
        }
        let step = Duration::minutes(self.step_min.clamp(1, MAX_MINUTES));
        let duration = Duration::minutes(duration_min.max(0));

        let mut slots = Vec::new();
        let mut cursor = window_start;
        while cursor + duration <= window_end {
            let candidate = Interval::new(cursor, cursor + duration);
            if !busy.iter().any(|taken| candidate.overlaps(taken)) {
                slots.push(Slot::at(cursor));
            }
            cursor += step;
        }
        slots
    }
}

/// Service durations are stored in hours; unset or non-positive means 30 minutes.
pub fn service_minutes(hours: f64) -> i64 {
    if hours.is_finite() && hours > 0.0 {
        (hours * 60.0).round() as i64
    } else {
        DEFAULT_SERVICE_MINUTES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, 0).unwrap()
    }

    fn times(slots: &[Slot]) -> Vec<&str> {
        slots.iter().map(|slot| slot.time.as_str()).collect()
    }

    #[test]
    fn empty_day_yields_every_fitting_half_hour() {
        let hours = WorkingHours::default();
        for duration in [0_i64, 30, 45, 60, 90, 480] {
            let slots = hours.slots_for(day(), duration, &[]);
            let expected = ((8 * 60 - duration) / 30 + 1) as usize;
            assert_eq!(slots.len(), expected, "duration {duration}");
            assert_eq!(slots[0].time, "09:00");
        }
    }

    #[test]
    fn services_longer_than_the_window_get_no_slots() {
        let hours = WorkingHours::default();
        assert!(hours.slots_for(day(), 481, &[]).is_empty());
        assert!(hours.slots_for(day(), i64::MAX, &[]).is_empty());

        let coarse = WorkingHours::new(hours.start, hours.end, i64::MAX);
        assert_eq!(times(&coarse.slots_for(day(), 30, &[])), ["09:00"]);
    }

    #[test]
    fn slots_are_thirty_minutes_apart_and_ordered() {
        let slots = WorkingHours::default().slots_for(day(), 30, &[]);
        assert_eq!(times(&slots[..3]), vec!["09:00", "09:30", "10:00"]);
        assert_eq!(slots.last().unwrap().time, "16:30");
    }

    #[test]
    fn confirmed_booking_blocks_its_slot_only() {
        let busy = [Interval::new(at(10, 0), at(10, 30))];
        let slots = WorkingHours::default().slots_for(day(), 30, &busy);
        let times = times(&slots);
        assert!(!times.contains(&"10:00"));
        assert!(times.contains(&"09:30"));
        assert!(times.contains(&"10:30"));
    }

    #[test]
    fn buffers_extend_the_blocked_range() {
        let busy = [Interval::new(at(10, 0), at(10, 35))];
        let slots = WorkingHours::default().slots_for(day(), 30, &busy);
        let times = times(&slots);
        assert!(!times.contains(&"10:30"));
        assert!(times.contains(&"11:00"));
    }

    #[test]
    fn longer_services_cannot_straddle_a_booking() {
        let busy = [Interval::new(at(10, 0), at(10, 30))];
        let slots = WorkingHours::default().slots_for(day(), 60, &busy);
        let times = times(&slots);
        assert!(!times.contains(&"09:30"));
        assert!(times.contains(&"09:00"));
    }

    #[test]
    fn slot_labels() {
        let slots = WorkingHours::default().slots_for(day(), 30, &[]);
        let afternoon = slots.iter().find(|slot| slot.time == "13:30").unwrap();
        assert_eq!(afternoon.datetime, "2026-01-05T13:30");
        assert_eq!(afternoon.display, "01:30 PM");
    }

    #[test]
    fn touching_intervals_do_not_overlap() {
        let a = Interval::new(at(9, 0), at(9, 30));
        let b = Interval::new(at(9, 30), at(10, 0));
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        assert!(a.overlaps(&Interval::new(at(9, 15), at(9, 45))));
    }

    #[test]
    fn service_hours_convert_to_minutes() {
        assert_eq!(service_minutes(0.5), 30);
        assert_eq!(service_minutes(1.25), 75);
        assert_eq!(service_minutes(0.0), DEFAULT_SERVICE_MINUTES);
        assert_eq!(service_minutes(-1.0), DEFAULT_SERVICE_MINUTES);
    }
}
