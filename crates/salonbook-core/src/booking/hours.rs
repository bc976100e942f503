//! Opening-hours model: per-weekday schedules and vacation closures.

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::model::hhmm;

/// A half-open open-for-business window within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl TimeInterval {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Whether `[start, start+duration)` fits entirely inside the window.
    pub fn fits(&self, start: NaiveTime, duration_minutes: u32) -> bool {
        start >= self.start
            && crate::model::minute_of_day(start) + duration_minutes
                <= crate::model::minute_of_day(self.end)
    }
}

/// Shape of one weekday's schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleKind {
    /// One continuous open window.
    Continuous,
    /// Two windows (morning / afternoon) with a closed stretch between.
    Split,
}

/// Open/closed configuration for one weekday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySchedule {
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: ScheduleKind,
    pub intervals: Vec<TimeInterval>,
}

impl DaySchedule {
    pub fn continuous(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            enabled: true,
            kind: ScheduleKind::Continuous,
            intervals: vec![TimeInterval::new(start, end)],
        }
    }

    pub fn split(morning: TimeInterval, afternoon: TimeInterval) -> Self {
        Self {
            enabled: true,
            kind: ScheduleKind::Split,
            intervals: vec![morning, afternoon],
        }
    }

    pub fn closed() -> Self {
        Self {
            enabled: false,
            kind: ScheduleKind::Continuous,
            intervals: Vec::new(),
        }
    }

    /// Open windows for candidate enumeration; empty when disabled.
    pub fn open_intervals(&self) -> &[TimeInterval] {
        if self.enabled {
            &self.intervals
        } else {
            &[]
        }
    }
}

/// Weekly opening hours, weekday -> schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessHours {
    pub monday: DaySchedule,
    pub tuesday: DaySchedule,
    pub wednesday: DaySchedule,
    pub thursday: DaySchedule,
    pub friday: DaySchedule,
    pub saturday: DaySchedule,
    pub sunday: DaySchedule,
}

impl BusinessHours {
    pub fn for_weekday(&self, weekday: Weekday) -> &DaySchedule {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }
}

impl Default for BusinessHours {
    /// Typical salon week: weekdays 09-18, Saturday morning, Sunday closed.
    fn default() -> Self {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        let weekday = DaySchedule::continuous(t(9, 0), t(18, 0));
        Self {
            monday: weekday.clone(),
            tuesday: weekday.clone(),
            wednesday: weekday.clone(),
            thursday: weekday.clone(),
            friday: weekday,
            saturday: DaySchedule::continuous(t(9, 0), t(13, 0)),
            sunday: DaySchedule::closed(),
        }
    }
}

/// A closed date range (inclusive on both ends) overriding business hours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VacationPeriod {
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub reason: Option<String>,
}

impl VacationPeriod {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn interval_fits_respects_closing_time() {
        let window = TimeInterval::new(t(9, 0), t(18, 0));
        assert!(window.fits(t(17, 0), 60));
        assert!(!window.fits(t(17, 30), 60));
        assert!(!window.fits(t(8, 30), 60));
    }

    #[test]
    fn closed_day_has_no_open_intervals() {
        let day = DaySchedule::closed();
        assert!(day.open_intervals().is_empty());
    }

    #[test]
    fn split_day_keeps_two_windows() {
        let day = DaySchedule::split(
            TimeInterval::new(t(9, 0), t(13, 0)),
            TimeInterval::new(t(15, 0), t(19, 0)),
        );
        assert_eq!(day.kind, ScheduleKind::Split);
        assert_eq!(day.open_intervals().len(), 2);
    }

    #[test]
    fn vacation_bounds_are_inclusive() {
        let vac = VacationPeriod {
            id: "vac-1".into(),
            start_date: d(2026, 8, 10),
            end_date: d(2026, 8, 21),
            reason: Some("Ferie estive".into()),
        };
        assert!(vac.contains(d(2026, 8, 10)));
        assert!(vac.contains(d(2026, 8, 21)));
        assert!(!vac.contains(d(2026, 8, 9)));
        assert!(!vac.contains(d(2026, 8, 22)));
    }

    #[test]
    fn day_schedule_wire_format_uses_type_tag() {
        let day = DaySchedule::continuous(t(9, 0), t(18, 0));
        let json = serde_json::to_string(&day).unwrap();
        assert!(json.contains("\"type\":\"continuous\""));
        assert!(json.contains("\"09:00\""));

        let back: DaySchedule = serde_json::from_str(&json).unwrap();
        assert!(back.enabled);
        assert_eq!(back.intervals[0].end, t(18, 0));
    }
}
