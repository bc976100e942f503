//! Bookable-slot computation for a service on a calendar date.
//!
//! Pure and synchronous: all inputs (hours, closures, the day's
//! appointments, the staff roster) are passed in, so the engine can run
//! against a live read from the system of record or against fixtures.

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::booking::conflict::ConflictPolicy;
use crate::booking::hours::{BusinessHours, VacationPeriod};
use crate::model::{Appointment, Service, Staff};

/// A candidate start time with its availability flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    #[serde(with = "crate::model::hhmm")]
    pub time: NaiveTime,
    pub available: bool,
}

/// Slot computation engine.
#[derive(Debug, Clone)]
pub struct AvailabilityEngine {
    /// Candidate granularity in minutes.
    pub slot_step_minutes: u32,
    /// How many days ahead slots may be offered.
    pub booking_window_days: u32,
    /// Occupancy policy shared with the conflict detector.
    pub policy: ConflictPolicy,
}

impl AvailabilityEngine {
    pub fn new(slot_step_minutes: u32, booking_window_days: u32) -> Self {
        Self {
            slot_step_minutes: slot_step_minutes.max(5),
            booking_window_days,
            policy: ConflictPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Compute the ordered slot list for `service` on `date`.
    ///
    /// `today` is passed explicitly so callers control the clock.
    /// `staff` may be the full roster; inactive or unqualified members
    /// are ignored. A slot is available when at least one qualified
    /// staff member is free for the whole interval -- assignment happens
    /// at booking time, not here.
    pub fn slots_for(
        &self,
        service: &Service,
        date: NaiveDate,
        today: NaiveDate,
        hours: &BusinessHours,
        vacations: &[VacationPeriod],
        appointments: &[Appointment],
        staff: &[Staff],
    ) -> Vec<Slot> {
        if date < today {
            return Vec::new();
        }
        let horizon = today + chrono::Duration::days(self.booking_window_days as i64);
        if date > horizon {
            return Vec::new();
        }
        if vacations.iter().any(|v| v.contains(date)) {
            return Vec::new();
        }

        let day = hours.for_weekday(date.weekday());
        let qualified: Vec<&Staff> = staff
            .iter()
            .filter(|s| s.active && s.is_qualified(&service.category))
            .collect();

        let mut slots = Vec::new();
        for window in day.open_intervals() {
            let mut t = window.start;
            // Candidates never cross the window's closing time, so no
            // slot straddles a split schedule's midday gap.
            while window.fits(t, service.duration_minutes) {
                let end = Appointment::end_for(t, service.duration_minutes);
                let available = qualified
                    .iter()
                    .any(|s| self.staff_is_free(s, date, t, end, appointments));
                slots.push(Slot { time: t, available });

                t = Appointment::end_for(t, self.slot_step_minutes);
                if t <= window.start {
                    break; // wrapped past midnight
                }
            }
        }
        slots
    }

    fn staff_is_free(
        &self,
        staff: &Staff,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        appointments: &[Appointment],
    ) -> bool {
        !appointments.iter().any(|a| {
            a.staff_id == staff.id
                && a.date == date
                && self.policy.occupies(a.status)
                && a.overlaps(start, end)
        })
    }
}
