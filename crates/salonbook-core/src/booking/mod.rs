//! Availability and booking rules: opening hours, slot computation and
//! double-booking detection.

pub mod availability;
pub mod conflict;
pub mod hours;

pub use availability::{AvailabilityEngine, Slot};
pub use conflict::{check_conflict, BookingRequest, ConflictCheck, ConflictPolicy};
pub use hours::{BusinessHours, DaySchedule, ScheduleKind, TimeInterval, VacationPeriod};
