//! Shared data model: services, staff, customers and appointments.
//!
//! Everything here is a plain serde type mirroring the system of record.
//! The booking engines read these; the reminder pipeline reads customers
//! and never mutates them.

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Serde helper for `HH:MM` wire times (the backend sends `"09:30"`,
/// chrono's default wants seconds).
pub(crate) mod hhmm {
    use chrono::NaiveTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<NaiveTime, String> {
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .map_err(|e| format!("invalid time '{raw}': {e}"))
    }
}

/// A bookable service. Immutable during a booking pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub duration_minutes: u32,
    pub price: f64,
    pub category: String,
}

/// A staff member. Only staff whose specializations include a service's
/// category may be assigned appointments for that service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    pub id: String,
    pub name: String,
    pub active: bool,
    #[serde(default)]
    pub specializations: Vec<String>,
    /// Identifying color for calendar views (e.g. "#e05b4b").
    #[serde(default)]
    pub color: String,
}

impl Staff {
    /// Whether this staff member may take appointments of the category.
    pub fn is_qualified(&self, category: &str) -> bool {
        self.specializations.iter().any(|s| s == category)
    }
}

/// GDPR consent flags. Read by the reminder pipeline, never written.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentFlags {
    #[serde(default)]
    pub sms_reminder_consent: bool,
    #[serde(default)]
    pub email_reminder_consent: bool,
    #[serde(default)]
    pub health_data_consent: bool,
    #[serde(default)]
    pub marketing_consent: bool,
}

/// A customer as the system of record exposes it to this core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub consents: ConsentFlags,
}

impl Customer {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Appointment lifecycle status.
///
/// ```text
/// scheduled -> confirmed -> completed
/// scheduled | confirmed -> cancelled | no-show
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Terminal statuses admit no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::NoShow)
    }

    /// Whether `self -> to` is a legal transition.
    pub fn can_transition_to(self, to: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, to),
            (Scheduled, Confirmed)
                | (Confirmed, Completed)
                | (Scheduled, Cancelled)
                | (Confirmed, Cancelled)
                | (Scheduled, NoShow)
                | (Confirmed, NoShow)
        )
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Scheduled => "scheduled",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no-show",
        };
        f.write_str(s)
    }
}

/// A booked appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub customer_id: String,
    pub service_id: String,
    pub staff_id: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub reminder_sent: bool,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    /// Derive an end time as `start + duration` on a 24-hour wheel.
    /// Overflow past midnight wraps (callers reject wrapped results via
    /// [`Appointment::validate_times`]).
    pub fn end_for(start: NaiveTime, duration_minutes: u32) -> NaiveTime {
        let total = (minute_of_day(start) + duration_minutes) % (24 * 60);
        NaiveTime::from_hms_opt(total / 60, total % 60, 0)
            .unwrap_or(start)
    }

    /// Enforce the same-day invariant `start < end`.
    pub fn validate_times(start: NaiveTime, end: NaiveTime) -> Result<(), ValidationError> {
        if start < end {
            Ok(())
        } else {
            Err(ValidationError::InvalidTimeRange { start, end })
        }
    }

    /// Half-open overlap against another minute-of-day interval on the
    /// same date.
    pub fn overlaps(&self, start: NaiveTime, end: NaiveTime) -> bool {
        start < self.end_time && end > self.start_time
    }

    /// Apply a status change, rejecting illegal transitions.
    pub fn transition_to(&mut self, to: AppointmentStatus) -> Result<(), ValidationError> {
        if !self.status.can_transition_to(to) {
            return Err(ValidationError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        Ok(())
    }
}

/// Minutes since midnight for a wall-clock time.
pub fn minute_of_day(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}
