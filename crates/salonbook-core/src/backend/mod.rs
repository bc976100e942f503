//! System-of-record boundary.
//!
//! Everything the core needs from the booking backend goes through
//! [`BookingApi`]; the engines stay testable against in-memory fakes and
//! the production client lives in [`http`].

pub mod http;

pub use http::HttpBookingApi;

use std::future::Future;

use chrono::NaiveDate;

use crate::booking::hours::{BusinessHours, VacationPeriod};
use crate::dispatch::types::PendingReminder;
use crate::error::ApiError;
use crate::model::{Appointment, Service, Staff};

/// Client interface to the booking system of record.
///
/// Fetches are live reads -- no caching is assumed between calls. The
/// two `mark_*` calls are the only writes this core ever performs.
pub trait BookingApi: Send + Sync {
    /// Appointments due for a reminder, not yet marked sent or failed.
    fn pending_reminders(
        &self,
    ) -> impl Future<Output = Result<Vec<PendingReminder>, ApiError>> + Send;

    /// Record a successful reminder delivery for an appointment.
    fn mark_reminder_sent(
        &self,
        appointment_id: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Record a failed reminder delivery with its reason. Best-effort on
    /// the server side; callers treat failures here as non-critical.
    fn mark_reminder_failed(
        &self,
        appointment_id: &str,
        error: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Weekly opening hours.
    fn business_hours(&self) -> impl Future<Output = Result<BusinessHours, ApiError>> + Send;

    /// Closed date ranges.
    fn vacation_periods(
        &self,
    ) -> impl Future<Output = Result<Vec<VacationPeriod>, ApiError>> + Send;

    /// Maximum number of days in advance a slot may be offered.
    fn booking_window_days(&self) -> impl Future<Output = Result<u32, ApiError>> + Send;

    /// All appointments on a calendar date, any status.
    fn appointments_on(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<Appointment>, ApiError>> + Send;

    /// Staff roster.
    fn staff(&self) -> impl Future<Output = Result<Vec<Staff>, ApiError>> + Send;

    /// Service catalog.
    fn services(&self) -> impl Future<Output = Result<Vec<Service>, ApiError>> + Send;
}
