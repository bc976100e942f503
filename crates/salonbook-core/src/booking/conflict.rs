//! Double-booking detection for prospective appointments.
//!
//! Pure and synchronous: the caller supplies the day's appointments (a
//! live read from the system of record) and gets a verdict back. Two
//! bookings conflict only when their minute-of-day intervals overlap
//! half-open AND they share the customer or the staff member -- two
//! different customers with different staff at the same time are fine.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::model::{Appointment, AppointmentStatus};

/// Which existing appointments count as occupying their slot.
///
/// The legacy behavior counts every status, so a cancelled appointment
/// still blocks the slot. That is kept as the default for compatibility;
/// deployments that want cancelled slots released set
/// `count_cancelled_as_occupying = false`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConflictPolicy {
    pub count_cancelled_as_occupying: bool,
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        Self {
            count_cancelled_as_occupying: true,
        }
    }
}

impl ConflictPolicy {
    /// Whether an appointment with this status blocks its time interval.
    pub fn occupies(&self, status: AppointmentStatus) -> bool {
        self.count_cancelled_as_occupying || status != AppointmentStatus::Cancelled
    }
}

/// A prospective booking to test against the day's appointments.
#[derive(Debug, Clone)]
pub struct BookingRequest<'a> {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub customer_id: &'a str,
    pub staff_id: &'a str,
    /// Appointment to ignore (self, when editing).
    pub exclude_id: Option<&'a str>,
}

/// Verdict returned to the booking caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictCheck {
    pub has_conflict: bool,
    pub message: Option<String>,
}

impl ConflictCheck {
    fn clear() -> Self {
        Self {
            has_conflict: false,
            message: None,
        }
    }

    fn because(message: String) -> Self {
        Self {
            has_conflict: true,
            message: Some(message),
        }
    }
}

/// Check a prospective booking against existing appointments.
///
/// Returns the first conflict found; the message names the clashing
/// resource (customer or staff) and its time range.
pub fn check_conflict(
    appointments: &[Appointment],
    request: &BookingRequest<'_>,
    policy: ConflictPolicy,
) -> ConflictCheck {
    for existing in appointments {
        if existing.date != request.date {
            continue;
        }
        if request.exclude_id == Some(existing.id.as_str()) {
            continue;
        }
        if !policy.occupies(existing.status) {
            continue;
        }
        if !existing.overlaps(request.start_time, request.end_time) {
            continue;
        }

        let range = format!(
            "{}-{}",
            existing.start_time.format("%H:%M"),
            existing.end_time.format("%H:%M")
        );
        if existing.customer_id == request.customer_id {
            return ConflictCheck::because(format!(
                "customer already has an appointment from {range} on {}",
                request.date
            ));
        }
        if existing.staff_id == request.staff_id {
            return ConflictCheck::because(format!(
                "staff member is already booked from {range} on {}",
                request.date
            ));
        }
    }
    ConflictCheck::clear()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AppointmentStatus;
    use chrono::Utc;
    use proptest::prelude::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn appt(
        id: &str,
        customer: &str,
        staff: &str,
        start: NaiveTime,
        end: NaiveTime,
        status: AppointmentStatus,
    ) -> Appointment {
        Appointment {
            id: id.into(),
            customer_id: customer.into(),
            service_id: "srv-1".into(),
            staff_id: staff.into(),
            date: day(),
            start_time: start,
            end_time: end,
            status,
            reminder_sent: false,
            notes: None,
            created_at: Utc::now(),
        }
    }

    fn request<'a>(
        start: NaiveTime,
        end: NaiveTime,
        customer: &'a str,
        staff: &'a str,
    ) -> BookingRequest<'a> {
        BookingRequest {
            date: day(),
            start_time: start,
            end_time: end,
            customer_id: customer,
            staff_id: staff,
            exclude_id: None,
        }
    }

    #[test]
    fn same_staff_overlap_conflicts() {
        let existing = vec![appt(
            "a1",
            "cust-x",
            "staff-1",
            t(10, 0),
            t(10, 30),
            AppointmentStatus::Scheduled,
        )];
        let check = check_conflict(
            &existing,
            &request(t(10, 15), t(10, 45), "cust-y", "staff-1"),
            ConflictPolicy::default(),
        );
        assert!(check.has_conflict);
        let msg = check.message.unwrap();
        assert!(msg.contains("staff"));
        assert!(msg.contains("10:00-10:30"));
    }

    #[test]
    fn same_customer_overlap_conflicts() {
        let existing = vec![appt(
            "a1",
            "cust-x",
            "staff-1",
            t(10, 0),
            t(11, 0),
            AppointmentStatus::Confirmed,
        )];
        let check = check_conflict(
            &existing,
            &request(t(10, 30), t(11, 30), "cust-x", "staff-2"),
            ConflictPolicy::default(),
        );
        assert!(check.has_conflict);
        assert!(check.message.unwrap().contains("customer"));
    }

    #[test]
    fn different_customer_and_staff_do_not_conflict() {
        let existing = vec![appt(
            "a1",
            "cust-x",
            "staff-1",
            t(10, 0),
            t(11, 0),
            AppointmentStatus::Scheduled,
        )];
        let check = check_conflict(
            &existing,
            &request(t(10, 0), t(11, 0), "cust-y", "staff-2"),
            ConflictPolicy::default(),
        );
        assert!(!check.has_conflict);
    }

    #[test]
    fn touching_intervals_do_not_conflict() {
        let existing = vec![appt(
            "a1",
            "cust-x",
            "staff-1",
            t(10, 0),
            t(10, 30),
            AppointmentStatus::Scheduled,
        )];
        let check = check_conflict(
            &existing,
            &request(t(10, 30), t(11, 0), "cust-x", "staff-1"),
            ConflictPolicy::default(),
        );
        assert!(!check.has_conflict);
    }

    #[test]
    fn excluded_appointment_is_ignored_on_edit() {
        let existing = vec![appt(
            "a1",
            "cust-x",
            "staff-1",
            t(10, 0),
            t(10, 30),
            AppointmentStatus::Scheduled,
        )];
        let mut req = request(t(10, 0), t(10, 45), "cust-x", "staff-1");
        req.exclude_id = Some("a1");
        let check = check_conflict(&existing, &req, ConflictPolicy::default());
        assert!(!check.has_conflict);
    }

    #[test]
    fn cancelled_blocks_under_default_policy() {
        let existing = vec![appt(
            "a1",
            "cust-x",
            "staff-1",
            t(10, 0),
            t(10, 30),
            AppointmentStatus::Cancelled,
        )];
        let check = check_conflict(
            &existing,
            &request(t(10, 0), t(10, 30), "cust-y", "staff-1"),
            ConflictPolicy::default(),
        );
        assert!(check.has_conflict);
    }

    #[test]
    fn cancelled_released_when_policy_allows() {
        let existing = vec![appt(
            "a1",
            "cust-x",
            "staff-1",
            t(10, 0),
            t(10, 30),
            AppointmentStatus::Cancelled,
        )];
        let check = check_conflict(
            &existing,
            &request(t(10, 0), t(10, 30), "cust-y", "staff-1"),
            ConflictPolicy {
                count_cancelled_as_occupying: false,
            },
        );
        assert!(!check.has_conflict);
    }

    #[test]
    fn other_dates_never_conflict() {
        let mut other_day = appt(
            "a1",
            "cust-x",
            "staff-1",
            t(10, 0),
            t(10, 30),
            AppointmentStatus::Scheduled,
        );
        other_day.date = NaiveDate::from_ymd_opt(2026, 3, 11).unwrap();
        let check = check_conflict(
            &[other_day],
            &request(t(10, 0), t(10, 30), "cust-x", "staff-1"),
            ConflictPolicy::default(),
        );
        assert!(!check.has_conflict);
    }

    proptest! {
        /// Overlap AND a shared resource <=> conflict, over arbitrary
        /// minute-of-day intervals.
        #[test]
        fn conflict_iff_overlap_and_shared_resource(
            existing_start in 0u32..1380,
            existing_len in 15u32..120,
            new_start in 0u32..1380,
            new_len in 15u32..120,
            same_customer in any::<bool>(),
            same_staff in any::<bool>(),
        ) {
            let existing_end = (existing_start + existing_len).min(1439);
            let new_end = (new_start + new_len).min(1439);
            prop_assume!(existing_start < existing_end && new_start < new_end);

            let tm = |m: u32| NaiveTime::from_hms_opt(m / 60, m % 60, 0).unwrap();
            let existing = vec![appt(
                "a1",
                "cust-x",
                "staff-1",
                tm(existing_start),
                tm(existing_end),
                AppointmentStatus::Scheduled,
            )];
            let customer = if same_customer { "cust-x" } else { "cust-y" };
            let staff = if same_staff { "staff-1" } else { "staff-2" };

            let check = check_conflict(
                &existing,
                &request(tm(new_start), tm(new_end), customer, staff),
                ConflictPolicy::default(),
            );

            let overlap = new_start < existing_end && new_end > existing_start;
            let expected = overlap && (same_customer || same_staff);
            prop_assert_eq!(check.has_conflict, expected);
        }
    }
}
