//! Pure cycle policy for the adaptive scheduler.
//!
//! Everything here is a function of its inputs -- the loop feeds in the
//! clock, battery state and the last-reminder-found timestamp, and gets
//! back a decision with a human-readable reason. No scheduler loop is
//! needed to unit-test the heuristics.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform floor for periodic background work.
pub const MIN_INTERVAL_MINUTES: u32 = 15;

/// Fixed sleep before re-evaluating a skipped cycle.
pub const SKIP_SLEEP_MINUTES: u32 = 30;

/// A time-of-day range during which dispatch is deliberately skipped.
/// May cross midnight (the default window 20:00-09:00 does).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietWindow {
    #[serde(with = "crate::model::hhmm")]
    pub start: NaiveTime,
    #[serde(with = "crate::model::hhmm")]
    pub end: NaiveTime,
}

impl QuietWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Whether `time` falls inside the window.
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            time >= self.start && time < self.end
        } else {
            // Crosses midnight: [start, 24:00) or [00:00, end).
            time >= self.start || time < self.end
        }
    }
}

/// Inputs the loop samples once per cycle.
#[derive(Debug, Clone, Copy)]
pub struct CycleInputs {
    /// Configured base interval, already clamped to the platform minimum.
    pub base_minutes: u32,
    /// Local wall-clock time of day.
    pub time_of_day: NaiveTime,
    /// Whether the host reports deep power saving.
    pub power_save: bool,
    /// When a pass last found at least one pending reminder.
    pub last_reminder_found_at: Option<DateTime<Utc>>,
    pub now: DateTime<Utc>,
}

/// What the loop should do this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleDecision {
    /// Skip dispatch entirely and re-evaluate later.
    Skip { reason: String, sleep_minutes: u32 },
    /// Run one pass, then sleep the optimized interval.
    Dispatch {
        interval_minutes: u32,
        reason: String,
    },
}

/// Clamp a configured interval to the platform minimum.
pub fn clamp_interval(configured: u32) -> u32 {
    configured.max(MIN_INTERVAL_MINUTES)
}

/// Decide one cycle.
pub fn plan_cycle(quiet: &QuietWindow, inputs: &CycleInputs) -> CycleDecision {
    if quiet.contains(inputs.time_of_day) {
        return CycleDecision::Skip {
            reason: format!(
                "inside quiet window {}-{}",
                quiet.start.format("%H:%M"),
                quiet.end.format("%H:%M")
            ),
            sleep_minutes: SKIP_SLEEP_MINUTES,
        };
    }
    if inputs.power_save {
        return CycleDecision::Skip {
            reason: "device is in power saving mode".into(),
            sleep_minutes: SKIP_SLEEP_MINUTES,
        };
    }

    let (interval_minutes, reason) =
        optimized_interval(inputs.base_minutes, inputs.last_reminder_found_at, inputs.now);
    CycleDecision::Dispatch {
        interval_minutes,
        reason: reason.into(),
    }
}

/// Interval heuristic: stay at the base while reminders keep turning up,
/// back off when passes come up empty to conserve power. Never below the
/// base (nor the platform minimum), never above 4x the base.
pub fn optimized_interval(
    base_minutes: u32,
    last_reminder_found_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> (u32, &'static str) {
    let base = clamp_interval(base_minutes);
    match last_reminder_found_at {
        Some(found) => {
            let age_hours = (now - found).num_hours();
            if age_hours < 2 {
                (base, "reminders found recently, staying at base interval")
            } else if age_hours < 24 {
                (base.saturating_mul(2), "no reminders for a few hours, backing off")
            } else {
                (base.saturating_mul(4), "no reminders since yesterday, backing off hard")
            }
        }
        None => (base.saturating_mul(4), "no reminder ever found, backing off hard"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn overnight() -> QuietWindow {
        QuietWindow::new(t(20, 0), t(9, 0))
    }

    fn inputs(time_of_day: NaiveTime) -> CycleInputs {
        CycleInputs {
            base_minutes: 30,
            time_of_day,
            power_save: false,
            last_reminder_found_at: Some(Utc::now()),
            now: Utc::now(),
        }
    }

    #[test]
    fn quiet_window_crossing_midnight() {
        let window = overnight();
        assert!(window.contains(t(21, 30)));
        assert!(window.contains(t(3, 0)));
        assert!(window.contains(t(8, 59)));
        assert!(!window.contains(t(9, 0)));
        assert!(!window.contains(t(12, 0)));
        assert!(!window.contains(t(19, 59)));
    }

    #[test]
    fn quiet_window_same_day() {
        let window = QuietWindow::new(t(13, 0), t(15, 0));
        assert!(window.contains(t(14, 0)));
        assert!(!window.contains(t(12, 59)));
        assert!(!window.contains(t(15, 0)));
    }

    #[test]
    fn evening_cycle_skips_with_reason() {
        // 21:30 with a 20:00-09:00 window: skip, ~30 minutes.
        let decision = plan_cycle(&overnight(), &inputs(t(21, 30)));
        match decision {
            CycleDecision::Skip {
                reason,
                sleep_minutes,
            } => {
                assert!(reason.contains("quiet window"));
                assert_eq!(sleep_minutes, SKIP_SLEEP_MINUTES);
            }
            other => panic!("expected skip, got {other:?}"),
        }
    }

    #[test]
    fn power_save_skips_dispatch() {
        let mut i = inputs(t(12, 0));
        i.power_save = true;
        let decision = plan_cycle(&overnight(), &i);
        match decision {
            CycleDecision::Skip { reason, .. } => assert!(reason.contains("power saving")),
            other => panic!("expected skip, got {other:?}"),
        }
    }

    #[test]
    fn daytime_cycle_dispatches_at_base() {
        let decision = plan_cycle(&overnight(), &inputs(t(12, 0)));
        match decision {
            CycleDecision::Dispatch {
                interval_minutes, ..
            } => assert_eq!(interval_minutes, 30),
            other => panic!("expected dispatch, got {other:?}"),
        }
    }

    #[test]
    fn interval_backs_off_as_findings_age() {
        let now = Utc::now();
        let fresh = now - Duration::minutes(30);
        let stale = now - Duration::hours(6);
        let ancient = now - Duration::days(3);

        assert_eq!(optimized_interval(30, Some(fresh), now).0, 30);
        assert_eq!(optimized_interval(30, Some(stale), now).0, 60);
        assert_eq!(optimized_interval(30, Some(ancient), now).0, 120);
        assert_eq!(optimized_interval(30, None, now).0, 120);
    }

    #[test]
    fn interval_never_drops_below_platform_minimum() {
        let now = Utc::now();
        let (interval, _) = optimized_interval(5, Some(now), now);
        assert_eq!(interval, MIN_INTERVAL_MINUTES);
        assert_eq!(clamp_interval(1), MIN_INTERVAL_MINUTES);
        assert_eq!(clamp_interval(45), 45);
    }
}
