use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every scheduler/dispatch state change produces an Event.
/// The host UI consumes these to drive its status notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SchedulerStarted {
        at: DateTime<Utc>,
    },
    SchedulerStopped {
        at: DateTime<Utc>,
    },
    /// A cycle skipped dispatch (quiet window or power saving).
    CycleSkipped {
        reason: String,
        resume_in_minutes: u32,
        at: DateTime<Utc>,
    },
    PassStarted {
        at: DateTime<Utc>,
    },
    PassCompleted {
        total: usize,
        sent: usize,
        failed: usize,
        /// Human-readable status line for the notification surface.
        status: String,
        at: DateTime<Utc>,
    },
    /// The pass aborted before anything was attempted (fetch failure).
    PassFailed {
        error: String,
        at: DateTime<Utc>,
    },
    /// A backgrounded dispatch request was picked up on foreground resume.
    CatchUpTriggered {
        at: DateTime<Utc>,
    },
}
