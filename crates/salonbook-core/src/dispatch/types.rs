//! Wire and aggregate types for the reminder dispatch pipeline.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::model::Customer;

/// An appointment due for a reminder, joined with its customer and a
/// pre-rendered message body. Produced by the system of record, consumed
/// read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingReminder {
    pub appointment_id: String,
    pub customer: Customer,
    pub service_name: String,
    pub date: NaiveDate,
    #[serde(with = "crate::model::hhmm")]
    pub start_time: NaiveTime,
    /// Ready-to-send message text.
    pub message: String,
}

/// Outcome of one reminder delivery attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsResult {
    pub appointment_id: String,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl SmsResult {
    pub fn sent(appointment_id: impl Into<String>) -> Self {
        Self {
            appointment_id: appointment_id.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(appointment_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            appointment_id: appointment_id.into(),
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Aggregate of one dispatch pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncResult {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub results: Vec<SmsResult>,
}

impl SyncResult {
    /// The zero-valued result recorded when nothing was pending.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: SmsResult) {
        self.total += 1;
        if result.success {
            self.sent += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(result);
    }

    /// Human-readable status line for notifications and the CLI.
    pub fn summary(&self) -> String {
        if self.total == 0 {
            "No reminders due".to_string()
        } else if self.failed == 0 {
            format!("Sent {} of {} reminders", self.sent, self.total)
        } else {
            format!(
                "Sent {} of {} reminders ({} failed)",
                self.sent, self.total, self.failed
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_updates_counters() {
        let mut result = SyncResult::empty();
        result.push(SmsResult::sent("a1"));
        result.push(SmsResult::failed("a2", "missing phone number"));

        assert_eq!(result.total, 2);
        assert_eq!(result.sent, 1);
        assert_eq!(result.failed, 1);
        assert_eq!(result.results[1].error.as_deref(), Some("missing phone number"));
    }

    #[test]
    fn summary_reads_naturally() {
        assert_eq!(SyncResult::empty().summary(), "No reminders due");

        let mut all_good = SyncResult::empty();
        all_good.push(SmsResult::sent("a1"));
        assert_eq!(all_good.summary(), "Sent 1 of 1 reminders");

        let mut mixed = SyncResult::empty();
        mixed.push(SmsResult::sent("a1"));
        mixed.push(SmsResult::failed("a2", "x"));
        assert_eq!(mixed.summary(), "Sent 1 of 2 reminders (1 failed)");
    }
}
