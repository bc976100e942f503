//! One dispatch pass: fetch -> send -> report -> aggregate.
//!
//! The orchestrator serializes passes behind an async mutex: the adaptive
//! scheduler, the foreground catch-up trigger and the manual CLI path all
//! funnel through [`SyncOrchestrator::run_pass`], so at most one pass is
//! in flight at any instant. Two concurrent passes could fetch and mark
//! the same pending reminder, breaking at-most-once delivery.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::backend::BookingApi;
use crate::dispatch::sender::ReminderSender;
use crate::dispatch::types::SyncResult;
use crate::error::ApiError;
use crate::platform::MessageChannel;
use crate::storage::Database;

/// Fixed pause between channel sends (carrier rate limit).
pub const INTER_MESSAGE_DELAY: Duration = Duration::from_secs(1);

/// Composes fetcher, sender and reporter into single passes.
pub struct SyncOrchestrator<A, C> {
    api: A,
    sender: ReminderSender<C>,
    db: Arc<Mutex<Database>>,
    pass_lock: tokio::sync::Mutex<()>,
}

impl<A: BookingApi, C: MessageChannel> SyncOrchestrator<A, C> {
    pub fn new(api: A, channel: C, db: Arc<Mutex<Database>>) -> Self {
        Self {
            api,
            sender: ReminderSender::new(channel),
            db,
            pass_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Run one pass over the pending reminders.
    ///
    /// Only a fetch failure aborts (nothing was attempted, nothing is
    /// marked); every later failure is captured per item or logged, never
    /// thrown past this boundary.
    pub async fn run_pass(&self) -> Result<SyncResult, ApiError> {
        let _guard = self.pass_lock.lock().await;
        let started_at = Utc::now();

        let pending = match self.api.pending_reminders().await {
            Ok(pending) => pending,
            Err(err) => {
                warn!(error = %err, "reminder fetch failed, aborting pass");
                return Err(err);
            }
        };

        let mut result = SyncResult::empty();
        if pending.is_empty() {
            info!("no reminders due");
            self.persist_outcome(&result, started_at);
            return Ok(result);
        }

        info!(count = pending.len(), "dispatching reminders");
        let last = pending.len() - 1;
        for (index, reminder) in pending.iter().enumerate() {
            let delivery = self.sender.deliver(reminder).await;

            let report = if delivery.result.success {
                self.api.mark_reminder_sent(&reminder.appointment_id).await
            } else {
                let reason = delivery.result.error.as_deref().unwrap_or("unknown error");
                self.api
                    .mark_reminder_failed(&reminder.appointment_id, reason)
                    .await
            };
            if let Err(err) = report {
                // The send already happened; losing the report is
                // non-critical and must not abort the pass.
                warn!(
                    appointment = %reminder.appointment_id,
                    error = %err,
                    "outcome report failed"
                );
            }

            let channel_invoked = delivery.channel_invoked;
            result.push(delivery.result);

            if channel_invoked && index < last {
                tokio::time::sleep(INTER_MESSAGE_DELAY).await;
            }
        }

        self.persist_outcome(&result, started_at);
        info!(
            total = result.total,
            sent = result.sent,
            failed = result.failed,
            "pass complete"
        );
        Ok(result)
    }

    fn persist_outcome(&self, result: &SyncResult, started_at: chrono::DateTime<Utc>) {
        let finished_at = Utc::now();
        let db = self.db.lock().unwrap();
        if let Err(err) = db.touch_last_sync(finished_at) {
            warn!(error = %err, "failed to persist last-sync timestamp");
        }
        if result.total > 0 {
            if let Err(err) = db.touch_last_reminder_found(finished_at) {
                warn!(error = %err, "failed to persist last-reminder-found timestamp");
            }
        }
        if let Err(err) = db.record_pass(result, started_at, finished_at) {
            warn!(error = %err, "failed to record pass history");
        }
    }
}
