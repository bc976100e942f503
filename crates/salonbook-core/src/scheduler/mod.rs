//! Adaptive background scheduler for reminder dispatch.
//!
//! One long-lived cooperative loop: each cycle it consults the pure
//! policy (quiet window, power state, interval heuristic), runs at most
//! one orchestrator pass and sleeps until the next wake-up. An explicit
//! stop interrupts the pending sleep -- there is never "one more cycle
//! after stop". The foreground catch-up trigger shares the
//! orchestrator's pass mutex, so the two paths can never dispatch
//! concurrently.

pub mod policy;

pub use policy::{
    clamp_interval, optimized_interval, plan_cycle, CycleDecision, CycleInputs, QuietWindow,
    MIN_INTERVAL_MINUTES, SKIP_SLEEP_MINUTES,
};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, warn};

use crate::backend::BookingApi;
use crate::dispatch::orchestrator::SyncOrchestrator;
use crate::dispatch::types::SyncResult;
use crate::error::ApiError;
use crate::events::Event;
use crate::platform::{DispatchBridge, MessageChannel, PowerMonitor};
use crate::storage::{Database, DEFAULT_SYNC_INTERVAL_MINUTES};

/// Snapshot of the scheduler's persisted and in-memory state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub auto_sync_enabled: bool,
    pub interval_minutes: u32,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub last_status: Option<String>,
}

/// The background dispatch loop.
///
/// Constructed once at application start and passed by reference; all
/// state lives in the struct, not in globals. Cloning is cheap (shared
/// handles) and start/stop act on the shared instance.
pub struct AdaptiveScheduler<A, C> {
    orchestrator: Arc<SyncOrchestrator<A, C>>,
    db: Arc<Mutex<Database>>,
    power: Arc<dyn PowerMonitor>,
    bridge: Arc<dyn DispatchBridge>,
    quiet: QuietWindow,
    running: Arc<AtomicBool>,
    stop: Arc<Notify>,
    events: mpsc::UnboundedSender<Event>,
}

impl<A, C> Clone for AdaptiveScheduler<A, C> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
            db: Arc::clone(&self.db),
            power: Arc::clone(&self.power),
            bridge: Arc::clone(&self.bridge),
            quiet: self.quiet,
            running: Arc::clone(&self.running),
            stop: Arc::clone(&self.stop),
            events: self.events.clone(),
        }
    }
}

impl<A, C> AdaptiveScheduler<A, C>
where
    A: BookingApi + 'static,
    C: MessageChannel + 'static,
{
    /// Build a scheduler and the event stream the host UI consumes.
    pub fn new(
        orchestrator: Arc<SyncOrchestrator<A, C>>,
        db: Arc<Mutex<Database>>,
        power: Arc<dyn PowerMonitor>,
        bridge: Arc<dyn DispatchBridge>,
        quiet: QuietWindow,
    ) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let scheduler = Self {
            orchestrator,
            db,
            power,
            bridge,
            quiet,
            running: Arc::new(AtomicBool::new(false)),
            stop: Arc::new(Notify::new()),
            events,
        };
        (scheduler, receiver)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start the loop. No-op (returns false) when already running or when
    /// auto-sync was disabled by an earlier stop -- a restart must not
    /// silently resume dispatch.
    pub fn start(&self) -> bool {
        let enabled = self.db.lock().unwrap().auto_sync_enabled().unwrap_or(true);
        if !enabled {
            info!("auto-sync is disabled, not starting the scheduler");
            return false;
        }
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("scheduler already running");
            return false;
        }
        tokio::spawn(self.clone().run_loop());
        true
    }

    /// Stop the loop. Safe to call at any point: the flag flips first,
    /// the pending sleep is interrupted, and an in-flight pass is allowed
    /// to finish and report. Persists the auto-sync-disabled flag.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Err(err) = self.db.lock().unwrap().set_auto_sync_enabled(false) {
            warn!(error = %err, "failed to persist auto-sync flag");
        }
        self.stop.notify_one();
    }

    /// Foreground catch-up: when the host reports a dispatch was
    /// requested while backgrounded, clear the flag and run exactly one
    /// pass. The orchestrator's pass mutex keeps this from overlapping a
    /// scheduled pass.
    pub async fn run_catchup(&self) -> Result<Option<SyncResult>, ApiError> {
        if !self.bridge.pending_dispatch() {
            return Ok(None);
        }
        self.bridge.clear_pending_dispatch();
        info!("running catch-up pass for backgrounded dispatch request");
        let _ = self.events.send(Event::CatchUpTriggered { at: Utc::now() });

        let result = self.orchestrator.run_pass().await?;
        self.publish_status(&result);
        Ok(Some(result))
    }

    pub fn status(&self) -> SchedulerStatus {
        let db = self.db.lock().unwrap();
        SchedulerStatus {
            running: self.is_running(),
            auto_sync_enabled: db.auto_sync_enabled().unwrap_or(true),
            interval_minutes: db
                .sync_interval_minutes()
                .unwrap_or(DEFAULT_SYNC_INTERVAL_MINUTES),
            last_sync_at: db.last_sync_at().ok().flatten(),
            last_status: db.last_status().ok().flatten(),
        }
    }

    async fn run_loop(self) {
        let _ = self.events.send(Event::SchedulerStarted { at: Utc::now() });

        while self.running.load(Ordering::SeqCst) {
            let sleep_minutes = self.run_cycle().await;

            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            if !self
                .sleep_unless_stopped(Duration::from_secs(u64::from(sleep_minutes) * 60))
                .await
            {
                break;
            }
        }

        self.running.store(false, Ordering::SeqCst);
        let _ = self.events.send(Event::SchedulerStopped { at: Utc::now() });
    }

    /// One cycle: decide, maybe dispatch, return the sleep length.
    async fn run_cycle(&self) -> u32 {
        let (configured, last_found) = {
            let db = self.db.lock().unwrap();
            (
                db.sync_interval_minutes()
                    .unwrap_or(DEFAULT_SYNC_INTERVAL_MINUTES),
                db.last_reminder_found_at().ok().flatten(),
            )
        };
        let base = clamp_interval(configured);
        if base != configured {
            warn!(configured, clamped = base, "sync interval below platform minimum");
        }

        let inputs = CycleInputs {
            base_minutes: base,
            time_of_day: Local::now().time(),
            power_save: self.power.is_power_save(),
            last_reminder_found_at: last_found,
            now: Utc::now(),
        };

        match plan_cycle(&self.quiet, &inputs) {
            CycleDecision::Skip {
                reason,
                sleep_minutes,
            } => {
                info!(%reason, "skipping dispatch this cycle");
                let _ = self.events.send(Event::CycleSkipped {
                    reason,
                    resume_in_minutes: sleep_minutes,
                    at: Utc::now(),
                });
                sleep_minutes
            }
            CycleDecision::Dispatch {
                interval_minutes,
                reason,
            } => {
                debug!(%reason, interval_minutes, "dispatch cycle");
                let _ = self.events.send(Event::PassStarted { at: Utc::now() });
                match self.orchestrator.run_pass().await {
                    Ok(result) => self.publish_status(&result),
                    Err(err) => {
                        let status = format!("Sync failed: {err}");
                        if let Err(db_err) = self.db.lock().unwrap().set_last_status(&status) {
                            warn!(error = %db_err, "failed to persist status");
                        }
                        let _ = self.events.send(Event::PassFailed {
                            error: err.to_string(),
                            at: Utc::now(),
                        });
                    }
                }
                interval_minutes
            }
        }
    }

    fn publish_status(&self, result: &SyncResult) {
        let status = result.summary();
        if let Err(err) = self.db.lock().unwrap().set_last_status(&status) {
            warn!(error = %err, "failed to persist status");
        }
        let _ = self.events.send(Event::PassCompleted {
            total: result.total,
            sent: result.sent,
            failed: result.failed,
            status,
            at: Utc::now(),
        });
    }

    /// Sleep, racing the stop signal. Returns false when the loop should
    /// exit.
    async fn sleep_unless_stopped(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.stop.notified() => self.running.load(Ordering::SeqCst),
            _ = tokio::time::sleep(duration) => self.running.load(Ordering::SeqCst),
        }
    }
}
