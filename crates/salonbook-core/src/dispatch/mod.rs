//! Reminder delivery pipeline: fetch, send, report, aggregate.

pub mod orchestrator;
pub mod phone;
pub mod sender;
pub mod types;

pub use orchestrator::{SyncOrchestrator, INTER_MESSAGE_DELAY};
pub use phone::normalize_phone;
pub use sender::ReminderSender;
pub use types::{PendingReminder, SmsResult, SyncResult};
