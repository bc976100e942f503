//! # Salonbook Core Library
//!
//! Core business logic for Salonbook, an appointment-booking and
//! customer-reminder system for service businesses. The CLI binary and
//! any GUI host are thin layers over this library.
//!
//! ## Architecture
//!
//! - **Booking**: pure, synchronous availability and conflict engines --
//!   all inputs (opening hours, closures, the day's appointments) are
//!   passed in by the caller
//! - **Dispatch**: the reminder pipeline -- fetch pending reminders,
//!   send each through the host's message channel, report outcomes back
//! - **Scheduler**: a long-lived adaptive loop deciding when the next
//!   dispatch pass runs
//! - **Storage**: SQLite-backed scheduler state plus TOML configuration
//! - **Platform**: capability traits the hosting application implements
//!
//! ## Key Components
//!
//! - [`AvailabilityEngine`]: bookable-slot computation
//! - [`check_conflict`]: double-booking detection
//! - [`SyncOrchestrator`]: one fetch->send->report pass
//! - [`AdaptiveScheduler`]: the background dispatch loop
//! - [`BookingApi`]: system-of-record boundary

pub mod backend;
pub mod booking;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod model;
pub mod platform;
pub mod scheduler;
pub mod storage;

pub use backend::{BookingApi, HttpBookingApi};
pub use booking::{
    check_conflict, AvailabilityEngine, BookingRequest, BusinessHours, ConflictCheck,
    ConflictPolicy, DaySchedule, Slot, TimeInterval, VacationPeriod,
};
pub use dispatch::{PendingReminder, SmsResult, SyncOrchestrator, SyncResult};
pub use error::{ApiError, ChannelError, ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use model::{Appointment, AppointmentStatus, ConsentFlags, Customer, Service, Staff};
pub use platform::{DispatchBridge, HttpSmsGateway, MessageChannel, PowerMonitor};
pub use scheduler::{AdaptiveScheduler, QuietWindow, SchedulerStatus};
pub use storage::{Config, Database, PassRecord};
