//! Per-reminder delivery: consent gate, phone normalization, channel send.

use tracing::{debug, warn};

use crate::dispatch::phone::normalize_phone;
use crate::dispatch::types::{PendingReminder, SmsResult};
use crate::platform::MessageChannel;

/// Failure reason when the customer record has no phone number.
pub const MISSING_PHONE: &str = "missing phone number";
/// Failure reason when SMS reminder consent was not granted.
pub const NO_CONSENT: &str = "customer has not granted SMS reminder consent";
/// Failure reason when the host denied use of the channel.
pub const NO_PERMISSION: &str = "SMS permission not granted";

/// What happened to one reminder.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub result: SmsResult,
    /// Whether the message channel was actually invoked. Consent and data
    /// failures never reach the channel, so they need no rate-limit delay.
    pub channel_invoked: bool,
}

impl Delivery {
    fn rejected(reminder: &PendingReminder, reason: &str) -> Self {
        Self {
            result: SmsResult::failed(&reminder.appointment_id, reason),
            channel_invoked: false,
        }
    }
}

/// Sends a single reminder through the host's message channel, enforcing
/// per-customer consent first.
pub struct ReminderSender<C> {
    channel: C,
}

impl<C: MessageChannel> ReminderSender<C> {
    pub fn new(channel: C) -> Self {
        Self { channel }
    }

    #[cfg(test)]
    pub(crate) fn channel_ref(&self) -> &C {
        &self.channel
    }

    /// Attempt delivery of one reminder.
    ///
    /// Consent and data checks run before any send: a customer without a
    /// phone number or without SMS consent is reported failed with a
    /// specific reason and the channel is never touched.
    pub async fn deliver(&self, reminder: &PendingReminder) -> Delivery {
        let Some(phone) = reminder.customer.phone.as_deref().filter(|p| !p.trim().is_empty())
        else {
            return Delivery::rejected(reminder, MISSING_PHONE);
        };

        if !reminder.customer.consents.sms_reminder_consent {
            return Delivery::rejected(reminder, NO_CONSENT);
        }

        if !self.channel.has_permission() {
            return Delivery::rejected(reminder, NO_PERMISSION);
        }

        let recipient = normalize_phone(phone);
        debug!(
            appointment = %reminder.appointment_id,
            recipient = %recipient,
            "sending reminder"
        );

        match self.channel.send(&recipient, &reminder.message).await {
            Ok(()) => Delivery {
                result: SmsResult::sent(&reminder.appointment_id),
                channel_invoked: true,
            },
            Err(err) => {
                warn!(
                    appointment = %reminder.appointment_id,
                    error = %err,
                    "reminder send failed"
                );
                Delivery {
                    result: SmsResult::failed(&reminder.appointment_id, err.to_string()),
                    channel_invoked: true,
                }
            }
        }
    }
}
