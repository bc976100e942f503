//! Host capability interfaces.
//!
//! The core never talks to OS services directly: the hosting application
//! supplies an outbound message channel, battery information and the
//! backgrounded-dispatch flag through these traits, which keeps the
//! pipeline testable with fakes and portable across hosts.

use std::future::Future;

use reqwest::Client;
use serde_json::json;

use crate::error::ChannelError;

/// Outbound messaging channel (device SMS, gateway, ...).
pub trait MessageChannel: Send + Sync {
    /// Whether the host has authorized use of the channel. Checked before
    /// every send; the orchestrator surfaces a per-item failure when
    /// denied so the host can prompt and retry on a later pass.
    fn has_permission(&self) -> bool {
        true
    }

    /// Send one message to a normalized recipient number.
    fn send(&self, to: &str, body: &str)
        -> impl Future<Output = Result<(), ChannelError>> + Send;
}

/// Battery/power information from the host.
pub trait PowerMonitor: Send + Sync {
    /// True when the device is in deep power saving and background
    /// dispatch should be skipped.
    fn is_power_save(&self) -> bool;
}

/// Mains-powered hosts: never in power saving.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnPower;

impl PowerMonitor for AlwaysOnPower {
    fn is_power_save(&self) -> bool {
        false
    }
}

/// Flag surviving backgrounded execution, polled on foreground resume.
pub trait DispatchBridge: Send + Sync {
    /// Whether a dispatch was requested while the app was backgrounded.
    fn pending_dispatch(&self) -> bool;

    /// Reset the flag once the catch-up pass has been claimed.
    fn clear_pending_dispatch(&self);
}

/// Hosts without a background bridge: nothing is ever pending.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPendingDispatch;

impl DispatchBridge for NoPendingDispatch {
    fn pending_dispatch(&self) -> bool {
        false
    }

    fn clear_pending_dispatch(&self) {}
}

/// SMS delivery through an HTTP gateway -- the channel desktop/server
/// hosts use. Mobile hosts provide their own `MessageChannel` over the
/// device SMS API instead.
pub struct HttpSmsGateway {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl HttpSmsGateway {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            api_key,
        }
    }
}

impl MessageChannel for HttpSmsGateway {
    fn has_permission(&self) -> bool {
        !self.url.is_empty()
    }

    async fn send(&self, to: &str, body: &str) -> Result<(), ChannelError> {
        if self.url.is_empty() {
            return Err(ChannelError::Unavailable("no SMS gateway configured".into()));
        }

        let mut request = self
            .client
            .post(&self.url)
            .json(&json!({ "to": to, "message": body }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ChannelError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else if status.as_u16() == 401 || status.as_u16() == 403 {
            Err(ChannelError::PermissionDenied)
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(ChannelError::Rejected(format!("gateway HTTP {status}: {text}")))
        }
    }
}
