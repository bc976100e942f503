//! HTTP client for the booking backend.

use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::backend::BookingApi;
use crate::booking::hours::{BusinessHours, VacationPeriod};
use crate::dispatch::types::PendingReminder;
use crate::error::ApiError;
use crate::model::{Appointment, Service, Staff};

/// REST client for the system of record.
#[derive(Debug, Clone)]
pub struct HttpBookingApi {
    client: Client,
    base: Url,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct BookingWindow {
    days: u32,
}

impl HttpBookingApi {
    /// Build a client for the given base URL (e.g. `https://host/api`).
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, ApiError> {
        // A trailing slash keeps Url::join from eating the last path
        // segment of the base.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base = Url::parse(&normalized).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        Ok(Self {
            client: Client::new(),
            base,
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        let response = self.authorized(self.client.get(url)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        response.json::<T>().await.map_err(|e| ApiError::Decode {
            endpoint: path.to_string(),
            message: e.to_string(),
        })
    }

    async fn post(&self, path: &str, body: Option<serde_json::Value>) -> Result<(), ApiError> {
        let url = self.endpoint(path)?;
        let mut request = self.authorized(self.client.post(url));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}

impl BookingApi for HttpBookingApi {
    async fn pending_reminders(&self) -> Result<Vec<PendingReminder>, ApiError> {
        self.get_json("pending-reminders").await
    }

    async fn mark_reminder_sent(&self, appointment_id: &str) -> Result<(), ApiError> {
        self.post(&format!("appointments/{appointment_id}/mark-sent"), None)
            .await
    }

    async fn mark_reminder_failed(&self, appointment_id: &str, error: &str) -> Result<(), ApiError> {
        self.post(
            &format!("appointments/{appointment_id}/mark-failed"),
            Some(json!({ "errorMessage": error })),
        )
        .await
    }

    async fn business_hours(&self) -> Result<BusinessHours, ApiError> {
        self.get_json("business-hours").await
    }

    async fn vacation_periods(&self) -> Result<Vec<VacationPeriod>, ApiError> {
        self.get_json("vacation-periods").await
    }

    async fn booking_window_days(&self) -> Result<u32, ApiError> {
        let window: BookingWindow = self.get_json("booking-window-days").await?;
        Ok(window.days)
    }

    async fn appointments_on(&self, date: NaiveDate) -> Result<Vec<Appointment>, ApiError> {
        self.get_json(&format!("appointments?date={date}")).await
    }

    async fn staff(&self) -> Result<Vec<Staff>, ApiError> {
        self.get_json("staff").await
    }

    async fn services(&self) -> Result<Vec<Service>, ApiError> {
        self.get_json("services").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn client_for(server: &mockito::Server) -> HttpBookingApi {
        HttpBookingApi::new(&format!("{}/api", server.url()), Some("token-1".into())).unwrap()
    }

    #[tokio::test]
    async fn decodes_pending_reminders() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/pending-reminders")
            .match_header("authorization", "Bearer token-1")
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{
                    "appointment_id": "app-1",
                    "customer": {
                        "id": "cust-1",
                        "first_name": "Anna",
                        "last_name": "Bianchi",
                        "phone": "333 1234567",
                        "consents": { "smsReminderConsent": true }
                    },
                    "service_name": "Taglio",
                    "date": "2026-03-10",
                    "start_time": "10:00",
                    "message": "Ti aspettiamo"
                }]"#,
            )
            .create_async()
            .await;

        let api = client_for(&server).await;
        let pending = api.pending_reminders().await.unwrap();
        mock.assert_async().await;

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].appointment_id, "app-1");
        assert!(pending[0].customer.consents.sms_reminder_consent);
    }

    #[tokio::test]
    async fn mark_sent_posts_to_appointment_route() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/appointments/app-1/mark-sent")
            .with_status(204)
            .create_async()
            .await;

        let api = client_for(&server).await;
        api.mark_reminder_sent("app-1").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn mark_failed_carries_the_error_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/appointments/app-2/mark-failed")
            .match_body(mockito::Matcher::Json(
                json!({ "errorMessage": "missing phone number" }),
            ))
            .with_status(204)
            .create_async()
            .await;

        let api = client_for(&server).await;
        api.mark_reminder_failed("app-2", "missing phone number")
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn booking_window_unwraps_days() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/booking-window-days")
            .with_body(r#"{ "days": 45 }"#)
            .create_async()
            .await;

        let api = client_for(&server).await;
        assert_eq!(api.booking_window_days().await.unwrap(), 45);
    }

    #[tokio::test]
    async fn non_success_status_becomes_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/pending-reminders")
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        let api = client_for(&server).await;
        let err = api.pending_reminders().await.unwrap_err();
        match err {
            ApiError::Status { status, body, .. } => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn appointments_query_carries_the_date() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/appointments?date=2026-03-10")
            .with_body("[]")
            .create_async()
            .await;

        let api = client_for(&server).await;
        let date = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        assert!(api.appointments_on(date).await.unwrap().is_empty());
        mock.assert_async().await;
    }
}
