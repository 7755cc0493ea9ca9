//! Reservation notifications.
//!
//! When a reservation is created, the payer receives a confirmation and the tenant's operations team receives an
//! alert. Both are sent through a templated mail API. Delivery is best-effort: failures are logged and nothing is
//! retried, and none of it happens on the request path, because the dispatcher is registered as the engine's
//! `on_reservation_created` hook.
use std::sync::Arc;

use booking_engine::{
    db_types::{Reservation, Tenant},
    events::{EventHandlers, EventHooks, ReservationCreatedEvent},
};
use futures::future::BoxFuture;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::MailConfig;

pub const CONFIRMATION_TEMPLATE: &str = "reservation_confirmation";
pub const OPERATIONAL_ALERT_TEMPLATE: &str = "reservation_operational_alert";
pub const NOTIFICATION_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Could not initialize the mail client. {0}")]
    Initialization(String),
    #[error("The mail service could not be reached. {0}")]
    Unreachable(String),
    #[error("The mail service rejected the message. Error {status}. {message}")]
    Rejected { status: u16, message: String },
}

/// A templated message, as accepted by the mail API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub template: String,
    pub data: Value,
}

#[derive(Clone)]
pub struct MailClient {
    config: MailConfig,
    client: Arc<Client>,
}

impl MailClient {
    pub fn new(config: MailConfig) -> Result<Self, NotificationError> {
        let mut headers = HeaderMap::with_capacity(1);
        if !config.api_key.is_empty() {
            let mut val = HeaderValue::from_str(&format!("Bearer {}", config.api_key.reveal()))
                .map_err(|e| NotificationError::Initialization(e.to_string()))?;
            val.set_sensitive(true);
            headers.insert(AUTHORIZATION, val);
        }
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| NotificationError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn from_address(&self) -> &str {
        &self.config.from
    }

    /// Sends `message`. When notifications are disabled, the message is logged instead.
    pub async fn send(&self, message: &MailMessage) -> Result<(), NotificationError> {
        let url = match (&self.config.api_url, self.config.enabled) {
            (Some(url), true) => url,
            _ => {
                info!("📧️ Notifications are disabled. Not sending {} to {}", message.template, message.to.join(", "));
                return Ok(());
            },
        };
        let response = self
            .client
            .post(url)
            .json(message)
            .send()
            .await
            .map_err(|e| NotificationError::Unreachable(e.to_string()))?;
        if response.status().is_success() {
            debug!("📧️ {} sent to {}", message.template, message.to.join(", "));
            Ok(())
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            Err(NotificationError::Rejected { status, message })
        }
    }
}

/// The reservation fields every template receives.
pub fn reservation_fields(reservation: &Reservation, tenant: &Tenant) -> Value {
    json!({
        "reservation_number": reservation.reservation_number,
        "tenant_name": tenant.display_name,
        "activity": reservation.activity,
        "activity_date": reservation.activity_date.format("%Y-%m-%d").to_string(),
        "adults": reservation.adults,
        "children": reservation.children,
        "guests": reservation.guests(),
        "contact_name": reservation.contact_name,
        "contact_email": reservation.contact_email,
        "contact_phone": reservation.contact_phone,
        "pickup_location": reservation.pickup_location,
        "pickup_time": reservation.pickup_time,
        "amount": reservation.amount,
        "currency": reservation.currency,
    })
}

pub fn confirmation_message(from: &str, reservation: &Reservation, tenant: &Tenant) -> MailMessage {
    MailMessage {
        from: from.to_string(),
        to: vec![reservation.contact_email.clone()],
        template: CONFIRMATION_TEMPLATE.to_string(),
        data: reservation_fields(reservation, tenant),
    }
}

/// `None` if the tenant has not configured any alert recipients.
pub fn operational_alert_message(from: &str, reservation: &Reservation, tenant: &Tenant) -> Option<MailMessage> {
    let to = tenant.alert_recipients();
    if to.is_empty() {
        return None;
    }
    Some(MailMessage {
        from: from.to_string(),
        to,
        template: OPERATIONAL_ALERT_TEMPLATE.to_string(),
        data: reservation_fields(reservation, tenant),
    })
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    mail: MailClient,
}

impl NotificationDispatcher {
    pub fn new(mail: MailClient) -> Self {
        Self { mail }
    }

    pub async fn send_confirmation(&self, reservation: &Reservation, tenant: &Tenant) {
        let message = confirmation_message(self.mail.from_address(), reservation, tenant);
        match self.mail.send(&message).await {
            Ok(()) => info!("📧️ Confirmation for {} sent", reservation.reservation_number),
            Err(e) => error!("📧️ Could not send the confirmation for {}. {e}", reservation.reservation_number),
        }
    }

    pub async fn send_operational_alerts(&self, reservation: &Reservation, tenant: &Tenant) {
        let Some(message) = operational_alert_message(self.mail.from_address(), reservation, tenant) else {
            debug!("📧️ Tenant {} has no alert recipients", tenant.id);
            return;
        };
        match self.mail.send(&message).await {
            Ok(()) => info!("📧️ Operational alert for {} sent", reservation.reservation_number),
            Err(e) => error!("📧️ Could not send the operational alert for {}. {e}", reservation.reservation_number),
        }
    }
}

/// Registers the notification dispatcher as the reservation created hook.
pub fn create_notification_event_handlers(config: MailConfig) -> Result<EventHandlers, NotificationError> {
    let dispatcher = NotificationDispatcher::new(MailClient::new(config)?);
    let mut hooks = EventHooks::default();
    hooks.on_reservation_created(move |ev| notify(dispatcher.clone(), ev));
    Ok(EventHandlers::new(NOTIFICATION_EVENT_BUFFER_SIZE, hooks))
}

fn notify(dispatcher: NotificationDispatcher, ev: ReservationCreatedEvent) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        let ReservationCreatedEvent { reservation, tenant } = ev;
        dispatcher.send_confirmation(&reservation, &tenant).await;
        dispatcher.send_operational_alerts(&reservation, &tenant).await;
    })
}
