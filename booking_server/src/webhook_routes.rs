//! The gateway's webhook.
//!
//! Webhook responses must be in the 200 range for every event we could read, otherwise the gateway keeps re-delivering
//! events that will never succeed. The exception is a temporary failure on our side (gateway unreachable, no
//! reservation number, database trouble): those answer `500` so that the gateway's retry policy delivers the event
//! again later.
//!
//! The signature check is advisory. The signing secret is per tenant, so it can only be looked up once the tenant
//! marker has been read from the (as yet unverified) payload. Whatever the outcome, the payment itself is fetched from
//! the gateway and checked before a reservation is made, so a forged event cannot create one.
use actix_web::{web, HttpRequest, HttpResponse};
use booking_engine::{
    db_types::{PaymentReference, Tenant, TenantId},
    traits::TENANT_MARKER_KEY,
    BookingDatabase,
    PaymentGateway,
    ReconciliationApi,
    RemoteSequence,
    TenantManagement,
};
use chrono::Utc;
use log::*;
use stripe_tools::{
    webhook::{verify_signature, SIGNATURE_HEADER},
    WebhookEvent,
};

use crate::{config::ServerOptions, data_objects::WebhookResponse, errors::ServerError, route};

/// The result of checking the signature header of a webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureCheck {
    Verified,
    /// The tenant has no signing secret, or is unknown
    NotConfigured,
    Failed(String),
}

route!(payment_webhook => Post "/payments" impl BookingDatabase, PaymentGateway, RemoteSequence);
pub async fn payment_webhook<B, G, R>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<ReconciliationApi<B, G, R>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    B: BookingDatabase,
    G: PaymentGateway,
    R: RemoteSequence,
{
    trace!("📬️ Received webhook request: {}", req.uri());
    let event = serde_json::from_slice::<WebhookEvent>(&body).map_err(|e| {
        warn!("📬️ Could not read webhook event. {e}");
        ServerError::InvalidRequest(format!("Malformed event. {e}"))
    })?;
    if !event.is_payment_succeeded() {
        debug!("📬️ Ignoring {} event {}", event.event_type, event.id);
        return Ok(HttpResponse::Ok().json(WebhookResponse::received()));
    }
    let reference = event.object_id().map(PaymentReference::from).ok_or_else(|| {
        warn!("📬️ Event {} does not say which payment it is about", event.id);
        ServerError::InvalidRequest("The event object has no id".into())
    })?;
    let Some(tenant_id) = event.object_metadata(TENANT_MARKER_KEY).map(str::trim).filter(|s| !s.is_empty()) else {
        warn!("📬️ Payment {reference} in event {} has no tenant marker. It cannot become a reservation.", event.id);
        return Ok(HttpResponse::Ok().json(WebhookResponse::received()));
    };
    let tenant_id = TenantId::from(tenant_id);
    let tenant = match api.db().fetch_tenant(&tenant_id).await {
        Ok(t) => t,
        Err(e) => {
            error!("📬️ Could not look up tenant {tenant_id} for payment {reference}. {e}");
            return Ok(retry_later());
        },
    };
    let header = req.headers().get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    match check_signature(&body, header, tenant.as_ref(), options.webhook_tolerance_secs) {
        SignatureCheck::Verified => debug!("🔐️ Signature verified for event {}", event.id),
        SignatureCheck::NotConfigured => debug!("🔐️ No signing secret for tenant {tenant_id}. Skipping the check."),
        SignatureCheck::Failed(reason) => warn!(
            "🔐️ Signature check failed for event {} (tenant {tenant_id}). {reason}. Continuing; the payment will be \
             verified with the gateway.",
            event.id
        ),
    }
    match api.reconcile(&reference, &tenant_id).await {
        Ok(outcome) => {
            info!(
                "📬️ Payment {reference} reconciled to reservation {} ({})",
                outcome.reservation.reservation_number, outcome.created_by
            );
            Ok(HttpResponse::Ok().json(WebhookResponse::from(outcome)))
        },
        Err(e) if e.is_transient() => {
            error!("📬️ Payment {reference} could not be reconciled right now. The gateway will retry. {e}");
            Ok(retry_later())
        },
        Err(e) => {
            info!("📬️ Payment {reference} will not become a reservation. {e}");
            Ok(HttpResponse::Ok().json(WebhookResponse::received()))
        },
    }
}

/// Checks the signature header against the tenant's signing secret, if it has one.
pub fn check_signature(
    body: &[u8],
    header: Option<&str>,
    tenant: Option<&Tenant>,
    tolerance_secs: i64,
) -> SignatureCheck {
    let Some(secret) = tenant.and_then(Tenant::signing_secret) else {
        return SignatureCheck::NotConfigured;
    };
    let Some(header) = header else {
        return SignatureCheck::Failed(format!("The {SIGNATURE_HEADER} header is missing"));
    };
    match verify_signature(body, header, secret, tolerance_secs, Utc::now()) {
        Ok(()) => SignatureCheck::Verified,
        Err(e) => SignatureCheck::Failed(e.to_string()),
    }
}

fn retry_later() -> HttpResponse {
    HttpResponse::InternalServerError().json(WebhookResponse { received: false, ..Default::default() })
}

#[cfg(test)]
mod test {
    use stripe_tools::webhook::signature_header;

    use super::*;

    const BODY: &[u8] = br#"{"id":"evt_1","type":"payment_intent.succeeded"}"#;

    fn tenant(secret: Option<&str>) -> Tenant {
        Tenant {
            id: TenantId::from("T1"),
            display_name: "Turtle Island Paddle Co".into(),
            initials: Some("T1P".into()),
            webhook_secret: secret.map(String::from),
            alert_emails: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn signature_checks() {
        let now = Utc::now().timestamp();
        let header = signature_header(BODY, now, "whsec_t1").unwrap();
        let t1 = tenant(Some("whsec_t1"));
        assert_eq!(check_signature(BODY, Some(&header), Some(&t1), 300), SignatureCheck::Verified);
        assert_eq!(check_signature(BODY, Some(&header), None, 300), SignatureCheck::NotConfigured);
        assert_eq!(check_signature(BODY, None, Some(&tenant(Some("  "))), 300), SignatureCheck::NotConfigured);
        assert!(matches!(check_signature(BODY, None, Some(&t1), 300), SignatureCheck::Failed(_)));
        let other = tenant(Some("whsec_someone_else"));
        assert!(matches!(check_signature(BODY, Some(&header), Some(&other), 300), SignatureCheck::Failed(_)));
        let stale = signature_header(BODY, now - 3600, "whsec_t1").unwrap();
        assert!(matches!(check_signature(BODY, Some(&stale), Some(&t1), 300), SignatureCheck::Failed(_)));
    }
}
