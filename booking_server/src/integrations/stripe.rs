use booking_engine::{
    db_types::PaymentReference,
    traits::{GatewayError, PaymentGateway, PaymentStatus, VerifiedPayment},
};
use log::*;
use stripe_tools::{PaymentIntent, PaymentIntentStatus, StripeApi, StripeApiError, StripeConfig};

/// The payment gateway, as the booking engine sees it.
#[derive(Clone)]
pub struct StripeGateway {
    api: StripeApi,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Result<Self, StripeApiError> {
        let api = StripeApi::new(config)?;
        Ok(Self { api })
    }
}

impl PaymentGateway for StripeGateway {
    async fn fetch_payment(&self, reference: &PaymentReference) -> Result<VerifiedPayment, GatewayError> {
        match self.api.get_payment_intent(reference.as_str()).await {
            Ok(intent) => Ok(verified_payment_from_intent(intent)),
            Err(e) if e.is_not_found() => {
                info!("💳️ The gateway has no payment {reference}");
                Err(GatewayError::PaymentNotFound(reference.clone()))
            },
            Err(StripeApiError::InvalidObjectId(id)) => {
                info!("💳️ {id} cannot be a payment reference");
                Err(GatewayError::PaymentNotFound(reference.clone()))
            },
            Err(e) => {
                warn!("💳️ Could not fetch payment {reference} from the gateway. {e}");
                Err(GatewayError::GatewayUnreachable(e.to_string()))
            },
        }
    }
}

pub fn payment_status(status: PaymentIntentStatus) -> PaymentStatus {
    match status {
        PaymentIntentStatus::Succeeded => PaymentStatus::Succeeded,
        PaymentIntentStatus::Processing |
        PaymentIntentStatus::RequiresAction |
        PaymentIntentStatus::RequiresCapture |
        PaymentIntentStatus::RequiresConfirmation |
        PaymentIntentStatus::RequiresPaymentMethod => PaymentStatus::Pending,
        PaymentIntentStatus::Canceled | PaymentIntentStatus::Unknown => PaymentStatus::Failed,
    }
}

pub fn verified_payment_from_intent(intent: PaymentIntent) -> VerifiedPayment {
    VerifiedPayment {
        reference: PaymentReference::from(intent.id),
        status: payment_status(intent.status),
        amount: intent.amount,
        currency: intent.currency,
        metadata: intent.metadata,
    }
}
