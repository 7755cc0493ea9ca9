//! # Stripe tools
//!
//! A deliberately small client for the parts of the Stripe API the booking platform relies on:
//! * Fetching a payment intent by id, so that the state reported by a webhook or a browser redirect can be checked
//!   independently against the gateway ([`StripeApi::get_payment_intent`]).
//! * Parsing webhook event envelopes ([`WebhookEvent`]).
//! * Checking the `Stripe-Signature` header of incoming webhooks ([`webhook`]).
mod api;
mod config;
mod data_objects;
mod error;
pub mod webhook;

pub use api::StripeApi;
pub use config::StripeConfig;
pub use data_objects::{EventData, PaymentIntent, PaymentIntentStatus, WebhookEvent, PAYMENT_INTENT_SUCCEEDED};
pub use error::StripeApiError;
